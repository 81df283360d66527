//! Sample records for worker passes

use chrono::{Duration, Utc};
use server::database::{
    AccountType, CustomerRecord, OilType, ScheduleRecord, ScheduleVehicle, VehicleInfo,
};
use uuid::Uuid;

pub const OFFICE_KEY: &str = "office-test-key";

pub fn sample_customer(account_type: AccountType) -> CustomerRecord {
    CustomerRecord {
        id: Uuid::new_v4().to_string(),
        account_type,
        full_name: match account_type {
            AccountType::Customer => "Jane Driver".to_string(),
            AccountType::Fleet => "Acme Trucks".to_string(),
        },
        address: "12 Oak Street".to_string(),
        phone: "555-0100".to_string(),
        office_phone: String::new(),
        email: format!("{}@luber.test", Uuid::new_v4().simple()),
        password_hash: "not-a-real-hash".to_string(),
        profile_picture_url: String::new(),
        created_at: Utc::now(),
    }
}

fn line(service_id: &str, plate: &str) -> ScheduleVehicle {
    ScheduleVehicle {
        vehicle_id: Uuid::new_v4().to_string(),
        service_id: service_id.to_string(),
        oil_type: OilType::FullSynthetic,
        price: 80.0,
        air_filter: false,
        cabin_filter: false,
        service_address: "12 Oak Street".to_string(),
        vehicle_info: VehicleInfo {
            brand: "Ford".to_string(),
            model: "Transit".to_string(),
            year: 2021,
            engine: "3.5L".to_string(),
            plate_last3: plate.to_string(),
            vehicle_image_url: String::new(),
            vin_image_url: String::new(),
        },
    }
}

/// Untouched schedule for `customer` with two vehicle lines
pub fn sample_schedule(customer: &CustomerRecord) -> ScheduleRecord {
    let now = Utc::now();
    ScheduleRecord {
        id: Uuid::new_v4().to_string(),
        customer_id: customer.id.clone(),
        account_type: customer.account_type,
        customer_name: customer.full_name.clone(),
        email: Some(customer.email.clone()),
        date: "2099-06-01".to_string(),
        time: "10:00 AM".to_string(),
        total: 160.0,
        client_address: customer.address.clone(),
        offer_price: vec![24.0, 24.0],
        secured: false,
        reserved: false,
        vehicles: vec![line("svc-oil", "TR1"), line("svc-filter", "TR2")],
        confirmed: false,
        paid: false,
        processed: false,
        completed: false,
        completed_at: None,
        completed_by: None,
        service_milage: None,
        invoice_id: None,
        paypal_order_id: None,
        fleet_notified: false,
        fleet_processed_notified: false,
        invoice_sent_notified: false,
        confirmation_notified: false,
        created_at: now,
        updated_at: now,
    }
}

/// Same schedule created `minutes` ago
pub fn aged(mut schedule: ScheduleRecord, minutes: i64) -> ScheduleRecord {
    schedule.created_at = Utc::now() - Duration::minutes(minutes);
    schedule.updated_at = schedule.created_at;
    schedule
}

/// Completed by a technician with the odometer reading taken on site
pub fn completed(mut schedule: ScheduleRecord) -> ScheduleRecord {
    schedule.paid = true;
    schedule.confirmed = true;
    schedule.completed = true;
    schedule.completed_at = Some(Utc::now());
    schedule.completed_by = Some("Tech Maria".to_string());
    schedule.service_milage = Some(48_250);
    schedule
}
