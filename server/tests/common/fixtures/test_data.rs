//! Common test data and constants

use chrono::{Duration, Utc};
use server::database::{
    AccountType, CustomerRecord, OilType, ScheduleRecord, ScheduleVehicle, ServiceRecord,
    VehicleInfo, VehicleRecord,
};
use uuid::Uuid;

pub const OFFICE_KEY: &str = "office-test-key";
pub const PASSWORD: &str = "s3cret-pass";

/// Appointment date far enough ahead to always be cancellable
pub const FUTURE_DATE: &str = "2099-06-01";

/// Generate a unique email for testing
pub fn random_email() -> String {
    format!("{}@luber.test", Uuid::new_v4().simple())
}

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
        email: random_email(),
        password_hash: "not-a-real-hash".to_string(),
        profile_picture_url: String::new(),
        created_at: Utc::now(),
    }
}

pub fn sample_vehicle(customer_id: &str) -> VehicleRecord {
    VehicleRecord {
        id: Uuid::new_v4().to_string(),
        customer_id: customer_id.to_string(),
        brand: "Toyota".to_string(),
        year: 2019,
        model: "Corolla".to_string(),
        engine: "1.8L".to_string(),
        color: "Blue".to_string(),
        plate_last3: "K7Q".to_string(),
        vin: "1NXBR32E".to_string(),
        vin_image_url: String::new(),
        vehicle_image_url: String::new(),
        service_intervals: vec![5000, 10000],
        interval: 5000,
        base_interval: 5000,
        milage: 0,
    }
}

pub fn sample_service(name: &str) -> ServiceRecord {
    ServiceRecord {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        description: "Oil and filter change".to_string(),
        description2: String::new(),
        details: String::new(),
        notes: String::new(),
        price_from: 49.0,
        price_to: 89.0,
        oil_capacity_from: 4.0,
        oil_capacity_to: 6.0,
        category: "oil".to_string(),
        image_path: String::new(),
        created_at: Utc::now(),
    }
}

/// Schedule for `customer` with one line for `vehicle`, every flag cleared
pub fn sample_schedule(customer: &CustomerRecord, vehicle: &VehicleRecord) -> ScheduleRecord {
    let now = Utc::now();
    ScheduleRecord {
        id: Uuid::new_v4().to_string(),
        customer_id: customer.id.clone(),
        account_type: customer.account_type,
        customer_name: customer.full_name.clone(),
        email: Some(customer.email.clone()),
        date: FUTURE_DATE.to_string(),
        time: "10:00 AM".to_string(),
        total: 80.0,
        client_address: customer.address.clone(),
        offer_price: vec![24.0],
        secured: false,
        reserved: false,
        vehicles: vec![ScheduleVehicle {
            vehicle_id: vehicle.id.clone(),
            service_id: "svc-oil".to_string(),
            oil_type: OilType::FullSynthetic,
            price: 80.0,
            air_filter: false,
            cabin_filter: true,
            service_address: String::new(),
            vehicle_info: VehicleInfo {
                brand: vehicle.brand.clone(),
                model: vehicle.model.clone(),
                year: vehicle.year,
                engine: vehicle.engine.clone(),
                plate_last3: vehicle.plate_last3.clone(),
                vehicle_image_url: String::new(),
                vin_image_url: String::new(),
            },
        }],
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
