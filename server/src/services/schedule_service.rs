use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::constants::booking;
use crate::database::{
    AccountType, CancellationRecord, CancelledVehicle, Database, OilType, ScheduleRecord,
    ScheduleVehicle, VehicleInfo, VehicleRecord,
};
use crate::errors::{AccountError, LuberError, PaymentError, ScheduleError};
use crate::lifecycle::{self, OfficeAction};
use crate::messages;
use crate::services::notifier::ChatNotifier;
use crate::services::paypal::{CreatedOrder, PayPalClient};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleLineRequest {
    pub vehicle_id: String,
    #[serde(default)]
    pub service_id: String,
    pub oil_type: OilType,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub air_filter: bool,
    #[serde(default)]
    pub cabin_filter: bool,
    #[serde(default)]
    pub service_address: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    pub date: String,
    pub time: String,
    pub total: Option<f64>,
    #[serde(default)]
    pub client_address: String,
    #[serde(default)]
    pub vehicles: Vec<ScheduleLineRequest>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedSchedule {
    pub schedule_id: String,
    pub account_type: AccountType,
    pub order_id: Option<String>,
    pub approve_link: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    pub completed_by: Option<String>,
    pub service_milage: Option<i64>,
}

/// Every bookable slot label of a day, "09:00 AM" through "09:00 PM"
pub fn all_slots() -> Vec<String> {
    (booking::FIRST_SLOT_HOUR..=booking::LAST_SLOT_HOUR)
        .map(|hour| {
            let hour12 = match hour {
                0 => 12,
                1..=12 => hour,
                _ => hour - 12,
            };
            let suffix = if hour < 12 { "AM" } else { "PM" };
            format!("{:02}:00 {}", hour12, suffix)
        })
        .collect()
}

pub fn offer_price(price: f64) -> f64 {
    (price * booking::OFFER_RATE * 100.0).round() / 100.0
}

fn parse_date(date: &str) -> Result<NaiveDate, LuberError> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| LuberError::validation("date", "must be formatted as YYYY-MM-DD"))
}

/// Cancellation needs at least one full day between today and the appointment
pub fn can_cancel(appointment: NaiveDate, today: NaiveDate) -> bool {
    (appointment - today).num_days() >= booking::CANCELLATION_NOTICE_DAYS
}

fn schedule_line(
    line: &ScheduleLineRequest,
    owned: &[VehicleRecord],
    client_address: &str,
) -> ScheduleVehicle {
    let vehicle_info = owned
        .iter()
        .find(|v| v.id == line.vehicle_id)
        .map(|v| VehicleInfo {
            brand: v.brand.clone(),
            model: v.model.clone(),
            year: v.year,
            engine: v.engine.clone(),
            plate_last3: v.plate_last3.clone(),
            vehicle_image_url: v.vehicle_image_url.clone(),
            vin_image_url: v.vin_image_url.clone(),
        })
        .unwrap_or_default();

    let service_address = if line.service_address.trim().is_empty() {
        client_address.to_string()
    } else {
        line.service_address.clone()
    };

    ScheduleVehicle {
        vehicle_id: line.vehicle_id.clone(),
        service_id: line.service_id.clone(),
        oil_type: line.oil_type,
        price: line.price,
        air_filter: line.air_filter,
        cabin_filter: line.cabin_filter,
        service_address,
        vehicle_info,
    }
}

#[derive(Clone)]
pub struct ScheduleService {
    database: Arc<Database>,
    paypal: PayPalClient,
    notifier: ChatNotifier,
    timezone: Tz,
}

impl ScheduleService {
    pub fn new(
        database: Arc<Database>,
        paypal: PayPalClient,
        notifier: ChatNotifier,
        timezone: Tz,
    ) -> Self {
        Self {
            database,
            paypal,
            notifier,
            timezone,
        }
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }

    async fn get(&self, schedule_id: &str) -> Result<ScheduleRecord, LuberError> {
        self.database
            .get_schedule(schedule_id)
            .await?
            .ok_or_else(|| {
                ScheduleError::NotFound {
                    schedule_id: schedule_id.to_string(),
                }
                .into()
            })
    }

    pub async fn availability(
        &self,
        customer_id: &str,
        date: &str,
    ) -> Result<Vec<String>, LuberError> {
        let booked = match self.database.booked_times(customer_id, date).await {
            Ok(booked) => booked,
            Err(e) => {
                // Fall back to the full day rather than failing the lookup
                warn!("Could not read booked times for {}: {}", customer_id, e);
                Vec::new()
            }
        };

        Ok(all_slots()
            .into_iter()
            .filter(|slot| !booked.contains(slot))
            .collect())
    }

    pub async fn create(
        &self,
        customer_id: &str,
        request: CreateScheduleRequest,
    ) -> Result<CreatedSchedule, LuberError> {
        parse_date(&request.date)?;
        if request.time.trim().is_empty() {
            return Err(LuberError::validation("time", "is required"));
        }
        if request.vehicles.is_empty() {
            return Err(LuberError::validation("vehicles", "at least one vehicle is required"));
        }

        let customer = self
            .database
            .get_customer_by_id(customer_id)
            .await?
            .ok_or_else(|| {
                LuberError::from(AccountError::CustomerNotFound {
                    customer_id: customer_id.to_string(),
                })
            })?;
        let owned = self.database.list_vehicles(customer_id).await?;

        let vehicles: Vec<ScheduleVehicle> = request
            .vehicles
            .iter()
            .map(|line| schedule_line(line, &owned, &request.client_address))
            .collect();
        let total = request
            .total
            .unwrap_or_else(|| vehicles.iter().map(|v| v.price).sum());

        let now = Utc::now();
        let schedule = ScheduleRecord {
            id: Uuid::new_v4().to_string(),
            customer_id: customer.id.clone(),
            account_type: customer.account_type,
            customer_name: customer.full_name.clone(),
            email: Some(customer.email.clone()),
            date: request.date.trim().to_string(),
            time: request.time.trim().to_string(),
            total,
            client_address: request.client_address,
            offer_price: vehicles.iter().map(|v| offer_price(v.price)).collect(),
            secured: false,
            reserved: false,
            vehicles,
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
        };

        self.database.insert_schedule(&schedule).await?;
        info!(
            "Created {} schedule {} for {} on {} at {}",
            schedule.account_type.as_str(),
            schedule.id,
            customer.id,
            schedule.date,
            schedule.time
        );

        let mut created = CreatedSchedule {
            schedule_id: schedule.id.clone(),
            account_type: schedule.account_type,
            order_id: None,
            approve_link: None,
        };

        if schedule.account_type == AccountType::Customer {
            // On failure the unpaid schedule is left for the unpaid remover
            let order = self.create_order(&schedule.id, schedule.total).await?;
            created.order_id = Some(order.id);
            created.approve_link = order.approve_link;
        }

        Ok(created)
    }

    /// Creates a PayPal order for the schedule and remembers its id
    pub async fn create_order(
        &self,
        schedule_id: &str,
        total: f64,
    ) -> Result<CreatedOrder, LuberError> {
        let schedule = self.get(schedule_id).await?;
        lifecycle::check_transition(&schedule, OfficeAction::OpenPayment)?;

        let order = self.paypal.create_order(schedule_id, total).await?;
        if !self
            .database
            .set_schedule_paypal_order(schedule_id, &order.id)
            .await?
        {
            warn!(
                "Schedule {} disappeared before order {} was stored",
                schedule_id, order.id
            );
        }
        Ok(order)
    }

    /// Captures the approved order and marks its schedule paid
    pub async fn capture_order(&self, order_id: &str) -> Result<String, LuberError> {
        let captured = self.paypal.capture_order(order_id).await?;
        let schedule_id = captured.reference_id.ok_or_else(|| {
            LuberError::from(PaymentError::CaptureFailed {
                order_id: order_id.to_string(),
                reason: "order has no reference id".to_string(),
            })
        })?;

        self.mark_paid(&schedule_id).await?;
        Ok(schedule_id)
    }

    pub async fn mark_paid(&self, schedule_id: &str) -> Result<ScheduleRecord, LuberError> {
        let schedule = self.get(schedule_id).await?;
        if schedule.paid {
            return Ok(schedule);
        }
        lifecycle::check_transition(&schedule, OfficeAction::MarkPaid)?;
        self.database.mark_schedule_paid(schedule_id).await?;
        info!("Schedule {} marked paid", schedule_id);
        self.get(schedule_id).await
    }

    pub async fn list_for_customer(
        &self,
        session_customer_id: &str,
        requested_customer_id: &str,
    ) -> Result<Vec<ScheduleRecord>, LuberError> {
        if session_customer_id != requested_customer_id {
            return Err(LuberError::Forbidden);
        }
        Ok(self
            .database
            .list_schedules_for_customer(session_customer_id)
            .await?)
    }

    pub async fn fleet_schedules(&self) -> Result<Vec<ScheduleRecord>, LuberError> {
        Ok(self.database.list_fleet_schedules_with_customer().await?)
    }

    pub async fn cancel(&self, customer_id: &str, schedule_id: &str) -> Result<(), LuberError> {
        let schedule = self.get(schedule_id).await?;
        if schedule.customer_id != customer_id {
            return Err(ScheduleError::NotOwner {
                schedule_id: schedule_id.to_string(),
            }
            .into());
        }

        let appointment = parse_date(&schedule.date)?;
        if !can_cancel(appointment, self.today()) {
            return Err(ScheduleError::TooLateToCancel {
                date: schedule.date.clone(),
            }
            .into());
        }

        let cancelled_at = Utc::now();
        for line in &schedule.vehicles {
            let service_name = self
                .database
                .get_service_name(&line.service_id)
                .await?
                .unwrap_or_else(|| booking::UNKNOWN_SERVICE_NAME.to_string());

            let entry = CancellationRecord {
                date: cancelled_at,
                service_name,
                vehicle_info: CancelledVehicle {
                    brand: line.vehicle_info.brand.clone(),
                    model: line.vehicle_info.model.clone(),
                    plate_last3: line.vehicle_info.plate_last3.clone(),
                },
                archived: false,
            };
            self.database
                .insert_cancellation(customer_id, &entry)
                .await?;
        }

        self.database.delete_schedule(schedule_id).await?;
        info!(
            "Schedule {} cancelled by customer {} ({} vehicle line(s))",
            schedule_id,
            customer_id,
            schedule.vehicles.len()
        );
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Office actions
    // ------------------------------------------------------------------------

    pub async fn confirm(&self, schedule_id: &str) -> Result<ScheduleRecord, LuberError> {
        let schedule = self.get(schedule_id).await?;
        lifecycle::check_transition(&schedule, OfficeAction::Confirm)?;

        self.database.mark_schedule_confirmed(schedule_id).await?;
        let text = messages::office_confirmation(&schedule);
        if let Err(e) = self
            .notifier
            .post_office_message(&schedule.customer_id, &text)
            .await
        {
            warn!("Could not post confirmation for {}: {}", schedule_id, e);
        }

        info!("Schedule {} confirmed by office", schedule_id);
        self.get(schedule_id).await
    }

    pub async fn process(&self, schedule_id: &str) -> Result<ScheduleRecord, LuberError> {
        let schedule = self.get(schedule_id).await?;
        lifecycle::check_transition(&schedule, OfficeAction::Process)?;
        self.database.mark_schedule_processed(schedule_id).await?;
        info!("Schedule {} processed", schedule_id);
        self.get(schedule_id).await
    }

    pub async fn attach_invoice(
        &self,
        schedule_id: &str,
        invoice_id: &str,
    ) -> Result<ScheduleRecord, LuberError> {
        let invoice_id = invoice_id.trim();
        if invoice_id.is_empty() {
            return Err(LuberError::validation("invoiceId", "is required"));
        }

        let schedule = self.get(schedule_id).await?;
        lifecycle::check_transition(&schedule, OfficeAction::AttachInvoice)?;
        self.database
            .set_schedule_invoice(schedule_id, invoice_id)
            .await?;
        info!("Invoice {} attached to schedule {}", invoice_id, schedule_id);
        self.get(schedule_id).await
    }

    pub async fn complete(
        &self,
        schedule_id: &str,
        request: CompleteRequest,
    ) -> Result<ScheduleRecord, LuberError> {
        if request.service_milage.is_some_and(|m| m < 0) {
            return Err(LuberError::validation(
                "serviceMilage",
                "must be a non-negative number",
            ));
        }

        let schedule = self.get(schedule_id).await?;
        lifecycle::check_transition(&schedule, OfficeAction::Complete)?;

        let completed_by = request
            .completed_by
            .map(|by| by.trim().to_string())
            .filter(|by| !by.is_empty())
            .unwrap_or_else(|| "office".to_string());

        self.database
            .mark_schedule_completed(
                schedule_id,
                &completed_by,
                request.service_milage,
                Utc::now(),
            )
            .await?;
        info!("Schedule {} completed by {}", schedule_id, completed_by);
        self.get(schedule_id).await
    }
}
