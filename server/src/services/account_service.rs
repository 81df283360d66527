use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::{
    AccountType, CancellationRecord, CustomerRecord, Database, LoginLogRecord, VehicleRecord,
};
use crate::errors::{AccountError, LuberError};
use crate::messages;
use crate::services::notifier::ChatNotifier;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IntervalValue {
    Number(f64),
    Text(String),
}

impl IntervalValue {
    fn as_miles(&self) -> i64 {
        match self {
            IntervalValue::Number(n) => *n as i64,
            IntervalValue::Text(s) => s.trim().parse::<f64>().map(|n| n as i64).unwrap_or(0),
        }
    }
}

/// Service intervals arrive either as a single value or as a list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ServiceIntervals {
    Many(Vec<IntervalValue>),
    One(IntervalValue),
}

impl Default for ServiceIntervals {
    fn default() -> Self {
        ServiceIntervals::Many(Vec::new())
    }
}

impl ServiceIntervals {
    pub fn to_vec(&self) -> Vec<i64> {
        match self {
            ServiceIntervals::Many(values) => values.iter().map(IntervalValue::as_miles).collect(),
            ServiceIntervals::One(value) => vec![value.as_miles()],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NewVehicle {
    pub brand: String,
    pub year: i64,
    pub model: String,
    pub engine: String,
    pub color: String,
    pub plate_last3: String,
    pub vin: String,
    pub vin_image_url: String,
    pub vehicle_image_url: String,
    pub service_intervals: ServiceIntervals,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub account_type: String,
    pub full_name: String,
    pub address: String,
    pub phone: String,
    pub office_phone: String,
    pub email: String,
    pub password: String,
    pub profile_picture_url: String,
    pub vehicles: Vec<NewVehicle>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    #[serde(flatten)]
    pub customer: CustomerRecord,
    pub vehicles: Vec<VehicleRecord>,
    pub cancellations: Vec<CancellationRecord>,
}

#[derive(Clone)]
pub struct AccountService {
    database: Arc<Database>,
    notifier: ChatNotifier,
    password_cost: u32,
}

fn vehicle_record(customer_id: &str, vehicle: &NewVehicle) -> VehicleRecord {
    let intervals = vehicle.service_intervals.to_vec();
    let first = intervals.first().copied().unwrap_or(0);
    VehicleRecord {
        id: Uuid::new_v4().to_string(),
        customer_id: customer_id.to_string(),
        brand: vehicle.brand.clone(),
        year: vehicle.year,
        model: vehicle.model.clone(),
        engine: vehicle.engine.clone(),
        color: vehicle.color.clone(),
        plate_last3: vehicle.plate_last3.clone(),
        vin: vehicle.vin.clone(),
        vin_image_url: vehicle.vin_image_url.clone(),
        vehicle_image_url: vehicle.vehicle_image_url.clone(),
        service_intervals: intervals,
        interval: first,
        base_interval: first,
        milage: 0,
    }
}

impl AccountService {
    pub fn new(database: Arc<Database>, notifier: ChatNotifier, password_cost: u32) -> Self {
        Self {
            database,
            notifier,
            password_cost,
        }
    }

    async fn hash_password(&self, password: String) -> Result<String, LuberError> {
        let cost = self.password_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| LuberError::Other(format!("Password hashing task failed: {}", e)))?
            .map_err(|e| LuberError::Other(format!("Password hashing failed: {}", e)))
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, LuberError> {
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| LuberError::Other(format!("Password check task failed: {}", e)))?;
        // A malformed stored hash is treated like a wrong password
        Ok(verified.unwrap_or(false))
    }

    /// Creates the customer with its vehicles and an empty conversation
    pub async fn register(&self, request: RegisterRequest) -> Result<CustomerRecord, LuberError> {
        let email = request.email.trim().to_string();
        if email.is_empty() {
            return Err(LuberError::validation("email", "is required"));
        }
        if request.password.is_empty() {
            return Err(LuberError::validation("password", "is required"));
        }
        if self.database.email_exists(&email).await? {
            return Err(AccountError::EmailTaken { email }.into());
        }

        let customer = CustomerRecord {
            id: Uuid::new_v4().to_string(),
            account_type: AccountType::parse(&request.account_type),
            full_name: request.full_name.trim().to_string(),
            address: request.address,
            phone: request.phone,
            office_phone: request.office_phone,
            email,
            password_hash: self.hash_password(request.password).await?,
            profile_picture_url: request.profile_picture_url,
            created_at: Utc::now(),
        };

        if let Err(e) = self.database.insert_customer(&customer).await {
            // Lost a race against a concurrent registration with the same email
            if self.database.email_exists(&customer.email).await? {
                return Err(AccountError::EmailTaken {
                    email: customer.email,
                }
                .into());
            }
            return Err(e.into());
        }

        for vehicle in &request.vehicles {
            self.database
                .insert_vehicle(&vehicle_record(&customer.id, vehicle))
                .await?;
        }
        self.database.ensure_conversation(&customer.id).await?;

        info!(
            "Registered {} account {} with {} vehicle(s)",
            customer.account_type.as_str(),
            customer.id,
            request.vehicles.len()
        );
        Ok(customer)
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        ip: &str,
    ) -> Result<CustomerRecord, LuberError> {
        let Some(customer) = self.database.get_customer_by_email(email.trim()).await? else {
            return Err(AccountError::InvalidCredentials.into());
        };

        if !self
            .verify_password(password.to_string(), customer.password_hash.clone())
            .await?
        {
            return Err(AccountError::InvalidCredentials.into());
        }

        let entry = LoginLogRecord {
            customer_id: customer.id.clone(),
            full_name: customer.full_name.clone(),
            email: customer.email.clone(),
            account_type: customer.account_type,
            ip: ip.to_string(),
            at: Utc::now(),
        };
        if let Err(e) = self.database.insert_login_log(&entry).await {
            warn!("Could not write login log for {}: {}", customer.id, e);
        }

        info!("Customer {} logged in from {}", customer.id, ip);
        Ok(customer)
    }

    pub async fn customer(&self, customer_id: &str) -> Result<CustomerRecord, LuberError> {
        self.database
            .get_customer_by_id(customer_id)
            .await?
            .ok_or_else(|| {
                AccountError::CustomerNotFound {
                    customer_id: customer_id.to_string(),
                }
                .into()
            })
    }

    pub async fn profile(&self, customer_id: &str) -> Result<CustomerProfile, LuberError> {
        let customer = self.customer(customer_id).await?;
        Ok(CustomerProfile {
            vehicles: self.database.list_vehicles(customer_id).await?,
            cancellations: self.database.list_cancellations(customer_id).await?,
            customer,
        })
    }

    pub async fn vehicles(&self, customer_id: &str) -> Result<Vec<VehicleRecord>, LuberError> {
        Ok(self.database.list_vehicles(customer_id).await?)
    }

    pub async fn add_vehicle(
        &self,
        customer_id: &str,
        vehicle: NewVehicle,
    ) -> Result<VehicleRecord, LuberError> {
        self.customer(customer_id).await?;

        let record = vehicle_record(customer_id, &vehicle);
        self.database.insert_vehicle(&record).await?;

        let text = messages::vehicle_added(&record.brand, &record.model, &record.plate_last3);
        if let Err(e) = self.notifier.post_office_message(customer_id, &text).await {
            warn!("Could not post vehicle notice for {}: {}", customer_id, e);
        }

        info!("Vehicle {} added for customer {}", record.id, customer_id);
        Ok(record)
    }

    pub async fn update_milage(
        &self,
        customer_id: &str,
        vehicle_id: &str,
        milage: Option<f64>,
    ) -> Result<i64, LuberError> {
        let milage = match milage {
            Some(m) if m.is_finite() && m >= 0.0 => m as i64,
            _ => {
                return Err(LuberError::validation(
                    "milage",
                    "must be a non-negative number",
                ))
            }
        };

        if !self
            .database
            .update_vehicle_milage(customer_id, vehicle_id, milage)
            .await?
        {
            return Err(AccountError::VehicleNotFound {
                vehicle_id: vehicle_id.to_string(),
            }
            .into());
        }
        Ok(milage)
    }

    /// Flips the archived flag of the cancellation recorded at `date`
    pub async fn toggle_cancellation_archive(
        &self,
        customer_id: &str,
        date: Option<&str>,
    ) -> Result<bool, LuberError> {
        let raw = date
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| LuberError::validation("date", "is required"))?;
        let date: DateTime<Utc> = DateTime::parse_from_rfc3339(raw)
            .map_err(|_| LuberError::validation("date", "must be an RFC 3339 timestamp"))?
            .with_timezone(&Utc);

        self.database
            .toggle_cancellation_archive(customer_id, date)
            .await?
            .ok_or_else(|| {
                AccountError::CancellationNotFound {
                    date: raw.to_string(),
                }
                .into()
            })
    }
}
