use anyhow::Result;
use chrono::Utc;
use server::database::WelcomeNotificationRecord;
use server::messages;
use server::services::deliver_email;
use tracing::{debug, error, info};

use crate::context::WorkerContext;

/// Sends the welcome email to customers that have not received it. A failed
/// send leaves no log entry, so the customer is retried on the next pass.
pub async fn run_once(context: &WorkerContext) -> Result<usize> {
    // Logged-only mail would mark customers welcomed without reaching them
    if !context.mailer.delivers() {
        debug!("SMTP disabled, welcome emails wait for a mail server");
        return Ok(0);
    }

    let customers = context.database.customers_without_welcome().await?;
    if customers.is_empty() {
        debug!("No pending welcome emails");
        return Ok(0);
    }

    let mut sent = 0;
    for customer in &customers {
        let email = messages::welcome(&customer.full_name);
        let Some(delivered) =
            deliver_email(context.mailer.as_ref(), Some(customer.email.as_str()), &email).await
        else {
            continue;
        };

        let entry = WelcomeNotificationRecord {
            customer_id: customer.id.clone(),
            email: customer.email.clone(),
            full_name: customer.full_name.clone(),
            subject: email.subject.clone(),
            sent_at: Utc::now(),
            message_id: delivered.message_id,
        };
        match context.database.insert_welcome_notification(&entry).await {
            Ok(()) => {
                sent += 1;
                info!("Welcome email sent to {}", customer.email);
            }
            Err(e) => error!(
                "Welcome email sent to {} but logging failed: {}",
                customer.email, e
            ),
        }
    }

    Ok(sent)
}
