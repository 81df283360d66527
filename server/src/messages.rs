//! Chat and email texts sent to customers along the appointment lifecycle.

use crate::constants::{booking, chat, paypal};
use crate::database::ScheduleRecord;

pub const WELCOME_SUBJECT: &str = "Thanks for joining Luber!";

#[derive(Debug, Clone, PartialEq)]
pub struct EmailContent {
    pub subject: String,
    pub html: String,
}

/// A chat message and the email that accompanies it
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub chat: String,
    pub email: EmailContent,
}

pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// Escapes text placed into an email body
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Renders chat text for an email body
pub fn chat_to_html(text: &str) -> String {
    format!(
        "<div style=\"font-family:sans-serif;padding:20px;\"><h2>{}</h2></div>",
        escape_html(text).replace('\n', "<br>")
    )
}

pub fn invoice_link(invoice_id: &str) -> String {
    format!("{}{}", paypal::INVOICE_LINK_BASE, invoice_id)
}

fn service_description(schedule: &ScheduleRecord) -> String {
    schedule
        .vehicles
        .first()
        .map(|v| v.oil_type.as_str().to_string())
        .unwrap_or_else(|| "vehicle without details".to_string())
}

fn service_address(schedule: &ScheduleRecord) -> String {
    let line_address = schedule
        .vehicles
        .first()
        .map(|v| v.service_address.trim())
        .filter(|a| !a.is_empty());

    match line_address {
        Some(address) => address.to_string(),
        None if !schedule.client_address.trim().is_empty() => schedule.client_address.clone(),
        None => "Address not specified".to_string(),
    }
}

fn vehicle_list(schedule: &ScheduleRecord) -> String {
    schedule
        .vehicles
        .iter()
        .map(|v| {
            let info = &v.vehicle_info;
            let brand = if info.brand.is_empty() { "Brand" } else { &info.brand };
            let plate = if info.plate_last3.is_empty() {
                "---"
            } else {
                &info.plate_last3
            };
            let year = if info.year > 0 {
                info.year.to_string()
            } else {
                String::new()
            };
            format!(
                "• {} {} {} - {} (Plate *{}*)",
                brand,
                info.model,
                year,
                v.oil_type.as_str(),
                plate
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn fleet_pending(schedule: &ScheduleRecord) -> Notice {
    let service = service_description(schedule);
    let address = service_address(schedule);
    let total = format_amount(schedule.total);

    let chat = format!(
        "📋 Hi {}, we received your appointment for {} at {}.\n\
         🛠 Service: {}\n\
         📍 Address: {}\n\
         💰 Estimated total: ${}\n\n\
         🔄 Your request is *pending approval*. We will notify you shortly.",
        schedule.customer_name, schedule.date, schedule.time, service, address, total
    );

    let html = format!(
        "<h2>Hi {},</h2>\
         <p>We received your appointment:</p>\
         <ul>\
         <li><strong>Date:</strong> {}</li>\
         <li><strong>Time:</strong> {}</li>\
         <li><strong>Service:</strong> {}</li>\
         <li><strong>Address:</strong> {}</li>\
         <li><strong>Estimated total:</strong> ${}</li>\
         </ul>\
         <p>Your request is <strong>pending approval</strong>. We will notify you soon.</p>",
        escape_html(&schedule.customer_name),
        escape_html(&schedule.date),
        escape_html(&schedule.time),
        escape_html(&service),
        escape_html(&address),
        total
    );

    Notice {
        chat,
        email: EmailContent {
            subject: "📋 Your appointment is pending approval".to_string(),
            html,
        },
    }
}

pub fn fleet_processed(schedule: &ScheduleRecord) -> Notice {
    let chat = format!(
        "✅ Your appointment has been processed. You will receive a PayPal invoice shortly. \
         You have {} days to pay.",
        booking::INVOICE_PAYMENT_DAYS
    );

    let html = format!(
        "<h2>Hi {},</h2>\
         <p>Your appointment has been <strong>processed successfully</strong>.</p>\
         <p>You will receive a PayPal invoice shortly and will have {} days to pay it.</p>\
         <br><p>Thanks for using Luber Fleet.</p>",
        escape_html(&schedule.customer_name),
        booking::INVOICE_PAYMENT_DAYS
    );

    Notice {
        chat,
        email: EmailContent {
            subject: "✅ Your appointment has been processed".to_string(),
            html,
        },
    }
}

pub fn fleet_invoice(schedule: &ScheduleRecord) -> Notice {
    let invoice_id = schedule.invoice_id.as_deref().unwrap_or_default();
    let link = invoice_link(invoice_id);

    let chat = format!(
        "💳 Your PayPal invoice is ready.\n\n\
         🔗 Invoice: *{}*\n\
         📎 You can pay it directly here:\n{}\n\n\
         You have {} days to complete the payment.",
        invoice_id,
        link,
        booking::INVOICE_PAYMENT_DAYS
    );

    let html = format!(
        "<h2>Hi {},</h2>\
         <p>Your appointment was processed and your invoice is available.</p>\
         <p><strong>Invoice:</strong> {}</p>\
         <p><a href=\"{}\">Click here to pay now</a></p>\
         <p>Remember you have {} days to complete the payment.</p>\
         <br><p>Thanks for using Luber Fleet.</p>",
        escape_html(&schedule.customer_name),
        escape_html(invoice_id),
        escape_html(&link),
        booking::INVOICE_PAYMENT_DAYS
    );

    Notice {
        chat,
        email: EmailContent {
            subject: "💳 Your PayPal invoice is ready".to_string(),
            html,
        },
    }
}

pub fn unpaid_cancellation(schedule: &ScheduleRecord) -> Notice {
    let chat = format!(
        "❌ Your appointment on {} at {} was cancelled because it was not paid.",
        schedule.date, schedule.time
    );

    let html = format!(
        "<p>Your appointment scheduled for {} at {} has been cancelled automatically \
         because payment was not received.</p>",
        escape_html(&schedule.date),
        escape_html(&schedule.time)
    );

    Notice {
        chat,
        email: EmailContent {
            subject: "Appointment cancelled for non-payment".to_string(),
            html,
        },
    }
}

pub fn office_confirmation(schedule: &ScheduleRecord) -> String {
    format!(
        "✅ Your appointment with {} vehicle(s) on {} at {} has been confirmed.",
        schedule.vehicles.len(),
        schedule.date,
        schedule.time
    )
}

pub fn payment_confirmation(schedule: &ScheduleRecord) -> Notice {
    let chat = format!(
        "✅ Hi {}, your appointment for {} at {} has been confirmed.\n\n\
         🚗 Vehicles:\n{}\n\n\
         💰 Total: ${}\n\n\
         Thanks for booking with Luber.",
        schedule.customer_name,
        schedule.date,
        schedule.time,
        vehicle_list(schedule),
        format_amount(schedule.total)
    );
    let html = chat_to_html(&chat);

    Notice {
        chat,
        email: EmailContent {
            subject: "✅ Your Luber appointment is confirmed".to_string(),
            html,
        },
    }
}

pub fn vehicle_added(brand: &str, model: &str, plate_last3: &str) -> String {
    format!(
        "🚗 New vehicle added: {} {} (Plate *{}*)",
        brand, model, plate_last3
    )
}

pub fn bot_reply(answer: &str) -> String {
    format!("{}{}", chat::BOT_PREFIX, answer)
}

pub fn welcome(full_name: &str) -> EmailContent {
    EmailContent {
        subject: WELCOME_SUBJECT.to_string(),
        html: format!(
            "<p>Hi <strong>{}</strong>!</p>\
             <p>Thanks for creating your <strong>Luber</strong> account. You can now manage \
             your vehicles and schedule oil services from our platform.</p>\
             <p>Welcome to the family!</p>\
             <br>\
             <p>Regards,<br>The Luber team</p>",
            escape_html(full_name)
        ),
    }
}
