pub mod account_service;
pub mod bot;
pub mod chat_service;
pub mod mailer;
pub mod notifier;
pub mod paypal;
pub mod realtime;
pub mod schedule_service;

pub use account_service::AccountService;
pub use chat_service::ChatService;
pub use mailer::{build_mailer, LogMailer, Mailer, SentEmail, SmtpMailer};
pub use notifier::{deliver_email, ChatNotifier};
pub use paypal::PayPalClient;
pub use realtime::{ConversationHub, ConversationPublisher, HubEvent, HubPublisher, RelayPublisher};
pub use schedule_service::ScheduleService;
