pub mod auth;
pub mod chat;
pub mod common;
pub mod office;
pub mod payments;
pub mod realtime;
pub mod schedules;

pub use auth::*;
pub use chat::*;
pub use office::*;
pub use payments::*;
pub use realtime::*;
pub use schedules::*;
