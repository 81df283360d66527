//! Luber background workers: archive completed appointments, send lifecycle
//! notices, drop unpaid bookings, record oil changes and send welcome emails.
//! Runs as its own process next to the API server and shares its database.

pub mod context;
pub mod history;
pub mod jobs;
pub mod registry;
pub mod scheduler;
pub mod status;

pub use context::WorkerContext;
pub use jobs::WorkerKind;
pub use registry::JobRegistry;
pub use scheduler::{run_pass, WorkerScheduler};
pub use status::{create_status_router, start_status_server, StatusState};
