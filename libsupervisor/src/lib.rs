pub mod error;
mod handler;
pub mod launcher;
mod lifecycle;
pub mod manager;
pub mod monitor;
mod registry;
mod shutdown;
pub mod status;

pub use error::{LaunchError, SubmitError};
pub use handler::Completion;
pub use manager::ProcessManager;
pub use monitor::{Monitor, MonitorSnapshot, SystemMonitor};
pub use status::ServiceStatus;
