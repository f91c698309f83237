pub mod alerts;
pub mod collector;
pub mod health;
pub mod monitor;
pub mod notify;

pub use alerts::AlertManagerService;
pub use collector::{MetricsCollectorService, RequestTracker};
pub use health::ServiceHealthChecker;
pub use monitor::MonitoringService;
