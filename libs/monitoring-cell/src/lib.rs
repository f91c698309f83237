// =====================================================================================
// MONITORING CELL
// =====================================================================================
//
// Periodic metric collection (host, API traffic, document store, frontend
// reports), threshold alert rules with deduplication and recovery, service
// health probing and multi-channel notification dispatch.
//
// =====================================================================================

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod router;
pub mod services;

pub use config::MonitoringConfig;
pub use error::{MonitoringError, NotifyError};
pub use middleware::track_requests;
pub use router::monitoring_routes;
pub use services::notify::{Notification, NotificationDispatcher};
pub use services::{MonitoringService, RequestTracker};
