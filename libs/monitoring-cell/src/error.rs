use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum MonitoringError {
    #[error("Failed to read monitoring config {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid monitoring config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Alert not found: {0}")]
    AlertNotFound(String),

    #[error("Alert {0} is already resolved")]
    AlertResolved(String),

    #[error("Invalid frontend metric: {0}")]
    InvalidMetric(String),

    #[error("Retention of {0} days is out of range")]
    RetentionOutOfRange(i64),
}

impl From<MonitoringError> for AppError {
    fn from(err: MonitoringError) -> Self {
        let message = err.to_string();
        match err {
            MonitoringError::AlertNotFound(_) => AppError::NotFound(message),
            MonitoringError::AlertResolved(_)
            | MonitoringError::InvalidMetric(_)
            | MonitoringError::RetentionOutOfRange(_) => {
                AppError::BadRequest(message)
            }
            MonitoringError::ConfigRead { .. } | MonitoringError::ConfigParse(_) => {
                AppError::Internal(message)
            }
        }
    }
}

/// Delivery failure on a single notification channel.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Channel is not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build email: {0}")]
    EmailBuild(String),

    #[error("SMTP transport error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Webhook delivery failed: {0}")]
    Webhook(String),
}
