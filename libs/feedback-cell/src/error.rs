use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum FeedbackError {
    #[error("Feedback not found")]
    NotFound,

    #[error("{0}")]
    InvalidFilter(String),

    #[error("{0}")]
    InvalidStatus(String),

    #[error("Comment must not exceed 1000 characters")]
    CommentTooLong,

    #[error("Invalid date range")]
    InvalidDateRange(Vec<String>),
}

impl From<FeedbackError> for AppError {
    fn from(err: FeedbackError) -> Self {
        let message = err.to_string();
        match err {
            FeedbackError::NotFound => AppError::NotFound(message),
            FeedbackError::InvalidDateRange(errors) => AppError::ValidationFailed(errors),
            FeedbackError::InvalidFilter(_)
            | FeedbackError::InvalidStatus(_)
            | FeedbackError::CommentTooLong => AppError::BadRequest(message),
        }
    }
}
