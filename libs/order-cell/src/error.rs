use thiserror::Error;

use shared_models::error::AppError;

use crate::models::OrderStatus;

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Order not found")]
    NotFound,

    #[error("You do not have access to this order")]
    AccessDenied,

    #[error("Cart is empty, cannot place an order")]
    EmptyCart,

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Insufficient stock for {0}")]
    InsufficientStock(String),

    #[error("Invalid order status: {0}")]
    InvalidStatus(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order can no longer be cancelled")]
    NotCancellable,

    #[error("Cancelled orders cannot be paid")]
    PaymentOnCancelled,

    #[error("Order is already paid")]
    AlreadyPaid,

    #[error("Order changed while it was being updated, try again")]
    ConcurrentUpdate,
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err {
            OrderError::NotFound | OrderError::ProductNotFound(_) => AppError::NotFound(message),
            OrderError::AccessDenied => AppError::Forbidden(message),
            OrderError::ConcurrentUpdate => AppError::Conflict(message),
            OrderError::EmptyCart
            | OrderError::InsufficientStock(_)
            | OrderError::InvalidStatus(_)
            | OrderError::InvalidStatusTransition { .. }
            | OrderError::NotCancellable
            | OrderError::PaymentOnCancelled
            | OrderError::AlreadyPaid => AppError::BadRequest(message),
        }
    }
}
