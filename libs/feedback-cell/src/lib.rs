// =====================================================================================
// FEEDBACK CELL
// =====================================================================================
//
// Public feedback submission with full validation, admin moderation,
// statistics and CSV export. Low ratings notify the admins through the
// monitoring notification channels.
//
// =====================================================================================

pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod validation;

pub use error::FeedbackError;
pub use models::*;
pub use router::{feedback_routes, FeedbackState};
pub use services::FeedbackService;
