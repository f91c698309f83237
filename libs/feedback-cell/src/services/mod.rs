pub mod export;
pub mod feedback;
pub mod stats;

pub use feedback::FeedbackService;
