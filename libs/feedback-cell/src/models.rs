use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

// ==============================================================================
// ENUMS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    Bug,
    Suggestion,
    Performance,
    Ui,
    Content,
    Other,
}

impl FeedbackType {
    pub const ALL: [FeedbackType; 6] = [
        FeedbackType::Bug,
        FeedbackType::Suggestion,
        FeedbackType::Performance,
        FeedbackType::Ui,
        FeedbackType::Content,
        FeedbackType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackType::Bug => "bug",
            FeedbackType::Suggestion => "suggestion",
            FeedbackType::Performance => "performance",
            FeedbackType::Ui => "ui",
            FeedbackType::Content => "content",
            FeedbackType::Other => "other",
        }
    }

    /// Human readable name used in notifications and exports.
    pub fn label(&self) -> &'static str {
        match self {
            FeedbackType::Bug => "Bug report",
            FeedbackType::Suggestion => "Feature suggestion",
            FeedbackType::Performance => "Performance issue",
            FeedbackType::Ui => "UI/UX",
            FeedbackType::Content => "Content error",
            FeedbackType::Other => "Other",
        }
    }
}

impl fmt::Display for FeedbackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeedbackType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Invalid feedback type: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    Pending,
    Processing,
    Resolved,
    Closed,
}

impl FeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackStatus::Pending => "pending",
            FeedbackStatus::Processing => "processing",
            FeedbackStatus::Resolved => "resolved",
            FeedbackStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for FeedbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FeedbackStatus::Pending),
            "processing" => Ok(FeedbackStatus::Processing),
            "resolved" => Ok(FeedbackStatus::Resolved),
            "closed" => Ok(FeedbackStatus::Closed),
            other => Err(format!("Invalid feedback status: {}", other)),
        }
    }
}

// ==============================================================================
// STORED DOCUMENTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackComment {
    pub status: FeedbackStatus,
    #[serde(default)]
    pub comment: String,
    pub timestamp: DateTime<Utc>,
}

/// A feedback record as read back from the store. The submitter's IP is
/// kept for abuse analysis and never serialized into responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: String,
    pub feedback_type: FeedbackType,
    #[serde(default)]
    pub selected_issues: Vec<String>,
    pub rating: i64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_info: Option<Value>,
    #[serde(default)]
    pub receive_reply: bool,
    #[serde(default, skip_serializing)]
    pub ip_address: Option<String>,
    pub status: FeedbackStatus,
    #[serde(default)]
    pub comments: Vec<FeedbackComment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Feedback {
    /// Priority of the admin notification for low ratings.
    pub fn priority(&self) -> &'static str {
        if self.rating <= 2 {
            "high"
        } else {
            "medium"
        }
    }
}

/// Insert body. Unlike [`Feedback`] this carries the IP address.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    pub id: String,
    pub feedback_type: FeedbackType,
    pub selected_issues: Vec<String>,
    pub rating: i64,
    pub description: String,
    pub contact_method: Option<String>,
    pub browser_info: Option<Value>,
    pub receive_reply: bool,
    pub ip_address: Option<String>,
    pub status: FeedbackStatus,
    pub comments: Vec<FeedbackComment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Narrow projection used for statistics.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackStatRow {
    pub feedback_type: FeedbackType,
    pub rating: i64,
    pub status: FeedbackStatus,
    pub created_at: DateTime<Utc>,
}

// ==============================================================================
// REQUESTS
// ==============================================================================

/// Submission body. Fields are loose so every problem can be reported at
/// once instead of failing on the first type mismatch.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFeedbackRequest {
    pub feedback_type: Option<String>,
    pub selected_issues: Option<Vec<String>>,
    pub rating: Option<Value>,
    pub description: Option<String>,
    pub contact_method: Option<String>,
    pub browser_info: Option<Value>,
    pub receive_reply: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFeedbackStatusRequest {
    pub status: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(rename = "type")]
    pub feedback_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub feedback_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeedbackSortField {
    #[default]
    CreatedAt,
    Rating,
    Status,
    FeedbackType,
}

impl FeedbackSortField {
    pub fn column(&self) -> &'static str {
        match self {
            FeedbackSortField::CreatedAt => "createdAt",
            FeedbackSortField::Rating => "rating",
            FeedbackSortField::Status => "status",
            FeedbackSortField::FeedbackType => "feedbackType",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub feedback_type: Option<String>,
    pub rating: Option<i64>,
    pub status: Option<String>,
    #[serde(default)]
    pub sort_by: FeedbackSortField,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl FeedbackListQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> i64 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> Option<u64> {
        (self.page() - 1)
            .checked_mul(self.page_size())
            .and_then(|offset| u64::try_from(offset).ok())
    }
}

// ==============================================================================
// RESPONSES
// ==============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub page_size: i64,
    pub total_items: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct FeedbackPage {
    pub feedbacks: Vec<Feedback>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub feedback_type: FeedbackType,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Serialize)]
pub struct RatingCount {
    pub rating: i64,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct StatusCount {
    pub status: FeedbackStatus,
    pub count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTrend {
    pub date: String,
    pub count: u64,
    pub average_rating: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackStats {
    pub total_feedbacks: u64,
    pub average_rating: f64,
    pub type_distribution: Vec<TypeCount>,
    pub rating_distribution: Vec<RatingCount>,
    pub status_distribution: Vec<StatusCount>,
    pub weekly_trend: Vec<DailyTrend>,
}
