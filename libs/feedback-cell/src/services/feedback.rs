use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use monitoring_cell::config::{Channel, Severity};
use monitoring_cell::{Notification, NotificationDispatcher};
use shared_config::AppConfig;
use shared_database::{QueryBuilder, SupabaseClient};
use shared_models::error::AppError;
use shared_utils::validation::is_valid_email;

use crate::error::FeedbackError;
use crate::models::{
    ExportQuery, Feedback, FeedbackComment, FeedbackListQuery, FeedbackPage, FeedbackStatRow,
    FeedbackStats, FeedbackStatus, FeedbackType, NewFeedback, Pagination, SortOrder, StatsQuery,
    SubmitFeedbackRequest, UpdateFeedbackStatusRequest,
};
use crate::services::{export, stats};
use crate::validation::{parse_date_range, validate_submission, DateRange};

const FEEDBACKS: &str = "feedbacks";
const STAT_COLUMNS: &str = "feedbackType,rating,status,createdAt";
const COMMENT_MAX: usize = 1000;
const LOW_RATING: i64 = 3;

pub struct FeedbackService {
    supabase: SupabaseClient,
    dispatcher: Arc<NotificationDispatcher>,
    admin_emails: Vec<String>,
}

impl FeedbackService {
    pub fn new(config: &AppConfig, dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            dispatcher,
            admin_emails: config.admin_emails.clone(),
        }
    }

    // ==============================================================================
    // SUBMISSION
    // ==============================================================================

    /// Validates and stores a submission. Ratings of 3 or lower notify the
    /// admins in the background.
    #[instrument(skip(self, request, ip_address))]
    pub async fn submit(
        &self,
        request: SubmitFeedbackRequest,
        ip_address: Option<String>,
    ) -> Result<Feedback, AppError> {
        let valid = validate_submission(request).map_err(AppError::ValidationFailed)?;
        let now = Utc::now();

        let record = NewFeedback {
            id: Uuid::new_v4().to_string(),
            feedback_type: valid.feedback_type,
            selected_issues: valid.selected_issues,
            rating: valid.rating,
            description: valid.description,
            contact_method: valid.contact_method,
            browser_info: valid.browser_info,
            receive_reply: valid.receive_reply,
            ip_address,
            status: FeedbackStatus::Pending,
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let created: Feedback = self.supabase.insert(FEEDBACKS, &record).await?;
        info!(
            feedback_id = %created.id,
            feedback_type = %created.feedback_type,
            rating = created.rating,
            "Feedback submitted"
        );

        if created.rating <= LOW_RATING {
            let dispatcher = self.dispatcher.clone();
            let admin_emails = self.admin_emails.clone();
            let feedback = created.clone();
            tokio::spawn(async move {
                notify_high_priority(&dispatcher, &admin_emails, &feedback).await;
            });
        }

        Ok(created)
    }

    // ==============================================================================
    // ADMIN QUERIES
    // ==============================================================================

    #[instrument(skip(self))]
    pub async fn stats(&self, query: &StatsQuery) -> Result<FeedbackStats, AppError> {
        let range = parse_date_range(query.start_date.as_deref(), query.end_date.as_deref())?;
        let feedback_type = parse_type(query.feedback_type.as_deref())?;

        let filtered = filter(QueryBuilder::new().select(STAT_COLUMNS), &range, feedback_type);
        let rows: Vec<FeedbackStatRow> = self.supabase.select(FEEDBACKS, &filtered.build()).await?;

        let trend_end = range.end.unwrap_or_else(Utc::now);
        let trend_range = DateRange {
            start: Some(stats::trend_start(trend_end)),
            end: Some(trend_end),
        };
        let trend_query = filter(QueryBuilder::new().select(STAT_COLUMNS), &trend_range, feedback_type);
        let trend_rows: Vec<FeedbackStatRow> =
            self.supabase.select(FEEDBACKS, &trend_query.build()).await?;

        Ok(stats::summarize(&rows, &trend_rows, trend_end))
    }

    #[instrument(skip(self))]
    pub async fn list(&self, query: &FeedbackListQuery) -> Result<FeedbackPage, AppError> {
        let page = query.page();
        let page_size = query.page_size();
        let offset = query
            .offset()
            .ok_or_else(|| FeedbackError::InvalidFilter("page is out of range".to_string()))?;

        let mut builder = QueryBuilder::new().select("*");
        if let Some(feedback_type) = parse_type(query.feedback_type.as_deref())? {
            builder = builder.eq("feedbackType", feedback_type);
        }
        if let Some(rating) = query.rating {
            builder = builder.eq("rating", rating);
        }
        if let Some(status) = query.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let status: FeedbackStatus = status.parse().map_err(FeedbackError::InvalidFilter)?;
            builder = builder.eq("status", status);
        }
        let builder = builder
            .order(query.sort_by.column(), query.sort_order == SortOrder::Asc)
            .offset(offset)
            .limit(page_size as u64);

        let (feedbacks, total) = self
            .supabase
            .select_with_count::<Feedback>(FEEDBACKS, &builder.build())
            .await?;

        Ok(FeedbackPage {
            feedbacks,
            pagination: Pagination {
                current_page: page,
                page_size,
                total_items: total,
                total_pages: total.div_ceil(page_size as u64),
            },
        })
    }

    pub async fn get(&self, feedback_id: &str) -> Result<Feedback, AppError> {
        let query = QueryBuilder::new().eq("id", feedback_id).build();
        self.supabase
            .select_one::<Feedback>(FEEDBACKS, &query)
            .await?
            .ok_or_else(|| FeedbackError::NotFound.into())
    }

    /// Sets the moderation status and appends an entry to the comment log.
    /// Moving into `resolved` emails the submitter when they asked for a
    /// reply and left an email address.
    #[instrument(skip(self, request))]
    pub async fn update_status(
        &self,
        feedback_id: &str,
        request: UpdateFeedbackStatusRequest,
    ) -> Result<Feedback, AppError> {
        let status: FeedbackStatus = match request.status.as_deref().map(str::trim) {
            None | Some("") => {
                return Err(FeedbackError::InvalidStatus("status is required".to_string()).into())
            }
            Some(raw) => raw.parse().map_err(FeedbackError::InvalidStatus)?,
        };
        let comment = request.comment.unwrap_or_default().trim().to_string();
        if comment.chars().count() > COMMENT_MAX {
            return Err(FeedbackError::CommentTooLong.into());
        }

        let existing = self.get(feedback_id).await?;
        let previous = existing.status;
        let now = Utc::now();

        let mut comments = existing.comments;
        comments.push(FeedbackComment {
            status,
            comment: comment.clone(),
            timestamp: now,
        });

        let query = QueryBuilder::new().eq("id", feedback_id).build();
        let body = json!({
            "status": status,
            "comments": comments,
            "updatedAt": now,
        });
        let updated: Feedback = self
            .supabase
            .update::<Feedback, _>(FEEDBACKS, &query, &body)
            .await?
            .into_iter()
            .next()
            .ok_or(FeedbackError::NotFound)?;

        info!(feedback_id, from = %previous, to = %status, "Feedback status updated");

        if status == FeedbackStatus::Resolved && previous != FeedbackStatus::Resolved {
            self.spawn_resolution_email(&updated, comment);
        }

        Ok(updated)
    }

    /// CSV of every matching record, newest first.
    #[instrument(skip(self))]
    pub async fn export(&self, query: &ExportQuery) -> Result<String, AppError> {
        let range = parse_date_range(query.start_date.as_deref(), query.end_date.as_deref())?;
        let feedback_type = parse_type(query.feedback_type.as_deref())?;

        let builder = filter(QueryBuilder::new().select("*"), &range, feedback_type).order("createdAt", false);
        let feedbacks: Vec<Feedback> = self.supabase.select(FEEDBACKS, &builder.build()).await?;

        info!(rows = feedbacks.len(), "Exporting feedback");
        Ok(export::to_csv(&feedbacks))
    }

    fn spawn_resolution_email(&self, feedback: &Feedback, comment: String) {
        if !feedback.receive_reply {
            return;
        }
        let Some(contact) = feedback.contact_method.clone().filter(|c| is_valid_email(c)) else {
            debug!(feedback_id = %feedback.id, "No email contact, skipping resolution notice");
            return;
        };

        let dispatcher = self.dispatcher.clone();
        let feedback = feedback.clone();
        tokio::spawn(async move {
            let Some(mailer) = dispatcher.mailer() else {
                warn!(feedback_id = %feedback.id, "SMTP not configured, resolution email not sent");
                return;
            };
            let (subject, body) = resolution_email(&feedback, &comment);
            if let Err(e) = mailer.send(&[contact], &subject, &body).await {
                warn!(feedback_id = %feedback.id, "Resolution email failed: {}", e);
            }
        });
    }
}

// ==============================================================================
// NOTIFICATIONS
// ==============================================================================

/// Alerts admins about a low rating over email and webhooks. Email is used
/// only when admin addresses are configured. Returns the number of
/// successful deliveries.
pub async fn notify_high_priority(
    dispatcher: &NotificationDispatcher,
    admin_emails: &[String],
    feedback: &Feedback,
) -> usize {
    let channels: &[Channel] = if admin_emails.is_empty() {
        &[Channel::Webhook]
    } else {
        &[Channel::Email, Channel::Webhook]
    };

    let delivered = dispatcher
        .dispatch(&high_priority_notification(feedback, admin_emails), channels)
        .await;
    info!(feedback_id = %feedback.id, delivered, "High priority feedback notification sent");
    delivered
}

pub fn high_priority_notification(feedback: &Feedback, admin_emails: &[String]) -> Notification {
    let priority = feedback.priority();
    let severity = if priority == "high" {
        Severity::Error
    } else {
        Severity::Warning
    };
    let issues = if feedback.selected_issues.is_empty() {
        "none".to_string()
    } else {
        feedback.selected_issues.join(", ")
    };

    Notification::new(
        format!("[High priority feedback] New {}", feedback.feedback_type.label()),
        format!(
            "Rating: {}\nIssues: {}\n\n{}",
            feedback.rating, issues, feedback.description
        ),
        severity,
    )
    .with_payload(json!({
        "type": "feedback-high-priority",
        "feedbackId": feedback.id,
        "feedbackType": feedback.feedback_type,
        "rating": feedback.rating,
        "priority": priority,
        "selectedIssues": feedback.selected_issues,
        "description": feedback.description,
        "contact": feedback.contact_method,
    }))
    .with_recipients(admin_emails.to_vec())
}

fn resolution_email(feedback: &Feedback, comment: &str) -> (String, String) {
    let subject = "Your feedback has been resolved".to_string();
    let mut body = format!(
        "Thank you for your {} feedback (reference {}).\n\nYou wrote:\n{}\n",
        feedback.feedback_type.label().to_lowercase(),
        feedback.id,
        feedback.description
    );
    if !comment.is_empty() {
        body.push_str(&format!("\nOur response:\n{}\n", comment));
    }
    (subject, body)
}

// ==============================================================================
// QUERY HELPERS
// ==============================================================================

fn parse_type(raw: Option<&str>) -> Result<Option<FeedbackType>, FeedbackError> {
    raw.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.parse().map_err(FeedbackError::InvalidFilter))
        .transpose()
}

fn filter(mut builder: QueryBuilder, range: &DateRange, feedback_type: Option<FeedbackType>) -> QueryBuilder {
    if let Some(start) = range.start {
        builder = builder.gte("createdAt", start.to_rfc3339());
    }
    if let Some(end) = range.end {
        builder = builder.lte("createdAt", end.to_rfc3339());
    }
    if let Some(feedback_type) = feedback_type {
        builder = builder.eq("feedbackType", feedback_type);
    }
    builder
}
