// =====================================================================================
// CSV EXPORT
// =====================================================================================

use chrono::{DateTime, Utc};

use crate::models::Feedback;

const HEADER: [&str; 10] = [
    "Feedback ID",
    "Type",
    "Issues",
    "Rating",
    "Description",
    "Contact",
    "Receive Reply",
    "Status",
    "Created At",
    "Updated At",
];

/// Renders feedback rows as CSV with a header line. Fields are quoted only
/// when they contain a delimiter, quote or line break.
pub fn to_csv(feedbacks: &[Feedback]) -> String {
    let mut out = String::new();
    push_row(&mut out, HEADER.iter().map(|h| h.to_string()));

    for feedback in feedbacks {
        push_row(
            &mut out,
            [
                feedback.id.clone(),
                feedback.feedback_type.label().to_string(),
                feedback.selected_issues.join(";"),
                feedback.rating.to_string(),
                feedback.description.clone(),
                feedback.contact_method.clone().unwrap_or_default(),
                feedback.receive_reply.to_string(),
                feedback.status.to_string(),
                timestamp(&feedback.created_at),
                timestamp(&feedback.updated_at),
            ]
            .into_iter(),
        );
    }
    out
}

pub fn export_filename(today: DateTime<Utc>) -> String {
    format!("feedbacks_{}.csv", today.format("%Y-%m-%d"))
}

fn push_row(out: &mut String, fields: impl Iterator<Item = String>) {
    let row: Vec<String> = fields.map(|f| escape(&f)).collect();
    out.push_str(&row.join(","));
    out.push_str("\r\n");
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}
