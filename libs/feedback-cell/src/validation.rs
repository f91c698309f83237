use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Months, NaiveDate, NaiveTime, Utc};
use serde_json::Value;

use shared_utils::validation::{is_valid_email, is_valid_mobile};

use crate::error::FeedbackError;
use crate::models::{FeedbackType, SubmitFeedbackRequest};

const DESCRIPTION_MIN: usize = 10;
const DESCRIPTION_MAX: usize = 1000;
const MAX_ISSUES: usize = 5;

/// A submission that passed every check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSubmission {
    pub feedback_type: FeedbackType,
    pub selected_issues: Vec<String>,
    pub rating: i64,
    pub description: String,
    pub contact_method: Option<String>,
    pub browser_info: Option<Value>,
    pub receive_reply: bool,
}

/// Checks every field and reports all problems together.
pub fn validate_submission(request: SubmitFeedbackRequest) -> Result<ValidSubmission, Vec<String>> {
    let mut errors = Vec::new();

    let feedback_type = match request.feedback_type.as_deref().map(str::trim) {
        None | Some("") => {
            errors.push("feedbackType is required".to_string());
            None
        }
        Some(raw) => match raw.parse::<FeedbackType>() {
            Ok(t) => Some(t),
            Err(_) => {
                errors.push(
                    "feedbackType must be one of bug, suggestion, performance, ui, content, other"
                        .to_string(),
                );
                None
            }
        },
    };

    let rating = request
        .rating
        .as_ref()
        .and_then(Value::as_i64)
        .filter(|r| (1..=5).contains(r));
    if rating.is_none() {
        errors.push("rating must be an integer between 1 and 5".to_string());
    }

    let description = request.description.as_deref().map(str::trim).unwrap_or_default();
    let length = description.chars().count();
    if length == 0 {
        errors.push("description is required".to_string());
    } else if length < DESCRIPTION_MIN {
        errors.push(format!("description must be at least {} characters", DESCRIPTION_MIN));
    } else if length > DESCRIPTION_MAX {
        errors.push(format!("description must not exceed {} characters", DESCRIPTION_MAX));
    }

    if let Some(issues) = &request.selected_issues {
        if issues.is_empty() {
            errors.push("selectedIssues must contain at least one entry".to_string());
        } else if issues.len() > MAX_ISSUES {
            errors.push(format!("selectedIssues must not contain more than {} entries", MAX_ISSUES));
        }
    }

    let contact_method = match request.contact_method.as_deref() {
        None | Some("") => None,
        Some(raw) => {
            let contact = raw.trim();
            if contact.is_empty() {
                errors.push("contactMethod must not be blank".to_string());
            } else if !is_valid_email(contact) && !is_valid_mobile(contact) {
                errors.push("contactMethod must be a valid email address or mobile number".to_string());
            }
            Some(contact.to_string()).filter(|c| !c.is_empty())
        }
    };

    let receive_reply = request.receive_reply.unwrap_or(false);
    if receive_reply && request.contact_method.as_deref().map_or(true, |c| c.trim().is_empty()) {
        errors.push("contactMethod is required to receive a reply".to_string());
    }

    if request.browser_info.as_ref().is_some_and(|b| !b.is_object() && !b.is_null()) {
        errors.push("browserInfo must be an object".to_string());
    }

    match (feedback_type, rating) {
        (Some(feedback_type), Some(rating)) if errors.is_empty() => Ok(ValidSubmission {
            feedback_type,
            selected_issues: request
                .selected_issues
                .unwrap_or_default()
                .into_iter()
                .map(|i| i.trim().to_string())
                .collect(),
            rating,
            description: description.to_string(),
            contact_method,
            browser_info: request.browser_info.filter(|b| !b.is_null()),
            receive_reply,
        }),
        _ => Err(errors),
    }
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .map(str::to_string)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Parses optional RFC 3339 or `YYYY-MM-DD` bounds. A bare end date covers
/// the whole day. When both are given the start must not be after the end
/// and the span must not exceed one year.
pub fn parse_date_range(start: Option<&str>, end: Option<&str>) -> Result<DateRange, FeedbackError> {
    let mut errors = Vec::new();

    let start = match start.map(str::trim).filter(|s| !s.is_empty()) {
        None => None,
        Some(raw) => {
            let parsed = parse_bound(raw, false);
            if parsed.is_none() {
                errors.push(format!("Invalid startDate: {}", raw));
            }
            parsed
        }
    };
    let end = match end.map(str::trim).filter(|s| !s.is_empty()) {
        None => None,
        Some(raw) => {
            let parsed = parse_bound(raw, true);
            if parsed.is_none() {
                errors.push(format!("Invalid endDate: {}", raw));
            }
            parsed
        }
    };

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            errors.push("startDate must not be after endDate".to_string());
        } else if start
            .checked_add_months(Months::new(12))
            .is_some_and(|limit| end > limit)
        {
            errors.push("Date range must not exceed one year".to_string());
        }
    }

    if errors.is_empty() {
        Ok(DateRange { start, end })
    } else {
        Err(FeedbackError::InvalidDateRange(errors))
    }
}

fn parse_bound(raw: &str, end_of_day: bool) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let start = date.and_time(NaiveTime::MIN).and_utc();
    Some(if end_of_day {
        start + Duration::days(1) - Duration::milliseconds(1)
    } else {
        start
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn request(body: Value) -> SubmitFeedbackRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn accepts_complete_submission() {
        let valid = validate_submission(request(json!({
            "feedbackType": "performance",
            "selectedIssues": [" slow search "],
            "rating": 4,
            "description": "  Search takes several seconds  ",
            "contactMethod": "138 0013 8000",
            "receiveReply": true,
            "browserInfo": {"userAgent": "test"}
        })))
        .unwrap();

        assert_eq!(valid.feedback_type, FeedbackType::Performance);
        assert_eq!(valid.selected_issues, vec!["slow search"]);
        assert_eq!(valid.description, "Search takes several seconds");
        assert!(valid.receive_reply);
    }

    #[test]
    fn reports_every_problem() {
        let errors = validate_submission(request(json!({
            "feedbackType": "praise",
            "rating": 3.5,
            "description": "short",
            "selectedIssues": [],
            "contactMethod": "nobody",
            "browserInfo": "chrome"
        })))
        .unwrap_err();

        assert_eq!(errors.len(), 6);
        assert!(errors.contains(&"rating must be an integer between 1 and 5".to_string()));
        assert!(errors.contains(&"description must be at least 10 characters".to_string()));
        assert!(errors.contains(&"browserInfo must be an object".to_string()));
    }

    #[test]
    fn missing_fields() {
        let errors = validate_submission(request(json!({"receiveReply": true}))).unwrap_err();

        assert_eq!(
            errors,
            vec![
                "feedbackType is required",
                "rating must be an integer between 1 and 5",
                "description is required",
                "contactMethod is required to receive a reply",
            ]
        );
    }

    #[test]
    fn limits_issue_count_and_description_length() {
        let errors = validate_submission(request(json!({
            "feedbackType": "bug",
            "rating": 1,
            "description": "x".repeat(1001),
            "selectedIssues": ["a", "b", "c", "d", "e", "f"]
        })))
        .unwrap_err();

        assert_eq!(
            errors,
            vec![
                "description must not exceed 1000 characters",
                "selectedIssues must not contain more than 5 entries",
            ]
        );
    }

    #[test]
    fn blank_contact_is_rejected() {
        let errors = validate_submission(request(json!({
            "feedbackType": "bug",
            "rating": 2,
            "description": "Payment page crashes",
            "contactMethod": "   "
        })))
        .unwrap_err();

        assert_eq!(errors, vec!["contactMethod must not be blank"]);
    }

    #[test]
    fn client_ip_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "10.0.0.2".parse().unwrap());
        assert_eq!(client_ip(&headers).as_deref(), Some("10.0.0.2"));

        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.7"));

        assert!(client_ip(&HeaderMap::new()).is_none());
    }

    #[test]
    fn date_range_rules() {
        let range = parse_date_range(Some("2024-01-01"), Some("2024-01-31")).unwrap();
        assert_eq!(range.start.unwrap().to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(range.end.unwrap().to_rfc3339(), "2024-01-31T23:59:59.999+00:00");

        assert_matches!(
            parse_date_range(Some("2024-02-01"), Some("2024-01-01")),
            Err(FeedbackError::InvalidDateRange(errors)) if errors == vec!["startDate must not be after endDate"]
        );
        assert_matches!(
            parse_date_range(Some("2023-01-01"), Some("2024-06-01")),
            Err(FeedbackError::InvalidDateRange(errors)) if errors == vec!["Date range must not exceed one year"]
        );
        assert_matches!(
            parse_date_range(Some("yesterday"), None),
            Err(FeedbackError::InvalidDateRange(errors)) if errors == vec!["Invalid startDate: yesterday"]
        );
        assert_eq!(parse_date_range(None, None).unwrap(), DateRange::default());
    }
}
