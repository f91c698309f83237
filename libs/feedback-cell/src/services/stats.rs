// =====================================================================================
// FEEDBACK STATISTICS
// =====================================================================================

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::{
    DailyTrend, FeedbackStatRow, FeedbackStats, FeedbackType, RatingCount, StatusCount, TypeCount,
};

pub const TREND_DAYS: i64 = 7;

/// Aggregates the filtered rows. `trend_rows` covers the trend window and
/// is bucketed by calendar day (UTC).
pub fn summarize(rows: &[FeedbackStatRow], trend_rows: &[FeedbackStatRow], trend_end: DateTime<Utc>) -> FeedbackStats {
    let total = rows.len() as u64;
    let average_rating = if rows.is_empty() {
        0.0
    } else {
        round_to(rows.iter().map(|r| r.rating as f64).sum::<f64>() / rows.len() as f64, 2)
    };

    let mut by_type: HashMap<FeedbackType, u64> = HashMap::new();
    let mut by_rating: BTreeMap<i64, u64> = BTreeMap::new();
    let mut by_status = BTreeMap::new();
    for row in rows {
        *by_type.entry(row.feedback_type).or_default() += 1;
        *by_rating.entry(row.rating).or_default() += 1;
        *by_status.entry(row.status).or_insert(0u64) += 1;
    }

    let mut type_distribution: Vec<TypeCount> = by_type
        .into_iter()
        .map(|(feedback_type, count)| TypeCount {
            feedback_type,
            count,
            percentage: round_to(count as f64 / total as f64 * 100.0, 1),
        })
        .collect();
    type_distribution.sort_by(|a, b| b.count.cmp(&a.count).then(a.feedback_type.cmp(&b.feedback_type)));

    FeedbackStats {
        total_feedbacks: total,
        average_rating,
        type_distribution,
        rating_distribution: by_rating
            .into_iter()
            .map(|(rating, count)| RatingCount { rating, count })
            .collect(),
        status_distribution: by_status
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect(),
        weekly_trend: weekly_trend(trend_rows, trend_end),
    }
}

/// First instant of the trend window ending at `end`.
pub fn trend_start(end: DateTime<Utc>) -> DateTime<Utc> {
    let first_day = end.date_naive() - Duration::days(TREND_DAYS - 1);
    first_day.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// One entry per day of the window, oldest first, including empty days.
pub fn weekly_trend(rows: &[FeedbackStatRow], end: DateTime<Utc>) -> Vec<DailyTrend> {
    let mut days: BTreeMap<NaiveDate, (u64, i64)> = (0..TREND_DAYS)
        .map(|offset| (end.date_naive() - Duration::days(offset), (0, 0)))
        .collect();

    let start = trend_start(end);
    for row in rows.iter().filter(|r| r.created_at >= start && r.created_at <= end) {
        if let Some((count, ratings)) = days.get_mut(&row.created_at.date_naive()) {
            *count += 1;
            *ratings += row.rating;
        }
    }

    days.into_iter()
        .map(|(date, (count, ratings))| DailyTrend {
            date: date.format("%Y-%m-%d").to_string(),
            count,
            average_rating: if count == 0 {
                0.0
            } else {
                round_to(ratings as f64 / count as f64, 2)
            },
        })
        .collect()
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
