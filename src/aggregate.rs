//! Deterministic time-bucket aggregation for charting.
//!
//! Commits fold into ISO-week buckets (Monday start) and issues into a fixed
//! 12-month window ending at the current month. Ordering always follows the
//! underlying date key, never the formatted label, so month and year
//! boundaries cannot reorder the series.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::github::types::{Commit, Issue};

/// One ISO-week bucket of commit activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct WeeklyCommits {
    /// Label of the week start, e.g. `"Jan 8"`.
    pub week: String,
    pub commits: i64,
}

/// One calendar-month bucket of issue activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MonthlyIssues {
    /// Label of the month, e.g. `"Jan 2024"`.
    pub month: String,
    pub opened: i64,
    pub closed: i64,
}

/// The Monday starting the ISO week containing `date`. A Sunday belongs to
/// the week that started the previous Monday.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Fold commits into weekly buckets, sorted ascending by week start.
///
/// Commits without an author date cannot be placed and are skipped.
pub fn weekly_commit_buckets(commits: &[Commit]) -> Vec<WeeklyCommits> {
    let mut buckets: BTreeMap<NaiveDate, i64> = BTreeMap::new();

    for commit in commits {
        let Some(authored_at) = commit.authored_at() else {
            continue;
        };
        let start = week_start(authored_at.date_naive());
        *buckets.entry(start).or_insert(0) += 1;
    }

    buckets
        .into_iter()
        .map(|(start, commits)| WeeklyCommits {
            week: start.format("%b %-d").to_string(),
            commits,
        })
        .collect()
}

/// Fold issues into a fixed 12-month window ending at `now`'s month.
///
/// All 12 buckets exist even when empty. Pull requests are excluded. An
/// issue's opened and closed events count independently and may land in
/// different buckets; a closure whose month falls outside the window is
/// dropped.
pub fn monthly_issue_buckets(issues: &[Issue], now: DateTime<Utc>) -> Vec<MonthlyIssues> {
    let months = trailing_months(now.date_naive(), 12);
    let mut counts: BTreeMap<(i32, u32), (i64, i64)> = months
        .iter()
        .map(|&(year, month)| ((year, month), (0, 0)))
        .collect();

    for issue in issues {
        if issue.is_pull_request() {
            continue;
        }

        let opened_key = month_key(issue.created_at);
        if let Some(bucket) = counts.get_mut(&opened_key) {
            bucket.0 += 1;
        }

        if let Some(closed_at) = issue.closed_at {
            let closed_key = month_key(closed_at);
            if let Some(bucket) = counts.get_mut(&closed_key) {
                bucket.1 += 1;
            }
        }
    }

    // `months` is already chronological; the map lookup keeps it that way.
    months
        .into_iter()
        .map(|(year, month)| {
            let (opened, closed) = counts[&(year, month)];
            let first_of_month = NaiveDate::from_ymd_opt(year, month, 1)
                .expect("month keys are built from valid dates");
            MonthlyIssues {
                month: first_of_month.format("%b %Y").to_string(),
                opened,
                closed,
            }
        })
        .collect()
}

fn month_key(at: DateTime<Utc>) -> (i32, u32) {
    (at.year(), at.month())
}

/// The last `count` (year, month) keys ending at `end`'s month, ascending.
fn trailing_months(end: NaiveDate, count: u32) -> Vec<(i32, u32)> {
    let mut months = Vec::with_capacity(count as usize);
    let (mut year, mut month) = (end.year(), end.month());
    for _ in 0..count {
        months.push((year, month));
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }
    months.reverse();
    months
}
