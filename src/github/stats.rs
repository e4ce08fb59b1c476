//! Contributor statistics polling and aggregation.
//!
//! GitHub computes `stats/contributors` asynchronously and answers 202 while
//! the computation runs. That state is not a failure: the poller retries a
//! few times with a fixed delay and then reports a non-fatal "still
//! computing" outcome. A 422 (history too large) is terminal.

use std::cmp::Reverse;
use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use super::fetcher::GhResponse;
use super::types::ContributorStats;
use super::GitHubError;

/// Fixed delay between polls of a still-computing result.
pub const STATS_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Default number of retries after the initial attempt.
pub const STATS_MAX_RETRIES: u32 = 3;

/// Lines added/removed per contributor, summed over all weeks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ContributorTotals {
    pub author: String,
    pub inserted: i64,
    pub deleted: i64,
}

/// Outcome of polling the contributor-stats endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContributorStatsOutcome {
    Ready(Vec<ContributorTotals>),
    /// GitHub is still computing after all retries; callers show "stats
    /// unavailable" rather than an error.
    Computing,
}

/// Poll `fetch` until it stops answering 202, up to `max_retries` retries
/// with a fixed 2-second delay between attempts.
pub async fn poll_contributor_stats<F, Fut>(
    max_retries: u32,
    mut fetch: F,
) -> Result<ContributorStatsOutcome, GitHubError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<GhResponse, GitHubError>>,
{
    for attempt in 0..=max_retries {
        let response = fetch().await.map_err(|err| match err {
            GitHubError::Api { status: 422, .. } => GitHubError::StatsUnavailable,
            other => other,
        })?;

        if response.status == StatusCode::ACCEPTED {
            if attempt == max_retries {
                debug!(attempt, "Contributor stats still computing, giving up");
                return Ok(ContributorStatsOutcome::Computing);
            }
            debug!(attempt, "Contributor stats computing, retrying");
            tokio::time::sleep(STATS_RETRY_DELAY).await;
            continue;
        }

        let stats: Vec<ContributorStats> = response.json()?;
        return Ok(ContributorStatsOutcome::Ready(summarize_contributors(
            stats,
        )));
    }

    unreachable!("loop returns on every attempt")
}

/// Sum per-author weekly additions/deletions, drop entries without a
/// resolvable login, and keep the ten most active contributors.
pub fn summarize_contributors(stats: Vec<ContributorStats>) -> Vec<ContributorTotals> {
    let mut totals: Vec<ContributorTotals> = stats
        .into_iter()
        .filter_map(|entry| {
            let login = entry.author.map(|a| a.login).filter(|l| !l.is_empty())?;
            let (inserted, deleted) = entry
                .weeks
                .iter()
                .fold((0, 0), |(add, del), week| (add + week.a, del + week.d));
            Some(ContributorTotals {
                author: login,
                inserted,
                deleted,
            })
        })
        .collect();

    totals.sort_by_key(|t| Reverse(t.inserted + t.deleted));
    totals.truncate(10);
    totals
}
