//! Typed records for the GitHub resources this service consumes.
//!
//! Only the fields the dashboard reads are modeled; everything else is
//! dropped at the boundary instead of flowing untyped into aggregation.
//! Optional upstream fields default rather than fail deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A GitHub user reference as embedded in commits, issues and stargazers.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GitHubAccount {
    pub login: String,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// One entry of `GET repos/{owner}/{repo}/commits`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Commit {
    pub sha: String,
    pub commit: CommitDetail,
    /// The GitHub account, when the commit email resolved to one.
    #[serde(default)]
    pub author: Option<GitHubAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
}

impl Commit {
    /// The author date used for time-bucketed aggregation.
    pub fn authored_at(&self) -> Option<DateTime<Utc>> {
        self.commit.author.as_ref().and_then(|sig| sig.date)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommitDetail {
    #[serde(default)]
    pub author: Option<CommitSignature>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommitSignature {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// One entry of `GET repos/{owner}/{repo}/issues`. Pull requests appear on
/// this endpoint too; the `pull_request` field distinguishes them.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Issue {
    pub id: i64,
    pub number: i64,
    pub title: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user: Option<GitHubAccount>,
    /// Present if and only if this record is a pull request.
    #[serde(default)]
    pub pull_request: Option<PullRequestMarker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
}

impl Issue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PullRequestMarker {
    #[serde(default)]
    pub url: Option<String>,
}

/// One entry of `GET repos/{owner}/{repo}/stargazers` with the
/// `star+json` media type.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Stargazer {
    #[serde(default)]
    pub starred_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user: Option<GitHubAccount>,
}

/// One entry of `GET repos/{owner}/{repo}/stats/contributors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributorStats {
    #[serde(default)]
    pub author: Option<GitHubAccount>,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub weeks: Vec<ContributorWeek>,
}

/// Weekly slice of a contributor's activity: additions, deletions, commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributorWeek {
    #[serde(default)]
    pub w: i64,
    #[serde(default)]
    pub a: i64,
    #[serde(default)]
    pub d: i64,
    #[serde(default)]
    pub c: i64,
}

/// `GET repos/{owner}/{repo}/traffic/clones`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrafficClones {
    pub count: i64,
    pub uniques: i64,
    #[serde(default)]
    pub clones: Vec<TrafficPoint>,
}

/// `GET repos/{owner}/{repo}/traffic/views`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrafficViews {
    pub count: i64,
    pub uniques: i64,
    #[serde(default)]
    pub views: Vec<TrafficPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrafficPoint {
    pub timestamp: DateTime<Utc>,
    pub count: i64,
    pub uniques: i64,
}
