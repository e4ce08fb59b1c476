//! # Repository Registry
//!
//! The registry maps (user, owner, repo) to an installation credential
//! reference and a visibility flag. The persistent store behind it is an
//! external collaborator; this module defines the operations the sync layer
//! consumes plus an in-memory implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use utoipa::ToSchema;

/// A repository a user has registered with the dashboard.
///
/// `installation_id` is absent until a GitHub App installation is linked;
/// `is_public` allows anonymous latest-commit reads.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ConnectedRepository {
    pub user_id: String,
    pub owner: String,
    pub name: String,
    /// Stable upstream identity of the repository.
    pub github_repo_id: i64,
    pub installation_id: Option<i64>,
    pub is_public: bool,
    pub default_branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl ConnectedRepository {
    pub fn matches(&self, owner: &str, name: &str) -> bool {
        // GitHub treats owner and repository names case-insensitively.
        self.owner.eq_ignore_ascii_case(owner) && self.name.eq_ignore_ascii_case(name)
    }
}

/// Read/write operations the sync layer needs from the registry.
#[async_trait]
pub trait RepoRegistry: Send + Sync {
    /// The row a specific user registered for (owner, name), if any.
    async fn find(&self, user_id: &str, owner: &str, name: &str) -> Option<ConnectedRepository>;

    /// Any row for (owner, name) with `is_public = true` and a linked
    /// installation.
    async fn find_public(&self, owner: &str, name: &str) -> Option<ConnectedRepository>;

    /// Insert or replace the row for (user_id, github_repo_id).
    async fn upsert(&self, row: ConnectedRepository);

    /// Flip the visibility flag; returns false when no row matched.
    async fn set_visibility(&self, user_id: &str, github_repo_id: i64, is_public: bool) -> bool;

    /// Delete the row; returns false when no row matched.
    async fn remove(&self, user_id: &str, github_repo_id: i64) -> bool;
}

/// In-memory registry used by tests and single-process deployments.
#[derive(Default)]
pub struct InMemoryRegistry {
    rows: RwLock<Vec<ConnectedRepository>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RepoRegistry for InMemoryRegistry {
    async fn find(&self, user_id: &str, owner: &str, name: &str) -> Option<ConnectedRepository> {
        self.rows
            .read()
            .await
            .iter()
            .find(|row| row.user_id == user_id && row.matches(owner, name))
            .cloned()
    }

    async fn find_public(&self, owner: &str, name: &str) -> Option<ConnectedRepository> {
        self.rows
            .read()
            .await
            .iter()
            .find(|row| row.is_public && row.installation_id.is_some() && row.matches(owner, name))
            .cloned()
    }

    async fn upsert(&self, row: ConnectedRepository) {
        let mut rows = self.rows.write().await;
        // At most one row per (user_id, github_repo_id).
        rows.retain(|existing| {
            !(existing.user_id == row.user_id && existing.github_repo_id == row.github_repo_id)
        });
        rows.push(row);
    }

    async fn set_visibility(&self, user_id: &str, github_repo_id: i64, is_public: bool) -> bool {
        let mut rows = self.rows.write().await;
        match rows
            .iter_mut()
            .find(|row| row.user_id == user_id && row.github_repo_id == github_repo_id)
        {
            Some(row) => {
                row.is_public = is_public;
                true
            }
            None => false,
        }
    }

    async fn remove(&self, user_id: &str, github_repo_id: i64) -> bool {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| !(row.user_id == user_id && row.github_repo_id == github_repo_id));
        rows.len() != before
    }
}

#[cfg(test)]
pub fn test_row(user_id: &str, owner: &str, name: &str) -> ConnectedRepository {
    ConnectedRepository {
        user_id: user_id.to_string(),
        owner: owner.to_string(),
        name: name.to_string(),
        github_repo_id: 1,
        installation_id: Some(100),
        is_public: false,
        default_branch: "main".to_string(),
        display_name: None,
    }
}
