//! # Credential Resolution
//!
//! Given (owner, repo) and the optional caller identity, decide whether the
//! request is authorized and which installation credential to use for the
//! upstream call. Read-only against the repository registry.

use thiserror::Error;

use crate::registry::{ConnectedRepository, RepoRegistry};

/// How the endpoint treats anonymous callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// The caller must own a connected row (all endpoints except the
    /// latest-commit probe).
    OwnerOnly,
    /// Read-only endpoints that also serve anonymous callers when any row for
    /// the repository is public.
    PublicFallback,
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Denial {
    /// No caller identity was presented.
    #[error("no caller identity")]
    Unauthenticated,
    /// Identity present, but no matching registry row with a linked
    /// installation.
    #[error("repository is not connected")]
    NotConnected,
}

/// A positive resolution: the registry row to act on and its installation id.
#[derive(Debug, Clone)]
pub struct ResolvedCredential {
    pub installation_id: i64,
    pub repository: ConnectedRepository,
}

pub struct CredentialResolver<'a> {
    registry: &'a dyn RepoRegistry,
}

impl<'a> CredentialResolver<'a> {
    pub fn new(registry: &'a dyn RepoRegistry) -> Self {
        Self { registry }
    }

    pub async fn resolve(
        &self,
        user_id: Option<&str>,
        owner: &str,
        name: &str,
        mode: AccessMode,
    ) -> Result<ResolvedCredential, Denial> {
        // A public row wins over a caller-owned private row so anonymous and
        // authenticated callers observe the same credential path.
        if mode == AccessMode::PublicFallback
            && let Some(row) = self.registry.find_public(owner, name).await
            && let Some(installation_id) = row.installation_id
        {
            return Ok(ResolvedCredential {
                installation_id,
                repository: row,
            });
        }

        let user_id = user_id.ok_or(Denial::Unauthenticated)?;
        let row = self
            .registry
            .find(user_id, owner, name)
            .await
            .ok_or(Denial::NotConnected)?;
        let installation_id = row.installation_id.ok_or(Denial::NotConnected)?;

        Ok(ResolvedCredential {
            installation_id,
            repository: row,
        })
    }
}
