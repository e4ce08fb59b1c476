//! # RepoLens API Library
//!
//! This library provides the GitHub data-synchronization core for the
//! RepoLens per-repository analytics dashboard: credential resolution,
//! installation-token exchange, paginated fetching, time-bucket aggregation,
//! and the page cache used by the list views.

pub mod access;
pub mod aggregate;
pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod github;
pub mod handlers;
pub mod proxy;
pub mod registry;
pub mod server;
pub mod telemetry;
