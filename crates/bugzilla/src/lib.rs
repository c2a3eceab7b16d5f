//! Bugzilla REST client for the bug lifecycle operator.
//!
//! This crate provides the tracker side of the operator: typed models for
//! bugs, comments and history, a [`Query`] builder for Bugzilla's advanced
//! search, and the [`BugzillaClient`] trait that controllers are written
//! against.
//!
//! ## Clients
//!
//! - [`RestClient`] talks to the Bugzilla REST API over HTTP
//! - [`CachedClient`] wraps any client and caches comments and history per
//!   bug, keyed by the bug's last change time
//!
//! ## Example
//!
//! ```ignore
//! use bugzilla::{BugzillaClient, CachedClient, Query, RestClient};
//!
//! let client = CachedClient::new(RestClient::new("https://bugzilla.redhat.com", api_key)?);
//!
//! let query = Query {
//!     status: vec!["NEW".to_string()],
//!     ..Query::default()
//! };
//! let bugs = client.search(&query).await?;
//! for bug in &bugs {
//!     let comments = client.get_cached_comments(bug.id, &bug.last_change_time).await?;
//! }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod client;
pub mod error;
pub mod models;
pub mod query;
pub mod rest;

pub use cache::CachedClient;
pub use client::BugzillaClient;
pub use error::TrackerError;
pub use models::{
    Bug, BugComment, BugUpdate, Comment, FieldDelta, Flag, FlagChange, HistoryChange, Priority,
};
pub use query::{AdvancedQuery, Query};
pub use rest::RestClient;
