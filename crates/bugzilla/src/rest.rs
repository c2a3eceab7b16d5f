//! Bugzilla REST API client implementation.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::client::BugzillaClient;
use crate::error::TrackerError;
use crate::models::{Bug, BugUpdate, Comment, HistoryChange};
use crate::query::Query;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Header carrying the API key.
const API_KEY_HEADER: &str = "X-BUGZILLA-API-KEY";

#[derive(Debug, Deserialize)]
struct BugList {
    #[serde(default)]
    bugs: Vec<Bug>,
}

#[derive(Debug, Deserialize)]
struct CommentEnvelope {
    #[serde(default)]
    bugs: HashMap<String, BugComments>,
}

#[derive(Debug, Deserialize)]
struct BugComments {
    #[serde(default)]
    comments: Vec<Comment>,
}

#[derive(Debug, Deserialize)]
struct HistoryEnvelope {
    #[serde(default)]
    bugs: Vec<BugHistory>,
}

#[derive(Debug, Deserialize)]
struct BugHistory {
    #[serde(default)]
    history: Vec<HistoryChange>,
}

/// Bugzilla reports some failures as `200 OK` with an error body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    error: bool,
    message: Option<String>,
}

/// Bugzilla REST client.
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestClient {
    /// Create a new REST client.
    ///
    /// # Arguments
    /// * `base_url` - Bugzilla instance, e.g. `https://bugzilla.redhat.com`
    /// * `api_key` - Bugzilla API key
    ///
    /// # Errors
    /// Returns error if the base URL is empty or the HTTP client cannot be created.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, TrackerError> {
        let base_url = base_url.trim_end_matches('/');
        if base_url.is_empty() {
            return Err(TrackerError::Config("base URL must not be empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/rest{path}", self.base_url)
    }

    /// Make an authenticated GET request.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
        bug_id: Option<u64>,
    ) -> Result<T, TrackerError> {
        let url = self.url(path);
        debug!(url = %url, "GET request");

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(params)
            .send()
            .await?;

        Self::handle_response(response, bug_id).await
    }

    /// Handle API response, parsing JSON or error.
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
        bug_id: Option<u64>,
    ) -> Result<T, TrackerError> {
        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            if let Some(id) = bug_id {
                return Err(TrackerError::NotFound(id));
            }
        }

        let error_body = serde_json::from_str::<ErrorBody>(&text).unwrap_or_default();
        if !status.is_success() || error_body.error {
            return Err(TrackerError::Api {
                status: status.as_u16(),
                message: error_body.message.unwrap_or(text),
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, body = %text, "Failed to parse response");
            TrackerError::Serialization(e)
        })
    }
}

#[async_trait]
impl BugzillaClient for RestClient {
    async fn search(&self, query: &Query) -> Result<Vec<Bug>, TrackerError> {
        let list: BugList = self.get("/bug", &query.to_params(), None).await?;
        debug!(count = list.bugs.len(), "Search returned bugs");
        Ok(list.bugs)
    }

    async fn get_bug(&self, id: u64) -> Result<Bug, TrackerError> {
        let list: BugList = self.get(&format!("/bug/{id}"), &[], Some(id)).await?;
        list.bugs
            .into_iter()
            .next()
            .ok_or(TrackerError::NotFound(id))
    }

    async fn update_bug(&self, id: u64, update: &BugUpdate) -> Result<(), TrackerError> {
        let url = self.url(&format!("/bug/{id}"));
        debug!(url = %url, bug_id = id, "PUT request");

        let response = self
            .client
            .put(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(update)
            .send()
            .await?;

        let _: serde_json::Value = Self::handle_response(response, Some(id)).await?;
        Ok(())
    }

    async fn get_cached_comments(
        &self,
        id: u64,
        _since_hint: &str,
    ) -> Result<Vec<Comment>, TrackerError> {
        let envelope: CommentEnvelope = self
            .get(&format!("/bug/{id}/comment"), &[], Some(id))
            .await?;

        envelope
            .bugs
            .into_iter()
            .find(|(key, _)| key == &id.to_string())
            .map(|(_, bug)| bug.comments)
            .ok_or_else(|| TrackerError::UnexpectedResponse(format!("no comments for bug #{id}")))
    }

    async fn get_cached_history(
        &self,
        id: u64,
        _since_hint: &str,
    ) -> Result<Vec<HistoryChange>, TrackerError> {
        let envelope: HistoryEnvelope = self
            .get(&format!("/bug/{id}/history"), &[], Some(id))
            .await?;

        envelope
            .bugs
            .into_iter()
            .next()
            .map(|bug| bug.history)
            .ok_or_else(|| TrackerError::UnexpectedResponse(format!("no history for bug #{id}")))
    }
}
