//! Slack Web API chat client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::channels::{ChannelRole, ChatClient};
use crate::error::ChannelError;

/// Environment variable for the Slack bot token.
const ENV_SLACK_BOT_TOKEN: &str = "SLACK_BOT_TOKEN";

/// Default Slack Web API endpoint.
pub const DEFAULT_API_BASE: &str = "https://slack.com/api";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fallback when a 429 carries no `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

/// Slack channel ids and delivery options.
#[derive(Debug, Clone, Default)]
pub struct SlackSettings {
    /// Channel id for [`ChannelRole::Admin`].
    pub admin_channel: String,
    /// Channel id for [`ChannelRole::Status`].
    pub status_channel: String,
    /// Redirect every direct message to the admin channel.
    pub debug: bool,
}

/// Slack chat client using a bot token.
pub struct SlackClient {
    api_base: String,
    bot_token: Option<String>,
    settings: SlackSettings,
    client: reqwest::Client,
}

impl SlackClient {
    /// Create a Slack client with the bot token from `SLACK_BOT_TOKEN`.
    #[must_use]
    pub fn from_env(settings: SlackSettings) -> Self {
        let bot_token = std::env::var(ENV_SLACK_BOT_TOKEN)
            .ok()
            .filter(|token| !token.trim().is_empty());

        if bot_token.is_some() {
            debug!("Slack notifications enabled");
        } else {
            debug!("Slack notifications disabled (SLACK_BOT_TOKEN not set)");
        }

        Self::build(DEFAULT_API_BASE, bot_token, settings)
    }

    /// Create a Slack client with a specific API base and bot token.
    #[must_use]
    pub fn new(api_base: &str, bot_token: String, settings: SlackSettings) -> Self {
        Self::build(api_base, Some(bot_token), settings)
    }

    fn build(api_base: &str, bot_token: Option<String>, settings: SlackSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.map(|token| token.trim().to_string()),
            settings,
            client,
        }
    }

    /// Check if a bot token is configured.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.bot_token.is_some()
    }

    fn token(&self) -> Result<&str, ChannelError> {
        self.bot_token
            .as_deref()
            .ok_or_else(|| ChannelError::NotConfigured(ENV_SLACK_BOT_TOKEN.to_string()))
    }

    fn channel_id(&self, role: ChannelRole) -> Result<&str, ChannelError> {
        let id = match role {
            ChannelRole::Admin => &self.settings.admin_channel,
            ChannelRole::Status => &self.settings.status_channel,
        };
        if id.is_empty() {
            return Err(ChannelError::NotConfigured(format!("{role} channel")));
        }
        Ok(id)
    }

    /// Resolve a Slack user id from an e-mail address.
    async fn lookup_user_id(&self, email: &str) -> Result<String, ChannelError> {
        let url = format!("{}/users.lookupByEmail", self.api_base);
        let response = self
            .client
            .get(&url)
            .bearer_auth(self.token()?)
            .query(&[("email", email)])
            .send()
            .await?;

        let body: LookupByEmailResponse =
            Self::handle_response("users.lookupByEmail", response).await?;
        body.user
            .map(|user| user.id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ChannelError::Api {
                method: "users.lookupByEmail".to_string(),
                error: "response did not include a user id".to_string(),
            })
    }

    /// Post `text` to a channel or user id.
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), ChannelError> {
        let url = format!("{}/chat.postMessage", self.api_base);
        let payload = PostMessagePayload {
            channel,
            text,
            unfurl_links: false,
            unfurl_media: false,
        };

        debug!(channel = %channel, "Posting Slack message");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.token()?)
            .json(&payload)
            .send()
            .await?;

        let _: PostMessageResponse = Self::handle_response("chat.postMessage", response).await?;
        Ok(())
    }

    /// Decode a Web API response, mapping rate limits and `ok: false`.
    async fn handle_response<T>(method: &str, response: reqwest::Response) -> Result<T, ChannelError>
    where
        T: DeserializeOwned + SlackResponse,
    {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            warn!(method = %method, retry_after_secs, "Slack rate limit hit");
            return Err(ChannelError::RateLimited { retry_after_secs });
        }

        let text = response.text().await?;
        if !status.is_success() {
            return Err(ChannelError::Other(format!(
                "Slack {method} returned {status}: {text}"
            )));
        }

        let body: T = serde_json::from_str(&text)?;
        if !body.ok() {
            return Err(ChannelError::Api {
                method: method.to_string(),
                error: body
                    .error()
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl ChatClient for SlackClient {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn message_user(&self, email: &str, text: &str) -> Result<(), ChannelError> {
        if self.settings.debug {
            let channel = self.channel_id(ChannelRole::Admin)?;
            let message = format!("DEBUG: message to {email}:\n\n{text}");
            return self.post_message(channel, &message).await;
        }

        let user_id = self.lookup_user_id(email).await?;
        self.post_message(&user_id, text).await
    }

    async fn message_channel(&self, role: ChannelRole, text: &str) -> Result<(), ChannelError> {
        let channel = self.channel_id(role)?;
        self.post_message(channel, text).await
    }
}

// =============================================================================
// Slack API types
// =============================================================================

trait SlackResponse {
    fn ok(&self) -> bool;
    fn error(&self) -> Option<&str>;
}

#[derive(Debug, Serialize)]
struct PostMessagePayload<'a> {
    channel: &'a str,
    text: &'a str,
    unfurl_links: bool,
    unfurl_media: bool,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupByEmailResponse {
    ok: bool,
    error: Option<String>,
    user: Option<SlackUser>,
}

#[derive(Debug, Deserialize)]
struct SlackUser {
    id: String,
}

impl SlackResponse for PostMessageResponse {
    fn ok(&self) -> bool {
        self.ok
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl SlackResponse for LookupByEmailResponse {
    fn ok(&self) -> bool {
        self.ok
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
