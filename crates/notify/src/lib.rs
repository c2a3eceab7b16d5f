//! Chat notifications for the bug lifecycle operator.
//!
//! Controllers talk to people through the [`ChatClient`] trait: a direct
//! message addressed by e-mail, or a post to one of the shared channels
//! ([`ChannelRole::Admin`], [`ChannelRole::Status`]).
//!
//! # Usage
//!
//! ```no_run
//! use notify::{ChannelRole, ChatClient, SlackClient, SlackSettings};
//!
//! # async fn run() -> Result<(), notify::ChannelError> {
//! let slack = SlackClient::from_env(SlackSettings {
//!     admin_channel: "C0ADMIN".to_string(),
//!     status_channel: "C0STATUS".to_string(),
//!     debug: false,
//! });
//!
//! slack.message_user("dev@example.com", "Hi there!").await?;
//! slack.message_channel(ChannelRole::Status, "3 new bugs").await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! - `SLACK_BOT_TOKEN`: Slack bot token (enables Slack delivery)
//! - `NOTIFY_DISABLED`: Set to "true" to disable all notifications

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod error;

pub use channels::slack::{SlackClient, SlackSettings};
pub use channels::{ChannelRole, ChatClient};
pub use error::ChannelError;

use async_trait::async_trait;
use tracing::debug;

/// Environment variable to disable all notifications.
const ENV_NOTIFY_DISABLED: &str = "NOTIFY_DISABLED";

/// Check whether notifications are disabled via `NOTIFY_DISABLED`.
#[must_use]
pub fn disabled_by_env() -> bool {
    std::env::var(ENV_NOTIFY_DISABLED)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}

/// Chat client that drops every message.
///
/// Used when notifications are disabled or no backend is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledChat;

#[async_trait]
impl ChatClient for DisabledChat {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn message_user(&self, email: &str, _text: &str) -> Result<(), ChannelError> {
        debug!(recipient = %email, "Notifications disabled, dropping direct message");
        Ok(())
    }

    async fn message_channel(&self, role: ChannelRole, _text: &str) -> Result<(), ChannelError> {
        debug!(channel = %role, "Notifications disabled, dropping channel message");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_role_names() {
        assert_eq!(ChannelRole::Admin.to_string(), "admin");
        assert_eq!(ChannelRole::Status.as_str(), "status");
    }

    #[tokio::test]
    async fn test_disabled_chat_accepts_everything() {
        let chat = DisabledChat;
        assert_eq!(chat.name(), "disabled");
        assert!(chat.message_user("dev@example.com", "hi").await.is_ok());
        assert!(chat
            .message_channel(ChannelRole::Admin, "hi")
            .await
            .is_ok());
    }
}
