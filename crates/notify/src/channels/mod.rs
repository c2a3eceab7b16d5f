//! Chat client implementations.

pub mod slack;

use async_trait::async_trait;
use std::fmt;

use crate::error::ChannelError;

/// Shared channels the operator posts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelRole {
    /// Operator administrators: reassignment summaries, debug copies.
    Admin,
    /// Team-wide status reports.
    Status,
}

impl ChannelRole {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for chat backends.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &'static str;

    /// Send a direct message to the user registered with `email`.
    async fn message_user(&self, email: &str, text: &str) -> Result<(), ChannelError>;

    /// Post a message to one of the shared channels.
    async fn message_channel(&self, role: ChannelRole, text: &str) -> Result<(), ChannelError>;
}
