//! Controller errors.

use std::fmt;

use bugzilla::TrackerError;
use notify::ChannelError;
use thiserror::Error;

/// A failure while processing one bug or one pass.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("bug search failed: {0}")]
    Search(#[source] TrackerError),

    #[error("bug #{bug_id}: fetching comments or history failed: {source}")]
    Fetch { bug_id: u64, source: TrackerError },

    #[error("bug #{bug_id}: unable to parse creation time {value:?}: {source}")]
    CreationTime {
        bug_id: u64,
        value: String,
        source: chrono::ParseError,
    },

    #[error("bug #{bug_id}: update failed: {source}")]
    Update { bug_id: u64, source: TrackerError },

    #[error("notification failed: {0}")]
    Notify(#[from] ChannelError),

    #[error("sync cancelled with {remaining} bug(s) left unprocessed")]
    Cancelled { remaining: usize },
}

impl LifecycleError {
    /// Bug the error is about, if any.
    pub fn bug_id(&self) -> Option<u64> {
        match self {
            Self::Fetch { bug_id, .. }
            | Self::CreationTime { bug_id, .. }
            | Self::Update { bug_id, .. } => Some(*bug_id),
            _ => None,
        }
    }
}

/// Every error collected during one controller pass.
#[derive(Debug, Default)]
pub struct AggregateError {
    errors: Vec<LifecycleError>,
}

impl AggregateError {
    /// `Ok` when nothing failed.
    pub fn into_result(errors: Vec<LifecycleError>) -> Result<(), AggregateError> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self { errors })
        }
    }

    pub fn errors(&self) -> &[LifecycleError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl From<LifecycleError> for AggregateError {
    fn from(error: LifecycleError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [single] = self.errors.as_slice() {
            return write!(f, "{single}");
        }
        f.write_str("[")?;
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{error}")?;
        }
        f.write_str("]")
    }
}

impl std::error::Error for AggregateError {}
