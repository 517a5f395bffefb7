//! Classified results of processing one work item

use crate::crawler::fetcher::FetchError;
use url::Url;

/// What happened when a worker processed a [`WorkItem`](crate::WorkItem)
///
/// The scheduler matches on this exhaustively to decide whether the item is
/// recorded, retried, replaced or dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Document fetched; these in-scope links were found in it
    Success { links: Vec<Url> },

    /// Fetched, but there was nothing to parse
    Empty,

    /// The server asked us to slow down
    RateLimited,

    /// The URL redirects elsewhere
    Redirected { target: Url },

    /// The URL does not exist
    NotFound,

    /// Worth trying again later
    TransientFailure { cause: String },

    /// Will not succeed on retry
    FatalFailure { cause: String },
}

impl Outcome {
    /// Short name used in logs
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success { .. } => "success",
            Outcome::Empty => "empty",
            Outcome::RateLimited => "rate-limited",
            Outcome::Redirected { .. } => "redirected",
            Outcome::NotFound => "not-found",
            Outcome::TransientFailure { .. } => "transient-failure",
            Outcome::FatalFailure { .. } => "fatal-failure",
        }
    }
}

impl From<FetchError> for Outcome {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::NotFound => Outcome::NotFound,
            FetchError::RateLimited => Outcome::RateLimited,
            FetchError::Redirect {
                target: Some(target),
                ..
            } => Outcome::Redirected { target },
            FetchError::Redirect {
                status,
                target: None,
            } => Outcome::FatalFailure {
                cause: format!("HTTP {} redirect without a usable Location", status),
            },
            FetchError::Status(status) => Outcome::TransientFailure {
                cause: format!("HTTP {}", status),
            },
            FetchError::Transport(cause) => Outcome::TransientFailure { cause },
        }
    }
}
