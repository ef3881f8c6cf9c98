use thiserror::Error;

/// Failure of a single term's fetch pipeline. Carries the offending term so
/// the orchestrator can aggregate per-term outcomes without losing context.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("search for '{term}' failed with status {status}: {message}")]
    Upstream {
        term: String,
        status: u16,
        message: String,
    },

    #[error("search for '{term}' timed out")]
    Timeout { term: String },

    #[error("network error while searching '{term}': {source}")]
    Network {
        term: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed response for '{term}': {message}")]
    Malformed { term: String, message: String },
}

impl FetchError {
    #[must_use]
    pub fn term(&self) -> &str {
        match self {
            Self::Upstream { term, .. }
            | Self::Timeout { term }
            | Self::Network { term, .. }
            | Self::Malformed { term, .. } => term,
        }
    }

    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Timeouts get a distinct retry affordance upstream, so callers need to
    /// tell them apart from generic failures.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("enter at least one search term")]
    EmptyQuery,
}
