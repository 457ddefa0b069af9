use thiserror::Error;

/// Raised by the tally reducer when a candidate record cannot be counted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TallyError {
    #[error("invalid tally input for candidate {candidate_id}: {reason}")]
    InvalidTallyInput { candidate_id: String, reason: String },
}

impl TallyError {
    pub fn invalid(candidate_id: impl Into<String>, reason: impl Into<String>) -> Self {
        TallyError::InvalidTallyInput {
            candidate_id: candidate_id.into(),
            reason: reason.into(),
        }
    }
}

/// Everything that can go wrong between issuing a results request and
/// holding a normalized `Election`.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend answered with status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("could not decode results payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("malformed results payload: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    InvalidTally(#[from] TallyError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("could not build http client: {0}")]
    Http(#[from] reqwest::Error),
}
