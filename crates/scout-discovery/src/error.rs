use thiserror::Error;

pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Errors from the upstream discovery calls.
///
/// `Transport` and `TransientStatus` are retried with backoff by the
/// generic retrying call; everything else is terminal for the whole
/// candidate fetch.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Context cancelled while waiting or backing off.
    #[error("discovery cancelled")]
    Cancelled,

    /// Retryable HTTP status (429 or 5xx).
    #[error("API error: {0}")]
    TransientStatus(u16),

    /// Non-retryable HTTP status.
    #[error("API error: {status} - {body}")]
    Terminal {
        status: u16,
        body: String,
    },

    /// Retry ceiling reached; wraps the last transient failure.
    #[error("max retries exceeded after {attempts} attempts")]
    Exhausted {
        attempts: u32,
        #[source]
        source: Box<DiscoveryError>,
    },

    /// Every configured credential was rejected with 401.
    #[error("all Moralis API keys failed")]
    AllCredentialsFailed,

    /// Connection-level failure from the HTTP client.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream returned a 2xx body that doesn't decode.
    #[error("failed to decode upstream JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl DiscoveryError {
    /// Whether the generic retrying call should try again.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DiscoveryError::Transport(_) | DiscoveryError::TransientStatus(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(DiscoveryError::TransientStatus(429).is_transient());
        assert!(DiscoveryError::TransientStatus(503).is_transient());
        assert!(!DiscoveryError::Cancelled.is_transient());
        assert!(!DiscoveryError::Terminal {
            status: 403,
            body: String::new()
        }
        .is_transient());
        assert!(!DiscoveryError::AllCredentialsFailed.is_transient());
    }

    #[test]
    fn test_exhausted_wraps_last_failure() {
        let err = DiscoveryError::Exhausted {
            attempts: 4,
            source: Box::new(DiscoveryError::TransientStatus(429)),
        };
        assert_eq!(err.to_string(), "max retries exceeded after 4 attempts");

        let source = std::error::Error::source(&err).expect("has source");
        assert_eq!(source.to_string(), "API error: 429");
    }
}
