//! Backend invocation error types.

use sy_protocol::BackendChoice;
use thiserror::Error;

/// Errors that can occur while talking to a language-model backend.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{backend} backend is not configured: {reason}")]
    NotConfigured {
        backend: BackendChoice,
        reason: String,
    },

    #[error("request to {endpoint} failed: {message}")]
    Request { endpoint: String, message: String },

    #[error("request to {endpoint} timed out after {secs}s")]
    Timeout { endpoint: String, secs: u64 },

    #[error("{endpoint} returned HTTP {status}: {detail}")]
    Status {
        endpoint: String,
        status: u16,
        detail: String,
    },

    #[error(
        "enterprise authentication failed after a token refresh; check the configured client id/secret ({0})"
    )]
    Authentication(String),

    #[error("token acquisition failed: {0}")]
    TokenAcquisition(String),

    #[error("invalid response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },

    #[error("no backend could answer: {0}")]
    Exhausted(String),
}

impl LlmError {
    /// Map a reqwest transport error, distinguishing timeouts.
    pub fn from_reqwest(endpoint: &str, err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            LlmError::Timeout {
                endpoint: endpoint.to_string(),
                secs: timeout_secs,
            }
        } else {
            LlmError::Request {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// Convenience alias for backend results.
pub type LlmResult<T> = Result<T, LlmError>;

/// Shorten an error body for inclusion in a message.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_configured_names_backend() {
        let err = LlmError::NotConfigured {
            backend: BackendChoice::SecondaryHosted,
            reason: "api_url and api_key must be set".into(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("openai backend"));
        assert!(msg.contains("api_key"));
    }

    #[test]
    fn authentication_mentions_credentials() {
        let err = LlmError::Authentication("HTTP 401".into());
        assert!(err.to_string().contains("client id/secret"));
    }
}
