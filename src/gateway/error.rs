//! Errors reported by agent gateways

use std::time::Duration;

/// Errors that can occur while talking to an agent session service
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Failed to create session: {0}")]
    SessionCreate(String),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Failed to destroy session {session}: {message}")]
    SessionDestroy { session: String, message: String },

    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Missing API key: environment variable {env_var} not set")]
    MissingApiKey { env_var: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_error_display() {
        let err = GatewayError::Send("boom".to_string());
        assert_eq!(err.to_string(), "Send failed: boom");
    }

    #[test]
    fn test_destroy_error_display() {
        let err = GatewayError::SessionDestroy {
            session: "session-1".to_string(),
            message: "already gone".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to destroy session session-1: already gone");
    }

    #[test]
    fn test_api_error_display() {
        let err = GatewayError::Api {
            status: 500,
            message: "Internal error".to_string(),
        };
        assert_eq!(err.to_string(), "API error 500: Internal error");
    }

    #[test]
    fn test_rate_limited_display() {
        let err = GatewayError::RateLimited {
            retry_after: Duration::from_secs(60),
        };
        assert_eq!(err.to_string(), "Rate limited, retry after 60s");
    }

    #[test]
    fn test_missing_api_key_display() {
        let err = GatewayError::MissingApiKey {
            env_var: "ANTHROPIC_API_KEY".to_string(),
        };
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }
}
