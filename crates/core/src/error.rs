//! Error types for the Clickmon domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external collaborator has its own error enum.

use thiserror::Error;

/// Failures talking to the task-tracking API.
///
/// A non-success HTTP status on a read is *not* an error (the client maps it
/// to an absent task or an empty comment list). These variants cover the
/// faults the monitor has to catch at its cycle boundary.
#[derive(Debug, Clone, Error)]
pub enum TaskServiceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider returned an empty response")]
    EmptyResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn decode_error_names_endpoint() {
        let err = TaskServiceError::Decode {
            endpoint: "/task/abc/comment".into(),
            reason: "expected array".into(),
        };
        let text = err.to_string();
        assert!(text.starts_with("Failed to decode"));
        assert!(text.contains("/task/abc/comment"));
    }
}
