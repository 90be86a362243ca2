use thiserror::Error;

/// Errors returned by [`crate::ApiClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or TLS failure from the underlying HTTP client, including
    /// timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered 429.
    #[error("rate limited by the product API")]
    RateLimited,

    #[error("not found: {0}")]
    NotFound(String),

    /// 401/403, or a rejection whose message points at credentials.
    #[error("authentication required ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// Any other non-success status, with the human-readable message
    /// extracted from the body.
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ApiError {
    /// The request never produced a usable answer from the server: network
    /// failure, timeout, or a 5xx.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        match self {
            ApiError::Http(_) => true,
            ApiError::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }

    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

/// Whether a rejection message reads like a credentials problem even though
/// the status code does not say so.
#[must_use]
pub fn mentions_auth(message: &str) -> bool {
    let lower = message.to_lowercase();
    ["token", "unauthorized", "authentication"]
        .iter()
        .any(|needle| lower.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_count_as_transport() {
        let err = ApiError::Rejected {
            status: 502,
            message: "Bad Gateway".to_string(),
        };
        assert!(err.is_transport());
        assert!(!err.is_auth());
    }

    #[test]
    fn validation_errors_are_not_transport() {
        let err = ApiError::Rejected {
            status: 400,
            message: "price: required".to_string(),
        };
        assert!(!err.is_transport());
    }

    #[test]
    fn unauthorized_is_auth() {
        let err = ApiError::Unauthorized {
            status: 401,
            message: "Given token not valid".to_string(),
        };
        assert!(err.is_auth());
        assert!(!err.is_transport());
    }

    #[test]
    fn auth_message_detection() {
        assert!(mentions_auth("Authentication credentials were not provided."));
        assert!(mentions_auth("Token is expired"));
        assert!(!mentions_auth("price: A valid number is required."));
    }
}
