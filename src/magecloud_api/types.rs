use serde::{Deserialize, Serialize};
use std::fmt;

/// Magento Cloud API error type
///
/// Represents all possible errors that can occur when interacting with
/// the accounts or platform endpoints.
#[derive(Debug)]
pub enum MageCloudError {
    /// Long-lived API token is missing or empty. The message is
    /// user-facing remediation text, not a debugging trace.
    Config(String),
    /// Token exchange did not yield a usable session token
    Exchange(String),
    /// API request failed (network, HTTP, or response parsing error)
    Api(ApiError),
    /// The requested feature is not supported yet
    Unimplemented(String),
}

impl fmt::Display for MageCloudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MageCloudError::Config(msg) => write!(f, "{}", msg),
            MageCloudError::Exchange(msg) => write!(f, "Token exchange failed: {}", msg),
            MageCloudError::Api(err) => write!(f, "API error: {}", err),
            MageCloudError::Unimplemented(msg) => write!(f, "Not implemented: {}", msg),
        }
    }
}

impl std::error::Error for MageCloudError {}

impl From<ApiError> for MageCloudError {
    fn from(err: ApiError) -> Self {
        MageCloudError::Api(err)
    }
}

/// API-specific errors
#[derive(Debug)]
pub enum ApiError {
    /// Network error (connection, timeout, etc.)
    Network(String),
    /// HTTP error with status code
    Http { status: u16, message: String },
    /// Failed to parse response
    Parse(String),
    /// Request building failed
    Request(String),
}

impl ApiError {
    /// Whether a failure of this kind may be cured by refreshing the
    /// session token and retrying (or by trying the other region).
    /// Request-building failures are caller bugs and never retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Http { .. } | ApiError::Parse(_) => true,
            ApiError::Request(_) => false,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
            ApiError::Http { status, message } => {
                write!(f, "HTTP {} error: {}", status, message)
            }
            ApiError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ApiError::Request(msg) => write!(f, "Request error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timeout".to_string())
        } else if err.is_connect() {
            ApiError::Network(format!("Connection failed: {}", err))
        } else if let Some(status) = err.status() {
            ApiError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Request payload for the token exchange endpoint
#[derive(Debug, Serialize)]
pub(crate) struct TokenExchangeRequest<'a> {
    /// Fixed grant type for API-token exchange
    pub grant_type: &'a str,
    /// The long-lived API token being exchanged
    pub api_token: &'a str,
}

/// Response from the token exchange endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenExchangeResponse {
    /// The short-lived session (bearer) token
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ApiError::Network("timeout".to_string()).is_retryable());
        assert!(ApiError::Http {
            status: 401,
            message: "Unauthorized".to_string()
        }
        .is_retryable());
        assert!(ApiError::Parse("bad json".to_string()).is_retryable());
        assert!(!ApiError::Request("invalid body".to_string()).is_retryable());
    }

    #[test]
    fn test_config_error_display_is_bare_remediation() {
        // Configuration errors surface remediation text only, no error-kind
        // prefix and no transport detail.
        let err = MageCloudError::Config("Set the MAGECLOUD_API_TOKEN environment variable.".to_string());
        assert_eq!(
            err.to_string(),
            "Set the MAGECLOUD_API_TOKEN environment variable."
        );
    }

    #[test]
    fn test_api_error_display() {
        let err = MageCloudError::Api(ApiError::Http {
            status: 500,
            message: "Internal Server Error".to_string(),
        });
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("Internal Server Error"));
    }

    #[test]
    fn test_token_exchange_response_ignores_extra_fields() {
        let json = r#"{"access_token":"tok123","token_type":"Bearer","expires_in":900,"scope":"account"}"#;
        let parsed: TokenExchangeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.access_token, "tok123");
        assert_eq!(parsed.token_type.as_deref(), Some("Bearer"));
        assert_eq!(parsed.expires_in, Some(900));
    }

    #[test]
    fn test_token_exchange_response_requires_access_token() {
        let json = r#"{"error":"invalid_grant"}"#;
        let parsed: Result<TokenExchangeResponse, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }
}
