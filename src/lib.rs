//! Magento Cloud SDK
//!
//! A Rust library for talking to the Magento Cloud REST API family.
//!
//! This SDK provides:
//! - Exchange of a long-lived API token for a short-lived session token
//! - Authorized requests that cache the session token and transparently
//!   refresh it once on failure
//! - Regional platform requests with US-to-EU fallback, plus direct
//!   accounts-service requests
//! - Environment-based credential configuration with user-facing errors
//!
//! # Example
//!
//! ```no_run
//! use magecloud_sdk::{ensure_credential, MageCloudClient, Method};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Fail fast with remediation text if no API token is configured
//! ensure_credential()?;
//!
//! let client = MageCloudClient::new();
//!
//! // Accounts-service request
//! let profile = client.accounts_request("/api/me", Method::GET, None).await?;
//! println!("{}", profile);
//!
//! // Regional platform request: tries the US endpoint, falls back to EU
//! let projects = client
//!     .regional_request("/api/projects", Method::GET, None, None)
//!     .await?;
//! println!("{}", projects);
//! # Ok(())
//! # }
//! ```

pub mod magecloud_api;

// Re-export commonly used types and functions
pub use magecloud_api::{
    client::MageCloudClient,
    credentials::{ensure_credential, session_token_from_env, API_TOKEN_ENV, SESSION_TOKEN_ENV},
    endpoints::{Endpoints, ACCOUNTS_URL, EU_PLATFORM_URL, TOKEN_PATH, US_PLATFORM_URL},
    types::{ApiError, MageCloudError, TokenExchangeResponse},
};

/// HTTP method type accepted by the request operations
pub use reqwest::Method;
