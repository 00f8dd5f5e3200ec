/// Magento Cloud API integration module
///
/// This module provides the client for the Magento Cloud REST API family:
/// the accounts service and the US/EU regional platform services.
///
/// ## Request Flow
///
/// 1. Caller issues an accounts or regional request
/// 2. Client verifies a long-lived API token is configured (per call)
/// 3. On a cache miss the API token is exchanged for a session token at the
///    accounts token endpoint
/// 4. The request is sent with the session bearer token
/// 5. On a retryable failure the session token is refreshed once and the
///    request retried; regional requests additionally fall back US → EU
pub mod client;
pub mod credentials;
pub mod endpoints;
pub mod types;

pub use client::MageCloudClient;
pub use credentials::{ensure_credential, session_token_from_env};
pub use endpoints::Endpoints;
pub use types::{ApiError, MageCloudError, TokenExchangeResponse};
