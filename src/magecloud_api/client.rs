use crate::magecloud_api::credentials::{ensure_credential, session_token_from_env};
use crate::magecloud_api::endpoints::{Endpoints, CLIENT_BASIC_CREDENTIAL};
use crate::magecloud_api::types::{
    ApiError, MageCloudError, TokenExchangeRequest, TokenExchangeResponse,
};
use reqwest::Method;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// HTTP client for the Magento Cloud API family
///
/// The client owns the cached session token and handles the full request
/// lifecycle: credential check, token exchange, authorized requests with a
/// single refresh-and-retry on failure, and US-to-EU region fallback for
/// platform requests.
///
/// Cloning is cheap and clones share the session cache, so a refresh
/// performed through one handle is visible to the others.
#[derive(Clone)]
pub struct MageCloudClient {
    /// HTTP client for making requests
    client: reqwest::Client,
    /// Base URLs for the accounts and regional platform services
    endpoints: Endpoints,
    /// Where the long-lived API token comes from
    credentials: CredentialSource,
    /// Cached session (bearer) token; holds at most one value, always
    /// overwritten on refresh
    session: Arc<Mutex<Option<String>>>,
}

/// Remediation text for an injected token that turns out to be empty
const EMPTY_TOKEN_REMEDIATION: &str =
    "The configured API token is empty. Provide a non-empty token or set the \
     MAGECLOUD_API_TOKEN environment variable.";

/// Source of the long-lived API token, checked on every call
#[derive(Clone)]
enum CredentialSource {
    /// Read MAGECLOUD_API_TOKEN from the process environment at call time
    Environment,
    /// Use an explicitly injected token
    Explicit(String),
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Environment => f.write_str("Environment"),
            CredentialSource::Explicit(_) => f.write_str("Explicit(..)"),
        }
    }
}

impl fmt::Debug for MageCloudClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MageCloudClient")
            .field("endpoints", &self.endpoints)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl MageCloudClient {
    /// Create a client for the production Magento Cloud endpoints.
    ///
    /// The session cache is pre-seeded from `PLATFORMSH_SESSION_TOKEN` when
    /// that variable is set; otherwise the first authorized request performs
    /// a token exchange.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use magecloud_sdk::MageCloudClient;
    ///
    /// let client = MageCloudClient::new();
    /// ```
    pub fn new() -> Self {
        Self::assemble(Endpoints::default(), session_token_from_env())
    }

    /// Create a client against custom base URLs.
    ///
    /// The session cache starts empty regardless of the environment; use
    /// [`with_session`](Self::with_session) to pre-seed it.
    pub fn with_endpoints(endpoints: Endpoints) -> Self {
        Self::assemble(endpoints, None)
    }

    fn assemble(endpoints: Endpoints, session: Option<String>) -> Self {
        tracing::debug!(
            "Creating MageCloudClient (accounts: {}, session pre-seeded: {})",
            endpoints.accounts,
            session.is_some()
        );

        Self {
            client: reqwest::Client::new(),
            endpoints,
            credentials: CredentialSource::Environment,
            session: Arc::new(Mutex::new(session)),
        }
    }

    /// Use an explicitly injected API token instead of the environment.
    pub fn with_api_token(mut self, api_token: impl Into<String>) -> Self {
        self.credentials = CredentialSource::Explicit(api_token.into());
        self
    }

    /// Pre-seed the session cache with an externally obtained token.
    pub fn with_session(mut self, session_token: impl Into<String>) -> Self {
        self.session = Arc::new(Mutex::new(Some(session_token.into())));
        self
    }

    /// Base URLs this client sends requests to
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// The currently cached session token, if any
    pub async fn session_token(&self) -> Option<String> {
        self.session.lock().await.clone()
    }

    /// Resolve the long-lived API token, failing with remediation text if it
    /// is missing or empty. Checked before every network-touching operation.
    fn credential(&self) -> Result<String, MageCloudError> {
        match &self.credentials {
            CredentialSource::Environment => ensure_credential(),
            CredentialSource::Explicit(token) if !token.is_empty() => Ok(token.clone()),
            CredentialSource::Explicit(_) => {
                Err(MageCloudError::Config(EMPTY_TOKEN_REMEDIATION.to_string()))
            }
        }
    }

    /// Exchange a long-lived API token for a session (bearer) token.
    ///
    /// Performs a `POST` to the accounts token endpoint identified by the
    /// public CLI client credential. On success the new token overwrites the
    /// session cache and is returned. On any failure (network error, non-2xx
    /// status, malformed body, missing `access_token`) the cache is left
    /// untouched and a [`MageCloudError::Exchange`] is returned.
    ///
    /// # Arguments
    ///
    /// * `api_token` - The long-lived API token to exchange
    pub async fn exchange_token(&self, api_token: &str) -> Result<String, MageCloudError> {
        if api_token.is_empty() {
            return Err(MageCloudError::Config(EMPTY_TOKEN_REMEDIATION.to_string()));
        }

        let token = self.request_session_token(api_token).await?;

        *self.session.lock().await = Some(token.clone());
        tracing::info!("Session token refreshed");

        Ok(token)
    }

    /// Perform the token exchange call without touching the session cache.
    async fn request_session_token(&self, api_token: &str) -> Result<String, MageCloudError> {
        let url = self.endpoints.token_url();

        tracing::debug!("Exchanging API token for a session token at: {}", url);

        let payload = TokenExchangeRequest {
            grant_type: "api_token",
            api_token,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Basic {}", CLIENT_BASIC_CREDENTIAL))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send token exchange request: {}", e);
                MageCloudError::Exchange(ApiError::from(e).to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            tracing::error!(
                "Token exchange failed: HTTP {} - {}",
                status.as_u16(),
                error_body
            );

            return Err(MageCloudError::Exchange(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_body
            )));
        }

        let parsed: TokenExchangeResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse token exchange response: {}", e);
            MageCloudError::Exchange(format!("malformed response: {}", e))
        })?;

        Ok(parsed.access_token)
    }

    /// Refresh the session token after a failed request.
    ///
    /// Runs under the session lock so concurrent callers hitting a stale
    /// token at the same time perform a single exchange: whoever gets the
    /// lock first refreshes, the rest observe the replaced token and reuse
    /// it.
    async fn refresh_session(
        &self,
        api_token: &str,
        stale: &str,
    ) -> Result<String, MageCloudError> {
        let mut guard = self.session.lock().await;

        if let Some(current) = guard.as_deref() {
            if current != stale {
                tracing::debug!("Session token already refreshed by a concurrent caller");
                return Ok(current.to_string());
            }
        }

        let token = self.request_session_token(api_token).await?;
        *guard = Some(token.clone());
        tracing::info!("Session token refreshed");

        Ok(token)
    }

    /// Issue an authorized request against an absolute URL.
    ///
    /// The credential check runs first on every call. With no cached session
    /// token the exchange happens eagerly and the request is issued once;
    /// with a cached token the request is attempted immediately and, if it
    /// fails with a retryable error (HTTP error status, response parse
    /// failure, or network error), the token is refreshed and the request
    /// retried exactly once. A second failure propagates unmodified.
    ///
    /// Returns the parsed JSON body of the successful response.
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute request URL
    /// * `method` - HTTP method
    /// * `data` - Optional JSON request body
    pub async fn authorized_request(
        &self,
        url: &str,
        method: Method,
        data: Option<&Value>,
    ) -> Result<Value, MageCloudError> {
        let api_token = self.credential()?;

        let cached = self.session.lock().await.clone();

        match cached {
            None => {
                let token = self.exchange_token(&api_token).await?;
                self.send_authorized(url, &token, method, data)
                    .await
                    .map_err(MageCloudError::Api)
            }
            Some(token) => match self.send_authorized(url, &token, method.clone(), data).await {
                Ok(body) => Ok(body),
                Err(err) if err.is_retryable() => {
                    tracing::debug!(
                        "Request to {} failed ({}), refreshing session token and retrying once",
                        url,
                        err
                    );
                    let fresh = self.refresh_session(&api_token, &token).await?;
                    self.send_authorized(url, &fresh, method, data)
                        .await
                        .map_err(MageCloudError::Api)
                }
                Err(err) => Err(MageCloudError::Api(err)),
            },
        }
    }

    /// Generic authorized request, one attempt, no retry.
    async fn send_authorized(
        &self,
        url: &str,
        session_token: &str,
        method: Method,
        data: Option<&Value>,
    ) -> Result<Value, ApiError> {
        tracing::debug!("Sending {} request to: {}", method, url);

        let mut request = self
            .client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", session_token))
            .header("Content-Type", "application/json");

        if let Some(body) = data {
            request = request.json(body);
        }

        let response = request.send().await.map_err(ApiError::from)?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            tracing::error!("Request failed: HTTP {} - {}", status.as_u16(), error_body);

            return Err(ApiError::Http {
                status: status.as_u16(),
                message: error_body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(format!("Failed to parse response JSON: {}", e)))
    }

    /// Request against the regional platform endpoints.
    ///
    /// With no explicit region the US endpoint is attempted first; if that
    /// attempt fails with a retryable API error the same request is issued
    /// once against the EU endpoint, whose failure propagates. Configuration
    /// and token-exchange failures skip the fallback since they would fail
    /// identically in either region.
    ///
    /// Explicit region targeting is not supported yet and fails with
    /// [`MageCloudError::Unimplemented`] before any network call.
    ///
    /// # Arguments
    ///
    /// * `endpoint_path` - Path suffix appended to the regional base URL
    /// * `method` - HTTP method
    /// * `data` - Optional JSON request body
    /// * `region` - Must be `None`; any value is rejected
    ///
    /// # Example
    ///
    /// ```no_run
    /// use magecloud_sdk::{MageCloudClient, Method};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = MageCloudClient::new();
    /// let projects = client
    ///     .regional_request("/api/projects", Method::GET, None, None)
    ///     .await?;
    /// println!("{}", projects);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn regional_request(
        &self,
        endpoint_path: &str,
        method: Method,
        data: Option<&Value>,
        region: Option<&str>,
    ) -> Result<Value, MageCloudError> {
        if let Some(region) = region {
            return Err(MageCloudError::Unimplemented(format!(
                "explicit region targeting is not supported yet (requested region: {})",
                region
            )));
        }

        let url = format!("{}{}", self.endpoints.us_platform, endpoint_path);
        match self.authorized_request(&url, method.clone(), data).await {
            Ok(body) => Ok(body),
            Err(MageCloudError::Api(err)) if err.is_retryable() => {
                tracing::warn!(
                    "US platform request failed ({}), falling back to the EU region",
                    err
                );
                let url = format!("{}{}", self.endpoints.eu_platform, endpoint_path);
                self.authorized_request(&url, method, data).await
            }
            Err(err) => Err(err),
        }
    }

    /// Request against the accounts endpoint. No region fallback applies.
    ///
    /// # Arguments
    ///
    /// * `endpoint_path` - Path suffix appended to the accounts base URL
    /// * `method` - HTTP method
    /// * `data` - Optional JSON request body
    pub async fn accounts_request(
        &self,
        endpoint_path: &str,
        method: Method,
        data: Option<&Value>,
    ) -> Result<Value, MageCloudError> {
        let url = format!("{}{}", self.endpoints.accounts, endpoint_path);
        self.authorized_request(&url, method, data).await
    }
}

impl Default for MageCloudClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_endpoints() -> Endpoints {
        Endpoints {
            accounts: "http://accounts.test".to_string(),
            us_platform: "http://us.test".to_string(),
            eu_platform: "http://eu.test".to_string(),
        }
    }

    #[test]
    fn test_client_creation_with_endpoints() {
        let client = MageCloudClient::with_endpoints(test_endpoints());
        assert_eq!(client.endpoints().accounts, "http://accounts.test");
        assert_eq!(client.endpoints().us_platform, "http://us.test");
        assert_eq!(client.endpoints().eu_platform, "http://eu.test");
    }

    #[tokio::test]
    async fn test_with_endpoints_starts_with_empty_session() {
        let client = MageCloudClient::with_endpoints(test_endpoints());
        assert!(client.session_token().await.is_none());
    }

    #[tokio::test]
    async fn test_with_session_seeds_cache() {
        let client =
            MageCloudClient::with_endpoints(test_endpoints()).with_session("seeded-token");
        assert_eq!(client.session_token().await.as_deref(), Some("seeded-token"));
    }

    #[tokio::test]
    async fn test_clones_share_session_cache() {
        let client = MageCloudClient::with_endpoints(test_endpoints());
        let other = client.clone();

        *client.session.lock().await = Some("shared".to_string());
        assert_eq!(other.session_token().await.as_deref(), Some("shared"));
    }

    #[tokio::test]
    async fn test_explicit_empty_api_token_is_config_error() {
        let client = MageCloudClient::with_endpoints(test_endpoints()).with_api_token("");

        let err = client
            .accounts_request("/api/me", Method::GET, None)
            .await
            .unwrap_err();
        assert!(matches!(err, MageCloudError::Config(_)));
    }

    #[test]
    fn test_token_exchange_request_serialization() {
        let request = TokenExchangeRequest {
            grant_type: "api_token",
            api_token: "my-api-token",
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"grant_type\":\"api_token\""));
        assert!(json.contains("\"api_token\":\"my-api-token\""));
    }

    #[test]
    fn test_debug_output_redacts_credentials() {
        let client = MageCloudClient::with_endpoints(test_endpoints())
            .with_api_token("secret-api-token")
            .with_session("secret-session-token");

        let debug = format!("{:?}", client);
        assert!(!debug.contains("secret-api-token"));
        assert!(!debug.contains("secret-session-token"));
    }
}
