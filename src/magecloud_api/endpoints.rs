//! Fixed endpoint constants for the Magento Cloud API family.
//!
//! The accounts service owns authentication and account-level resources;
//! the platform service is deployed per region behind separate hosts with
//! otherwise-identical API surfaces.

/// Base URL for the accounts service (authentication, account resources)
pub const ACCOUNTS_URL: &str = "https://accounts.magento.cloud";

/// Base URL for the US platform region
pub const US_PLATFORM_URL: &str = "https://us.magento.cloud";

/// Base URL for the EU platform region
pub const EU_PLATFORM_URL: &str = "https://eu.magento.cloud";

/// Path of the token exchange endpoint on the accounts service
pub const TOKEN_PATH: &str = "/oauth2/token";

/// Pre-shared Basic credential identifying the CLI client to the token
/// endpoint. This is the base64 of `api_token_platform:` — a publicly known
/// client id, not a secret.
pub const CLIENT_BASIC_CREDENTIAL: &str = "YXBpX3Rva2VuX3BsYXRmb3JtOg==";

/// Base URLs the client sends requests to.
///
/// Defaults to the production Magento Cloud hosts. Overridable so tests can
/// point the client at a mock server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Accounts service base URL
    pub accounts: String,
    /// US platform base URL (primary region)
    pub us_platform: String,
    /// EU platform base URL (fallback region)
    pub eu_platform: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            accounts: ACCOUNTS_URL.to_string(),
            us_platform: US_PLATFORM_URL.to_string(),
            eu_platform: EU_PLATFORM_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// URL of the token exchange endpoint
    pub fn token_url(&self) -> String {
        format!("{}{}", self.accounts, TOKEN_PATH)
    }
}
