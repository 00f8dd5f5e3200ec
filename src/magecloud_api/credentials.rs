use crate::magecloud_api::types::MageCloudError;

/// Environment variable holding the long-lived API token
pub const API_TOKEN_ENV: &str = "MAGECLOUD_API_TOKEN";

/// Environment variable that may pre-seed the session token.
/// magento.cloud is a platform.sh derivative and the session variable kept
/// the upstream name.
pub const SESSION_TOKEN_ENV: &str = "PLATFORMSH_SESSION_TOKEN";

/// Read the long-lived API token from the environment.
///
/// The variable is read on every call, never captured at startup, so a token
/// set after the process launched is picked up. An absent or empty value is
/// a configuration error carrying remediation text for the user.
pub fn ensure_credential() -> Result<String, MageCloudError> {
    match std::env::var(API_TOKEN_ENV) {
        Ok(token) if !token.is_empty() => Ok(token),
        _ => {
            tracing::debug!("{} is not set", API_TOKEN_ENV);
            Err(MageCloudError::Config(format!(
                "Set the {} environment variable. You can get your API token \
                 under account settings at https://accounts.magento.cloud/user.",
                API_TOKEN_ENV
            )))
        }
    }
}

/// Read an externally pre-seeded session token, if any.
pub fn session_token_from_env() -> Option<String> {
    std::env::var(SESSION_TOKEN_ENV)
        .ok()
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// Set an environment variable for the duration of a test
    fn set_env_guard(key: &'static str, value: Option<&str>) -> impl Drop {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }

        struct Guard(&'static str);
        impl Drop for Guard {
            fn drop(&mut self) {
                std::env::remove_var(self.0);
            }
        }
        Guard(key)
    }

    #[test]
    #[serial]
    fn test_ensure_credential_missing() {
        let _guard = set_env_guard(API_TOKEN_ENV, None);

        let err = ensure_credential().unwrap_err();
        match err {
            MageCloudError::Config(msg) => {
                assert!(msg.contains("MAGECLOUD_API_TOKEN"));
                assert!(msg.contains("https://accounts.magento.cloud/user"));
            }
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_ensure_credential_empty_is_missing() {
        let _guard = set_env_guard(API_TOKEN_ENV, Some(""));

        assert!(matches!(
            ensure_credential(),
            Err(MageCloudError::Config(_))
        ));
    }

    #[test]
    #[serial]
    fn test_ensure_credential_present() {
        let _guard = set_env_guard(API_TOKEN_ENV, Some("api-token-123"));

        let token = ensure_credential().unwrap();
        assert_eq!(token, "api-token-123");
    }

    #[test]
    #[serial]
    fn test_session_token_from_env() {
        let _guard = set_env_guard(SESSION_TOKEN_ENV, Some("seeded-session"));
        assert_eq!(session_token_from_env().as_deref(), Some("seeded-session"));
    }

    #[test]
    #[serial]
    fn test_session_token_from_env_absent_or_empty() {
        {
            let _guard = set_env_guard(SESSION_TOKEN_ENV, None);
            assert!(session_token_from_env().is_none());
        }
        {
            let _guard = set_env_guard(SESSION_TOKEN_ENV, Some(""));
            assert!(session_token_from_env().is_none());
        }
    }
}
