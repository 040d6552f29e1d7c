//! Credentials trait and implementations.
//!
//! All credential types implement custom Debug to redact sensitive data.

use crate::config::SfConfig;
use crate::error::{Error, ErrorKind, Result};

/// Trait for Salesforce credentials.
pub trait Credentials: Send + Sync {
    /// Get the Salesforce instance URL.
    fn instance_url(&self) -> &str;

    /// Get the access token.
    fn access_token(&self) -> &str;

    /// Get the API version (e.g., "53.0").
    fn api_version(&self) -> &str;

    /// Returns true if the credentials appear to be valid (non-empty).
    fn is_valid(&self) -> bool {
        !self.instance_url().is_empty() && !self.access_token().is_empty()
    }
}

/// Standard Salesforce credentials implementation.
///
/// Sensitive fields (access_token, refresh_token) are redacted in Debug output
/// to prevent accidental exposure in logs.
#[derive(Clone)]
pub struct SalesforceCredentials {
    instance_url: String,
    access_token: String,
    api_version: String,
    refresh_token: Option<String>,
}

impl std::fmt::Debug for SalesforceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceCredentials")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl SalesforceCredentials {
    /// Create new credentials with the given values.
    pub fn new(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            instance_url: instance_url.into(),
            access_token: access_token.into(),
            api_version: api_version.into(),
            refresh_token: None,
        }
    }

    /// Create credentials with a refresh token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Get the refresh token if available.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Set a new access token (e.g., after refresh).
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
    }

    /// Change the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Load credentials from environment variables.
    ///
    /// Required: `SF_INSTANCE_URL`, `SF_ACCESS_TOKEN`.
    /// Optional: `SF_API_VERSION`, `SF_REFRESH_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let env = SfConfig::from_env();
        if env.instance.is_none() {
            return Err(Error::new(ErrorKind::EnvVar("SF_INSTANCE_URL".to_string())));
        }
        if env.access_token.is_none() {
            return Err(Error::new(ErrorKind::EnvVar("SF_ACCESS_TOKEN".to_string())));
        }
        Self::from_config(&env)
    }

    /// Build credentials from a resolved profile.
    ///
    /// An absent access token is not an error here: the caller is expected
    /// to refresh before the first request in that case.
    pub fn from_config(config: &SfConfig) -> Result<Self> {
        let mut creds = Self::new(
            config.instance_url()?,
            config.access_token.clone().unwrap_or_default(),
            config.api_version(),
        );
        if let Some(rt) = &config.refresh_token {
            creds = creds.with_refresh_token(rt);
        }
        Ok(creds)
    }
}

impl Credentials for SalesforceCredentials {
    fn instance_url(&self) -> &str {
        &self.instance_url
    }

    fn access_token(&self) -> &str {
        &self.access_token
    }

    fn api_version(&self) -> &str {
        &self.api_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_new() {
        let creds = SalesforceCredentials::new("https://test.salesforce.com", "access_token_123", "53.0");

        assert_eq!(creds.instance_url(), "https://test.salesforce.com");
        assert_eq!(creds.access_token(), "access_token_123");
        assert_eq!(creds.api_version(), "53.0");
        assert!(creds.is_valid());
    }

    #[test]
    fn test_invalid_credentials() {
        let creds = SalesforceCredentials::new("", "", "53.0");
        assert!(!creds.is_valid());
    }

    #[test]
    fn test_from_config() {
        let config = SfConfig {
            instance: Some("myorg.my.salesforce.com".into()),
            access_token: Some("at".into()),
            refresh_token: Some("rt".into()),
            api_version: Some("58.0".into()),
            ..SfConfig::production()
        };

        let creds = SalesforceCredentials::from_config(&config).unwrap();
        assert_eq!(creds.instance_url(), "https://myorg.my.salesforce.com");
        assert_eq!(creds.access_token(), "at");
        assert_eq!(creds.refresh_token(), Some("rt"));
        assert_eq!(creds.api_version(), "58.0");
    }

    #[test]
    fn test_from_config_without_instance() {
        let err = SalesforceCredentials::from_config(&SfConfig::production()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_set_access_token() {
        let mut creds = SalesforceCredentials::new("https://x.my.salesforce.com", "old", "53.0");
        creds.set_access_token("new");
        assert_eq!(creds.access_token(), "new");
    }

    #[test]
    fn test_credentials_debug_redacts_tokens() {
        let creds = SalesforceCredentials::new(
            "https://test.salesforce.com",
            "super_secret_access_token_12345",
            "53.0",
        )
        .with_refresh_token("super_secret_refresh_token_67890");

        let debug_output = format!("{:?}", creds);

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_access_token_12345"));
        assert!(!debug_output.contains("super_secret_refresh_token_67890"));
        assert!(debug_output.contains("test.salesforce.com"));
    }
}
