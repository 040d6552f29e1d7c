//! OAuth 2.0 token endpoint client.
//!
//! Every flow in this crate talks to `<base>/services/oauth2/token` with
//! form-encoded POSTs; the base is normally the org's instance URL.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::credentials::SalesforceCredentials;
use crate::error::{Error, ErrorKind, Result};

/// Path of the OAuth token endpoint, relative to the instance or login URL.
pub const TOKEN_PATH: &str = "/services/oauth2/token";

/// OAuth 2.0 configuration for a connected app.
///
/// Sensitive fields like `consumer_secret` are redacted in Debug output
/// to prevent accidental exposure in logs.
#[derive(Clone)]
pub struct OAuthConfig {
    /// Consumer key (client_id).
    pub consumer_key: String,
    /// Consumer secret (client_secret). Device flow apps have none.
    consumer_secret: Option<String>,
    /// Scopes to request.
    pub scopes: Vec<String>,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &self.consumer_secret.as_ref().map(|_| "[REDACTED]"))
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl OAuthConfig {
    /// Create a new OAuth config.
    ///
    /// The default scopes are `full refresh_token`.
    pub fn new(consumer_key: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: None,
            scopes: vec!["full".to_string(), "refresh_token".to_string()],
        }
    }

    /// Set the consumer secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.consumer_secret = Some(secret.into());
        self
    }

    pub(crate) fn consumer_secret(&self) -> Option<&str> {
        self.consumer_secret.as_deref()
    }

    /// Set the scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Scopes joined with spaces, as the token endpoint expects them.
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}

/// OAuth client for the refresh-token exchange.
#[derive(Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OAuthClient {
    /// Create a new OAuth client.
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Get the OAuth config.
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// `base_url` is the instance (or login) URL; the token endpoint path is
    /// appended. The refresh token is not logged.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_token(&self, refresh_token: &str, base_url: &str) -> Result<TokenResponse> {
        if refresh_token.is_empty() {
            return Err(Error::new(ErrorKind::Config(
                "Must set refresh_token before refreshing access token".to_string(),
            )));
        }

        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("client_id", self.config.consumer_key.as_str()),
            ("refresh_token", refresh_token),
        ];
        if let Some(secret) = self.config.consumer_secret() {
            params.push(("client_secret", secret));
        }

        let response = post_form(&self.http_client, base_url, &params).await?;
        let token = handle_token_response(response).await?;
        info!("Access token refreshed");
        Ok(token)
    }
}

/// POST form parameters to the token endpoint under `base_url`.
pub(crate) async fn post_form(
    http_client: &reqwest::Client,
    base_url: &str,
    params: &[(&str, &str)],
) -> Result<reqwest::Response> {
    let body = serde_urlencoded::to_string(params)?;
    let url = format!("{}{}", base_url.trim_end_matches('/'), TOKEN_PATH);

    let response = http_client
        .post(url)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(body)
        .send()
        .await?;

    Ok(response)
}

/// Turn a token endpoint response into a token or an OAuth error.
pub(crate) async fn handle_token_response(response: reqwest::Response) -> Result<TokenResponse> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        return serde_json::from_str(&body).map_err(Into::into);
    }

    Err(oauth_error(status.as_u16(), &body))
}

/// Parse an OAuth error body, falling back to the HTTP status.
pub(crate) fn oauth_error(status: u16, body: &str) -> Error {
    match serde_json::from_str::<OAuthErrorResponse>(body) {
        Ok(err) => Error::new(ErrorKind::OAuth {
            error: err.error,
            description: err.error_description,
        }),
        Err(_) => Error::new(ErrorKind::Http(format!(
            "Unexpected response status: {status}"
        ))),
    }
}

/// Token response from OAuth.
///
/// Sensitive fields like `access_token` and `refresh_token` are redacted
/// in Debug output to prevent accidental exposure in logs.
#[derive(Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Refresh token (only issued by the initial grant).
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Instance URL.
    #[serde(default)]
    pub instance_url: Option<String>,
    /// User ID URL.
    #[serde(default)]
    pub id: Option<String>,
    /// Token type (usually "Bearer").
    #[serde(default)]
    pub token_type: Option<String>,
    /// Scopes granted.
    #[serde(default)]
    pub scope: Option<String>,
    /// Signature for verification.
    #[serde(default)]
    pub signature: Option<String>,
    /// Issued at timestamp.
    #[serde(default)]
    pub issued_at: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("instance_url", &self.instance_url)
            .field("id", &self.id)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("signature", &self.signature.as_ref().map(|_| "[REDACTED]"))
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

impl TokenResponse {
    /// Convert to SalesforceCredentials.
    ///
    /// `fallback_instance_url` is used when the response carries no
    /// `instance_url` (refresh responses from some orgs).
    pub fn to_credentials(
        &self,
        fallback_instance_url: &str,
        api_version: &str,
    ) -> SalesforceCredentials {
        let instance_url = self
            .instance_url
            .as_deref()
            .unwrap_or(fallback_instance_url);
        let mut creds = SalesforceCredentials::new(instance_url, &self.access_token, api_version);

        if let Some(ref rt) = self.refresh_token {
            creds = creds.with_refresh_token(rt);
        }

        creds
    }
}

/// OAuth error response.
#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: String,
}
