//! OAuth 2.0 device flow for interactive login.
//!
//! The user is shown a verification URL, approves access in a browser, and
//! meanwhile the token endpoint is polled until it hands out tokens or the
//! deadline passes.

use std::time::Duration;

use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::error::{Error, ErrorKind, Result};
use crate::oauth::{handle_token_response, oauth_error, post_form, OAuthConfig, TokenResponse};

/// How long to wait for the user before giving up.
pub const DEFAULT_APPROVAL_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Device flow authenticator.
#[derive(Clone)]
pub struct DeviceFlowAuth {
    config: OAuthConfig,
    base_url: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for DeviceFlowAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceFlowAuth")
            .field("config", &self.config)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Verification details returned by the first device-flow request.
#[derive(Clone, Deserialize)]
pub struct DeviceVerification {
    /// Where the user goes to approve access.
    pub verification_uri: String,
    /// Code the user confirms on the verification page.
    pub user_code: String,
    /// Opaque code used while polling.
    pub device_code: String,
    /// Minimum delay between polls.
    #[serde(default = "default_interval", deserialize_with = "interval_from_secs")]
    pub interval: Duration,
}

impl std::fmt::Debug for DeviceVerification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceVerification")
            .field("verification_uri", &self.verification_uri)
            .field("user_code", &self.user_code)
            .field("device_code", &"[REDACTED]")
            .field("interval", &self.interval)
            .finish()
    }
}

fn default_interval() -> Duration {
    Duration::from_secs(1)
}

fn interval_from_secs<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let secs = Option::<u64>::deserialize(deserializer)?;
    Ok(secs.map(Duration::from_secs).unwrap_or_else(default_interval))
}

impl DeviceVerification {
    /// The verification URI with the user code attached as `user_code`.
    pub fn verification_url(&self) -> Result<String> {
        let url = url::Url::parse_with_params(
            &self.verification_uri,
            [("user_code", self.user_code.as_str())],
        )?;
        Ok(url.into())
    }
}

impl DeviceFlowAuth {
    /// Create a device flow authenticator for the token endpoint under `base_url`.
    pub fn new(config: OAuthConfig, base_url: impl Into<String>) -> Result<Self> {
        if config.consumer_key.is_empty() {
            return Err(Error::new(ErrorKind::Config(
                "Missing required config: client_id".to_string(),
            )));
        }

        Ok(Self {
            config,
            base_url: base_url.into(),
            http_client: reqwest::Client::new(),
        })
    }

    /// Start the flow: ask for a user code and verification URI.
    #[instrument(skip(self))]
    pub async fn request_verification(&self) -> Result<DeviceVerification> {
        let scope = self.config.scope_string();
        let params = [
            ("response_type", "device_code"),
            ("scope", scope.as_str()),
            ("client_id", self.config.consumer_key.as_str()),
        ];

        let response = post_form(&self.http_client, &self.base_url, &params).await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(oauth_error(status.as_u16(), &body));
        }

        let verification: DeviceVerification = serde_json::from_str(&body)?;
        info!(user_code = %verification.user_code, "Device verification requested");
        Ok(verification)
    }

    /// Poll the token endpoint once.
    ///
    /// Returns [`ErrorKind::DevicePending`] or [`ErrorKind::DeviceSlowDown`]
    /// while the user has not approved yet; other OAuth errors are final.
    #[instrument(skip(self, device_code))]
    pub async fn poll_token(&self, device_code: &str) -> Result<TokenResponse> {
        let params = [
            ("grant_type", "device"),
            ("client_id", self.config.consumer_key.as_str()),
            ("code", device_code),
        ];

        let response = post_form(&self.http_client, &self.base_url, &params).await?;
        handle_token_response(response)
            .await
            .map_err(classify_device_error)
    }

    /// Poll until the user approves, the flow fails, or `timeout` elapses.
    ///
    /// A timeout is not an error: it returns `Ok(None)`.
    #[instrument(skip(self, verification))]
    pub async fn wait_for_approval(
        &self,
        verification: &DeviceVerification,
        timeout: Duration,
    ) -> Result<Option<TokenResponse>> {
        let deadline = Instant::now() + timeout;
        let mut interval = verification.interval;

        while Instant::now() < deadline {
            match self.poll_token(&verification.device_code).await {
                Ok(token) => {
                    info!("Device authorization approved");
                    return Ok(Some(token));
                }
                Err(err) => match err.kind {
                    ErrorKind::DeviceSlowDown => {
                        interval += Duration::from_secs(1);
                        debug!(interval_ms = interval.as_millis(), "Slowing down device polling");
                    }
                    ErrorKind::DevicePending => debug!("Authorization pending"),
                    _ => return Err(err),
                },
            }

            tokio::time::sleep(interval).await;
        }

        warn!("Verification timeout");
        Ok(None)
    }
}

/// Map the device-flow specific OAuth errors to their own kinds and give
/// the remaining ones a readable description.
fn classify_device_error(err: Error) -> Error {
    let ErrorKind::OAuth { error, description } = &err.kind else {
        return err;
    };

    let message = match error.as_str() {
        "authorization_pending" => return Error::new(ErrorKind::DevicePending),
        "slow_down" => return Error::new(ErrorKind::DeviceSlowDown),
        "server_error" | "invalid_request" => {
            format!("Error waiting for authorization: {description}")
        }
        "invalid_grant" => format!("Invalid grant for this app: {description}"),
        "access_denied" => format!("User denied access: {description}"),
        _ => format!("Unknown error: {error} ({description})"),
    };

    Error::new(ErrorKind::OAuth {
        error: error.clone(),
        description: message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn verification(interval: Duration) -> DeviceVerification {
        DeviceVerification {
            verification_uri: "https://login.salesforce.com/setup/connect".to_string(),
            user_code: "ABCD1234".to_string(),
            device_code: "device-code".to_string(),
            interval,
        }
    }

    #[test]
    fn test_verification_url_carries_user_code() {
        let url = verification(Duration::from_secs(5)).verification_url().unwrap();
        assert_eq!(
            url,
            "https://login.salesforce.com/setup/connect?user_code=ABCD1234"
        );
    }

    #[test]
    fn test_verification_deserializes_interval() {
        let v: DeviceVerification = serde_json::from_value(serde_json::json!({
            "verification_uri": "https://x.example.com/connect",
            "user_code": "U",
            "device_code": "D",
            "interval": 5
        }))
        .unwrap();
        assert_eq!(v.interval, Duration::from_secs(5));

        let v: DeviceVerification = serde_json::from_value(serde_json::json!({
            "verification_uri": "https://x.example.com/connect",
            "user_code": "U",
            "device_code": "D"
        }))
        .unwrap();
        assert_eq!(v.interval, Duration::from_secs(1));
        assert!(!format!("{v:?}").contains("\"D\""));
    }

    #[test]
    fn test_requires_client_id() {
        let err = DeviceFlowAuth::new(OAuthConfig::new(""), "https://x.example.com").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_classify_device_errors() {
        let oauth = |e: &str| {
            Error::new(ErrorKind::OAuth {
                error: e.to_string(),
                description: "desc".to_string(),
            })
        };

        assert!(matches!(
            classify_device_error(oauth("authorization_pending")).kind,
            ErrorKind::DevicePending
        ));
        assert!(matches!(
            classify_device_error(oauth("slow_down")).kind,
            ErrorKind::DeviceSlowDown
        ));
        let denied = classify_device_error(oauth("access_denied"));
        assert!(denied.to_string().contains("User denied access"));
    }

    #[tokio::test]
    async fn test_request_verification() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .and(body_string_contains("response_type=device_code"))
            .and(body_string_contains("scope=full+refresh_token"))
            .and(body_string_contains("client_id=cid"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "verification_uri": "https://myorg.my.salesforce.com/setup/connect",
                "user_code": "WXYZ",
                "device_code": "dc-1",
                "interval": 5
            })))
            .mount(&mock_server)
            .await;

        let auth = DeviceFlowAuth::new(OAuthConfig::new("cid"), mock_server.uri()).unwrap();
        let verification = auth.request_verification().await.unwrap();

        assert_eq!(verification.user_code, "WXYZ");
        assert_eq!(verification.device_code, "dc-1");
        assert_eq!(verification.interval, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_wait_for_approval_after_pending() {
        let mock_server = MockServer::start().await;
        let polls = Arc::new(AtomicU32::new(0));
        let polls_clone = polls.clone();

        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .and(body_string_contains("grant_type=device"))
            .respond_with(move |_: &wiremock::Request| {
                if polls_clone.fetch_add(1, Ordering::SeqCst) < 2 {
                    ResponseTemplate::new(400).set_body_json(serde_json::json!({
                        "error": "authorization_pending",
                        "error_description": "waiting"
                    }))
                } else {
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({
                        "access_token": "at",
                        "refresh_token": "rt",
                        "instance_url": "https://myorg.my.salesforce.com"
                    }))
                }
            })
            .mount(&mock_server)
            .await;

        let auth = DeviceFlowAuth::new(OAuthConfig::new("cid"), mock_server.uri()).unwrap();
        let token = auth
            .wait_for_approval(&verification(Duration::from_millis(10)), Duration::from_secs(10))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(token.access_token, "at");
        assert_eq!(token.refresh_token.as_deref(), Some("rt"));
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_wait_for_approval_times_out_with_none() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "authorization_pending",
                "error_description": "waiting"
            })))
            .mount(&mock_server)
            .await;

        let auth = DeviceFlowAuth::new(OAuthConfig::new("cid"), mock_server.uri()).unwrap();
        let result = auth
            .wait_for_approval(&verification(Duration::from_millis(10)), Duration::from_millis(100))
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_wait_for_approval_fails_on_denial() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "access_denied",
                "error_description": "end-user denied authorization"
            })))
            .mount(&mock_server)
            .await;

        let auth = DeviceFlowAuth::new(OAuthConfig::new("cid"), mock_server.uri()).unwrap();
        let err = auth
            .wait_for_approval(&verification(Duration::from_millis(10)), Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("User denied access"));
    }
}
