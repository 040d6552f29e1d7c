//! Session handling and one-shot refresh on expiry.
//!
//! Every remote call of this crate goes through [`call_with_refresh`]. When
//! the access token has expired, the session is refreshed once and the call
//! is repeated once; a second expiry is returned to the caller.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sftools_auth::{
    Credentials, ErrorKind as AuthErrorKind, OAuthClient, OAuthConfig, ProfileStore,
    SalesforceCredentials, SfConfig,
};
use sftools_client::{ClientConfig, SalesforceClient};
use tracing::{debug, info, instrument, warn};

use crate::error::{Error, ErrorKind, Result};

/// Something that can renew an expired session.
#[allow(async_fn_in_trait)]
pub trait SessionRefresher {
    /// Obtain a fresh access token.
    ///
    /// Missing configuration (no refresh token, no client id) must be
    /// reported as an [`ErrorKind::Config`] error.
    async fn refresh_session(&self) -> Result<()>;
}

/// Run `action`, refreshing the session and retrying once if it expired.
///
/// - If the refresh fails for lack of configuration, the original expiry
///   error is returned.
/// - Any other refresh failure is returned as is.
/// - `after_refresh` runs between a successful refresh and the retry.
pub async fn call_with_refresh<R, T, F, Fut>(
    refresher: &R,
    mut action: F,
    after_refresh: Option<&dyn Fn()>,
) -> Result<T>
where
    R: SessionRefresher,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let expired = match action().await {
        Err(err) if err.is_session_expired() => err,
        other => return other,
    };

    warn!(error = %expired, "Session expired, refreshing access token");
    if let Err(err) = refresher.refresh_session().await {
        if err.is_configuration() {
            debug!(error = %err, "Session refresh not configured");
            return Err(expired);
        }
        return Err(err);
    }

    if let Some(after_refresh) = after_refresh {
        after_refresh();
    }
    action().await
}

/// Lock a cache mutex, recovering the data if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An authenticated connection to one org.
///
/// Holds the current [`SalesforceClient`] and what is needed to refresh it.
/// When a profile store is attached, refreshed access tokens are written
/// back to the profile.
pub struct Session {
    client: Mutex<SalesforceClient>,
    oauth: Option<OAuthClient>,
    refresh_token: Option<String>,
    store: Option<(Arc<dyn ProfileStore>, String)>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client", &*self.lock())
            .field("oauth", &self.oauth)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("profile", &self.store.as_ref().map(|(_, p)| p))
            .finish()
    }
}

impl Session {
    /// A session that cannot refresh itself.
    pub fn new(client: SalesforceClient) -> Self {
        Self {
            client: Mutex::new(client),
            oauth: None,
            refresh_token: None,
            store: None,
        }
    }

    /// Build a session from a resolved profile.
    ///
    /// Only `instance` is required here. Without an access token every call
    /// starts with an expired session, which triggers a refresh.
    pub fn from_config(config: &SfConfig) -> Result<Self> {
        Self::from_config_with(config, ClientConfig::default())
    }

    /// Like [`Session::from_config`] with custom HTTP settings.
    pub fn from_config_with(config: &SfConfig, client_config: ClientConfig) -> Result<Self> {
        let creds = SalesforceCredentials::from_config(config)?;
        let client =
            SalesforceClient::with_config(creds.instance_url(), creds.access_token(), client_config)?
                .with_api_version(creds.api_version());

        let mut session = Self::new(client);
        if let Some(client_id) = &config.client_id {
            session = session.with_oauth(OAuthClient::new(OAuthConfig::new(client_id)));
        }
        if let Some(refresh_token) = creds.refresh_token() {
            session = session.with_refresh_token(refresh_token);
        }
        Ok(session)
    }

    /// Use this OAuth client for refreshes.
    pub fn with_oauth(mut self, oauth: OAuthClient) -> Self {
        self.oauth = Some(oauth);
        self
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into()).filter(|t| !t.is_empty());
        self
    }

    /// Persist refreshed access tokens to `profile` in `store`.
    pub fn with_store(mut self, store: Arc<dyn ProfileStore>, profile: impl Into<String>) -> Self {
        self.store = Some((store, profile.into()));
        self
    }

    fn lock(&self) -> MutexGuard<'_, SalesforceClient> {
        lock(&self.client)
    }

    /// The client bound to the current access token.
    pub fn client(&self) -> SalesforceClient {
        self.lock().clone()
    }

    /// Whether a refresh could be attempted at all.
    pub fn can_refresh(&self) -> bool {
        self.oauth.is_some() && self.refresh_token.is_some()
    }

    fn persist_access_token(&self, access_token: &str) -> Result<()> {
        let Some((store, profile)) = &self.store else {
            return Ok(());
        };

        let mut file = store.load(profile)?.unwrap_or_default();
        file.access_token = Some(access_token.to_string());
        match store.save(profile, &file) {
            Ok(()) => Ok(()),
            Err(err) if matches!(err.kind, AuthErrorKind::ReadOnly(_)) => {
                warn!(profile = %profile, "Profile is read-only, refreshed token not saved");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl SessionRefresher for Session {
    #[instrument(skip(self))]
    async fn refresh_session(&self) -> Result<()> {
        let refresh_token = self.refresh_token.as_deref().ok_or_else(|| {
            Error::new(ErrorKind::Config(
                "Must set refresh_token before refreshing access token".to_string(),
            ))
        })?;
        let oauth = self.oauth.as_ref().ok_or_else(|| {
            Error::new(ErrorKind::Config(
                "Missing required config: client_id".to_string(),
            ))
        })?;

        let current = self.client();
        let token = oauth
            .refresh_token(refresh_token, current.instance_url())
            .await?;

        *self.lock() = current.with_access_token(&token.access_token);
        info!(instance_url = %current.instance_url(), "Session refreshed");

        self.persist_access_token(&token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sftools_auth::FileProfileStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct CountingRefresher {
        calls: AtomicUsize,
        outcome: fn() -> Result<()>,
    }

    impl CountingRefresher {
        fn new(outcome: fn() -> Result<()>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                outcome,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SessionRefresher for CountingRefresher {
        async fn refresh_session(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.outcome)()
        }
    }

    fn expired() -> Error {
        Error::new(ErrorKind::SessionExpired("INVALID_SESSION_ID".into()))
    }

    /// Action failing with an expired session for the first `failures` calls.
    fn flaky(failures: usize, attempts: &AtomicUsize) -> impl FnMut() -> std::future::Ready<Result<&'static str>> + '_ {
        move || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            std::future::ready(if n < failures { Err(expired()) } else { Ok("ok") })
        }
    }

    #[tokio::test]
    async fn test_success_needs_no_refresh() {
        let refresher = CountingRefresher::new(|| Ok(()));
        let attempts = AtomicUsize::new(0);

        let value = call_with_refresh(&refresher, flaky(0, &attempts), None)
            .await
            .unwrap();
        assert_eq!(value, "ok");
        assert_eq!(refresher.calls(), 0);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_one_expiry_is_recovered() {
        let refresher = CountingRefresher::new(|| Ok(()));
        let attempts = AtomicUsize::new(0);
        let rebound = AtomicUsize::new(0);
        let after = || {
            rebound.fetch_add(1, Ordering::SeqCst);
        };

        let value = call_with_refresh(&refresher, flaky(1, &attempts), Some(&after))
            .await
            .unwrap();
        assert_eq!(value, "ok");
        assert_eq!(refresher.calls(), 1);
        assert_eq!(rebound.load(Ordering::SeqCst), 1);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_second_expiry_propagates() {
        let refresher = CountingRefresher::new(|| Ok(()));
        let attempts = AtomicUsize::new(0);

        let err = call_with_refresh(&refresher, flaky(2, &attempts), None)
            .await
            .unwrap_err();
        assert!(err.is_session_expired());
        assert_eq!(refresher.calls(), 1);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unconfigured_refresh_returns_original_error() {
        let refresher = CountingRefresher::new(|| {
            Err(Error::new(ErrorKind::Config("no refresh token".into())))
        });
        let attempts = AtomicUsize::new(0);

        let err = call_with_refresh(&refresher, flaky(1, &attempts), None)
            .await
            .unwrap_err();
        assert!(err.is_session_expired());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_propagates() {
        let refresher =
            CountingRefresher::new(|| Err(Error::new(ErrorKind::Auth("invalid_grant".into()))));
        let attempts = AtomicUsize::new(0);

        let err = call_with_refresh(&refresher, flaky(1, &attempts), None)
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Auth(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let refresher = CountingRefresher::new(|| Ok(()));
        let err = call_with_refresh(
            &refresher,
            || async { Err::<(), _>(Error::new(ErrorKind::Transport("503".into()))) },
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Transport(_)));
        assert_eq!(refresher.calls(), 0);
    }

    fn config(instance: &str) -> SfConfig {
        SfConfig {
            instance: Some(instance.to_string()),
            client_id: Some("cid".to_string()),
            access_token: Some("old-token".to_string()),
            refresh_token: Some("refresh".to_string()),
            ..SfConfig::production()
        }
    }

    #[tokio::test]
    async fn test_session_refresh_swaps_client_and_persists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "new-token",
                "instance_url": server.uri(),
            })))
            .expect(1)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(FileProfileStore::with_path(temp_dir.path()));
        store
            .save("production", &SfConfig { client_id: Some("cid".into()), ..Default::default() })
            .unwrap();

        let session = Session::from_config(&config(&server.uri()))
            .unwrap()
            .with_store(store.clone(), "production");
        session.refresh_session().await.unwrap();

        assert_eq!(session.client().access_token(), "new-token");
        let saved = store.load("production").unwrap().unwrap();
        assert_eq!(saved.access_token.as_deref(), Some("new-token"));
        assert_eq!(saved.client_id.as_deref(), Some("cid"));
    }

    #[tokio::test]
    async fn test_session_refresh_read_only_store_still_refreshes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access_token": "new-token"})),
            )
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(FileProfileStore::with_path(temp_dir.path()).read_only());
        let session = Session::from_config(&config(&server.uri()))
            .unwrap()
            .with_store(store, "custom");

        session.refresh_session().await.unwrap();
        assert_eq!(session.client().access_token(), "new-token");
    }

    #[tokio::test]
    async fn test_session_without_refresh_token_is_config_error() {
        let mut cfg = config("https://myorg.my.salesforce.com");
        cfg.refresh_token = None;
        let session = Session::from_config(&cfg).unwrap();
        assert!(!session.can_refresh());

        let err = session.refresh_session().await.unwrap_err();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_session_without_client_id_is_config_error() {
        let mut cfg = config("https://myorg.my.salesforce.com");
        cfg.client_id = None;
        let err = Session::from_config(&cfg)
            .unwrap()
            .refresh_session()
            .await
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("client_id"));
    }

    #[test]
    fn test_session_debug_redacts() {
        let session = Session::from_config(&config("https://myorg.my.salesforce.com")).unwrap();
        let debug = format!("{session:?}");
        assert!(!debug.contains("old-token"));
        assert!(!debug.contains("\"refresh\""));
    }
}
