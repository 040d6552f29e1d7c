//! Connection profile configuration.
//!
//! A profile is resolved from three layers, lowest to highest precedence:
//!
//! 1. built-in defaults for production or sandbox orgs
//! 2. the profile file managed by a [`ProfileStore`](crate::ProfileStore)
//! 3. `SF_*` environment variables
//!
//! Only the file layer is ever written back.

use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};
use crate::storage::ProfileStore;

/// Name of the default production profile.
pub const PRODUCTION_PROFILE: &str = "production";

/// Name of the default sandbox profile.
pub const SANDBOX_PROFILE: &str = "sandbox";

/// Environment variables consulted by [`SfConfig::from_env`], paired with the
/// key each one sets.
pub const ENV_VARS: [(&str, &str); 6] = [
    ("SF_INSTANCE_URL", "instance"),
    ("SF_ACCESS_TOKEN", "access_token"),
    ("SF_REFRESH_TOKEN", "refresh_token"),
    ("SF_CLIENT_ID", "client_id"),
    ("SF_DOMAIN", "domain"),
    ("SF_API_VERSION", "api_version"),
];

/// One connection profile.
///
/// Every key is optional at this level; the getters that need a value
/// return `Missing required config: <key>` when it is absent.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SfConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production: Option<bool>,
    /// Instance host (`myorg.my.salesforce.com`) or full URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    /// Login domain prefix: `login` or `test`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

impl std::fmt::Debug for SfConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SfConfig")
            .field("production", &self.production)
            .field("instance", &self.instance)
            .field("domain", &self.domain)
            .field("client_id", &self.client_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl SfConfig {
    /// Built-in defaults for a production org.
    pub fn production() -> Self {
        Self {
            production: Some(true),
            domain: Some("login".to_string()),
            ..Default::default()
        }
    }

    /// Built-in defaults for a sandbox org.
    pub fn sandbox() -> Self {
        Self {
            production: Some(false),
            domain: Some("test".to_string()),
            ..Default::default()
        }
    }

    /// Built-in defaults picked by the production flag.
    pub fn defaults(production: bool) -> Self {
        if production {
            Self::production()
        } else {
            Self::sandbox()
        }
    }

    /// Overlay `other` on top of `self`: every key set in `other` wins.
    pub fn merge(mut self, other: SfConfig) -> Self {
        macro_rules! overlay {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field;
                })*
            };
        }
        overlay!(production, instance, domain, client_id, access_token, refresh_token, api_version);
        self
    }

    /// Build the environment layer from `SF_*` variables.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build the environment layer from an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        Self {
            production: None,
            instance: get("SF_INSTANCE_URL"),
            domain: get("SF_DOMAIN"),
            client_id: get("SF_CLIENT_ID"),
            access_token: get("SF_ACCESS_TOKEN"),
            refresh_token: get("SF_REFRESH_TOKEN"),
            api_version: get("SF_API_VERSION"),
        }
    }

    /// Resolve a profile through all three layers.
    ///
    /// The production flag of the profile file, if any, selects the built-in
    /// defaults; otherwise the `sandbox` profile gets sandbox defaults and
    /// every other profile gets production defaults.
    pub fn load(store: &dyn ProfileStore, profile: &str) -> Result<Self> {
        Self::load_with(store, profile, Self::from_env())
    }

    /// Like [`SfConfig::load`] with an explicit environment layer.
    pub fn load_with(store: &dyn ProfileStore, profile: &str, env: SfConfig) -> Result<Self> {
        let file = store.load(profile)?.unwrap_or_default();
        let production = file
            .production
            .unwrap_or(profile != SANDBOX_PROFILE);

        Ok(Self::defaults(production).merge(file).merge(env))
    }

    fn require<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str> {
        value
            .as_deref()
            .ok_or_else(|| Error::new(ErrorKind::Config(format!("Missing required config: {key}"))))
    }

    /// Whether this profile targets a production org (defaults to true).
    pub fn is_production(&self) -> bool {
        self.production.unwrap_or(true)
    }

    /// The instance host or URL.
    pub fn instance(&self) -> Result<&str> {
        Self::require(&self.instance, "instance")
    }

    /// The connected app client id.
    pub fn client_id(&self) -> Result<&str> {
        Self::require(&self.client_id, "client_id")
    }

    /// The login domain prefix.
    pub fn domain(&self) -> Result<&str> {
        Self::require(&self.domain, "domain")
    }

    /// `https://<instance>`, or the instance itself if it already has a scheme.
    pub fn instance_url(&self) -> Result<String> {
        let instance = self.instance()?.trim_end_matches('/');
        if instance.starts_with("https://") || instance.starts_with("http://") {
            Ok(instance.to_string())
        } else {
            Ok(format!("https://{instance}"))
        }
    }

    /// `https://<domain>.salesforce.com`.
    pub fn login_url(&self) -> Result<String> {
        Ok(format!("https://{}.salesforce.com", self.domain()?))
    }

    /// The configured API version or the transport default.
    pub fn api_version(&self) -> &str {
        self.api_version
            .as_deref()
            .unwrap_or(sftools_client::DEFAULT_API_VERSION)
    }

    /// Render as the JSON written to profile files.
    pub fn render(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }
}
