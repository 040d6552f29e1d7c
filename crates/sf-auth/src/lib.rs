//! # sftools-auth
//!
//! Salesforce authentication and connection profiles.
//!
//! ## Security
//!
//! - Sensitive data (tokens, secrets) are redacted in Debug output
//! - Tracing skips credential parameters
//! - Profile files are written with owner-only permissions
//!
//! ## Supported Authentication Methods
//!
//! - **OAuth 2.0 Device Flow** - interactive login from a terminal
//! - **OAuth 2.0 Refresh Token** - renewing an expired access token
//!
//! ## Example
//!
//! ```rust,ignore
//! use sftools_auth::{DeviceFlowAuth, FileProfileStore, OAuthConfig, SfConfig};
//!
//! let store = FileProfileStore::new()?;
//! let mut config = SfConfig::load(&store, "production")?;
//!
//! let flow = DeviceFlowAuth::new(OAuthConfig::new(config.client_id()?), config.instance_url()?)?;
//! let verification = flow.request_verification().await?;
//! println!("Please approve access: {}", verification.verification_url()?);
//! if let Some(token) = flow.wait_for_approval(&verification, DEFAULT_APPROVAL_TIMEOUT).await? {
//!     config.access_token = Some(token.access_token);
//!     config.refresh_token = token.refresh_token;
//! }
//! ```

mod config;
mod credentials;
mod device;
mod error;
mod oauth;
mod storage;

pub use config::{SfConfig, ENV_VARS, PRODUCTION_PROFILE, SANDBOX_PROFILE};
pub use credentials::{Credentials, SalesforceCredentials};
pub use device::{DeviceFlowAuth, DeviceVerification, DEFAULT_APPROVAL_TIMEOUT};
pub use error::{Error, ErrorKind, Result};
pub use oauth::{OAuthClient, OAuthConfig, TokenResponse, TOKEN_PATH};
pub use storage::{default_profile_dir, FileProfileStore, ProfileStore};

/// Default Salesforce login URL for production.
pub const PRODUCTION_LOGIN_URL: &str = "https://login.salesforce.com";

/// Default Salesforce login URL for sandbox.
pub const SANDBOX_LOGIN_URL: &str = "https://test.salesforce.com";
