//! # sftools
//!
//! Salesforce query client for Rust: structured SOQL, pagination past the
//! per-request record cap, session refresh and typed objects.
//!
//! ## Security
//!
//! - Access and refresh tokens are redacted in Debug output
//! - Tracing skips credential parameters
//! - Values interpolated into SOQL are escaped
//!
//! ## Crates
//!
//! - **sftools-client** - HTTP transport with retry, compression and error parsing
//! - **sftools-auth** - Profiles, token refresh and the OAuth device flow
//! - **sftools-query** - Query builder, pagination, session refresh, typed objects
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sftools::auth::{FileProfileStore, SfConfig};
//! use sftools::query::{Sf, SfOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = FileProfileStore::new()?;
//!     let sf = Sf::connect(&SfConfig::load(&store, "production")?, SfOptions::default())?;
//!
//!     for record in sf.query_where("Case.Priority = 'High'").await? {
//!         println!("{}", record.id().unwrap_or_default());
//!     }
//!
//!     Ok(())
//! }
//! ```

// Re-export all crates for convenient access
pub use sftools_auth as auth;
pub use sftools_client as client;
pub use sftools_query as query;

// Re-export commonly used types at the top level
pub use sftools_auth::{FileProfileStore, SfConfig};
pub use sftools_client::SalesforceClient;
pub use sftools_query::{QueryOptions, Sf, SfObject, SfOptions, SfType, Soql};
