//! # sftools-client
//!
//! HTTP transport for the Salesforce REST API.
//!
//! This crate provides the layer every remote call of `sftools` goes through:
//! - Automatic retry with exponential backoff and jitter
//! - Compression support (gzip, deflate)
//! - Rate limit detection and handling
//! - Salesforce error body parsing (with HTTP status retained)
//! - Request/response tracing
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    sftools-query                            │
//! │  (query builder, pagination, session retry, typed objects)  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   SalesforceClient                          │
//! │  - Holds instance URL, access token, API version            │
//! │  - Raw SOQL query, describe, typed JSON GETs                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SfHttpClient                             │
//! │  - Raw HTTP with retry, compression, rate limiting          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use sftools_client::SalesforceClient;
//!
//! let client = SalesforceClient::new("https://myorg.my.salesforce.com", token)?;
//! let page = client.query("SELECT Id FROM Case LIMIT 10").await?;
//! println!("{} of {}", page.records.len(), page.total_size);
//! ```

mod client;
mod config;
pub mod describe;
mod error;
mod request;
mod response;
mod retry;
mod salesforce_client;
pub mod security;

pub use client::SfHttpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, ErrorKind, Result};
pub use request::{RequestBuilder, RequestMethod};
pub use response::{Response, ResponseExt};
pub use retry::RetryConfig;
pub use salesforce_client::{QueryResult, SalesforceClient};

/// Default Salesforce API version
pub const DEFAULT_API_VERSION: &str = "53.0";

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("sftools/", env!("CARGO_PKG_VERSION"));
