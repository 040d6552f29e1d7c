//! # sftools-query
//!
//! SOQL queries against a Salesforce org, paged past the per-request
//! record cap, with typed per-object proxies on top.
//!
//! ## Features
//!
//! - **Query builder** - [`Soql`] with deduplicated projection, composable
//!   filters and `FIELDS(ALL)` support
//! - **Pagination** - counts first, then pages with LIMIT/OFFSET up to the
//!   remote's offset ceiling
//! - **Session refresh** - an expired access token is refreshed once and the
//!   call retried
//! - **Type proxies** - one [`SfType`] per object name with cached describe
//!   metadata and an identity cache of [`SfObject`]s
//! - **Built-in profiles** - `Case`, `CaseComment`, `User`, `TimeCard__c`
//!
//! ## Example
//!
//! ```rust,ignore
//! use sftools_auth::{FileProfileStore, SfConfig};
//! use sftools_query::{kinds::case, Sf, SfOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sftools_query::Error> {
//!     let store = FileProfileStore::new()?;
//!     let sf = Sf::connect(&SfConfig::load(&store, "production")?, SfOptions::default())?;
//!
//!     if let Some(case) = sf.sftype("Case").get("1234").await? {
//!         for line in case.dump_fields(&["Subject", "Status"], None).await? {
//!             println!("{line}");
//!         }
//!         println!("{} comments", case::comments(&case).await?.len());
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod error;
pub mod kinds;
mod object;
pub mod paginate;
mod query;
mod registry;
mod result;
mod session;
mod sftype;
mod soql;
pub mod where_util;

#[cfg(test)]
mod test_support;

pub use client::{Sf, SfOptions};
pub use error::{Error, ErrorKind, Result};
pub use object::SfObject;
pub use paginate::{PagePlan, FIELDS_ALL};
pub use query::QueryOptions;
pub use registry::{DefaultProfile, KeyLookup, ProfileFactory, TypeProfile, TypeRegistry};
pub use result::{PagedResult, Record, RecordAttributes};
pub use session::{call_with_refresh, Session, SessionRefresher};
pub use sftype::SfType;
pub use soql::{IntoFields, Soql, ID_FIELD};
