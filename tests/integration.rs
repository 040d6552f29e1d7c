//! Integration test suite (requires a real Salesforce org).
//!
//! The tests use the profile named by `SF_PROFILE` (default `production`),
//! which must hold an instance, a client id and a refresh token, for
//! example after `sfq login`. Run them with:
//!   SF_PROFILE=sandbox cargo test --test integration -- --ignored --nocapture

#[path = "integration/common.rs"]
mod common;
#[path = "integration/query.rs"]
mod query;
