//! Structured SOQL query.
//!
//! [`Soql`] holds one single-object query and renders it to wire text:
//!
//! ```rust
//! use sftools_query::Soql;
//!
//! let soql = Soql::new()
//!     .with_select("Id, CaseNumber, Subject")
//!     .with_from("Case")?
//!     .with_filter("IsClosed = FALSE")
//!     .with_limit(10);
//!
//! assert_eq!(
//!     soql.render()?,
//!     "SELECT Id,CaseNumber,Subject FROM Case WHERE IsClosed = FALSE ORDER BY Id LIMIT 10"
//! );
//! # Ok::<(), sftools_query::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::where_util;

/// Default ordering field.
pub const ID_FIELD: &str = "Id";

/// Input accepted wherever a field list is expected: a comma-separated
/// string or a list of names.
pub trait IntoFields {
    /// Split into trimmed, non-empty field names.
    fn into_fields(self) -> Vec<String>;
}

impl IntoFields for &str {
    fn into_fields(self) -> Vec<String> {
        self.split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl IntoFields for String {
    fn into_fields(self) -> Vec<String> {
        self.as_str().into_fields()
    }
}

impl IntoFields for &String {
    fn into_fields(self) -> Vec<String> {
        self.as_str().into_fields()
    }
}

impl<S: AsRef<str>> IntoFields for Vec<S> {
    fn into_fields(self) -> Vec<String> {
        self.as_slice().into_fields()
    }
}

impl<S: AsRef<str>> IntoFields for &[S] {
    fn into_fields(self) -> Vec<String> {
        self.iter()
            .map(|f| f.as_ref().trim())
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl<S: AsRef<str>, const N: usize> IntoFields for [S; N] {
    fn into_fields(self) -> Vec<String> {
        self.as_slice().into_fields()
    }
}

/// Append `fields` to `list`, keeping the first occurrence of each name.
fn extend_unique(list: &mut Vec<String>, fields: Vec<String>) {
    for field in fields {
        if !list.contains(&field) {
            list.push(field);
        }
    }
}

/// One SOQL SELECT statement against a single object.
///
/// Zero `limit` and `offset` mean "not set". An empty `order_by` means no
/// ORDER BY clause; a fresh query orders by `Id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Soql {
    select: Vec<String>,
    from: Option<String>,
    filter: String,
    order_by: Vec<String>,
    limit: u32,
    offset: u32,
    preload_fields: Option<bool>,
}

impl Default for Soql {
    fn default() -> Self {
        Self {
            select: Vec::new(),
            from: None,
            filter: String::new(),
            order_by: vec![ID_FIELD.to_string()],
            limit: 0,
            offset: 0,
            preload_fields: None,
        }
    }
}

impl Soql {
    /// Create an empty query ordered by `Id`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Infer source object and projection from the filter's first token.
    ///
    /// `"Case.CaseNumber = '00001234'"` gives `FROM Case` and
    /// `SELECT CaseNumber`. This is only a convenience for filters written as
    /// `Object.Field ...`; anything else fails.
    pub fn from_filter(filter: &str) -> Result<Self> {
        let token = filter.split_whitespace().next().unwrap_or_default();
        let (from, field) = token.split_once('.').ok_or_else(|| {
            Error::validation(format!(
                "Cannot infer FROM and SELECT from filter: {filter}"
            ))
        })?;

        Self::new()
            .with_select(field)
            .with_from(from)
            .map(|soql| soql.with_filter(filter))
    }

    // Builder-style setters

    /// Replace the projection.
    pub fn with_select(mut self, fields: impl IntoFields) -> Self {
        self.set_select(fields);
        self
    }

    /// Set the source object.
    pub fn with_from(mut self, from: &str) -> Result<Self> {
        self.set_from(from)?;
        Ok(self)
    }

    /// Replace the filter.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.set_filter(filter);
        self
    }

    /// Replace the ordering.
    pub fn with_order_by(mut self, fields: impl IntoFields) -> Self {
        self.set_order_by(fields);
        self
    }

    /// Set the LIMIT.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Set the OFFSET.
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Request every field of each record.
    pub fn with_preload_fields(mut self, preload: bool) -> Self {
        self.preload_fields = Some(preload);
        self
    }

    // Getters

    pub fn select(&self) -> &[String] {
        &self.select
    }

    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn order_by(&self) -> &[String] {
        &self.order_by
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// `None` defers to the client's default.
    pub fn preload_fields(&self) -> Option<bool> {
        self.preload_fields
    }

    // In-place setters

    /// Replace the projection, deduplicated in first-seen order.
    pub fn set_select(&mut self, fields: impl IntoFields) {
        self.select.clear();
        extend_unique(&mut self.select, fields.into_fields());
    }

    /// Append to the projection, skipping names already present.
    pub fn add_select(&mut self, fields: impl IntoFields) {
        extend_unique(&mut self.select, fields.into_fields());
    }

    /// Set the source object; an empty name unsets it.
    ///
    /// Only one object is supported, so a comma is rejected.
    pub fn set_from(&mut self, from: &str) -> Result<()> {
        let from = from.trim();
        if from.contains(',') {
            return Err(Error::validation(format!(
                "Only a single object is supported in FROM: {from}"
            )));
        }
        self.from = (!from.is_empty()).then(|| from.to_string());
        Ok(())
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
    }

    /// AND the current filter with `fragments` and return the new filter.
    pub fn and_filter<I, S>(&mut self, fragments: I) -> &str
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filter = where_util::and(self.filter_args(fragments));
        &self.filter
    }

    /// OR the current filter with `fragments` and return the new filter.
    pub fn or_filter<I, S>(&mut self, fragments: I) -> &str
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filter = where_util::or(self.filter_args(fragments));
        &self.filter
    }

    fn filter_args<I, S>(&self, fragments: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args: Vec<String> = fragments
            .into_iter()
            .map(|f| f.as_ref().to_string())
            .collect();
        if !args.contains(&self.filter) {
            args.insert(0, self.filter.clone());
        }
        args
    }

    /// Replace the ordering; an empty input restores the `Id` default.
    pub fn set_order_by(&mut self, fields: impl IntoFields) {
        let fields = fields.into_fields();
        self.order_by.clear();
        if fields.is_empty() {
            self.order_by.push(ID_FIELD.to_string());
        } else {
            extend_unique(&mut self.order_by, fields);
        }
    }

    pub fn add_order_by(&mut self, fields: impl IntoFields) {
        extend_unique(&mut self.order_by, fields.into_fields());
    }

    /// Drop the ORDER BY clause entirely.
    pub fn clear_order_by(&mut self) {
        self.order_by.clear();
    }

    pub fn set_limit(&mut self, limit: u32) {
        self.limit = limit;
    }

    pub fn set_offset(&mut self, offset: u32) {
        self.offset = offset;
    }

    pub fn set_preload_fields(&mut self, preload: Option<bool>) {
        self.preload_fields = preload;
    }

    /// The `COUNT()` form of this query: same source and filter, no
    /// ordering, no offset.
    pub fn count_query(&self) -> Self {
        let mut count = self.clone();
        count.set_select("COUNT()");
        count.clear_order_by();
        count.offset = 0;
        count
    }

    /// Render the statement.
    ///
    /// Fails if the projection is empty or no source object is set. Empty
    /// clauses are left out.
    pub fn render(&self) -> Result<String> {
        if self.select.is_empty() {
            return Err(Error::validation("SELECT is required"));
        }
        let from = self
            .from
            .as_deref()
            .ok_or_else(|| Error::validation("FROM is required"))?;

        let mut q = format!("SELECT {} FROM {}", self.select.join(","), from);
        if !self.filter.is_empty() {
            q.push_str(&format!(" WHERE {}", self.filter));
        }
        if !self.order_by.is_empty() {
            q.push_str(&format!(" ORDER BY {}", self.order_by.join(",")));
        }
        if self.limit > 0 {
            q.push_str(&format!(" LIMIT {}", self.limit));
        }
        if self.offset > 0 {
            q.push_str(&format!(" OFFSET {}", self.offset));
        }
        Ok(q)
    }
}
