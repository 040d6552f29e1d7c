//! Options for per-type queries.

use crate::soql::IntoFields;

/// Options for [`SfType::query`](crate::SfType::query).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Extra fields to select; `Id` is always added.
    pub select: Vec<String>,
    /// Ordering; `None` keeps the `Id` default.
    pub order_by: Option<Vec<String>>,
    /// Maximum number of records, 0 for no limit.
    pub limit: u32,
    /// `None` defers to the client's default.
    pub preload_fields: Option<bool>,
    /// Skip the type's default restriction (for example "open cases only").
    pub unrestricted: bool,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add fields to select.
    pub fn select(mut self, fields: impl IntoFields) -> Self {
        for field in fields.into_fields() {
            if !self.select.contains(&field) {
                self.select.push(field);
            }
        }
        self
    }

    pub fn order_by(mut self, fields: impl IntoFields) -> Self {
        self.order_by = Some(fields.into_fields());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn preload_fields(mut self, preload: bool) -> Self {
        self.preload_fields = Some(preload);
        self
    }

    /// Lift the type's default restriction.
    pub fn unrestricted(mut self) -> Self {
        self.unrestricted = true;
        self
    }
}
