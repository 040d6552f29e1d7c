//! Query results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sftools_client::QueryResult;

static NULL: Value = Value::Null;

/// One record as returned by a query: a JSON object with an optional
/// `attributes` entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Wrap a JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// The record's `Id`, if present.
    pub fn id(&self) -> Option<&str> {
        self.0.get("Id").and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// The field as a string, when it is one.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Resolve a relationship path such as `Owner.Name`.
    ///
    /// Related records come back nested (`{"Owner": {"Name": ..}}`). A null
    /// relationship along the way resolves to null; a missing key does not
    /// resolve.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.0.get(path) {
            return Some(value);
        }
        let mut segments = path.split('.');
        let mut value = self.0.get(segments.next()?)?;
        for segment in segments {
            value = match value {
                Value::Null => return Some(&NULL),
                Value::Object(map) => map.get(segment)?,
                _ => return None,
            };
        }
        Some(value)
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.get_path(path).is_some()
    }

    /// Field names, without `attributes`.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0
            .keys()
            .map(String::as_str)
            .filter(|k| *k != "attributes")
    }

    /// The `attributes` entry; empty when absent.
    pub fn attributes(&self) -> RecordAttributes {
        self.0
            .get("attributes")
            .cloned()
            .and_then(|a| serde_json::from_value(a).ok())
            .unwrap_or_default()
    }

    /// Copy every field of `other` into this record, overwriting.
    ///
    /// Nested related records are merged field by field.
    pub fn merge_from(&mut self, other: Record) {
        merge_maps(&mut self.0, other.0);
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

fn merge_maps(into: &mut Map<String, Value>, from: Map<String, Value>) {
    for (key, value) in from {
        match value {
            Value::Object(nested) => {
                if let Some(Value::Object(existing)) = into.get_mut(&key) {
                    merge_maps(existing, nested);
                } else {
                    into.insert(key, Value::Object(nested));
                }
            }
            value => {
                into.insert(key, value);
            }
        }
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// The `attributes` entry of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordAttributes {
    #[serde(rename = "type", default)]
    pub object_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Records of one logical query, possibly assembled from several pages.
///
/// `total` is the match count established once for the query; merging
/// pages never changes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PagedResult {
    pub total: u64,
    pub complete: bool,
    pub records: Vec<Record>,
}

impl PagedResult {
    pub fn new(total: u64, complete: bool, records: Vec<Record>) -> Self {
        Self {
            total,
            complete,
            records,
        }
    }

    /// Wrap one raw page as returned by the transport.
    pub fn from_page(page: QueryResult<Record>) -> Self {
        Self {
            total: page.total_size,
            complete: page.done,
            records: page.records,
        }
    }

    /// Append `next` to this result.
    ///
    /// Records are concatenated in order, `complete` is true if either side
    /// is, and `total` stays the one of `self`.
    #[must_use]
    pub fn merge(mut self, next: PagedResult) -> Self {
        self.records.extend(next.records);
        self.complete = self.complete || next.complete;
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// The first record, if any.
    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }
}

impl std::ops::Add for PagedResult {
    type Output = PagedResult;

    fn add(self, next: PagedResult) -> PagedResult {
        self.merge(next)
    }
}

impl IntoIterator for PagedResult {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a PagedResult {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
