//! Materialized records.

use std::sync::{Arc, Mutex, Weak};

use serde_json::Value;
use sftools_client::security::soql::is_safe_field_path;
use tracing::debug;

use crate::client::Sf;
use crate::error::{Error, Result};
use crate::query::QueryOptions;
use crate::result::Record;
use crate::session::lock;
use crate::sftype::{SfType, SfTypeInner};
use crate::soql::ID_FIELD;
use crate::where_util;

/// One record of an [`SfType`], unique per `Id` within its type.
///
/// Field access is two-tiered: [`has_field`](SfObject::has_field) and
/// [`get_field`](SfObject::get_field) only look at what has been fetched so
/// far, [`fetch_field`](SfObject::fetch_field) falls back to asking the org
/// for that one field.
#[derive(Clone)]
pub struct SfObject {
    inner: Arc<SfObjectInner>,
}

struct SfObjectInner {
    id: String,
    type_name: String,
    sftype: Weak<SfTypeInner>,
    record: Mutex<Record>,
}

impl std::fmt::Debug for SfObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SfObject")
            .field("type", &self.inner.type_name)
            .field("id", &self.inner.id)
            .finish()
    }
}

impl std::fmt::Display for SfObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.inner.type_name, self.inner.id)
    }
}

impl SfObject {
    pub(crate) fn new(sftype: &SfType, id: String, record: Record) -> Self {
        Self {
            inner: Arc::new(SfObjectInner {
                id,
                type_name: sftype.name().to_string(),
                sftype: sftype.downgrade(),
                record: Mutex::new(record),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn type_name(&self) -> &str {
        &self.inner.type_name
    }

    pub fn sftype(&self) -> Result<SfType> {
        SfType::upgrade(&self.inner.sftype)
    }

    pub fn client(&self) -> Result<Sf> {
        self.sftype()?.client()
    }

    /// A copy of the fields fetched so far.
    pub fn record(&self) -> Record {
        lock(&self.inner.record).clone()
    }

    pub(crate) fn merge_record(&self, record: Record) {
        lock(&self.inner.record).merge_from(record);
    }

    /// True if both handles refer to the same object.
    pub fn ptr_eq(&self, other: &SfObject) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// True if `field` has been fetched. Relationship paths such as
    /// `Owner.Name` are resolved through the nested related record.
    pub fn has_field(&self, field: &str) -> bool {
        lock(&self.inner.record).contains_path(field)
    }

    /// The fetched value of `field`, without asking the org.
    pub fn get_field(&self, field: &str) -> Option<Value> {
        lock(&self.inner.record).get_path(field).cloned()
    }

    /// The value of `field`, querying the org for it if it has not been
    /// fetched yet.
    ///
    /// Returns `None` if the org does not return the field or rejects the
    /// query as malformed. Plain field names must be fields of the type;
    /// relationship paths such as `Owner.Name` are passed through.
    pub async fn fetch_field(&self, field: &str) -> Result<Option<Value>> {
        if let Some(value) = self.get_field(field) {
            return Ok(Some(value));
        }
        self.fetch_fields(&[field]).await?;
        Ok(self.get_field(field))
    }

    /// Fetch every field of `fields` not fetched yet, in one query.
    pub async fn fetch_fields<S: AsRef<str>>(&self, fields: &[S]) -> Result<()> {
        let sftype = self.sftype()?;
        let mut missing: Vec<String> = Vec::new();
        for field in fields.iter().map(|f| f.as_ref()) {
            if self.has_field(field) || missing.iter().any(|m| m == field) {
                continue;
            }
            self.check_field(&sftype, field).await?;
            missing.push(field.to_string());
        }
        if missing.is_empty() {
            return Ok(());
        }

        let filter = where_util::eq(&format!("{}.{}", self.type_name(), ID_FIELD), self.id());
        let options = QueryOptions::new()
            .select(missing)
            .preload_fields(false)
            .unrestricted();
        match sftype.query(&filter, &options).await {
            Ok(result) => {
                for record in result {
                    sftype.materialize(record)?;
                }
                Ok(())
            }
            Err(err) if err.is_malformed_request() => {
                debug!(object = %self, error = %err, "Field lookup rejected");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn check_field(&self, sftype: &SfType, field: &str) -> Result<()> {
        if !is_safe_field_path(field) {
            return Err(Error::validation(format!("Invalid field name '{field}'")));
        }
        if field.contains('.') || sftype.fields().await?.iter().any(|f| f.name == field) {
            return Ok(());
        }
        Err(Error::validation(format!(
            "{} has no field '{}'",
            self.type_name(),
            field
        )))
    }

    /// Render fields for display, one line per field.
    ///
    /// An empty `fields` means every field of the type. Lines are
    /// `Field: value` when `label` is set, the bare value otherwise; `None`
    /// labels only when more than one field is shown. Missing fields are
    /// fetched together first.
    pub async fn dump_fields<S: AsRef<str>>(
        &self,
        fields: &[S],
        label: Option<bool>,
    ) -> Result<Vec<String>> {
        let fields: Vec<String> = if fields.is_empty() {
            self.sftype()?.field_names().await?
        } else {
            fields.iter().map(|f| f.as_ref().to_string()).collect()
        };
        let label = label.unwrap_or(fields.len() != 1);

        self.fetch_fields(fields.as_slice()).await?;

        Ok(fields
            .iter()
            .map(|field| {
                let value = display_value(self.get_field(field));
                if label {
                    format!("{field}: {value}")
                } else {
                    value
                }
            })
            .collect())
    }
}

fn display_value(value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    }
}
