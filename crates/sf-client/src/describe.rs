//! Describe metadata types.
//!
//! Only the parts of the describe payloads the query layer reads are
//! modelled; unknown keys are ignored.

use serde::{Deserialize, Serialize};

/// Result of the describeGlobal operation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DescribeGlobalResult {
    /// Character encoding (e.g., "UTF-8").
    #[serde(default)]
    pub encoding: Option<String>,

    /// Maximum batch size for composite operations.
    #[serde(rename = "maxBatchSize", default)]
    pub max_batch_size: Option<u32>,

    /// List of SObject descriptions.
    pub sobjects: Vec<SObjectBasicInfo>,
}

impl DescribeGlobalResult {
    /// Names of the objects that are both queryable and searchable.
    pub fn queryable_names(&self) -> impl Iterator<Item = &str> {
        self.sobjects
            .iter()
            .filter(|s| s.queryable && s.searchable)
            .map(|s| s.name.as_str())
    }
}

/// Basic information about an SObject from describeGlobal.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SObjectBasicInfo {
    pub name: String,
    pub label: String,
    #[serde(rename = "keyPrefix", default)]
    pub key_prefix: Option<String>,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub queryable: bool,
    #[serde(default)]
    pub searchable: bool,
}

/// SObject describe result.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DescribeSObjectResult {
    pub name: String,
    pub label: String,
    #[serde(rename = "keyPrefix", default)]
    pub key_prefix: Option<String>,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub queryable: bool,
    #[serde(default)]
    pub fields: Vec<FieldDescribe>,
    #[serde(rename = "recordTypeInfos", default)]
    pub record_type_infos: Vec<RecordTypeInfo>,
}

impl DescribeSObjectResult {
    /// Look up a field by exact API name.
    pub fn field(&self, name: &str) -> Option<&FieldDescribe> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Ids of the record types currently marked active.
    pub fn active_record_type_ids(&self) -> Vec<String> {
        self.record_type_infos
            .iter()
            .filter(|rt| rt.active)
            .map(|rt| rt.record_type_id.clone())
            .collect()
    }
}

/// Record type information for an SObject.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecordTypeInfo {
    pub name: String,
    #[serde(rename = "recordTypeId")]
    pub record_type_id: String,
    #[serde(rename = "developerName", default)]
    pub developer_name: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub master: Option<bool>,
}

/// Field metadata.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldDescribe {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub nillable: bool,
    #[serde(rename = "referenceTo", default)]
    pub reference_to: Vec<String>,
    #[serde(rename = "relationshipName", default)]
    pub relationship_name: Option<String>,
}

impl FieldDescribe {
    /// True for lookup/master-detail fields pointing at `sobject`.
    pub fn references(&self, sobject: &str) -> bool {
        self.field_type == "reference" && self.reference_to.iter().any(|r| r == sobject)
    }
}
