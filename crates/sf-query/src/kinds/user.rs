//! `User`: lookup by alias and the cases a user owns.

use sftools_client::security::ids::is_valid_salesforce_id;
use tracing::debug;

use crate::error::Result;
use crate::object::SfObject;
use crate::registry::{KeyLookup, TypeProfile};
use crate::soql::Soql;
use crate::where_util;

use super::{expect_type, CaseProfile};

#[derive(Debug, Clone, Copy, Default)]
pub struct UserProfile;

impl UserProfile {
    pub const TYPE_NAME: &'static str = "User";
}

impl TypeProfile for UserProfile {
    fn key_lookup(&self, key: &str) -> KeyLookup {
        if is_valid_salesforce_id(key) {
            KeyLookup::Id(key.to_string())
        } else {
            KeyLookup::Filter {
                filter: where_util::eq("Alias", key),
                unrestricted: false,
            }
        }
    }
}

/// Cases owned by `user` through any of the Case owner lookup fields.
///
/// Runs one query per field whose name contains `Owner`, stopping once
/// `limit` cases (0 for no limit) have been found.
pub async fn cases(user: &SfObject, only_open: bool, limit: u32) -> Result<Vec<SfObject>> {
    expect_type(user, UserProfile::TYPE_NAME)?;
    let sf = user.client()?;
    let case_type = sf.sftype(CaseProfile::TYPE_NAME);

    let owner_fields: Vec<String> = case_type
        .fields()
        .await?
        .iter()
        .filter(|f| f.name.contains("Owner") && f.field_type == "reference")
        .map(|f| f.name.clone())
        .collect();

    let mut found = Vec::new();
    for field in owner_fields {
        let mut soql = Soql::new()
            .with_from(CaseProfile::TYPE_NAME)?
            .with_filter(where_util::eq(&field, user.id()))
            .with_limit(limit);
        if only_open {
            soql.and_filter([CaseProfile::OPEN_ONLY]);
        }
        debug!(field = %field, "Querying owned cases");
        let result = sf.query(&soql).await?;
        found.extend(case_type.objects(result)?);

        if limit > 0 && found.len() >= limit as usize {
            break;
        }
    }
    if limit > 0 {
        found.truncate(limit as usize);
    }
    Ok(found)
}
