//! `TimeCard__c`, a custom object logging time against cases.

use crate::error::Result;
use crate::object::SfObject;
use crate::query::QueryOptions;
use crate::registry::TypeProfile;
use crate::where_util;

use super::{expect_type, CaseProfile};

#[derive(Debug, Clone, Copy, Default)]
pub struct TimeCardProfile;

impl TimeCardProfile {
    pub const TYPE_NAME: &'static str = "TimeCard__c";
}

impl TypeProfile for TimeCardProfile {}

/// Every time card on `case`.
pub async fn from_case(case: &SfObject) -> Result<Vec<SfObject>> {
    expect_type(case, CaseProfile::TYPE_NAME)?;
    case.client()?
        .sftype(TimeCardProfile::TYPE_NAME)
        .query_objects(&where_util::eq("CaseId__c", case.id()), &QueryOptions::new())
        .await
}
