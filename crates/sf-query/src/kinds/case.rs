//! `Case`: open cases only by default, lookup by case number.

use crate::error::Result;
use crate::object::SfObject;
use crate::query::QueryOptions;
use crate::registry::{KeyLookup, TypeProfile};
use crate::where_util;

use super::{expect_type, time_card, CaseCommentProfile};

/// Case numbers are zero-padded to this many digits.
const CASE_NUMBER_DIGITS: usize = 8;

#[derive(Debug, Clone, Copy, Default)]
pub struct CaseProfile;

impl CaseProfile {
    pub const TYPE_NAME: &'static str = "Case";
    /// Restriction applied to case queries unless they are unrestricted.
    pub const OPEN_ONLY: &'static str = "IsClosed = FALSE";
}

impl TypeProfile for CaseProfile {
    fn restriction(&self) -> Option<&str> {
        Some(Self::OPEN_ONLY)
    }

    fn key_lookup(&self, key: &str) -> KeyLookup {
        match case_number(key) {
            Some(number) => KeyLookup::Filter {
                filter: where_util::eq("CaseNumber", &number),
                unrestricted: true,
            },
            None => KeyLookup::Id(key.to_string()),
        }
    }
}

/// The padded case number for `key`, if it is a number of at most eight
/// digits.
pub fn case_number(key: &str) -> Option<String> {
    let n: u64 = key.trim().parse().ok()?;
    let number = n.to_string();
    (number.len() <= CASE_NUMBER_DIGITS).then(|| format!("{number:0>CASE_NUMBER_DIGITS$}"))
}

/// Every comment on `case`.
pub async fn comments(case: &SfObject) -> Result<Vec<SfObject>> {
    expect_type(case, CaseProfile::TYPE_NAME)?;
    case.client()?
        .sftype(CaseCommentProfile::TYPE_NAME)
        .query_objects(&where_util::eq("ParentId", case.id()), &QueryOptions::new())
        .await
}

/// Every time card logged against `case`.
pub async fn time_cards(case: &SfObject) -> Result<Vec<SfObject>> {
    time_card::from_case(case).await
}
