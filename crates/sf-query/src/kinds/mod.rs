//! Built-in type profiles and the helpers that go with them.

pub mod case;
pub mod case_comment;
pub mod time_card;
pub mod user;

pub use case::CaseProfile;
pub use case_comment::CaseCommentProfile;
pub use time_card::TimeCardProfile;
pub use user::UserProfile;

use crate::error::{Error, Result};
use crate::object::SfObject;

/// Fail unless `object` is of type `type_name`.
fn expect_type(object: &SfObject, type_name: &str) -> Result<()> {
    if object.type_name() == type_name {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "expected a {type_name}, got {object}"
        )))
    }
}
