//! `CaseComment`: text search and the parent case.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::object::SfObject;
use crate::query::QueryOptions;
use crate::registry::TypeProfile;
use crate::sftype::SfType;
use crate::where_util;

use super::{expect_type, CaseProfile};

#[derive(Debug, Clone, Copy, Default)]
pub struct CaseCommentProfile;

impl CaseCommentProfile {
    pub const TYPE_NAME: &'static str = "CaseComment";
}

impl TypeProfile for CaseCommentProfile {}

/// Comments whose body contains `text`. SOQL wildcards in `text` are
/// honoured.
pub async fn containing(
    comments: &SfType,
    text: &str,
    options: &QueryOptions,
) -> Result<Vec<SfObject>> {
    if comments.name() != CaseCommentProfile::TYPE_NAME {
        return Err(Error::validation(format!(
            "expected the {} type, got {}",
            CaseCommentProfile::TYPE_NAME,
            comments
        )));
    }
    comments
        .query_objects(&where_util::like("CommentBody", text), options)
        .await
}

/// The case `comment` belongs to.
pub async fn parent_case(comment: &SfObject) -> Result<Option<SfObject>> {
    expect_type(comment, CaseCommentProfile::TYPE_NAME)?;
    let parent = match comment.fetch_field("ParentId").await? {
        Some(Value::String(id)) => id,
        _ => return Ok(None),
    };
    comment
        .client()?
        .sftype(CaseProfile::TYPE_NAME)
        .by_id(&parent)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mock_sf, mount_describe, mount_query};
    use serde_json::json;
    use wiremock::MockServer;

    #[tokio::test]
    async fn test_containing_uses_like() {
        let server = MockServer::start().await;
        mount_describe(&server, "CaseComment", &[("Id", "id")], &[]).await;
        mount_query(
            &server,
            "SELECT COUNT() FROM CaseComment WHERE (CommentBody LIKE '%kernel panic%')",
            "SELECT CommentBody,Id FROM CaseComment WHERE (CommentBody LIKE '%kernel panic%') ORDER BY Id LIMIT 2000",
            vec![json!({"Id": "00aA", "CommentBody": "saw a kernel panic on boot"})],
        )
        .await;

        let sf = mock_sf(&server);
        let found = containing(
            &sf.sftype("CaseComment"),
            "kernel panic",
            &QueryOptions::new().select("CommentBody"),
        )
        .await
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].get_field("CommentBody"),
            Some(json!("saw a kernel panic on boot"))
        );
    }

    #[tokio::test]
    async fn test_containing_rejects_other_types() {
        let server = MockServer::start().await;
        let sf = mock_sf(&server);
        let err = containing(&sf.sftype("Case"), "x", &QueryOptions::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("expected the CaseComment type"));
    }

    #[tokio::test]
    async fn test_parent_case() {
        let server = MockServer::start().await;
        mount_describe(&server, "Case", &[("Id", "id")], &[]).await;
        mount_query(
            &server,
            "SELECT COUNT() FROM Case WHERE (Id = '500A')",
            "SELECT Id FROM Case WHERE (Id = '500A') ORDER BY Id LIMIT 2000",
            vec![json!({"Id": "500A"})],
        )
        .await;

        let sf = mock_sf(&server);
        let comment = sf
            .sftype("CaseComment")
            .materialize(serde_json::from_value(json!({"Id": "00aA", "ParentId": "500A"})).unwrap())
            .unwrap();

        let case = parent_case(&comment).await.unwrap().unwrap();
        assert_eq!(case.to_string(), "Case: 500A");
        assert!(sf.sftype("Case").cached("500A").unwrap().ptr_eq(&case));
    }

    #[tokio::test]
    async fn test_parent_case_null_parent() {
        let server = MockServer::start().await;
        let sf = mock_sf(&server);
        let comment = sf
            .sftype("CaseComment")
            .materialize(serde_json::from_value(json!({"Id": "00aA", "ParentId": null})).unwrap())
            .unwrap();
        assert!(parent_case(&comment).await.unwrap().is_none());
    }
}
