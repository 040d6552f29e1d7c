//! Query engine against a live org.

use super::common::connect;
use sftools::query::{kinds::case, QueryOptions, SfOptions, Soql};

#[tokio::test]
#[ignore = "requires a Salesforce org"]
async fn test_refresh_and_count() {
    let sf = connect(SfOptions::default());
    sf.refresh().await.expect("refresh should succeed");

    let soql = Soql::new().with_from("User").unwrap();
    let count = sf.query_count(&soql).await.expect("count should succeed");
    assert!(count > 0, "an org always has users");
}

#[tokio::test]
#[ignore = "requires a Salesforce org"]
async fn test_query_matches_count() {
    let sf = connect(SfOptions::default());
    let soql = Soql::new()
        .with_select("Name")
        .with_from("User")
        .unwrap()
        .with_filter("IsActive = TRUE")
        .with_limit(50);

    let count = sf.query_count(&soql).await.unwrap();
    let result = sf.query(&soql).await.unwrap();
    assert_eq!(result.total, count);
    assert_eq!(result.len() as u64, count);
    assert!(result.iter().all(|r| r.id().is_some()));
}

#[tokio::test]
#[ignore = "requires a Salesforce org"]
async fn test_fields_all_pages() {
    let sf = connect(SfOptions::default().with_preload_fields(true));
    let result = sf
        .query(&Soql::new().with_from("User").unwrap().with_limit(250))
        .await
        .unwrap();
    assert!(result.len() <= 250);
    assert!(result.iter().all(|r| r.contains("Username")));
}

#[tokio::test]
#[ignore = "requires a Salesforce org"]
async fn test_typed_objects() {
    let sf = connect(SfOptions::default());
    let users = sf.resolve_type("User").await.unwrap();
    assert!(users.field_names().await.unwrap().iter().any(|f| f == "Alias"));

    let found = users
        .query_objects("IsActive = TRUE", &QueryOptions::new().select("Alias").limit(1))
        .await
        .unwrap();
    let Some(user) = found.first() else {
        return;
    };

    let alias = user.fetch_field("Alias").await.unwrap().unwrap();
    let by_alias = users.get(alias.as_str().unwrap()).await.unwrap().unwrap();
    assert_eq!(by_alias.fetch_field("Alias").await.unwrap(), Some(alias));

    let owned = sftools::query::kinds::user::cases(user, true, 5).await.unwrap();
    assert!(owned.len() <= 5);
    for c in &owned {
        assert!(case::comments(c).await.is_ok());
    }
}

#[tokio::test]
#[ignore = "requires a Salesforce org"]
async fn test_unknown_type() {
    let sf = connect(SfOptions::default());
    assert!(sf.resolve_type("NoSuchObject__x").await.is_err());
}
