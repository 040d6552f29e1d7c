//! Mock org helpers shared by the unit tests.

use serde_json::{json, Value};
use sftools_client::{ClientConfig, SalesforceClient};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::{Sf, SfOptions};
use crate::session::Session;

pub(crate) const QUERY_PATH: &str = "/services/data/v53.0/query";

/// A client pointed at `server`, without transport retries.
pub(crate) fn mock_sf(server: &MockServer) -> Sf {
    mock_sf_with(server, SfOptions::default())
}

pub(crate) fn mock_sf_with(server: &MockServer, options: SfOptions) -> Sf {
    let client = SalesforceClient::with_config(
        server.uri(),
        "token",
        ClientConfig::builder().without_retry().build(),
    )
    .unwrap();
    Sf::new(Session::new(client), options)
}

/// `count` records with ids `r<start>`..
pub(crate) fn records(start: usize, count: usize) -> Vec<Value> {
    (start..start + count)
        .map(|i| json!({"attributes": {"type": "Case"}, "Id": format!("r{i}")}))
        .collect()
}

/// Answer `SELECT COUNT() ...` with `total`.
pub(crate) async fn mount_count(server: &MockServer, statement: &str, total: u64) {
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param("q", statement))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"totalSize": total, "done": true})),
        )
        .mount(server)
        .await;
}

/// Answer `statement` with one complete page of `records`.
pub(crate) async fn mount_page(server: &MockServer, statement: &str, records: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param("q", statement))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalSize": records.len(),
            "done": true,
            "records": records,
        })))
        .mount(server)
        .await;
}

/// Answer a count and its data page for a query returning `records`.
pub(crate) async fn mount_query(server: &MockServer, count: &str, data: &str, records: Vec<Value>) {
    mount_count(server, count, records.len() as u64).await;
    mount_page(server, data, records).await;
}

/// Answer `statement` with a 400 error.
pub(crate) async fn mount_malformed(server: &MockServer, statement: &str) {
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param("q", statement))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!([
            {"errorCode": "MALFORMED_QUERY", "message": "unexpected token"}
        ])))
        .mount(server)
        .await;
}

/// Describe `sobject` with `fields` as `(name, type)` pairs and the given
/// record types as `(id, active)` pairs.
pub(crate) async fn mount_describe(
    server: &MockServer,
    sobject: &str,
    fields: &[(&str, &str)],
    record_types: &[(&str, bool)],
) {
    let fields: Vec<Value> = fields
        .iter()
        .map(|(name, field_type)| json!({"name": name, "label": name, "type": field_type}))
        .collect();
    let record_types: Vec<Value> = record_types
        .iter()
        .map(|(id, active)| {
            json!({"name": id, "recordTypeId": id, "active": active, "available": true})
        })
        .collect();

    Mock::given(method("GET"))
        .and(path(format!("/services/data/v53.0/sobjects/{sobject}/describe")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": sobject,
            "label": sobject,
            "queryable": true,
            "fields": fields,
            "recordTypeInfos": record_types,
        })))
        .expect(1)
        .mount(server)
        .await;
}
