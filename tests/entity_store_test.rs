//! LinkHub entity store tests against a mock LinkHub API

use linkhub_sync::adapters::linkhub::{EntityStore, HttpEntityStore};
use linkhub_sync::config::{secret_string, LinkHubConfig};
use linkhub_sync::domain::{EntityType, FieldMap, SyncError, TenantId};
use mockito::{Matcher, Server};
use serde_json::json;

fn store_for(server: &Server, token: Option<&str>) -> HttpEntityStore {
    HttpEntityStore::new(&LinkHubConfig {
        base_url: format!("{}/", server.url()),
        api_token: token.map(secret_string),
        ..LinkHubConfig::default()
    })
    .unwrap()
}

fn fields() -> FieldMap {
    json!({ "description": "Revenue: Big Deal", "symbol": "€" })
        .as_object()
        .cloned()
        .unwrap()
}

fn tenant() -> TenantId {
    TenantId::new("company-1").unwrap()
}

#[tokio::test]
async fn test_save_entity_posts_fields_with_tenant() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/indicators")
        .match_header("authorization", "Bearer lh-token")
        .match_body(Matcher::PartialJson(json!({
            "description": "Revenue: Big Deal",
            "companyId": "company-1",
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": {"id": "ind-42"}}"#)
        .create_async()
        .await;

    let store = store_for(&server, Some("lh-token"));
    let id = store
        .save_entity(EntityType::Indicators, &fields(), &tenant())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(id.as_str(), "ind-42");
}

#[tokio::test]
async fn test_save_entity_accepts_typed_numeric_id() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/values")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data": {"valueId": 77}}"#)
        .create_async()
        .await;

    let store = store_for(&server, None);
    let id = store
        .save_entity(EntityType::Values, &FieldMap::new(), &tenant())
        .await
        .unwrap();

    assert_eq!(id.as_str(), "77");
}

#[tokio::test]
async fn test_save_entity_http_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/initiatives")
        .with_status(500)
        .with_body("database unavailable")
        .create_async()
        .await;

    let store = store_for(&server, None);
    let err = store
        .save_entity(EntityType::Initiatives, &fields(), &tenant())
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::EntityStore(_)));
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_save_entity_rejected_by_api() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/indicators")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": false, "error": "duplicate indicator"}"#)
        .create_async()
        .await;

    let store = store_for(&server, None);
    let err = store
        .save_entity(EntityType::Indicators, &fields(), &tenant())
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::EntityStore(_)));
    assert!(err.to_string().contains("duplicate indicator"));
}

#[tokio::test]
async fn test_save_entity_without_id() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/indicators")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": {}}"#)
        .create_async()
        .await;

    let store = store_for(&server, None);
    let err = store
        .save_entity(EntityType::Indicators, &fields(), &tenant())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("carried no id"));
}
