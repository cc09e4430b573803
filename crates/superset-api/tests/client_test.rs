#![allow(clippy::unwrap_used)]
// Integration tests for `SupersetClient` using wiremock.

use std::sync::Arc;

use futures_util::future::join_all;
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use superset_api::models::{DatabasePayload, PermissionKey};
use superset_api::{Credentials, DatabaseCache, Error, SupersetClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, SupersetClient) {
    let server = MockServer::start().await;
    let client = client_for(&server);
    (server, client)
}

fn client_for(server: &MockServer) -> SupersetClient {
    let base_url = Url::parse(&server.uri()).unwrap();
    SupersetClient::new(base_url, &TransportConfig::default().with_cookie_jar()).unwrap()
}

fn credentials(password: &str) -> Credentials {
    Credentials::new("admin", SecretString::from(password.to_owned()))
}

async fn mount_database_listing(server: &MockServer, body: serde_json::Value, calls: u64) {
    Mock::given(method("GET"))
        .and(path("/api/v1/database/"))
        .and(query_param("q", "(page_size:5000)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(calls)
        .mount(server)
        .await;
}

async fn mount_csrf(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/security/csrf_token/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "session=s3ss10n; HttpOnly; Path=/")
                .set_body_json(json!({ "result": "csrf-tok" })),
        )
        .mount(server)
        .await;
}

fn listing() -> serde_json::Value {
    json!({
        "count": 3,
        "result": [
            { "id": 1, "database_name": "examples", "sqlalchemy_uri": "postgresql://u@h/examples", "backend": "postgresql" },
            { "id": 42, "database_name": "X", "sqlalchemy_uri": "superset://",
              "extra": "{\"engine_params\":{\"allowed_dbs\":[\"examples\",\"sales\"]}}" },
            { "id": 43, "database_name": "X", "sqlalchemy_uri": "postgresql://u@h/x" }
        ]
    })
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_success_sends_bearer_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/security/login"))
        .and(body_json(json!({
            "username": "admin",
            "password": "secret",
            "provider": "db",
            "refresh": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "tok" })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/security/roles/"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": [] })))
        .expect(1)
        .mount(&server)
        .await;

    client.login(&credentials("secret")).await.unwrap();
    assert!(client.is_authenticated());
    assert!(client.list_roles().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_login_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/security/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    let result = client.login(&credentials("wrong")).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_login_without_token_is_shape_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/security/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "refresh_token": "r" })))
        .mount(&server)
        .await;

    let result = client.login(&credentials("secret")).await;
    assert!(matches!(result, Err(Error::Deserialization { .. })));
}

// ── Role resolution tests ───────────────────────────────────────────

#[tokio::test]
async fn test_role_id_by_name() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/security/roles/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                { "id": 1, "name": "Admin" },
                { "id": 4, "name": "Gamma" }
            ]
        })))
        .mount(&server)
        .await;

    assert_eq!(client.role_id_by_name("Admin").await.unwrap(), 1);

    let missing = client.role_id_by_name("Nope").await;
    assert!(
        matches!(missing, Err(Error::NotFound { entity: "role", .. })),
        "expected NotFound, got: {missing:?}"
    );
}

#[tokio::test]
async fn test_get_role_404_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/security/roles/9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not found" })))
        .mount(&server)
        .await;

    let err = client.get_role(9).await.unwrap_err();
    assert!(err.is_not_found());
}

// ── Permission tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_permission_ids_resolve_against_one_catalogue_fetch() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/security/permissions-resources/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                { "id": 10, "permission": { "name": "can_read" }, "view_menu": { "name": "Dashboard" } },
                { "id": 11, "permission": { "name": "can_write" }, "view_menu": { "name": "Dashboard" } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ids = client
        .permission_ids(&[
            PermissionKey::new("can_write", "Dashboard"),
            PermissionKey::new("can_read", "Dashboard"),
        ])
        .await
        .unwrap();

    assert_eq!(ids, vec![11, 10]);
}

#[tokio::test]
async fn test_replace_role_permissions_sends_bulk_payload() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/security/roles/3/permissions"))
        .and(body_json(json!({ "permission_view_menu_ids": [10, 12] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": {} })))
        .expect(1)
        .mount(&server)
        .await;

    client.replace_role_permissions(3, &[10, 12]).await.unwrap();
}

#[tokio::test]
async fn test_clear_role_permissions_sends_empty_list() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/security/roles/3/permissions"))
        .and(body_json(json!({ "permission_view_menu_ids": [] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.clear_role_permissions(3).await.unwrap();
}

// ── Database listing cache tests ────────────────────────────────────

#[tokio::test]
async fn test_concurrent_listing_reads_issue_one_request() {
    let (server, client) = setup().await;
    mount_database_listing(&server, listing(), 1).await;

    let results = join_all((0..8).map(|_| client.list_databases())).await;

    for result in results {
        assert_eq!(result.unwrap().len(), 3);
    }
}

#[tokio::test]
async fn test_listing_cache_is_shared_between_clients() {
    let server = MockServer::start().await;
    mount_database_listing(&server, listing(), 1).await;

    let cache = Arc::new(DatabaseCache::default());
    let first = client_for(&server).with_database_cache(Arc::clone(&cache));
    let second = client_for(&server).with_database_cache(cache);

    assert_eq!(first.database_id_by_name("examples").await.unwrap(), 1);
    assert_eq!(second.database_name_by_id(1).await.unwrap(), "examples");
}

#[tokio::test]
async fn test_duplicate_database_name_is_ambiguous() {
    let (server, client) = setup().await;
    mount_database_listing(&server, listing(), 1).await;

    let err = client.database_id_by_name("X").await.unwrap_err();
    match err {
        Error::AmbiguousName { ids, .. } => assert_eq!(ids, vec![42, 43]),
        other => panic!("expected AmbiguousName, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_create_database_uses_csrf_and_invalidates_cache() {
    let (server, client) = setup().await;
    mount_database_listing(&server, listing(), 2).await;
    mount_csrf(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/database/"))
        .and(header("x-csrftoken", "csrf-tok"))
        .and(header("cookie", "session=s3ss10n"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 5,
            "result": { "database_name": "warehouse", "allow_dml": true }
        })))
        .expect(1)
        .mount(&server)
        .await;

    client.list_databases().await.unwrap();

    let payload = DatabasePayload {
        database_name: "warehouse".into(),
        sqlalchemy_uri: "postgresql://u:p@db:5432/wh".into(),
        engine: None,
        configuration_method: None,
        expose_in_sqllab: true,
        allow_ctas: false,
        allow_cvas: false,
        allow_dml: true,
        allow_run_async: false,
        allow_csv_upload: Some(false),
        allow_multi_schema_metadata_fetch: Some(true),
        cache_timeout: Some(0),
        is_managed_externally: None,
        extra: "{\"client_encoding\": \"utf8\"}".into(),
    };
    let created = client.create_database(&payload).await.unwrap();
    assert_eq!(created.id, Some(5));
    assert_eq!(created.database_name, "warehouse");

    // Invalidated by the create, so this read goes back to the server.
    client.list_databases().await.unwrap();
}

#[tokio::test]
async fn test_mutation_sends_back_every_session_cookie() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/security/csrf_token/"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", "session=s3ss10n; HttpOnly; Path=/")
                .append_header("set-cookie", "lang=en; Path=/; SameSite=Lax")
                .set_body_json(json!({ "result": "csrf-tok" })),
        )
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/database/7"))
        .and(header("x-csrftoken", "csrf-tok"))
        .and(header_regex("cookie", "session=s3ss10n"))
        .and(header_regex("cookie", "lang=en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "OK" })))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_database(7).await.unwrap();
}

#[tokio::test]
async fn test_client_without_cookie_jar_sends_no_session_cookie() {
    let server = MockServer::start().await;
    let client = SupersetClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
    );
    mount_csrf(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/database/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "OK" })))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_database(7).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let delete = requests
        .iter()
        .find(|r| r.method == wiremock::http::Method::DELETE)
        .unwrap();
    assert!(delete.headers.get("cookie").is_none());
}

// ── Meta database tests ─────────────────────────────────────────────

#[tokio::test]
async fn test_get_meta_database_takes_extra_from_listing() {
    let (server, client) = setup().await;
    mount_database_listing(&server, listing(), 1).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/database/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "result": {
                "database_name": "X",
                "sqlalchemy_uri": "superset://",
                "expose_in_sqllab": true,
                "allow_run_async": true
            }
        })))
        .mount(&server)
        .await;

    let meta = client.get_meta_database(42).await.unwrap();
    assert_eq!(meta.database_name, "X");
    assert_eq!(
        meta.allowed_databases,
        Some(vec!["examples".to_owned(), "sales".to_owned()])
    );
}

#[tokio::test]
async fn test_find_meta_database_requires_marker_uri() {
    let (server, client) = setup().await;
    mount_database_listing(
        &server,
        json!({ "result": [
            { "id": 43, "database_name": "X", "sqlalchemy_uri": "postgresql://u@h/x" }
        ]}),
        1,
    )
    .await;

    assert!(client.find_meta_database("X").await.unwrap().is_none());
}

// ── Database enrichment tests ───────────────────────────────────────

#[tokio::test]
async fn test_database_infos_fill_placeholders() {
    let (server, client) = setup().await;
    mount_database_listing(
        &server,
        json!({ "result": [ { "id": 1, "database_name": "examples" } ] }),
        1,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/database/1/connection"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "result": { "database_name": "", "backend": "postgresql" }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/database/1/schemas/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": ["public", "staging"] })),
        )
        .mount(&server)
        .await;

    let infos = client.database_infos(100).await.unwrap();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].database_name, "Name not provided");
    assert_eq!(infos[0].sqlalchemy_uri, "URI not provided");
    assert_eq!(infos[0].schemas, vec!["public", "staging"]);
}

// ── Dataset tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_missing_dataset_reports_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/dataset/77"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not found" })))
        .mount(&server)
        .await;

    let err = client.delete_dataset(77).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_get_dataset_decodes_database_reference() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/dataset/8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 8,
            "result": {
                "table_name": "t1",
                "schema": "public",
                "sql": null,
                "database": { "id": 1, "database_name": "examples" }
            }
        })))
        .mount(&server)
        .await;

    let dataset = client.get_dataset(8).await.unwrap();
    assert_eq!(dataset.id, Some(8));
    assert_eq!(dataset.table_name, "t1");
    assert_eq!(dataset.database.unwrap().id, 1);
    assert_eq!(dataset.sql, None);
}
