//! OrientDbClient against a local stand-in for the OrientDB REST API.

use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use schemegraph::db::{OrientDbClient, SchemaSource};
use schemegraph::schema::{BuildOptions, RawEndpointPair, SchemaBuilder};
use schemegraph::SchemeError;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// `root:secret`
const AUTH: &str = "Basic cm9vdDpzZWNyZXQ=";

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("authorization").and_then(|v| v.to_str().ok()) == Some(AUTH)
}

async fn handle_command(
    Path(db): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"errors": [{"code": 401, "reason": 401, "content": "401 Unauthorized."}]})),
        );
    }
    if db != "demodb" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"errors": [{"code": 404, "content": "Database not found"}]})),
        );
    }

    let sql = body["command"].as_str().unwrap_or_default().to_string();
    if sql.contains("metadata:schema") {
        return (
            StatusCode::OK,
            Json(json!({"result": [
                {"@type": "d", "name": "Broken", "superClass": "E"},
                {"@type": "d", "name": "E", "superClass": null},
                {"@type": "d", "name": "Employee", "superClasses": ["Person"]},
                {"@type": "d", "name": "Manages", "superClass": "E"},
                {"@type": "d", "name": "Person", "superClass": "V"},
                {"@type": "d", "name": "V"},
                {"@type": "d", "name": "WorksAt", "superClass": "E"}
            ]})),
        );
    }
    if sql.contains("FROM `WorksAt`") {
        return (
            StatusCode::OK,
            Json(json!({"result": [
                {"fromClass": "Employee", "toClass": "Person"},
                {"fromClass": "Employee", "toClass": "Person"},
                {"fromClass": "Employee", "toClass": null}
            ]})),
        );
    }
    if sql.contains("FROM `Manages`") {
        return (StatusCode::OK, Json(json!({"result": []})));
    }
    if sql.contains("FROM `Slow`") {
        tokio::time::sleep(Duration::from_secs(3)).await;
        return (StatusCode::OK, Json(json!({"result": []})));
    }

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"errors": [{"code": 500, "reason": 500, "content": "Class is not an edge"}]})),
    )
}

async fn handle_connect(Path(db): Path<String>, headers: HeaderMap) -> StatusCode {
    if !authorized(&headers) {
        StatusCode::UNAUTHORIZED
    } else if db != "demodb" {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

async fn spawn_fake_orientdb() -> Url {
    let app = Router::new()
        .route("/command/:db/sql", post(handle_command))
        .route("/connect/:db", get(handle_connect));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{}", addr)).unwrap()
}

fn client(base: Url, database: &str, password: &str) -> OrientDbClient {
    OrientDbClient::new(
        base,
        database,
        "root",
        Some(password.to_string()),
        Duration::from_millis(500),
    )
    .unwrap()
}

#[tokio::test]
async fn lists_classes_with_superclasses() {
    let base = spawn_fake_orientdb().await;
    let classes = client(base, "demodb", "secret").list_classes().await.unwrap();

    assert_eq!(classes.len(), 7);
    let employee = classes.iter().find(|c| c.name == "Employee").unwrap();
    assert_eq!(employee.super_class.as_deref(), Some("Person"));
    let v = classes.iter().find(|c| c.name == "V").unwrap();
    assert_eq!(v.super_class, None);
}

#[tokio::test]
async fn lists_endpoint_pairs_with_unknown_fallback() {
    let base = spawn_fake_orientdb().await;
    let pairs = client(base, "demodb", "secret")
        .list_distinct_endpoints("WorksAt")
        .await
        .unwrap();

    assert_eq!(
        pairs,
        vec![
            RawEndpointPair::new("Employee", "Person"),
            RawEndpointPair::new("Employee", "Person"),
            RawEndpointPair::new("Employee", "Unknown"),
        ]
    );
}

#[tokio::test]
async fn empty_edge_class_is_not_an_error() {
    let base = spawn_fake_orientdb().await;
    let pairs = client(base, "demodb", "secret")
        .list_distinct_endpoints("Manages")
        .await
        .unwrap();
    assert!(pairs.is_empty());
}

#[tokio::test]
async fn rejected_endpoint_query_names_edge_class() {
    let base = spawn_fake_orientdb().await;
    let err = client(base, "demodb", "secret")
        .list_distinct_endpoints("Broken")
        .await
        .unwrap_err();

    match err {
        SchemeError::EdgeQuery { edge, reason } => {
            assert_eq!(edge, "Broken");
            assert!(reason.contains("Class is not an edge"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn wrong_credentials_are_a_connection_error() {
    let base = spawn_fake_orientdb().await;
    let db = client(base, "demodb", "wrong");

    assert!(matches!(db.list_classes().await, Err(SchemeError::Connection(_))));
    assert!(matches!(db.ping().await, Err(SchemeError::Connection(_))));
}

#[tokio::test]
async fn unknown_database_fails_metadata_query() {
    let base = spawn_fake_orientdb().await;
    let db = client(base, "nope", "secret");

    assert!(matches!(db.list_classes().await, Err(SchemeError::SchemaQuery(_))));
    assert!(matches!(db.ping().await, Err(SchemeError::Connection(_))));
}

#[tokio::test]
async fn ping_succeeds() {
    let base = spawn_fake_orientdb().await;
    client(base, "demodb", "secret").ping().await.unwrap();
}

#[tokio::test]
async fn unreachable_server_is_a_connection_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let base = Url::parse(&format!("http://127.0.0.1:{}", port)).unwrap();
    let err = client(base, "demodb", "secret").list_classes().await.unwrap_err();
    assert!(matches!(err, SchemeError::Connection(_)));
}

#[tokio::test]
async fn slow_query_times_out() {
    let base = spawn_fake_orientdb().await;
    let err = client(base, "demodb", "secret")
        .list_distinct_endpoints("Slow")
        .await
        .unwrap_err();
    assert!(matches!(err, SchemeError::Timeout(_)));
}

#[tokio::test]
async fn invalid_class_name_never_reaches_server() {
    let base = spawn_fake_orientdb().await;
    let err = client(base, "demodb", "secret")
        .list_distinct_endpoints("x` WHERE 1=1 --")
        .await
        .unwrap_err();
    assert!(matches!(err, SchemeError::InvalidClassName(_)));
}

#[tokio::test]
async fn full_build_over_rest() {
    let base = spawn_fake_orientdb().await;
    let source = Arc::new(client(base, "demodb", "secret"));
    let builder = SchemaBuilder::new(source, BuildOptions::default());

    let doc = builder.build().await.unwrap();

    assert_eq!(doc.vertex_names().collect::<Vec<_>>(), vec!["Person", "Employee"]);
    assert_eq!(
        doc.edge_names().collect::<Vec<_>>(),
        vec!["Broken", "Manages", "WorksAt"]
    );
    let rels: Vec<(&str, &str, &str)> = doc
        .relationships
        .iter()
        .map(|r| (r.edge_name.as_str(), r.from.as_str(), r.to.as_str()))
        .collect();
    assert_eq!(
        rels,
        vec![
            ("Inheritance", "Person", "Employee"),
            ("WorksAt", "Person", "Person"),
            ("WorksAt", "Person", "Unknown"),
        ]
    );
}
