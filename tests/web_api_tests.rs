//! HTTP contract tests against the router, driven with `tower::ServiceExt::oneshot`

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::builders::*;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use signflow_core::config::WebConfig;
use signflow_core::constants::{DocumentStatus, SignerRole};
use signflow_core::web::{create_app, AppState};
use tower::ServiceExt;
use uuid::Uuid;

fn app(fixture: &FlowFixture) -> Router {
    create_app(AppState::new(
        fixture.engine.clone(),
        WebConfig::default(),
        "test",
    ))
}

fn request(method: &str, uri: &str, caller: Option<(Uuid, &str)>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((user_id, role)) = caller {
        builder = builder
            .header("x-user-id", user_id.to_string())
            .header("x-user-role", role);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_health_without_database() {
    let fixture = FlowFixtureBuilder::new().build().await;
    let (status, body) = send(app(&fixture), request("GET", "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "not_configured");
    assert_eq!(body["environment"], "test");
}

#[tokio::test]
async fn test_admin_defines_flow_and_reads_it_back() {
    let fixture = FlowFixtureBuilder::new().build().await;
    let admin = fixture.user("Ana Administradora").await;
    let uri = format!("/documents/{}/flow", fixture.document_id);

    let (status, body) = send(
        app(&fixture),
        request(
            "POST",
            &uri,
            Some((admin, "admin")),
            Some(json!({
                "required_signatures": [
                    {"role": "management", "count": 1, "order": 2},
                    {"role": "operativo", "count": 2, "order": 1}
                ]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["stages"].as_array().unwrap().len(), 2);

    let (status, body) = send(app(&fixture), request("GET", &uri, Some((admin, "admin")), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["flow"][0]["role"], "employer");
    assert_eq!(body["flow"][0]["is_active"], true);
    assert_eq!(body["flow"][1]["role"], "management");
    assert_eq!(body["progress"]["total_required"], 3);
    assert_eq!(body["progress"]["total_signed"], 0);
}

#[tokio::test]
async fn test_non_admin_cannot_define_flow() {
    let fixture = FlowFixtureBuilder::new().build().await;
    let coordinator = fixture.user("Carlos Coordinador").await;

    let (status, body) = send(
        app(&fixture),
        request(
            "POST",
            &format!("/documents/{}/flow", fixture.document_id),
            Some((coordinator, "management")),
            Some(json!({"required_signatures": [{"role": "admin", "count": 1, "order": 1}]})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert!(fixture.store.stages(fixture.document_id).await.is_empty());
}

#[tokio::test]
async fn test_empty_definition_is_bad_request() {
    let fixture = FlowFixtureBuilder::new().build().await;
    let admin = fixture.user("Ana Administradora").await;

    let (status, body) = send(
        app(&fixture),
        request(
            "POST",
            &format!("/documents/{}/flow", fixture.document_id),
            Some((admin, "admin")),
            Some(json!({"required_signatures": []})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("at least one"));
}

#[tokio::test]
async fn test_unknown_role_in_definition_is_bad_request() {
    let fixture = FlowFixtureBuilder::new().build().await;
    let admin = fixture.user("Ana Administradora").await;

    let (status, body) = send(
        app(&fixture),
        request(
            "POST",
            &format!("/documents/{}/flow", fixture.document_id),
            Some((admin, "admin")),
            Some(json!({"required_signatures": [{"role": "auditor", "count": 1, "order": 1}]})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let fixture = operational_then_coordinator().await;

    let (status, body) = send(
        app(&fixture),
        request(
            "POST",
            &format!("/documents/{}/sign", fixture.document_id),
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        app(&fixture),
        request(
            "GET",
            "/documents/pending",
            Some((Uuid::new_v4(), "janitor")),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sign_flow_over_http() {
    let fixture = operational_then_coordinator().await;
    let first_operator = fixture.user("Luis Operativo").await;
    let second_operator = fixture.user("Marta Operativa").await;
    let coordinator = fixture.user("Carlos Coordinador").await;
    let uri = format!("/documents/{}/sign", fixture.document_id);

    let (status, body) = send(
        app(&fixture),
        request("POST", &uri, Some((coordinator, "coordinador")), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("employer"));

    let (status, body) = send(
        app(&fixture),
        request("POST", &uri, Some((first_operator, "employer")), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["stage_completed"], false);

    let (status, body) = send(
        app(&fixture),
        request("POST", &uri, Some((first_operator, "employer")), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User has already signed this document");

    let (_, body) = send(
        app(&fixture),
        request("POST", &uri, Some((second_operator, "employer")), None),
    )
    .await;
    assert_eq!(body["stage_completed"], true);
    assert_eq!(body["next_stage"]["role"], "management");

    let (status, body) = send(
        app(&fixture),
        request("GET", "/documents/pending", Some((coordinator, "management")), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["documents"][0]["document_id"], fixture.document_id.to_string());

    let (_, body) = send(
        app(&fixture),
        request("POST", &uri, Some((coordinator, "management")), None),
    )
    .await;
    assert_eq!(body["flow_completed"], true);
    assert_eq!(fixture.document_status().await, DocumentStatus::Signed);
}

#[tokio::test]
async fn test_unknown_document_is_not_found() {
    let fixture = FlowFixtureBuilder::new().build().await;
    let operator = fixture.user("Luis Operativo").await;

    let (status, body) = send(
        app(&fixture),
        request(
            "POST",
            &format!("/documents/{}/sign", Uuid::new_v4()),
            Some((operator, SignerRole::Employer.as_str())),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        app(&fixture),
        request(
            "GET",
            "/documents/not-a-uuid/flow",
            Some((operator, "employer")),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_storage_failure_is_generic_server_error() {
    let fixture = operational_then_coordinator().await;
    let operator = fixture.user("Luis Operativo").await;
    fixture.store.fail_next_commit().await;

    let (status, body) = send(
        app(&fixture),
        request(
            "POST",
            &format!("/documents/{}/sign", fixture.document_id),
            Some((operator, "employer")),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Failed to record signature");
}
