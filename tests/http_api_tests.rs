#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use serde_json::json;
use taskgraph::http_api::{self, AppState};
use taskgraph::{Task, Taskgraph, TaskgraphInfo};
use tower::util::ServiceExt;

fn new_router() -> axum::Router {
    http_api::router(AppState::in_memory())
}

fn sample() -> Taskgraph {
    Taskgraph::with_tasks(
        TaskgraphInfo::named("HTTP Demo"),
        vec![
            Task::new("root", 1.0),
            Task::new("sub1", 2.0).with_depends(["root"]),
            Task::new("sub2", 3.0).with_depends(["root"]),
            Task::new("leaf", 4.0).with_depends(["sub1", "sub2"]),
        ],
    )
}

fn put_request(uri: &str, taskgraph: &Taskgraph) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(taskgraph).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn project_lifecycle_via_http_api() {
    let app = new_router();

    let response = app.clone().oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(put_request("/projects/demo", &sample()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get_request("/projects")).await.unwrap();
    assert_eq!(json_body(response).await, json!(["demo"]));

    let response = app
        .clone()
        .oneshot(get_request("/projects/demo"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let fetched: Taskgraph = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(fetched, sample());

    let response = app
        .oneshot(get_request("/projects/demo/analysis"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let analysis = json_body(response).await;
    assert_eq!(analysis["criticalPath"]["projectDuration"], json!(8.0));
    assert_eq!(
        analysis["criticalPath"]["criticalTaskNames"],
        json!(["root", "sub2", "leaf"])
    );
}

#[tokio::test]
async fn missing_project_returns_not_found() {
    let response = new_router()
        .oneshot(get_request("/projects/ghost"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], json!("not_found"));
}

#[tokio::test]
async fn cyclic_dependency_edit_is_a_conflict() {
    let app = new_router();
    app.clone()
        .oneshot(put_request("/projects/demo", &sample()))
        .await
        .unwrap();

    let link = |dependency: &str, dependent: &str| {
        Request::builder()
            .method("POST")
            .uri("/projects/demo/dependencies")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_vec(&json!({ "dependency": dependency, "dependent": dependent }))
                    .unwrap(),
            ))
            .unwrap()
    };

    let response = app.clone().oneshot(link("leaf", "root")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["error"], json!("conflict"));

    let response = app.clone().oneshot(link("sub1", "sub2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["tasks"][2]["depends"], json!(["root", "sub1"]));

    let response = app.oneshot(link("nope", "sub2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_payload_returns_bad_request() {
    let mut bad = sample();
    bad.tasks[0].difficulty = -3.0;
    let response = new_router()
        .oneshot(put_request("/projects/demo", &bad))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], json!("invalid_request"));
}

#[tokio::test]
async fn markdown_export_is_ordered() {
    let app = new_router();
    app.clone()
        .oneshot(put_request("/projects/demo", &sample()))
        .await
        .unwrap();
    let response = app
        .oneshot(get_request("/projects/demo/export.md"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/markdown")
    );
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let md = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(md.starts_with("# HTTP Demo"));
    assert!(md.find("## 1. root").unwrap() < md.find("## 4. leaf").unwrap());
}
