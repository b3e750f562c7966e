use axum::http::StatusCode;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

use common::{create_test_app, get, json_body, post_json};

async fn new_instance(app: &axum::Router, topic: &str, student: &str) -> Value {
  let response = app
    .clone()
    .oneshot(post_json("/api/v1/instances", json!({ "topicId": topic, "studentId": student })))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  json_body(response).await
}

#[tokio::test]
async fn test_health() {
  let app = create_test_app();
  let response = app.oneshot(get("/api/v1/health")).await.unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(json_body(response).await["ok"], true);
}

#[tokio::test]
async fn test_topics_lists_configured_families() {
  let app = create_test_app();
  let body = json_body(app.oneshot(get("/api/v1/topics")).await.unwrap()).await;
  let families: Vec<&str> = body.as_array().unwrap().iter().map(|t| t["family"].as_str().unwrap()).collect();
  assert_eq!(
    families,
    ["carried_addition", "borrow_subtraction", "truth_table", "triangle_centers", "fraction_simplification"]
  );
}

#[tokio::test]
async fn test_instance_hides_correctness() {
  let app = create_test_app();
  let body = new_instance(&app, "logic", "s1").await;
  assert_eq!(body["family"], "truth_table");
  assert_eq!(body["level"], 1);
  let options = body["options"].as_array().unwrap();
  assert_eq!(options.len(), 4);
  assert!(options.iter().all(|o| o.is_string()));
  assert!(!body.to_string().contains("isCorrect"));
}

#[tokio::test]
async fn test_unknown_topic_collapses_message() {
  let app = create_test_app();
  let response = app
    .oneshot(post_json("/api/v1/instances", json!({ "topicId": "calculus", "studentId": "s1" })))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::NOT_FOUND);
  let body = json_body(response).await;
  assert_eq!(body["error"], "could not load a new problem");
  assert_eq!(body["code"], "unknown_topic");
}

#[tokio::test]
async fn test_submit_then_resubmit() {
  let app = create_test_app();
  let instance = new_instance(&app, "addition", "s1").await;
  let id = instance["id"].as_str().unwrap().to_string();
  let choice = instance["options"][0].as_str().unwrap().to_string();

  let submit = json!({ "instanceId": id, "selectedValue": choice, "elapsedSeconds": 3.5 });
  let response = app.clone().oneshot(post_json("/api/v1/submit", submit.clone())).await.unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  let body = json_body(response).await;
  assert_eq!(body["attemptsRemaining"], 0);
  assert_eq!(body["newLevel"], 1);
  // Single-attempt topics are resolved after one submission, so the trace is shown.
  assert!(body["trace"].as_array().is_some_and(|steps| !steps.is_empty()));

  let response = app.clone().oneshot(post_json("/api/v1/submit", submit)).await.unwrap();
  assert_eq!(response.status(), StatusCode::CONFLICT);
  let body = json_body(response).await;
  assert_eq!(body["error"], "could not submit answer, please retry");
  assert_eq!(body["code"], "already_resolved");

  let ledger = json_body(app.oneshot(get("/api/v1/topics/addition/ledger/s1")).await.unwrap()).await;
  assert_eq!(ledger["totalAttemptsAtLevel"], 1);
  assert_eq!(ledger["studentId"], "s1");
}

#[tokio::test]
async fn test_submit_rejects_bad_input() {
  let app = create_test_app();
  let instance = new_instance(&app, "fractions", "s1").await;
  let id = instance["id"].as_str().unwrap().to_string();

  let response = app
    .clone()
    .oneshot(post_json("/api/v1/submit", json!({ "instanceId": id, "selectedValue": "999/1000", "elapsedSeconds": 1.0 })))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  assert_eq!(json_body(response).await["code"], "malformed_submission");

  let response = app
    .oneshot(post_json(
      "/api/v1/submit",
      json!({ "instanceId": "00000000-0000-0000-0000-000000000000", "selectedValue": "1", "elapsedSeconds": 1.0 }),
    ))
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_classifier_report_starts_empty() {
  let app = create_test_app();
  let body = json_body(app.clone().oneshot(get("/api/v1/topics/triangles/classifier")).await.unwrap()).await;
  assert_eq!(body["topicId"], "triangles");
  assert_eq!(body["examples"], 0);
  assert!(body["accuracy"].is_null());

  let response = app.oneshot(get("/api/v1/topics/calculus/classifier")).await.unwrap();
  assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
