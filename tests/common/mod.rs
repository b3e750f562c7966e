use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use serde_json::Value;

use practice_backend::config::EngineConfig;
use practice_backend::routes::build_router;
use practice_backend::state::AppState;

pub fn create_test_app() -> Router {
  let mut config = EngineConfig::default();
  config.generation.seed = Some(11);
  build_router(Arc::new(AppState::with_config(config)))
}

pub fn get(uri: &str) -> Request<Body> {
  Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
  Request::builder()
    .method("POST")
    .uri(uri)
    .header("content-type", "application/json")
    .body(Body::from(body.to_string()))
    .unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
  let bytes = axum::body::to_bytes(response.into_body(), 1 << 20).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}
