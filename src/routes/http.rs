//! HTTP endpoint handlers. Thin wrappers over the engine; failures are
//! collapsed into `ApiError` so students only ever see two messages.

use std::sync::Arc;

use axum::{
  extract::{Path, State},
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_topics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let topics: Vec<TopicOut> = state.engine.config().topics.iter().map(TopicOut::from).collect();
  Json(topics)
}

#[instrument(level = "info", skip(state, body), fields(topic_id = %body.topic_id, student_id = %body.student_id))]
pub async fn http_post_instance(
  State(state): State<Arc<AppState>>,
  Json(body): Json<InstanceIn>,
) -> Result<Json<InstanceOut>, ApiError> {
  let started = state.engine.start_instance(&body.topic_id, &body.student_id).await.map_err(ApiError::LoadProblem)?;
  info!(target: "practice_backend", id = %started.instance.id, topic_id = %body.topic_id, "HTTP instance served");
  Ok(Json(to_out(&started)))
}

#[instrument(level = "info", skip(state, body), fields(instance_id = %body.instance_id))]
pub async fn http_post_submit(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SubmitIn>,
) -> Result<Json<SubmitOut>, ApiError> {
  let result = state
    .engine
    .submit(body.instance_id, &body.selected_value, body.elapsed_seconds)
    .await
    .map_err(ApiError::SubmitAnswer)?;
  info!(target: "practice_backend", id = %body.instance_id, correct = result.is_correct, level = %result.new_level, "HTTP submission evaluated");
  Ok(Json(result.into()))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_classifier(
  State(state): State<Arc<AppState>>,
  Path(topic_id): Path<String>,
) -> Result<Json<ClassifierOut>, ApiError> {
  let accuracy = state.engine.classifier_accuracy(&topic_id).await.map_err(ApiError::LoadProblem)?;
  let examples = state.engine.example_count(&topic_id).await.map_err(ApiError::LoadProblem)?;
  Ok(Json(ClassifierOut { topic_id, accuracy, examples }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_ledger(
  State(state): State<Arc<AppState>>,
  Path((topic_id, student_id)): Path<(String, String)>,
) -> Result<Json<LedgerOut>, ApiError> {
  let ledger = state.engine.ledger(&student_id, &topic_id).await.map_err(ApiError::LoadProblem)?;
  Ok(Json(LedgerOut { student_id, topic_id, ledger }))
}
