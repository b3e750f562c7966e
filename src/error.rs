//! Engine-level errors and their collapse into the two messages students see.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::attempt::SubmissionError;
use crate::options::GenerationError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum EngineError {
  #[error("unknown topic {0}")]
  UnknownTopic(String),
  #[error(transparent)]
  Submission(#[from] SubmissionError),
  #[error(transparent)]
  Storage(#[from] StorageError),
  #[error(transparent)]
  Generation(#[from] GenerationError),
}

impl EngineError {
  /// Machine-readable code returned next to the outward message.
  pub fn code(&self) -> &'static str {
    match self {
      EngineError::UnknownTopic(_) => "unknown_topic",
      EngineError::Submission(SubmissionError::UnknownInstance(_)) => "unknown_instance",
      EngineError::Submission(SubmissionError::AlreadyResolved) => "already_resolved",
      EngineError::Submission(SubmissionError::Malformed(_)) => "malformed_submission",
      EngineError::Storage(StorageError::Conflict { .. }) => "storage_conflict",
      EngineError::Storage(StorageError::Backend(_)) => "storage_unavailable",
      EngineError::Generation(_) => "generation_failed",
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      EngineError::UnknownTopic(_) | EngineError::Submission(SubmissionError::UnknownInstance(_)) => {
        StatusCode::NOT_FOUND
      }
      EngineError::Submission(SubmissionError::Malformed(_)) => StatusCode::BAD_REQUEST,
      EngineError::Submission(SubmissionError::AlreadyResolved) | EngineError::Storage(StorageError::Conflict { .. }) => {
        StatusCode::CONFLICT
      }
      EngineError::Storage(StorageError::Backend(_)) => StatusCode::SERVICE_UNAVAILABLE,
      EngineError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

/// What the HTTP and WebSocket surfaces report. The detail stays in the logs.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("could not load a new problem")]
  LoadProblem(#[source] EngineError),
  #[error("could not submit answer, please retry")]
  SubmitAnswer(#[source] EngineError),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
  pub error: String,
  pub code: &'static str,
}

impl ApiError {
  pub fn inner(&self) -> &EngineError {
    match self {
      ApiError::LoadProblem(e) | ApiError::SubmitAnswer(e) => e,
    }
  }

  pub fn body(&self) -> ErrorBody {
    ErrorBody { error: self.to_string(), code: self.inner().code() }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let inner = self.inner();
    warn!(target: "practice_backend", code = inner.code(), error = %inner, "Request failed");
    (inner.status(), Json(self.body())).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use uuid::Uuid;

  #[test]
  fn outward_messages_collapse_to_two() {
    let load = ApiError::LoadProblem(EngineError::UnknownTopic("calculus".into()));
    assert_eq!(load.to_string(), "could not load a new problem");
    assert_eq!(load.body().code, "unknown_topic");

    let submit = ApiError::SubmitAnswer(EngineError::Storage(StorageError::Backend("disk".into())));
    assert_eq!(submit.to_string(), "could not submit answer, please retry");
    assert_eq!(submit.inner().status(), StatusCode::SERVICE_UNAVAILABLE);
  }

  #[test]
  fn submission_errors_map_to_statuses() {
    let unknown: EngineError = SubmissionError::UnknownInstance(Uuid::nil()).into();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    let resolved: EngineError = SubmissionError::AlreadyResolved.into();
    assert_eq!(resolved.status(), StatusCode::CONFLICT);
    let malformed: EngineError = SubmissionError::Malformed("empty".into()).into();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    assert_eq!(malformed.code(), "malformed_submission");
  }
}
