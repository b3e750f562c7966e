//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Wire names are camelCase. Option correctness never leaves the server.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::TopicConfig;
use crate::domain::{FamilyId, InstanceSource, Level, Trace};
use crate::engine::{StartedInstance, SubmitResult};
use crate::error::ErrorBody;
use crate::ledger::PerformanceLedger;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
  Ping,
  NewInstance {
    #[serde(rename = "topicId")]
    topic_id: String,
    #[serde(rename = "studentId")]
    student_id: String,
  },
  SubmitAnswer {
    #[serde(rename = "instanceId")]
    instance_id: Uuid,
    #[serde(rename = "selectedValue")]
    selected_value: String,
    #[serde(rename = "elapsedSeconds", default)]
    elapsed_seconds: f64,
  },
  ClassifierAccuracy {
    #[serde(rename = "topicId")]
    topic_id: String,
  },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
  Pong,
  Instance { instance: InstanceOut },
  AnswerResult(SubmitOut),
  ClassifierAccuracy(ClassifierOut),
  Error(ErrorBody),
}

/// DTO used by both WS and HTTP for instance delivery.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceOut {
  pub id: Uuid,
  pub family: FamilyId,
  pub level: Level,
  pub source: InstanceSource,
  pub display: String,
  pub options: Vec<String>,
}

pub fn to_out(started: &StartedInstance) -> InstanceOut {
  InstanceOut {
    id: started.instance.id,
    family: started.instance.family,
    level: started.instance.level,
    source: started.instance.source,
    display: started.instance.display.clone(),
    options: started.options.iter().map(|o| o.value.clone()).collect(),
  }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceIn {
  pub topic_id: String,
  pub student_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitIn {
  pub instance_id: Uuid,
  pub selected_value: String,
  #[serde(default)]
  pub elapsed_seconds: f64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOut {
  pub is_correct: bool,
  pub attempts_remaining: u32,
  pub new_level: Level,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub trace: Option<Trace>,
}

impl From<SubmitResult> for SubmitOut {
  fn from(r: SubmitResult) -> Self {
    Self { is_correct: r.is_correct, attempts_remaining: r.attempts_remaining, new_level: r.new_level, trace: r.trace }
  }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierOut {
  pub topic_id: String,
  pub accuracy: Option<f64>,
  pub examples: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerOut {
  pub student_id: String,
  pub topic_id: String,
  #[serde(flatten)]
  pub ledger: PerformanceLedger,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicOut {
  pub id: String,
  pub family: FamilyId,
  pub max_attempts: u32,
}

impl From<&TopicConfig> for TopicOut {
  fn from(t: &TopicConfig) -> Self {
    Self { id: t.id.clone(), family: t.family, max_attempts: t.max_attempts }
  }
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
}
