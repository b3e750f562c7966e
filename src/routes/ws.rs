//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to the engine. We reply with a single JSON message per request.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::error::{ApiError, EngineError, ErrorBody};
use crate::protocol::{to_out, ClassifierOut, ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "practice_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "practice_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "practice_backend", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error(ErrorBody { error: format!("Invalid JSON: {}", e), code: "invalid_json" }),
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "error": format!("Serialization error: {}", e), "code": "internal" }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "practice_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => {
        if let Err(e) = socket.send(Message::Pong(payload)).await {
          error!(target: "practice_backend", error = %e, "WS pong send error");
          break;
        }
      }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "practice_backend", "WebSocket disconnected");
}

fn failure(err: ApiError) -> ServerWsMessage {
  error!(target: "practice_backend", code = err.inner().code(), error = %err.inner(), "WS request failed");
  ServerWsMessage::Error(err.body())
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::NewInstance { topic_id, student_id } => match state.engine.start_instance(&topic_id, &student_id).await {
      Ok(started) => {
        info!(target: "practice_backend", id = %started.instance.id, %topic_id, "WS new_instance served");
        ServerWsMessage::Instance { instance: to_out(&started) }
      }
      Err(e) => failure(ApiError::LoadProblem(e)),
    },

    ClientWsMessage::SubmitAnswer { instance_id, selected_value, elapsed_seconds } => {
      match state.engine.submit(instance_id, &selected_value, elapsed_seconds).await {
        Ok(result) => {
          info!(target: "practice_backend", id = %instance_id, correct = result.is_correct, "WS submit_answer evaluated");
          ServerWsMessage::AnswerResult(result.into())
        }
        Err(e) => failure(ApiError::SubmitAnswer(e)),
      }
    }

    ClientWsMessage::ClassifierAccuracy { topic_id } => {
      let report = async {
        let accuracy = state.engine.classifier_accuracy(&topic_id).await?;
        let examples = state.engine.example_count(&topic_id).await?;
        Ok::<_, EngineError>(ClassifierOut { topic_id: topic_id.clone(), accuracy, examples })
      };
      match report.await {
        Ok(out) => ServerWsMessage::ClassifierAccuracy(out),
        Err(e) => failure(ApiError::LoadProblem(e)),
      }
    }
  }
}
