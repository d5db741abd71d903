//! HTTP endpoint handlers. These are thin wrappers that forward to the
//! generation pipeline and quiz store; each handler is instrumented.

use std::sync::Arc;

use axum::{
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, model_enabled: state.model_enabled })
}

#[instrument(level = "info", skip(state, body), fields(topic = %body.topic, count = body.question_count))]
pub async fn http_generate_quiz(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GenerateIn>,
) -> impl IntoResponse {
  let req = match body.into_request() {
    Ok(r) => r,
    Err(e) => {
      info!(target: "quiz", error = %e, "Rejected malformed generation request");
      return (StatusCode::BAD_REQUEST, Json(GenerateOut::rejected(e)));
    }
  };

  let (outcome, origin) = state.generate_quiz(&req).await;
  info!(target: "quiz", topic = %req.topic, success = outcome.success, %origin,
        score = %format!("{:.1}", outcome.diagnostics.best_score), "HTTP quiz generation served");
  (
    StatusCode::OK,
    Json(GenerateOut {
      success: outcome.success,
      origin: origin.to_string(),
      quiz: outcome.quiz,
      error: outcome.error,
      diagnostics: outcome.diagnostics,
    }),
  )
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_quiz(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> impl IntoResponse {
  match state.get_quiz(&id).await {
    Some(quiz) => (StatusCode::OK, Json(quiz)).into_response(),
    None => (
      StatusCode::NOT_FOUND,
      Json(ErrorOut { message: format!("unknown quiz id: {}", id) }),
    )
      .into_response(),
  }
}
