//! Quizsmith · AI Quiz Generation Backend
//!
//! - Axum HTTP API for generating and fetching quizzes
//! - Optional OpenAI integration (via environment variables)
//! - Built-in seed quizzes when no model is configured
//!
//! Important env variables:
//!   PORT          : u16 (default 3000)
//!   OPENAI_API_KEY    : enables the model pipeline if present
//!   OPENAI_BASE_URL    : default "https://api.openai.com/v1"
//!   OPENAI_MODEL  : default "gpt-4o-mini"
//!   GEN_TIMEOUT_SECS   : per-call HTTP timeout (default 30)
//!   GEN_CONFIG_PATH  : path to TOML config (prompts + quality/retry tuning)
//!   LOG_LEVEL    : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT      : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod seeds;
mod state;
mod protocol;
mod prompt;
mod openai;
mod recovery;
mod normalize;
mod validate;
mod quality;
mod pipeline;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (quiz store, generator, seed bank).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "quizsmith_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
