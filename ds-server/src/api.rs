//! REST API and SSE routes

use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use ds_core::{InputEvent, InputSource};
use futures::stream::{Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use tokio::sync::mpsc::error::TrySendError;
use tokio_stream::wrappers::WatchStream;
use tower_http::cors::CorsLayer;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/state", get(current_state))
        .route("/api/state/stream", get(state_stream))
        .route("/api/input", post(submit_input))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// === Health ===

#[derive(Serialize)]
struct Health {
    status: &'static str,
    tick: Option<u64>,
    source: Option<InputSource>,
    link: Option<String>,
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    let latest = state.latest();
    Json(Health {
        status: "ok",
        tick: latest.as_ref().map(|s| s.tick),
        source: latest.as_ref().map(|s| s.source),
        link: latest.and_then(|s| s.link),
    })
}

// === State Endpoints ===

async fn current_state(State(state): State<AppState>) -> Response {
    match state.latest() {
        Some(snapshot) => Json(snapshot).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Control loop has not ticked yet",
        )
            .into_response(),
    }
}

async fn state_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = WatchStream::new(state.subscribe()).filter_map(|snapshot| async move {
        let snapshot = snapshot?;
        match snapshot.to_json() {
            Ok(json) => Some(Ok(Event::default().data(json))),
            Err(e) => {
                tracing::error!("Failed to serialize snapshot: {}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

// === Input Endpoint ===

async fn submit_input(
    State(state): State<AppState>,
    Json(event): Json<InputEvent>,
) -> Result<StatusCode, (StatusCode, String)> {
    match state.input_tx.try_send(event) {
        Ok(()) => Ok(StatusCode::ACCEPTED),
        Err(TrySendError::Full(_)) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "Input queue full".to_string(),
        )),
        Err(TrySendError::Closed(_)) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "Control loop stopped".to_string(),
        )),
    }
}
