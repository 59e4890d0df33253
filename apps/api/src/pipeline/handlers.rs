//! Axum route handler for the streaming pipeline.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
    Json,
};
use bytes::Bytes;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use crate::errors::AppError;
use crate::llm_client::{LlmClient, TokenSource};
use crate::pipeline::events::Frame;
use crate::pipeline::orchestrator::run_pipeline;
use crate::state::AppState;

/// Frames buffered between the pipeline task and the response body. Bounded
/// so a slow client backpressures the upstream read instead of buffering the
/// whole generation in memory.
const FRAME_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub linkedin_pdf: String,
    #[serde(default)]
    pub resume: String,
    #[serde(default)]
    pub resume_pdf: String,
}

/// POST /api/run
///
/// Validates the request, then relays the orchestrator's frames as an SSE
/// body. All pipeline failures after this point are in-band stream events;
/// only a missing primary document is rejected with a plain 400.
pub async fn handle_run(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Result<Response, AppError> {
    if request.linkedin_pdf.trim().is_empty() {
        return Err(AppError::Validation("linkedin_pdf is required".to_string()));
    }

    // Credential check happens here, with no side effects; the orchestrator
    // reports a failure in protocol order (after document extraction).
    let source = LlmClient::new(&state.config, state.http.clone())
        .map(|client| Arc::new(client) as Arc<dyn TokenSource>);

    let (tx, rx) = mpsc::channel::<Frame>(FRAME_CHANNEL_CAPACITY);
    tokio::spawn(async move {
        let final_state = run_pipeline(source, request, tx).await;
        debug!(?final_state, "pipeline task finished");
    });

    let body = Body::from_stream(
        ReceiverStream::new(rx).map(|frame| Ok::<_, Infallible>(Bytes::from(frame.to_sse()))),
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header("X-Accel-Buffering", "no")
        .body(body)
        .map_err(|e| AppError::Internal(anyhow::Error::new(e)))
}
