/// LLM Client — the single point of entry for all chat-completion calls.
///
/// ARCHITECTURAL RULE: No other module may call the backend API directly.
/// All generation traffic MUST go through this module.
///
/// The client speaks the OpenAI-compatible streaming chat-completions
/// protocol: one POST per call with `stream: true`, tokens arriving as SSE
/// `data:` chunks terminated by a `[DONE]` sentinel.
use async_trait::async_trait;
use bytes::BytesMut;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::Config;

/// Sampling temperature for every call — low and deterministic-leaning.
/// Intentionally fixed per process; there is no per-request override.
pub const TEMPERATURE: f32 = 0.3;

const TOKEN_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("credential not configured")]
    MissingCredential,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("stream error: {0}")]
    Stream(String),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    stream: bool,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// A lazy, finite, non-restartable sequence of text fragments from one
/// generation call, in arrival order. A mid-stream failure is delivered
/// in-band as the final `Err` item. Dropping the stream abandons the
/// upstream call: the forwarding task notices the closed channel and exits.
pub struct TokenStream {
    rx: mpsc::Receiver<Result<String, LlmError>>,
}

impl TokenStream {
    pub(crate) fn new(rx: mpsc::Receiver<Result<String, LlmError>>) -> Self {
        Self { rx }
    }

    /// Next fragment, or `None` when the backend signalled completion.
    pub async fn next(&mut self) -> Option<Result<String, LlmError>> {
        self.rx.recv().await
    }
}

#[cfg(test)]
impl TokenStream {
    /// Builds a pre-scripted stream for tests — no network, no task.
    pub(crate) fn from_results(items: Vec<Result<String, LlmError>>) -> Self {
        let (tx, rx) = mpsc::channel(items.len().max(1));
        for item in items {
            tx.try_send(item).expect("scripted channel sized to fit");
        }
        Self::new(rx)
    }
}

/// The seam between the pipeline and the hosted backend. Production uses
/// `LlmClient`; tests substitute scripted sources.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn open(&self, system: &str, user: &str) -> Result<TokenStream, LlmError>;
}

/// Streaming client for the configured OpenAI-compatible backend.
/// Credential, base URL, and model id are resolved once at startup and
/// carried here — no ambient environment lookups at call time.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl LlmClient {
    /// Fails fast when no credential is configured; the caller decides how
    /// to surface that (the orchestrator fans it out as stream events).
    pub fn new(config: &Config, client: Client) -> Result<Self, LlmError> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or(LlmError::MissingCredential)?;

        Ok(Self {
            client,
            api_key,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            model: config.openai_model.clone(),
        })
    }
}

#[async_trait]
impl TokenSource for LlmClient {
    async fn open(&self, system: &str, user: &str) -> Result<TokenStream, LlmError> {
        let request_body = ChatRequest {
            model: &self.model,
            temperature: TEMPERATURE,
            stream: true,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Try to parse the structured error message
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let (tx, rx) = mpsc::channel(TOKEN_CHANNEL_CAPACITY);
        tokio::spawn(forward_tokens(response.bytes_stream(), tx));
        Ok(TokenStream::new(rx))
    }
}

/// Reads the SSE body of a streaming chat-completions response and forwards
/// each non-empty delta through the channel. Returns when the backend sends
/// `[DONE]`, the body ends, or the receiver is dropped.
///
/// The buffer holds raw bytes and events are split on the blank-line
/// delimiter before any decoding: chunk boundaries are network-determined
/// and may fall inside a multi-byte character, so decoding per chunk would
/// corrupt tokens.
async fn forward_tokens<S, E>(body: S, tx: mpsc::Sender<Result<String, LlmError>>)
where
    S: Stream<Item = Result<bytes::Bytes, E>>,
    E: std::fmt::Display,
{
    let mut body = Box::pin(body);
    let mut buffer = BytesMut::new();

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(c) => c,
            Err(e) => {
                let _ = tx.send(Err(LlmError::Stream(e.to_string()))).await;
                return;
            }
        };
        buffer.extend_from_slice(&chunk);

        // SSE events are separated by a blank line; drain every complete one.
        while let Some(pos) = buffer.windows(2).position(|w| w == b"\n\n") {
            let event = buffer.split_to(pos + 2);
            if !dispatch_event(&event, &tx).await {
                return;
            }
        }
    }

    // Body ended without a trailing delimiter (e.g. connection closed right
    // after the final `data:` line); flush what remains so the last token
    // is not dropped.
    if !buffer.is_empty() {
        dispatch_event(&buffer, &tx).await;
    }
}

/// Parses one SSE event block and forwards its tokens. Returns `false` when
/// forwarding should stop: the backend sent `[DONE]`, or the receiver is
/// gone (client disconnected).
async fn dispatch_event(event: &[u8], tx: &mpsc::Sender<Result<String, LlmError>>) -> bool {
    let event = String::from_utf8_lossy(event);
    for line in event.lines() {
        let Some(data) = line.strip_prefix("data: ") else {
            continue;
        };
        if data.trim() == "[DONE]" {
            return false;
        }
        match serde_json::from_str::<ChatChunk>(data) {
            Ok(parsed) => {
                let token = parsed
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.delta.content)
                    .filter(|t| !t.is_empty());
                if let Some(token) = token {
                    if tx.send(Ok(token)).await.is_err() {
                        return false;
                    }
                }
            }
            Err(e) => debug!("skipping unparseable stream chunk: {e}"),
        }
    }
    true
}
