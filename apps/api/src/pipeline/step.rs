//! Step Runner — drives one generation call and translates it into events.
//!
//! Invariant: every call sends exactly one `running`, then zero or more
//! `token` frames in arrival order, then exactly one of `done`/`error`.
//! No failure escapes this boundary; the caller learns about it only through
//! the returned `None`.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::llm_client::TokenSource;
use crate::pipeline::events::{Frame, StepKey, StreamEvent};

/// Runs one step: relays live events into `tx` and returns the accumulated
/// output text, or `None` if the adapter failed before or during streaming.
/// Tokens already relayed before a mid-stream failure are not retracted.
///
/// A `false` return from a channel send means the client is gone; the run
/// stops writing and reports no result.
pub async fn run_step(
    source: &dyn TokenSource,
    key: StepKey,
    system: &str,
    user: &str,
    tx: &mpsc::Sender<Frame>,
) -> Option<String> {
    if !send(tx, StreamEvent::Running { agent: key }).await {
        return None;
    }

    let mut stream = match source.open(system, user).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!(step = key.as_str(), "generation call failed to open: {e}");
            send(tx, StreamEvent::Error { agent: key, error: e.to_string() }).await;
            return None;
        }
    };

    let mut output = String::new();
    while let Some(item) = stream.next().await {
        match item {
            Ok(token) => {
                output.push_str(&token);
                if !send(tx, StreamEvent::Token { agent: key, token }).await {
                    return None;
                }
            }
            Err(e) => {
                warn!(step = key.as_str(), "generation stream failed mid-flight: {e}");
                send(tx, StreamEvent::Error { agent: key, error: e.to_string() }).await;
                return None;
            }
        }
    }

    debug!(step = key.as_str(), chars = output.len(), "step completed");
    if !send(
        tx,
        StreamEvent::Done {
            agent: key,
            output: output.clone(),
        },
    )
    .await
    {
        return None;
    }
    Some(output)
}

async fn send(tx: &mpsc::Sender<Frame>, event: StreamEvent) -> bool {
    tx.send(Frame::Event(event)).await.is_ok()
}
