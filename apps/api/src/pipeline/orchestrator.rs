//! Pipeline Orchestrator — the core sequencing state machine.
//!
//! Four steps run strictly in order; each prompt is a pure function of fixed
//! instruction text plus a subset of prior results, so there is no fan-out.
//! Extraction or credential failures before the chain starts are fanned out
//! as an `error` event on every step key so the client never has to
//! special-case steps that were never attempted. Every completed run emits
//! the `[DONE]` terminator exactly once, as the final frame.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::extract::extract_pdf_text;
use crate::llm_client::{LlmError, TokenSource};
use crate::pipeline::events::{Frame, StepKey, StreamEvent};
use crate::pipeline::handlers::RunRequest;
use crate::pipeline::prompts::{build_prompt, resume_block, StepOutputs};
use crate::pipeline::step::run_step;

/// Explicit pipeline state. `Aborted` is reachable only from the extraction
/// and credential gates; a mid-chain step failure does NOT abort later steps
/// (they proceed on the failed step's empty output).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Extracting,
    Running(StepKey),
    Aborted,
    Terminated,
}

/// Pure transition function over the fixed step order.
pub fn advance(state: PipelineState) -> PipelineState {
    match state {
        PipelineState::Extracting => PipelineState::Running(StepKey::ProfileSummary),
        PipelineState::Running(key) => match key.next() {
            Some(next) => PipelineState::Running(next),
            None => PipelineState::Terminated,
        },
        PipelineState::Aborted => PipelineState::Terminated,
        PipelineState::Terminated => PipelineState::Terminated,
    }
}

/// Runs the whole pipeline for one request, writing frames into `tx`.
///
/// `source` is resolved by the caller (credential check happens at client
/// construction, which has no side effects); the orchestrator surfaces a
/// construction failure in sequence, after document extraction, matching the
/// gate order of the protocol.
///
/// Returns the final state: `Terminated` when the terminator was written,
/// or the state at which the client disconnected.
pub async fn run_pipeline(
    source: Result<Arc<dyn TokenSource>, LlmError>,
    request: RunRequest,
    tx: mpsc::Sender<Frame>,
) -> PipelineState {
    let mut state = PipelineState::Extracting;

    // Gate 1: primary profile document.
    let linkedin_text = match extract_pdf_text(&request.linkedin_pdf) {
        Ok(text) => text,
        Err(e) => {
            warn!("LinkedIn PDF extraction failed: {e}");
            return abort(&tx, format!("LinkedIn PDF: {e}")).await;
        }
    };

    // Gate 2: optional resume document. When present it supersedes the
    // plain-text resume field entirely, including its failure handling.
    let resume = if request.resume_pdf.trim().is_empty() {
        request.resume.clone()
    } else {
        match extract_pdf_text(&request.resume_pdf) {
            Ok(text) => text,
            Err(e) => {
                warn!("Resume PDF extraction failed: {e}");
                return abort(&tx, format!("Resume PDF: {e}")).await;
            }
        }
    };

    // Gate 3: generation backend. No network call has happened yet.
    let source = match source {
        Ok(source) => source,
        Err(e) => {
            warn!("generation client unavailable: {e}");
            return abort(&tx, e.to_string()).await;
        }
    };

    let mut outputs = StepOutputs {
        linkedin_text,
        resume_block: resume_block(&resume),
        ..StepOutputs::default()
    };

    state = advance(state);
    while let PipelineState::Running(key) = state {
        if tx.is_closed() {
            // Client went away; stop without further upstream calls.
            info!(step = key.as_str(), "client disconnected, abandoning pipeline");
            return state;
        }

        let (system, user) = build_prompt(key, &outputs);
        let result = run_step(source.as_ref(), key, system, &user, &tx).await;
        record(&mut outputs, key, result.unwrap_or_default());

        state = advance(state);
    }

    let _ = tx.send(Frame::Done).await;
    state
}

/// Stores a completed step's output for later prompt builders. The final
/// step's output feeds nothing and is dropped with the request.
fn record(outputs: &mut StepOutputs, key: StepKey, output: String) {
    match key {
        StepKey::ProfileSummary => outputs.profile_summary = output,
        StepKey::CompanyResearch => outputs.company_research = output,
        StepKey::FitnessEvaluation => outputs.fitness_evaluation = output,
        StepKey::OutreachStrategy => {}
    }
}

/// Total-failure path: one `error` event per step key carrying the same
/// message, then the terminator. No step ever starts.
async fn abort(tx: &mpsc::Sender<Frame>, message: String) -> PipelineState {
    let mut state = PipelineState::Aborted;
    for key in StepKey::ALL {
        let event = StreamEvent::Error {
            agent: key,
            error: message.clone(),
        };
        if tx.send(Frame::Event(event)).await.is_err() {
            return state;
        }
    }
    state = advance(state);
    let _ = tx.send(Frame::Done).await;
    state
}
