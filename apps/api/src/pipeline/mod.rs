//! The streaming pipeline: four sequential generation steps multiplexed into
//! one client-facing SSE event stream.

pub mod events;
pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod step;
