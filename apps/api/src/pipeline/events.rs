//! The client-facing event protocol.
//!
//! Every frame written to the response body is either one serialized
//! `StreamEvent` (`data: {json}\n\n`) or the literal `data: [DONE]\n\n`
//! terminator. For a given step key the sequence is exactly one `running`,
//! zero or more `token`, then exactly one of `done`/`error`.

use serde::Serialize;

/// The fixed ordered set of pipeline steps. Defined at compile time, never
/// created or destroyed at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKey {
    ProfileSummary,
    CompanyResearch,
    FitnessEvaluation,
    OutreachStrategy,
}

impl StepKey {
    pub const ALL: [StepKey; 4] = [
        StepKey::ProfileSummary,
        StepKey::CompanyResearch,
        StepKey::FitnessEvaluation,
        StepKey::OutreachStrategy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StepKey::ProfileSummary => "profile_summary",
            StepKey::CompanyResearch => "company_research",
            StepKey::FitnessEvaluation => "fitness_evaluation",
            StepKey::OutreachStrategy => "outreach_strategy",
        }
    }

    /// The step after this one, or `None` after the final step.
    pub fn next(self) -> Option<StepKey> {
        match self {
            StepKey::ProfileSummary => Some(StepKey::CompanyResearch),
            StepKey::CompanyResearch => Some(StepKey::FitnessEvaluation),
            StepKey::FitnessEvaluation => Some(StepKey::OutreachStrategy),
            StepKey::OutreachStrategy => None,
        }
    }
}

/// One per-step record on the wire. `agent` carries the step key; `status`
/// is the serde tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StreamEvent {
    Running { agent: StepKey },
    Token { agent: StepKey, token: String },
    Done { agent: StepKey, output: String },
    Error { agent: StepKey, error: String },
}

/// One write to the client: a serialized event or the end-of-stream sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Event(StreamEvent),
    Done,
}

impl Frame {
    /// Serializes this frame as an SSE `data:` line pair.
    pub fn to_sse(&self) -> String {
        match self {
            Frame::Event(event) => {
                // Serialization of a field-only enum cannot fail.
                let json = serde_json::to_string(event).expect("stream event serialization");
                format!("data: {json}\n\n")
            }
            Frame::Done => "data: [DONE]\n\n".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_keys_serialize_as_snake_case() {
        for key in StepKey::ALL {
            assert_eq!(
                serde_json::to_value(key).unwrap(),
                json!(key.as_str()),
                "wire name mismatch for {key:?}"
            );
        }
    }

    #[test]
    fn test_step_order_is_fixed() {
        assert_eq!(StepKey::ProfileSummary.next(), Some(StepKey::CompanyResearch));
        assert_eq!(StepKey::CompanyResearch.next(), Some(StepKey::FitnessEvaluation));
        assert_eq!(
            StepKey::FitnessEvaluation.next(),
            Some(StepKey::OutreachStrategy)
        );
        assert_eq!(StepKey::OutreachStrategy.next(), None);
    }

    #[test]
    fn test_event_wire_shapes() {
        let running = StreamEvent::Running {
            agent: StepKey::ProfileSummary,
        };
        assert_eq!(
            serde_json::to_value(&running).unwrap(),
            json!({"status": "running", "agent": "profile_summary"})
        );

        let token = StreamEvent::Token {
            agent: StepKey::CompanyResearch,
            token: "Acme".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&token).unwrap(),
            json!({"status": "token", "agent": "company_research", "token": "Acme"})
        );

        let done = StreamEvent::Done {
            agent: StepKey::OutreachStrategy,
            output: "full text".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&done).unwrap(),
            json!({"status": "done", "agent": "outreach_strategy", "output": "full text"})
        );

        let error = StreamEvent::Error {
            agent: StepKey::FitnessEvaluation,
            error: "boom".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({"status": "error", "agent": "fitness_evaluation", "error": "boom"})
        );
    }

    #[test]
    fn test_sse_framing() {
        let frame = Frame::Event(StreamEvent::Running {
            agent: StepKey::ProfileSummary,
        });
        let sse = frame.to_sse();
        assert!(sse.starts_with("data: {"));
        assert!(sse.ends_with("\n\n"));

        assert_eq!(Frame::Done.to_sse(), "data: [DONE]\n\n");
    }
}
