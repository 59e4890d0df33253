//! Fixed system instructions and per-step prompt builders.
//!
//! Each builder is a pure function of prior step outputs. The chain is
//! deliberately data-minimizing: the company-research prompt sees only the
//! profile summary, never the raw profile text.

use crate::pipeline::events::StepKey;

// ────────────────────────────────────────────────────────────────────────────
// System instructions (one per step, fixed at compile time)
// ────────────────────────────────────────────────────────────────────────────

pub const SUMMARIZER_SYSTEM: &str = r#"You are an expert talent intelligence analyst specialising in reading LinkedIn profiles.
Your job: analyse the HR manager's LinkedIn profile text and extract structured intelligence.

CONTEXT: A job candidate wants to reach out to this HR manager. Your summary will be used
by downstream agents to research the company and craft a personalised outreach strategy.

RULES:
- Use markdown: ## for section headers, **bold** for names/titles/companies, - for bullets
- Be concise: 3-5 bullets per section, no waffle
- Focus on signals that would help a candidate connect with this person personally"#;

pub const RESEARCHER_SYSTEM: &str = r#"You are a corporate intelligence researcher. Your job: build a deep intelligence brief
on the HR manager's company so a job candidate can reference specific, accurate details
in their outreach message, making it feel informed and non-generic.

RULES:
- Use markdown: ## for sections, **bold** for key facts, - for bullets
- 4-6 bullets per section, specific and factual
- If you lack live data, reason clearly from the profile context and known industry patterns
- Flag anything a candidate could use as a natural conversation hook"#;

pub const EVALUATOR_SYSTEM: &str = r#"You are a career strategist and resume fitness evaluator. Your job: cross-reference
the CANDIDATE'S resume against the HR manager's company and role needs.

IMPORTANT DIRECTION: The CANDIDATE is reaching out TO the HR manager, not the other way around.
Evaluate the candidate's fit from the candidate's perspective.

RULES:
- Use markdown: ## for sections, **bold** for key points
- Be honest and specific: flag real gaps, don't just be positive
- End with ## Fit Score: X/10 and a one-sentence justification"#;

/// Sender/recipient roles are pinned here to prevent role inversion in the
/// generated message: the candidate writes TO the HR manager, never the
/// other way around.
pub const STRATEGIST_SYSTEM: &str = r#"You are a master job-search outreach strategist. Your job: write a strategy and a
ready-to-send message FROM the candidate TO the HR manager.

CRITICAL DIRECTION - never mix this up:
- SENDER   = the JOB CANDIDATE (whose resume you have)
- RECEIVER = the HR MANAGER (whose LinkedIn profile was analysed)
- The message must be written in FIRST PERSON as the CANDIDATE, addressed to the HR MANAGER by name

RULES:
- Use ## APPROACH STRATEGY and ## OUTREACH MESSAGE as section headers
- Strategy: 4 bullets (channel, timing, conversation hook, what to avoid)
- Message: under 150 words, written AS the candidate TO the HR manager
- Do NOT use placeholder names like [Your Name] — sign off with "Best regards," only
- Reference specific real details from the candidate's background AND the company research
- Lead with value the candidate offers, not a generic compliment
- End with a single low-friction call to action (e.g. "Would a 15-minute call this week work?")"#;

// ────────────────────────────────────────────────────────────────────────────
// User prompt templates
// ────────────────────────────────────────────────────────────────────────────

/// Substituted for the resume block when no resume was provided.
pub const NO_RESUME_PLACEHOLDER: &str = "No resume provided — evaluate generally.";

const SUMMARIZER_PROMPT_TEMPLATE: &str = r#"Analyse this LinkedIn profile PDF text and extract a structured summary.

LINKEDIN PROFILE TEXT:
{linkedin_text}

Cover: name & title, career history (key milestones only), core skills,
education, personality signals, what they value in candidates."#;

const RESEARCHER_PROMPT_TEMPLATE: &str = r#"Research this HR manager's company based on their profile.

HR MANAGER PROFILE:
{profile_summary}

Cover: company overview, recent news, culture signals, current hiring trends,
strategic priorities, one unique angle a candidate could use in outreach.
If live data unavailable, reason from context and industry knowledge."#;

const EVALUATOR_PROMPT_TEMPLATE: &str = r#"{resume_block}

HR MANAGER PROFILE:
{profile_summary}

COMPANY RESEARCH:
{company_research}

Evaluate: skills alignment, experience relevance, culture fit, gaps,
unique value proposition, fit score 1-10 with justification."#;

const STRATEGIST_PROMPT_TEMPLATE: &str = r#"You are helping THE CANDIDATE write a message TO the HR manager.
THE CANDIDATE is the sender. THE HR MANAGER is the recipient.

--- CANDIDATE'S BACKGROUND (the SENDER) ---
{resume_block}

--- HR MANAGER PROFILE (the RECIPIENT) ---
{profile_summary}

--- COMPANY RESEARCH ---
{company_research}

--- FITNESS EVALUATION ---
{fitness_evaluation}

Now produce:
1. ## APPROACH STRATEGY — 4 bullets on how the candidate should approach outreach
2. ## OUTREACH MESSAGE — a complete message written in first person AS the candidate,
   addressed to the HR manager by their first name. Under 150 words. No placeholder text."#;

// ────────────────────────────────────────────────────────────────────────────
// Builders
// ────────────────────────────────────────────────────────────────────────────

/// Formats the candidate's background for later prompts, or the generic
/// placeholder when no resume text survived extraction.
pub fn resume_block(resume: &str) -> String {
    if resume.trim().is_empty() {
        NO_RESUME_PLACEHOLDER.to_string()
    } else {
        format!("CANDIDATE RESUME:\n{resume}")
    }
}

/// Accumulated step outputs threaded through the prompt chain. A step that
/// failed contributes an empty string downstream.
#[derive(Debug, Default)]
pub struct StepOutputs {
    pub linkedin_text: String,
    pub resume_block: String,
    pub profile_summary: String,
    pub company_research: String,
    pub fitness_evaluation: String,
}

/// Pure prompt construction: (step, prior outputs) → (system, user).
pub fn build_prompt(key: StepKey, outputs: &StepOutputs) -> (&'static str, String) {
    match key {
        StepKey::ProfileSummary => (
            SUMMARIZER_SYSTEM,
            SUMMARIZER_PROMPT_TEMPLATE.replace("{linkedin_text}", &outputs.linkedin_text),
        ),
        StepKey::CompanyResearch => (
            RESEARCHER_SYSTEM,
            RESEARCHER_PROMPT_TEMPLATE.replace("{profile_summary}", &outputs.profile_summary),
        ),
        StepKey::FitnessEvaluation => (
            EVALUATOR_SYSTEM,
            EVALUATOR_PROMPT_TEMPLATE
                .replace("{resume_block}", &outputs.resume_block)
                .replace("{profile_summary}", &outputs.profile_summary)
                .replace("{company_research}", &outputs.company_research),
        ),
        StepKey::OutreachStrategy => (
            STRATEGIST_SYSTEM,
            STRATEGIST_PROMPT_TEMPLATE
                .replace("{resume_block}", &outputs.resume_block)
                .replace("{profile_summary}", &outputs.profile_summary)
                .replace("{company_research}", &outputs.company_research)
                .replace("{fitness_evaluation}", &outputs.fitness_evaluation),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_outputs() -> StepOutputs {
        StepOutputs {
            linkedin_text: "RAW PROFILE DOCUMENT".to_string(),
            resume_block: resume_block("Senior Engineer, 5 years Python"),
            profile_summary: "SUMMARY OF JANE".to_string(),
            company_research: "ACME RESEARCH BRIEF".to_string(),
            fitness_evaluation: "FIT 8/10".to_string(),
        }
    }

    #[test]
    fn test_summarizer_prompt_embeds_raw_profile_text() {
        let (system, user) = build_prompt(StepKey::ProfileSummary, &sample_outputs());
        assert_eq!(system, SUMMARIZER_SYSTEM);
        assert!(user.contains("RAW PROFILE DOCUMENT"));
    }

    #[test]
    fn test_researcher_prompt_sees_summary_not_raw_document() {
        let (_, user) = build_prompt(StepKey::CompanyResearch, &sample_outputs());
        assert!(user.contains("SUMMARY OF JANE"));
        assert!(
            !user.contains("RAW PROFILE DOCUMENT"),
            "company research must never receive the raw profile text"
        );
    }

    #[test]
    fn test_evaluator_prompt_combines_resume_and_prior_steps() {
        let (_, user) = build_prompt(StepKey::FitnessEvaluation, &sample_outputs());
        assert!(user.contains("CANDIDATE RESUME:\nSenior Engineer, 5 years Python"));
        assert!(user.contains("SUMMARY OF JANE"));
        assert!(user.contains("ACME RESEARCH BRIEF"));
    }

    #[test]
    fn test_strategist_prompt_carries_all_prior_results() {
        let (system, user) = build_prompt(StepKey::OutreachStrategy, &sample_outputs());
        assert!(system.contains("SENDER"));
        assert!(system.contains("RECEIVER"));
        assert!(user.contains("CANDIDATE RESUME:"));
        assert!(user.contains("SUMMARY OF JANE"));
        assert!(user.contains("ACME RESEARCH BRIEF"));
        assert!(user.contains("FIT 8/10"));
    }

    #[test]
    fn test_resume_block_placeholder_for_blank_input() {
        assert_eq!(resume_block(""), NO_RESUME_PLACEHOLDER);
        assert_eq!(resume_block("   \n "), NO_RESUME_PLACEHOLDER);
        assert_eq!(
            resume_block("10 years Rust"),
            "CANDIDATE RESUME:\n10 years Rust"
        );
    }
}
