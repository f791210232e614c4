// Prompt text for the interview flow. Everything the candidate's transcript
// carries besides their own answers comes from here.

/// Interviewer persona used when the client starts without a system prompt.
pub const INTERVIEWER_PERSONA: &str = "You are Fernanda, a DevClub recruiter who \
    specializes in interviews for software developers. Be professional but friendly.";

/// Heading that introduces caller-supplied requirements in the system prompt.
pub const CUSTOM_REQUIREMENTS_HEADER: &str = "Additional requirements for this interview:";

/// Seed message that asks the interviewer for the opening question.
pub const OPENING_REQUEST: &str =
    "Hello, I am ready to start the interview. Please ask the first question.";

/// Appended after every candidate answer. It stays in the returned
/// conversation so the next turn replays it verbatim.
pub const FEEDBACK_INSTRUCTION: &str = "Please evaluate my previous answer. \
    Highlight the strong points and suggest specific improvements. \
    After the feedback, ask the next interview question.";

/// Builds the system prompt for a new interview.
///
/// A non-blank caller prompt replaces the default persona; non-blank custom
/// requirements are appended as their own paragraph.
pub fn resolve_system_prompt(
    system_prompt: Option<&str>,
    custom_requirements: Option<&str>,
) -> String {
    let mut prompt = system_prompt
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(INTERVIEWER_PERSONA)
        .to_string();

    if let Some(requirements) = custom_requirements.filter(|r| !r.trim().is_empty()) {
        prompt.push_str("\n\n");
        prompt.push_str(CUSTOM_REQUIREMENTS_HEADER);
        prompt.push(' ');
        prompt.push_str(requirements);
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_persona_when_prompt_missing_or_blank() {
        assert_eq!(resolve_system_prompt(None, None), INTERVIEWER_PERSONA);
        assert_eq!(resolve_system_prompt(Some("  "), None), INTERVIEWER_PERSONA);
    }

    #[test]
    fn test_caller_prompt_replaces_persona() {
        assert_eq!(
            resolve_system_prompt(Some("You are a Rust hiring manager."), None),
            "You are a Rust hiring manager."
        );
    }

    #[test]
    fn test_custom_requirements_are_appended() {
        let prompt = resolve_system_prompt(None, Some("focus on Go"));
        assert!(prompt.starts_with(INTERVIEWER_PERSONA));
        assert!(prompt.contains("focus on Go"));
        assert!(prompt.ends_with("Additional requirements for this interview: focus on Go"));
    }

    #[test]
    fn test_blank_custom_requirements_are_ignored() {
        assert_eq!(resolve_system_prompt(None, Some("")), INTERVIEWER_PERSONA);
    }
}
