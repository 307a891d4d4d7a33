//! Instruction templates for each oracle-backed step.

use autobook_contracts::{
    message::Message,
    state::{ConversationState, UserProfile},
};

/// Standing instruction for the tool-calling agent.
pub const AGENT_INSTRUCTION: &str = "You are a scheduling assistant. Answer the user's \
latest message. When you need facts about the clinic, doctors, or opening hours, call \
search_knowledge_base. Check availability with check_calendar_availability before \
proposing a time, and only call create_calendar_invite once the user has agreed to a \
date and time. Reply in plain text when you have everything you need.";

/// The agent instruction, personalized when a profile is known.
pub fn agent(profile: &UserProfile) -> String {
    if profile.is_empty() {
        return AGENT_INSTRUCTION.to_string();
    }
    format!("{AGENT_INSTRUCTION}\n\nUser Profile:\n{}", render_map(profile))
}

/// Ask for exactly one routing token.
pub fn routing(state: &ConversationState) -> String {
    format!(
        "Decide whether the request below can be scheduled now or needs clarification.\n\
         Reply with exactly one word: SCHEDULE if the request names what to book and \
         roughly when, CLARIFY otherwise.\n\n\
         Conversation:\n{}\n\
         User Request: {}\n\
         Research Findings: {}\n\n\
         Decision:",
        render_history(&state.conversation_history),
        state.user_request,
        findings(state),
    )
}

/// Ask for one clarifying question.
pub fn clarification(state: &ConversationState) -> String {
    format!(
        "The request below cannot be booked yet. Ask the user one short, friendly \
         question that would let you book it.\n\n\
         Conversation:\n{}\n\
         User Request: {}\n\
         Research Findings: {}\n\n\
         Question:",
        render_history(&state.conversation_history),
        state.user_request,
        findings(state),
    )
}

/// Ask for a concrete booking proposal.
pub fn scheduling(state: &ConversationState) -> String {
    format!(
        "Based on the user's request and the following research, create a concrete \
         booking proposal.\n\
         If you have enough information, suggest a specific time and action \
         (e.g., 'Book appointment for user with Dr. Reed at 9am on Monday').\n\
         If information is missing, state what is needed to proceed with the booking.\n\n\
         User Profile:\n{}\n\
         Conversation:\n{}\n\
         User Request: {}\n\
         Research Findings: {}\n\n\
         Proposed Schedule:",
        render_profile(state),
        render_history(&state.conversation_history),
        state.user_request,
        findings(state),
    )
}

/// Ask for the final confirmation message.
pub fn confirmation(schedule: &str) -> String {
    format!(
        "You are a friendly assistant. Based on the following proposed schedule, write a \
         short, friendly confirmation message for the user.\n\
         Make it sound final and reassuring.\n\n\
         Proposed Schedule: {schedule}\n\n\
         Confirmation Message:"
    )
}

/// One `role: content` line per message.
pub fn render_history(history: &[Message]) -> String {
    if history.is_empty() {
        return "(none)\n".to_string();
    }
    history
        .iter()
        .map(|m| format!("{}: {}\n", m.role, m.content))
        .collect()
}

fn render_profile(state: &ConversationState) -> String {
    if state.user_profile.is_empty() {
        return "(none)\n".to_string();
    }
    render_map(&state.user_profile)
}

fn render_map(profile: &UserProfile) -> String {
    profile.iter().map(|(k, v)| format!("{k}: {v}\n")).collect()
}

fn findings(state: &ConversationState) -> &str {
    state.research_findings.as_deref().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use autobook_contracts::{
        message::Message,
        state::{ConversationState, UserProfile},
    };

    use super::*;

    #[test]
    fn scheduling_prompt_carries_profile_and_findings() {
        let mut profile = UserProfile::new();
        profile.insert("preferred_doctor".to_string(), "Dr. Reed".to_string());
        let mut state = ConversationState::new("Book a checkup", vec![], profile);
        state.research_findings = Some("Dr. Reed works Mondays.".to_string());

        let prompt = scheduling(&state);
        assert!(prompt.contains("preferred_doctor: Dr. Reed"));
        assert!(prompt.contains("Research Findings: Dr. Reed works Mondays."));
        assert!(prompt.ends_with("Proposed Schedule:"));
    }

    #[test]
    fn agent_instruction_mentions_known_preferences() {
        assert_eq!(agent(&UserProfile::new()), AGENT_INSTRUCTION);

        let mut profile = UserProfile::new();
        profile.insert("timezone".to_string(), "Europe/Berlin".to_string());
        assert!(agent(&profile).ends_with("User Profile:\ntimezone: Europe/Berlin\n"));
    }

    #[test]
    fn history_renders_one_line_per_message() {
        let rendered = render_history(&[Message::human("hi"), Message::assistant("hello")]);
        assert_eq!(rendered, "human: hi\nassistant: hello\n");
        assert_eq!(render_history(&[]), "(none)\n");
    }
}
