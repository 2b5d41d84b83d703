use crate::config::{DialogConfig, Participant};

/// Build the instruction text a participant's model receives on every turn.
///
/// Reads `participant.system_prompt` as the persona addendum, so call it
/// before the computed prompt is stored back on the participant.
pub fn build_system_prompt(participant: &Participant, config: &DialogConfig) -> String {
    let mut prompt = format!(
        "You are participating in a dialog about \"{}\".\n",
        config.topic
    );
    if !participant.role_label.is_empty() {
        prompt.push_str(&format!(
            "Your role / perspective: {}.\n",
            participant.role_label
        ));
    }
    if !config.rules.is_empty() {
        prompt.push_str(&format!("Additional rules: {}\n", config.rules));
    }
    prompt.push_str(
        "Refer to the previous contributions of your conversation partner. \
         Keep your responses concise (max 3-4 paragraphs). \
         When the Moderator (User) sends a message, you MUST address their point \
         or question directly before continuing the discussion.",
    );
    if !participant.role_label.is_empty() {
        prompt.push_str(" Respond from your assigned perspective.");
    }
    if !participant.system_prompt.is_empty() {
        prompt.push_str(&format!(
            "\n\nAdditional context: {}",
            participant.system_prompt
        ));
    }
    prompt
}
