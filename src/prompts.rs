//! Centralized prompt definitions and content markers
//!
//! This module contains the default system prompt, the built-in actions and
//! the literal markers used to classify note content.

use crate::config::Action;

/// Literal prefix that marks a note as a system prompt override.
///
/// Matched against the note text after trimming whitespace.
pub const SYSTEM_PROMPT_MARKER: &str = "SYSTEM PROMPT";

/// Content prefix that marks a note as an image reference (a data URL).
pub const IMAGE_SENTINEL: &str = "data:image/";

/// Default system prompt used when no ancestor carries a system prompt marker.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a critical-thinking assistant bot.
Consider the intent of my questions before responding.
Do not restate my information unless I ask for it.
Do not include caveats or disclaimers.
Use step-by-step reasoning. Be brief."#;

/// Prompt for the built-in "summarize" action.
pub const SUMMARIZE_PROMPT: &str =
    "Summarize the conversation so far in a few short bullet points.";

/// Prompt for the built-in "critique" action.
pub const CRITIQUE_PROMPT: &str = "Point out weaknesses, gaps or errors in the most recent note. \
Be specific and suggest a concrete improvement for each.";

/// Prompt for the built-in "expand" action.
pub const EXPAND_PROMPT: &str =
    "Expand on the most recent note with more detail and one concrete example.";

/// Actions available when no actions file is configured.
pub fn builtin_actions() -> Vec<Action> {
    vec![
        Action::new("summarize", "Summarize", SUMMARIZE_PROMPT),
        Action::new("critique", "Critique", CRITIQUE_PROMPT),
        Action::new("expand", "Expand", EXPAND_PROMPT),
    ]
}

/// Whether `text` is a system-prompt-marked note.
pub fn is_system_prompt(text: &str) -> bool {
    text.trim().starts_with(SYSTEM_PROMPT_MARKER)
}

/// Prompt text of a system-prompt-marked note, without the marker.
///
/// `None` when `text` is not marked or holds nothing but the marker.
pub fn system_prompt_body(text: &str) -> Option<&str> {
    let body = text.trim().strip_prefix(SYSTEM_PROMPT_MARKER)?;
    let body = body.trim_start().trim_start_matches(':').trim();
    if body.is_empty() {
        None
    } else {
        Some(body)
    }
}

/// Whether `text` is an image reference.
pub fn is_image_reference(text: &str) -> bool {
    text.starts_with(IMAGE_SENTINEL)
}
