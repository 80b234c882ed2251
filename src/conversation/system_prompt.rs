use super::walker::{walk, Visit};
use crate::canvas::Canvas;
use crate::prompts::system_prompt_body;

/// System prompt for a conversation ending at `node_id`.
///
/// The nearest note (in walk order, `node_id` included) whose trimmed text
/// starts with the system prompt marker wins, with the marker removed. A
/// note holding only the marker does not count. Without a match, `default`
/// is returned. The search ignores the configured ancestor depth limit.
pub fn resolve_system_prompt(canvas: &dyn Canvas, node_id: &str, default: &str) -> String {
    let mut found: Option<String> = None;

    walk(canvas, node_id, 0, |node, _| match system_prompt_body(&node.text) {
        Some(body) => {
            if found.is_none() {
                found = Some(body.to_string());
            }
            Visit::Prune
        }
        None => Visit::Continue,
    });

    found.unwrap_or_else(|| default.to_string())
}
