use std::collections::VecDeque;

use serde::Serialize;
use tracing::debug;

use super::system_prompt::resolve_system_prompt;
use super::walker::{walk, Visit};
use crate::canvas::{Canvas, NodeRole};
use crate::completion::Message;
use crate::config::GenerationConfig;
use crate::encoder::Encoder;
use crate::prompts::{is_image_reference, is_system_prompt};

/// Tokens held back from the remaining budget when a note is truncated.
pub const TRUNCATION_MARGIN: usize = 1;

/// Ordered messages ready to send, with their token cost.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Conversation {
    /// Messages, oldest first.
    pub messages: Vec<Message>,
    /// Tokens across all text messages and the system prompt.
    pub token_count: usize,
}

impl Conversation {
    /// No messages to send.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Assembles the conversation that ends at a note.
///
/// Notes are collected from the leaf upwards and prepended, so the result
/// reads oldest first. Once a text note no longer fits the input budget it
/// is cut to fit (minus [`TRUNCATION_MARGIN`]) and nothing older is
/// included.
pub struct ConversationBuilder<'a> {
    canvas: &'a dyn Canvas,
    encoder: &'a Encoder,
    config: &'a GenerationConfig,
}

impl<'a> ConversationBuilder<'a> {
    /// Create a builder over `canvas`
    pub fn new(canvas: &'a dyn Canvas, encoder: &'a Encoder, config: &'a GenerationConfig) -> Self {
        Self {
            canvas,
            encoder,
            config,
        }
    }

    /// Build the conversation ending at `node_id`, optionally followed by an
    /// action prompt.
    pub fn build(&self, node_id: &str, action_prompt: Option<&str>) -> Conversation {
        let system_prompt =
            resolve_system_prompt(self.canvas, node_id, &self.config.system_prompt);
        let system_prompt = system_prompt.trim();
        let limit = self.config.max_input_tokens;

        let mut token_count = self.encoder.count(system_prompt);
        let mut messages: VecDeque<Message> = VecDeque::new();

        walk(self.canvas, node_id, self.config.max_depth, |node, depth| {
            let text = node.text.as_str();
            if text.trim().is_empty() {
                return Visit::Continue;
            }
            if is_image_reference(text) {
                messages.push_front(Message::image(text.trim_end()));
                return Visit::Continue;
            }
            if is_system_prompt(text) {
                return Visit::Continue;
            }

            let tokens = self.encoder.count(text);
            let overflow = limit > 0 && token_count + tokens > limit;
            let (content, contribution) = if overflow {
                let allowance = limit
                    .saturating_sub(token_count)
                    .saturating_sub(TRUNCATION_MARGIN);
                let cut = self.encoder.truncate(text, allowance);
                debug!(
                    node_id = %node.id,
                    depth,
                    original_tokens = tokens,
                    kept_tokens = cut.tokens,
                    kept_chars = cut.text.chars().count(),
                    "Truncated note to fit input token limit"
                );
                (cut.text, cut.tokens)
            } else {
                (text.to_string(), tokens)
            };

            if !content.is_empty() {
                messages.push_front(match node.effective_role() {
                    NodeRole::Assistant => Message::assistant(content),
                    NodeRole::User => Message::user(content),
                });
            }
            token_count += contribution;

            if overflow {
                Visit::Stop
            } else {
                Visit::Continue
            }
        });

        if messages.is_empty() {
            debug!(node_id = %node_id, "No notes to send");
            return Conversation::default();
        }

        if !system_prompt.is_empty() {
            messages.push_front(Message::system(system_prompt));
        }

        if let Some(prompt) = action_prompt.filter(|p| !p.trim().is_empty()) {
            token_count += self.encoder.count(prompt);
            messages.push_back(Message::user(prompt));
        }

        debug!(
            node_id = %node_id,
            messages = messages.len(),
            token_count,
            "Conversation built"
        );

        Conversation {
            messages: messages.into(),
            token_count,
        }
    }
}
