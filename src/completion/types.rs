use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::error::ReplyDecodeError;

/// Message in a completion conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message.
    pub role: MessageRole,
    /// Text or typed parts.
    pub content: MessageContent,
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions for the model.
    System,
    /// Note written by the person.
    User,
    /// Earlier model reply.
    Assistant,
}

/// Message payload: plain text or a list of typed parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text.
    Text(String),
    /// Typed parts, used for images.
    Parts(Vec<ContentPart>),
}

/// Typed input part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Image given by URL; data URLs are accepted.
    InputImage {
        /// Image location.
        image_url: String,
    },
}

/// Request body for the completion endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    /// Conversation, oldest first.
    pub input: Vec<Message>,
    /// Model identifier.
    pub model: String,
    /// Sampling options, flattened into the body.
    #[serde(flatten)]
    pub options: CompletionOptions,
}

/// Caller-supplied generation parameters.
///
/// Flattened into the request body; having no `model` or `input` field it
/// cannot override either.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompletionOptions {
    /// Output token cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling mass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Frequency penalty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    /// Presence penalty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    /// Stop sequences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

/// One entry of a reply content array
#[derive(Debug, Clone, Deserialize)]
pub struct OutputPart {
    /// Part type; only `output_text` carries reply text.
    #[serde(rename = "type")]
    pub kind: String,
    /// Text of an `output_text` part.
    #[serde(default)]
    pub text: Option<String>,
}

/// `{content: [{type: "output_text", text}]}`
#[derive(Debug, Clone, Deserialize)]
pub struct InlineReply {
    /// Reply parts.
    pub content: Vec<OutputPart>,
}

/// Item of a nested `output` array
#[derive(Debug, Clone, Deserialize)]
pub struct OutputItem {
    /// Parts of this output item.
    #[serde(default)]
    pub content: Vec<OutputPart>,
}

/// `{output: [{content: [...]}]}`
#[derive(Debug, Clone, Deserialize)]
pub struct NestedReply {
    /// Output items, in order.
    pub output: Vec<OutputItem>,
}

/// `{output_text: "..."}`
#[derive(Debug, Clone, Deserialize)]
pub struct FlatReply {
    /// Complete reply text.
    pub output_text: String,
}

/// The reply shapes the endpoint is known to return
#[derive(Debug, Clone)]
pub enum ReplyShape {
    /// `{content: [...]}`.
    Inline(InlineReply),
    /// `{output: [{content: [...]}]}`.
    Nested(NestedReply),
    /// `{output_text: "..."}`.
    Flat(FlatReply),
}

const OUTPUT_TEXT: &str = "output_text";

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a user message carrying an image URL
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Parts(vec![ContentPart::InputImage {
                image_url: url.into(),
            }]),
        }
    }

    /// Text of a plain text message
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(text) => Some(text),
            MessageContent::Parts(_) => None,
        }
    }

    /// Whether the message carries an image part.
    pub fn is_image(&self) -> bool {
        matches!(
            &self.content,
            MessageContent::Parts(parts)
                if parts.iter().any(|p| matches!(p, ContentPart::InputImage { .. }))
        )
    }
}

impl CompletionRequest {
    /// Create a new request with model and input messages
    pub fn new(model: impl Into<String>, input: Vec<Message>) -> Self {
        Self {
            input,
            model: model.into(),
            options: CompletionOptions::default(),
        }
    }

    /// Attach generation options
    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }
}

impl CompletionOptions {
    /// Options derived from configuration; zero output cap is left unset.
    pub fn from_config(config: &GenerationConfig) -> Self {
        let options = Self::default().with_temperature(config.temperature);
        if config.max_response_tokens > 0 {
            options.with_max_tokens(config.max_response_tokens)
        } else {
            options
        }
    }

    /// Set max output tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set nucleus sampling
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set frequency penalty
    pub fn with_frequency_penalty(mut self, penalty: f32) -> Self {
        self.frequency_penalty = Some(penalty);
        self
    }

    /// Set presence penalty
    pub fn with_presence_penalty(mut self, penalty: f32) -> Self {
        self.presence_penalty = Some(penalty);
        self
    }

    /// Set stop sequences
    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }
}

impl ReplyShape {
    /// Decode a response body, trying inline, nested, then flat.
    pub fn decode(body: &serde_json::Value) -> Result<Self, ReplyDecodeError> {
        if let Ok(inline) = serde_json::from_value::<InlineReply>(body.clone()) {
            return Ok(ReplyShape::Inline(inline));
        }
        if let Ok(nested) = serde_json::from_value::<NestedReply>(body.clone()) {
            return Ok(ReplyShape::Nested(nested));
        }
        if let Ok(flat) = serde_json::from_value::<FlatReply>(body.clone()) {
            return Ok(ReplyShape::Flat(flat));
        }

        let preview: String = body.to_string().chars().take(100).collect();
        Err(ReplyDecodeError {
            message: format!("no known reply shape matched: {}", preview),
        })
    }

    /// Concatenated `output_text` content.
    pub fn text(&self) -> String {
        match self {
            ReplyShape::Inline(reply) => collect_output_text(&reply.content),
            ReplyShape::Nested(reply) => reply
                .output
                .iter()
                .map(|item| collect_output_text(&item.content))
                .collect(),
            ReplyShape::Flat(reply) => reply.output_text.clone(),
        }
    }
}

fn collect_output_text(parts: &[OutputPart]) -> String {
    parts
        .iter()
        .filter(|p| p.kind == OUTPUT_TEXT)
        .filter_map(|p| p.text.as_deref())
        .collect()
}
