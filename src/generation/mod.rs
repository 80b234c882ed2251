//! Reply generation for the selected note.
//!
//! One call to [`Generator::generate`] runs
//! `AwaitingSelection → Building → Requesting → Integrating | Failed`:
//! the conversation ending at the selected note is built, a placeholder
//! reply note is shown while the request is in flight, and the reply is
//! written into that note and linked to the source. A failed request
//! removes the placeholder; nothing is retried.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::canvas::{fit_height, Canvas, NewEdge, NewNode, NodeRole, NoteNode, Size};
use crate::completion::{CompletionClient, CompletionOptions};
use crate::config::{Action, Config};
use crate::conversation::{Conversation, ConversationBuilder};
use crate::encoder::Encoder;
use crate::error::{AppError, AppResult, CanvasError};

/// Step of a generation request, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationPhase {
    /// Checking for a single selected note.
    AwaitingSelection,
    /// Assembling the conversation.
    Building,
    /// Waiting on the completion endpoint.
    Requesting,
    /// Writing the reply into the canvas.
    Integrating,
    /// Request ended without a reply.
    Failed,
}

/// How a generation request ended without an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Not exactly one note selected.
    NoSelection,
    /// The ancestry held nothing to send.
    EmptyConversation,
    /// The endpoint answered without usable text; the placeholder was removed.
    NoReply,
    /// Reply written into a new note.
    Replied {
        /// Id of the reply note.
        node_id: String,
        /// Whether selection moved to the reply.
        selected: bool,
    },
}

impl GenerationOutcome {
    /// Notice to show the user, if any.
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            GenerationOutcome::NoSelection => Some("Select a single note to generate from."),
            GenerationOutcome::EmptyConversation => None,
            GenerationOutcome::NoReply => {
                Some("The completion endpoint returned an empty or unreadable response.")
            }
            GenerationOutcome::Replied { .. } => None,
        }
    }
}

/// Generates replies into a canvas.
pub struct Generator {
    canvas: Arc<dyn Canvas>,
    client: CompletionClient,
    encoder: Encoder,
    config: Config,
}

impl Generator {
    /// Create a generator for `canvas` from configuration.
    pub fn new(canvas: Arc<dyn Canvas>, config: Config) -> AppResult<Self> {
        let client = CompletionClient::new(&config.provider, &config.request)?;
        let encoder = Encoder::for_model(client.model())?;
        Ok(Self {
            canvas,
            client,
            encoder,
            config,
        })
    }

    /// Configuration the generator was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the conversation for `node_id` without sending it.
    ///
    /// Read-only: the canvas is not committed, so the preview reflects the
    /// host's current view.
    pub fn preview(&self, node_id: &str, action: Option<&Action>) -> Conversation {
        self.build(node_id, action)
    }

    /// Generate a reply to the selected note.
    pub async fn generate(&self, action: Option<&Action>) -> AppResult<GenerationOutcome> {
        if self.config.provider.api_key.trim().is_empty() {
            return Err(AppError::Config {
                message: "API key is not set (OPENAI_API_KEY)".to_string(),
            });
        }

        enter(GenerationPhase::AwaitingSelection);
        let Some(source_id) = self.single_selection() else {
            return Ok(GenerationOutcome::NoSelection);
        };

        // Freshly typed text only reaches the graph once committed.
        self.canvas.commit().await?;
        let source = self.require_node(&source_id)?;

        enter(GenerationPhase::Building);
        let conversation = self.build(&source_id, action);
        if conversation.is_empty() {
            info!(node_id = %source_id, "Nothing to send, skipping generation");
            return Ok(GenerationOutcome::EmptyConversation);
        }

        let placeholder_id = self.canvas.create_node(NewNode::below(
            &source,
            format!("Calling {}…", self.client.model()),
            Some(NodeRole::Assistant),
        ))?;

        enter(GenerationPhase::Requesting);
        let start = Instant::now();
        let options = CompletionOptions::from_config(&self.config.generation);
        let reply = match self.client.complete(&conversation.messages, &options).await {
            Ok(reply) => reply,
            Err(e) => {
                enter(GenerationPhase::Failed);
                self.discard(&placeholder_id);
                return Err(e.into());
            }
        };

        let Some(text) = reply else {
            enter(GenerationPhase::Failed);
            self.discard(&placeholder_id);
            return Ok(GenerationOutcome::NoReply);
        };

        enter(GenerationPhase::Integrating);
        let selected = match self.integrate(&source, &placeholder_id, &text, action) {
            Ok(selected) => selected,
            Err(e) => {
                // Source or placeholder may have been removed during the request.
                enter(GenerationPhase::Failed);
                self.discard(&placeholder_id);
                return Err(e);
            }
        };
        self.canvas.commit().await?;

        info!(
            source_id = %source_id,
            reply_id = %placeholder_id,
            token_count = conversation.token_count,
            latency_ms = start.elapsed().as_millis(),
            selected,
            "Reply generated"
        );

        Ok(GenerationOutcome::Replied {
            node_id: placeholder_id,
            selected,
        })
    }

    /// Add an empty user note below the selected note and select it.
    ///
    /// Returns the new note's id, or `None` without a single selection.
    pub async fn add_next_note(&self) -> AppResult<Option<String>> {
        let Some(source_id) = self.single_selection() else {
            return Ok(None);
        };
        self.canvas.commit().await?;
        let source = self.require_node(&source_id)?;

        let id = self
            .canvas
            .create_node(NewNode::below(&source, "", Some(NodeRole::User)))?;
        self.canvas.add_edge(NewEdge::downward(&source_id, &id))?;
        self.canvas.select(&id);
        self.canvas.commit().await?;

        debug!(source_id = %source_id, node_id = %id, "Next note added");
        Ok(Some(id))
    }

    fn build(&self, node_id: &str, action: Option<&Action>) -> Conversation {
        ConversationBuilder::new(self.canvas.as_ref(), &self.encoder, &self.config.generation)
            .build(node_id, action.map(|a| a.prompt.as_str()))
    }

    /// Write the reply into the placeholder and link it.
    ///
    /// Selection follows the reply only if it still points at the source.
    fn integrate(
        &self,
        source: &NoteNode,
        reply_id: &str,
        text: &str,
        action: Option<&Action>,
    ) -> AppResult<bool> {
        self.canvas.set_text(reply_id, text)?;

        let width = self
            .canvas
            .node(reply_id)
            .map(|n| n.width)
            .unwrap_or(source.width);
        self.canvas.resize(
            reply_id,
            Size {
                width,
                height: fit_height(text, width),
            },
        )?;

        let edge = NewEdge::downward(&source.id, reply_id);
        let edge = match action {
            Some(action) => edge.with_label(&action.name),
            None => edge,
        };
        self.canvas.add_edge(edge)?;

        let still_selected = self.canvas.selection() == [source.id.as_str()];
        if still_selected {
            self.canvas.select(reply_id);
        } else {
            debug!(source_id = %source.id, "Selection changed during request, leaving it");
        }
        Ok(still_selected)
    }

    fn single_selection(&self) -> Option<String> {
        let mut selection = self.canvas.selection();
        if selection.len() == 1 {
            selection.pop()
        } else {
            None
        }
    }

    fn require_node(&self, id: &str) -> AppResult<NoteNode> {
        self.canvas.node(id).ok_or_else(|| {
            CanvasError::NodeNotFound {
                node_id: id.to_string(),
            }
            .into()
        })
    }

    fn discard(&self, placeholder_id: &str) {
        if let Err(e) = self.canvas.remove_node(placeholder_id) {
            warn!(node_id = %placeholder_id, error = %e, "Failed to remove placeholder note");
        }
    }
}

fn enter(phase: GenerationPhase) {
    debug!(phase = ?phase, "Generation phase");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::MockCanvas;
    use crate::config::{GenerationConfig, LogFormat, LoggingConfig, ProviderConfig, RequestConfig};

    fn config(api_key: &str) -> Config {
        Config {
            provider: ProviderConfig {
                api_key: api_key.to_string(),
                base_url: "http://127.0.0.1:9".to_string(),
                model: "gpt-4o-mini".to_string(),
                remapped_from: None,
            },
            generation: GenerationConfig::default(),
            actions: Vec::new(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Pretty,
            },
            request: RequestConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_missing_api_key_touches_nothing() {
        // No expectations: any canvas call would panic.
        let canvas = MockCanvas::new();
        let generator = Generator::new(Arc::new(canvas), config("  ")).unwrap();

        let result = generator.generate(None).await;
        assert!(matches!(result, Err(AppError::Config { .. })));
    }

    #[tokio::test]
    async fn test_no_selection_is_a_noop() {
        let mut canvas = MockCanvas::new();
        canvas
            .expect_selection()
            .times(1)
            .returning(|| vec!["a".to_string(), "b".to_string()]);

        let generator = Generator::new(Arc::new(canvas), config("key")).unwrap();
        let outcome = generator.generate(None).await.unwrap();
        assert_eq!(outcome, GenerationOutcome::NoSelection);
        assert!(outcome.notice().is_some());
    }

    #[tokio::test]
    async fn test_empty_conversation_commits_but_creates_nothing() {
        let mut canvas = MockCanvas::new();
        canvas
            .expect_selection()
            .returning(|| vec!["blank".to_string()]);
        canvas.expect_commit().times(1).returning(|| Ok(()));
        canvas.expect_node().returning(|id| {
            Some(NoteNode {
                id: id.to_string(),
                text: "   ".to_string(),
                role: None,
                x: 0,
                y: 0,
                width: 400,
                height: 60,
            })
        });
        canvas.expect_parents().returning(|_| Vec::new());
        canvas.expect_create_node().never();

        let generator = Generator::new(Arc::new(canvas), config("key")).unwrap();
        let outcome = generator.generate(None).await.unwrap();
        assert_eq!(outcome, GenerationOutcome::EmptyConversation);
        assert_eq!(outcome.notice(), None);
    }

    #[test]
    fn test_outcome_notices() {
        assert!(GenerationOutcome::NoReply
            .notice()
            .unwrap()
            .contains("empty or unreadable"));
        assert_eq!(
            GenerationOutcome::Replied {
                node_id: "x".to_string(),
                selected: true
            }
            .notice(),
            None
        );
    }
}
