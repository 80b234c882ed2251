//! # Canvas Conversation
//!
//! Turns the ancestry of a note on a canvas into a token-bounded chat
//! conversation, sends it to a completion endpoint, and writes the reply
//! back as a new note linked to the one it answers.
//!
//! ## Features
//!
//! - **Ancestor walk**: depth-first traversal of incoming edges with an
//!   optional depth limit
//! - **System prompt notes**: the nearest note starting with `SYSTEM PROMPT`
//!   overrides the configured default
//! - **Token budgeting**: notes are counted with the model's tokenizer and
//!   the oldest note that overflows the input limit is truncated
//! - **Image notes**: `data:image/...` notes are sent as image inputs
//! - **Actions**: named prompts appended to the conversation
//! - **Reply integration**: placeholder note, labeled edge, selection hand-off
//!
//! ## Architecture
//!
//! ```text
//! Canvas (host) → ConversationBuilder → CompletionClient (HTTP)
//!       ↑                                        ↓
//!       └──────────── Generator (reply) ←────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use canvas_conversation::{Config, Generator};
//! use canvas_conversation::canvas::{Canvas, JsonCanvas};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let canvas = Arc::new(JsonCanvas::load("chat.canvas").await?);
//!     canvas.select("question-node");
//!     let generator = Generator::new(canvas, config)?;
//!     let outcome = generator.generate(None).await?;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Host canvas interface and the JSON Canvas document implementation.
pub mod canvas;
/// Completion endpoint client and wire types.
pub mod completion;
/// Configuration management.
pub mod config;
/// Conversation assembly from a note's ancestry.
pub mod conversation;
/// Tokenizer wrapper used for budget accounting.
pub mod encoder;
/// Error types and result aliases for the application.
pub mod error;
/// Reply generation and integration into the canvas.
pub mod generation;
/// Default prompts and content markers.
pub mod prompts;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use generation::{GenerationOutcome, Generator};
