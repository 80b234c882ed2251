//! Completion endpoint client and wire types.
//!
//! Turns a built conversation into a provider request and decodes the
//! structured reply into plain text.

mod client;
mod models;
mod types;

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;

pub use client::{parse_reply, CompletionClient, COMPLETION_PATH};
pub use models::{resolve_model, ModelFallback, ModelPattern, MODEL_FALLBACKS};
pub use types::*;
