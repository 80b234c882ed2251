//! Conversation assembly from a note's ancestry.
//!
//! - [`walk`]: depth-first traversal up the ancestor edges
//! - [`resolve_system_prompt`]: nearest system-prompt note, or the default
//! - [`ConversationBuilder`]: token-bounded, oldest-first message list

mod builder;
mod system_prompt;
mod walker;

pub use builder::{Conversation, ConversationBuilder, TRUNCATION_MARGIN};
pub use system_prompt::resolve_system_prompt;
pub use walker::{walk, Visit};
