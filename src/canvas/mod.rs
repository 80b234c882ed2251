//! Host canvas interface.
//!
//! The core never owns the note graph. It reads nodes, ancestors and the
//! selection through [`Canvas`], writes replies back through it, and awaits
//! [`Canvas::commit`] whenever it needs the host's pending edits persisted.

mod json;

pub use json::{CanvasDocument, DocEdge, DocNode, JsonCanvas};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CanvasResult;

/// Default width for notes created by the core.
pub const DEFAULT_NODE_WIDTH: u32 = 400;
/// Vertical gap between a note and a note spawned below it.
pub const NODE_GAP: i64 = 60;
/// Smallest height a note is resized to.
pub const MIN_NODE_HEIGHT: u32 = 60;

const LINE_HEIGHT: u32 = 24;
const CHAR_WIDTH: u32 = 8;
const NODE_PADDING: u32 = 40;

/// Conversation role tag stored on a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Sent as a `user` message.
    User,
    /// Sent as an `assistant` message.
    Assistant,
}

/// Edge anchor side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Top side.
    Top,
    /// Right side.
    Right,
    /// Bottom side.
    Bottom,
    /// Left side.
    Left,
}

/// Snapshot of a note as read from the host.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteNode {
    /// Host-assigned id.
    pub id: String,
    /// Text content; empty for node kinds that carry no text.
    pub text: String,
    /// Role tag; untagged notes are sent as user messages.
    pub role: Option<NodeRole>,
    /// Left edge.
    pub x: i64,
    /// Top edge.
    pub y: i64,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

/// Width and height of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

/// Request to create a note.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNode {
    /// Initial text.
    pub text: String,
    /// Role tag.
    pub role: Option<NodeRole>,
    /// Left edge.
    pub x: i64,
    /// Top edge.
    pub y: i64,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

/// Request to create a directed edge.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEdge {
    /// Source note id.
    pub from: String,
    /// Side the edge leaves the source from.
    pub from_side: Side,
    /// Target note id.
    pub to: String,
    /// Side the edge enters the target at.
    pub to_side: Side,
    /// Optional label.
    pub label: Option<String>,
}

/// Graph operations the core consumes from the host.
///
/// Reads and mutations are synchronous against the host's in-memory view;
/// only [`Canvas::commit`] suspends.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Canvas: Send + Sync {
    /// Read a note by id.
    fn node(&self, id: &str) -> Option<NoteNode>;

    /// Ids of the direct ancestors of a note, in edge order.
    fn parents(&self, id: &str) -> Vec<String>;

    /// Ids of the currently selected notes.
    fn selection(&self) -> Vec<String>;

    /// Replace the selection with a single note.
    fn select(&self, id: &str);

    /// Create a note and return its id.
    fn create_node(&self, node: NewNode) -> CanvasResult<String>;

    /// Replace a note's text.
    fn set_text(&self, id: &str, text: &str) -> CanvasResult<()>;

    /// Resize a note.
    fn resize(&self, id: &str, size: Size) -> CanvasResult<()>;

    /// Remove a note and the edges attached to it.
    fn remove_node(&self, id: &str) -> CanvasResult<()>;

    /// Create a directed edge and return its id.
    fn add_edge(&self, edge: NewEdge) -> CanvasResult<String>;

    /// Wait until pending edits are persisted by the host.
    async fn commit(&self) -> CanvasResult<()>;
}

impl NoteNode {
    /// Role used when the note is sent as a message.
    pub fn effective_role(&self) -> NodeRole {
        self.role.unwrap_or(NodeRole::User)
    }

    /// Current width and height.
    pub fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }
}

impl NewNode {
    /// A note placed directly below `anchor`, aligned to its left edge.
    pub fn below(anchor: &NoteNode, text: impl Into<String>, role: Option<NodeRole>) -> Self {
        let width = if anchor.width == 0 {
            DEFAULT_NODE_WIDTH
        } else {
            anchor.width
        };
        Self {
            text: text.into(),
            role,
            x: anchor.x,
            y: anchor.y + i64::from(anchor.height) + NODE_GAP,
            width,
            height: MIN_NODE_HEIGHT,
        }
    }
}

impl NewEdge {
    /// Edge from the bottom of `from` to the top of `to`.
    pub fn downward(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            from_side: Side::Bottom,
            to: to.into(),
            to_side: Side::Top,
            label: None,
        }
    }

    /// Attach a label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Height that fits `text` rendered at `width`.
///
/// Approximates rendering with a fixed glyph width and line height; each
/// source line wraps independently.
pub fn fit_height(text: &str, width: u32) -> u32 {
    let per_line = (width.saturating_sub(NODE_PADDING) / CHAR_WIDTH).max(1) as usize;
    let lines: usize = text
        .lines()
        .map(|line| line.chars().count().div_ceil(per_line).max(1))
        .sum::<usize>()
        .max(1);

    let height = (lines as u32)
        .saturating_mul(LINE_HEIGHT)
        .saturating_add(NODE_PADDING);
    height.max(MIN_NODE_HEIGHT)
}
