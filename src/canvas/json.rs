//! JSON Canvas document host.
//!
//! An in-memory note graph loaded from (and committed back to) a `.canvas`
//! file. Unknown node and edge fields are carried through untouched.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::{Canvas, NewEdge, NewNode, NodeRole, NoteNode, Side, Size};
use crate::error::{CanvasError, CanvasResult};

/// Serialized canvas document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanvasDocument {
    /// Nodes in document order.
    #[serde(default)]
    pub nodes: Vec<DocNode>,
    /// Edges in document order.
    #[serde(default)]
    pub edges: Vec<DocEdge>,
}

/// Node entry of a canvas document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocNode {
    /// Unique node id.
    pub id: String,
    /// Node type (`text`, `file`, `link`, `group`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Text of a `text` node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Left edge.
    pub x: i64,
    /// Top edge.
    pub y: i64,
    /// Width in canvas units.
    pub width: u32,
    /// Height in canvas units.
    pub height: u32,
    /// Conversation role tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_role: Option<NodeRole>,
    /// Fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Edge entry of a canvas document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocEdge {
    /// Unique edge id.
    pub id: String,
    /// Source node id.
    #[serde(rename = "fromNode")]
    pub from_node: String,
    /// Side of the source node the edge leaves from.
    #[serde(rename = "fromSide", default, skip_serializing_if = "Option::is_none")]
    pub from_side: Option<Side>,
    /// Target node id.
    #[serde(rename = "toNode")]
    pub to_node: String,
    /// Side of the target node the edge enters.
    #[serde(rename = "toSide", default, skip_serializing_if = "Option::is_none")]
    pub to_side: Option<Side>,
    /// Label drawn on the edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Default)]
struct CanvasState {
    doc: CanvasDocument,
    selection: Vec<String>,
}

/// Canvas backed by a JSON Canvas document.
///
/// `commit` writes the document to its file when one is attached and is a
/// no-op otherwise.
#[derive(Debug, Default)]
pub struct JsonCanvas {
    path: Option<PathBuf>,
    state: RwLock<CanvasState>,
    commits: AtomicUsize,
}

impl JsonCanvas {
    /// Create an empty canvas with no backing file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already parsed document.
    pub fn from_document(doc: CanvasDocument) -> CanvasResult<Self> {
        validate(&doc)?;
        Ok(Self {
            path: None,
            state: RwLock::new(CanvasState {
                doc,
                selection: Vec::new(),
            }),
            commits: AtomicUsize::new(0),
        })
    }

    /// Parse a document from JSON text.
    pub fn from_json(raw: &str) -> CanvasResult<Self> {
        let doc: CanvasDocument = serde_json::from_str(raw)?;
        Self::from_document(doc)
    }

    /// Load a canvas file; commits write back to the same path.
    pub async fn load(path: impl AsRef<Path>) -> CanvasResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let mut canvas = Self::from_json(&raw)?;
        canvas.path = Some(path.to_path_buf());
        debug!(path = %path.display(), "Canvas loaded");
        Ok(canvas)
    }

    /// Current document as pretty JSON.
    pub fn to_json(&self) -> CanvasResult<String> {
        let state = self.state.read();
        Ok(serde_json::to_string_pretty(&state.doc)?)
    }

    /// Snapshot of the current document.
    pub fn document(&self) -> CanvasDocument {
        self.state.read().doc.clone()
    }

    /// Number of completed commits.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Insert a text note with a caller-chosen id.
    pub fn insert_note(&self, id: &str, text: &str, role: Option<NodeRole>) {
        let mut state = self.state.write();
        let y = state.doc.nodes.len() as i64 * 200;
        state.doc.nodes.push(DocNode {
            id: id.to_string(),
            kind: "text".to_string(),
            text: Some(text.to_string()),
            x: 0,
            y,
            width: super::DEFAULT_NODE_WIDTH,
            height: super::MIN_NODE_HEIGHT,
            chat_role: role,
            extra: serde_json::Map::new(),
        });
    }

    /// Link `from` to `to` with an unlabeled downward edge.
    pub fn connect(&self, from: &str, to: &str) {
        let mut state = self.state.write();
        let edge = doc_edge(NewEdge::downward(from, to));
        state.doc.edges.push(edge);
    }

    /// Edges whose target is `id`.
    pub fn incoming_edges(&self, id: &str) -> Vec<DocEdge> {
        self.state
            .read()
            .doc
            .edges
            .iter()
            .filter(|e| e.to_node == id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Canvas for JsonCanvas {
    fn node(&self, id: &str) -> Option<NoteNode> {
        let state = self.state.read();
        state.doc.nodes.iter().find(|n| n.id == id).map(note_from_doc)
    }

    fn parents(&self, id: &str) -> Vec<String> {
        let state = self.state.read();
        state
            .doc
            .edges
            .iter()
            .filter(|e| e.to_node == id)
            .map(|e| e.from_node.clone())
            .collect()
    }

    fn selection(&self) -> Vec<String> {
        self.state.read().selection.clone()
    }

    fn select(&self, id: &str) {
        self.state.write().selection = vec![id.to_string()];
    }

    fn create_node(&self, node: NewNode) -> CanvasResult<String> {
        let id = new_id();
        let mut state = self.state.write();
        state.doc.nodes.push(DocNode {
            id: id.clone(),
            kind: "text".to_string(),
            text: Some(node.text),
            x: node.x,
            y: node.y,
            width: node.width,
            height: node.height,
            chat_role: node.role,
            extra: serde_json::Map::new(),
        });
        Ok(id)
    }

    fn set_text(&self, id: &str, text: &str) -> CanvasResult<()> {
        let mut state = self.state.write();
        let node = find_mut(&mut state.doc, id)?;
        node.text = Some(text.to_string());
        Ok(())
    }

    fn resize(&self, id: &str, size: Size) -> CanvasResult<()> {
        let mut state = self.state.write();
        let node = find_mut(&mut state.doc, id)?;
        node.width = size.width;
        node.height = size.height;
        Ok(())
    }

    fn remove_node(&self, id: &str) -> CanvasResult<()> {
        let mut state = self.state.write();
        let before = state.doc.nodes.len();
        state.doc.nodes.retain(|n| n.id != id);
        if state.doc.nodes.len() == before {
            return Err(CanvasError::NodeNotFound {
                node_id: id.to_string(),
            });
        }
        state
            .doc
            .edges
            .retain(|e| e.from_node != id && e.to_node != id);
        state.selection.retain(|s| s != id);
        Ok(())
    }

    fn add_edge(&self, edge: NewEdge) -> CanvasResult<String> {
        let mut state = self.state.write();
        for endpoint in [&edge.from, &edge.to] {
            if !state.doc.nodes.iter().any(|n| &n.id == endpoint) {
                return Err(CanvasError::NodeNotFound {
                    node_id: endpoint.clone(),
                });
            }
        }
        let edge = doc_edge(edge);
        let id = edge.id.clone();
        state.doc.edges.push(edge);
        Ok(id)
    }

    async fn commit(&self) -> CanvasResult<()> {
        if let Some(path) = &self.path {
            let json = self.to_json()?;
            tokio::fs::write(path, json).await?;
            debug!(path = %path.display(), "Canvas committed");
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn note_from_doc(node: &DocNode) -> NoteNode {
    NoteNode {
        id: node.id.clone(),
        text: node.text.clone().unwrap_or_default(),
        role: node.chat_role,
        x: node.x,
        y: node.y,
        width: node.width,
        height: node.height,
    }
}

fn doc_edge(edge: NewEdge) -> DocEdge {
    DocEdge {
        id: new_id(),
        from_node: edge.from,
        from_side: Some(edge.from_side),
        to_node: edge.to,
        to_side: Some(edge.to_side),
        label: edge.label,
        extra: serde_json::Map::new(),
    }
}

fn find_mut<'a>(doc: &'a mut CanvasDocument, id: &str) -> CanvasResult<&'a mut DocNode> {
    doc.nodes
        .iter_mut()
        .find(|n| n.id == id)
        .ok_or_else(|| CanvasError::NodeNotFound {
            node_id: id.to_string(),
        })
}

/// 16 hex characters, the id length canvas files conventionally use.
fn new_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(16);
    id
}

fn validate(doc: &CanvasDocument) -> CanvasResult<()> {
    let mut ids: Vec<&str> = doc.nodes.iter().map(|n| n.id.as_str()).collect();
    ids.sort_unstable();
    if let Some(pair) = ids.windows(2).find(|w| w[0] == w[1]) {
        return Err(CanvasError::InvalidDocument {
            message: format!("duplicate node id {}", pair[0]),
        });
    }
    Ok(())
}
