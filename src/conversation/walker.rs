//! Upward traversal of the note graph.

use tracing::trace;

use crate::canvas::{Canvas, NoteNode};

/// What the walk does after a node has been visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Descend into the node's ancestors.
    Continue,
    /// Skip the node's ancestors; sibling branches still run.
    Prune,
    /// End the entire walk.
    Stop,
}

/// Walk from `start` through its ancestors, depth first.
///
/// `visitor` receives each node with its distance from `start` (0 for
/// `start` itself). Every incoming edge is followed, so a note reachable
/// through two branches is visited once per branch. With `max_depth > 0`,
/// nodes deeper than `max_depth` are not visited. A node already on the
/// current descent path is skipped so cyclic graphs terminate.
pub fn walk<F>(canvas: &dyn Canvas, start: &str, max_depth: usize, mut visitor: F)
where
    F: FnMut(&NoteNode, usize) -> Visit,
{
    let mut path = Vec::new();
    descend(canvas, start, 0, max_depth, &mut path, &mut visitor);
}

/// Returns `false` once the visitor has asked to stop.
fn descend<F>(
    canvas: &dyn Canvas,
    id: &str,
    depth: usize,
    max_depth: usize,
    path: &mut Vec<String>,
    visitor: &mut F,
) -> bool
where
    F: FnMut(&NoteNode, usize) -> Visit,
{
    if max_depth > 0 && depth > max_depth {
        return true;
    }
    if path.iter().any(|p| p == id) {
        trace!(node_id = %id, depth, "Cycle in ancestor graph, skipping");
        return true;
    }
    let Some(node) = canvas.node(id) else {
        trace!(node_id = %id, "Edge points at a missing node");
        return true;
    };

    match visitor(&node, depth) {
        Visit::Stop => return false,
        Visit::Prune => return true,
        Visit::Continue => {}
    }

    path.push(node.id.clone());
    let mut running = true;
    for parent in canvas.parents(id) {
        if !descend(canvas, &parent, depth + 1, max_depth, path, visitor) {
            running = false;
            break;
        }
    }
    path.pop();
    running
}
