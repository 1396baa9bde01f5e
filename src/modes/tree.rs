//! Thought tree structure - appending children and walking lineage.
//!
//! Children are appended in batches. A batch is validated in full before
//! any node is created, so a rejected batch leaves the tree untouched.

use chrono::Utc;
use tracing::debug;

use crate::error::{ToolError, ToolResult};
use crate::storage::{new_node_id, Node, Session};

/// Append `contents` as new children of `parent_id` (the root when `None` or empty).
///
/// Returns the created nodes in the order given. Fails without modifying the
/// session when the parent is unknown, the batch is empty or contains blank
/// text, or when the batch would break the depth or branch limit.
pub fn add_nodes(
    session: &mut Session,
    parent_id: Option<&str>,
    contents: &[String],
) -> ToolResult<Vec<Node>> {
    let parent_id = parent_id
        .filter(|id| !id.is_empty())
        .unwrap_or(&session.root_node_id)
        .to_string();
    let parent = session
        .node(&parent_id)
        .ok_or_else(|| ToolError::NodeNotFound {
            node_id: parent_id.clone(),
        })?;

    if contents.is_empty() {
        return Err(ToolError::validation(
            "contents",
            "At least one thought is required",
        ));
    }
    if let Some(i) = contents.iter().position(|c| c.trim().is_empty()) {
        return Err(ToolError::validation(
            "contents",
            format!("Thought at index {} is empty", i),
        ));
    }

    let child_depth = parent.depth + 1;
    if child_depth > session.config.max_depth {
        return Err(ToolError::DepthLimitExceeded {
            parent_id,
            max_depth: session.config.max_depth,
            requested_depth: child_depth,
        });
    }

    let existing = parent.children_ids.len();
    if existing + contents.len() > session.config.max_branches_per_node as usize {
        return Err(ToolError::BranchLimitExceeded {
            parent_id,
            max_branches: session.config.max_branches_per_node,
            existing,
            requested: contents.len(),
        });
    }

    let mut added = Vec::with_capacity(contents.len());
    for content in contents {
        let node = Node {
            id: new_node_id(),
            session_id: session.id.clone(),
            parent_id: Some(parent_id.clone()),
            content: content.clone(),
            depth: child_depth,
            sequence: session.next_sequence(),
            children_ids: Vec::new(),
            evaluation: None,
            created_at: Utc::now(),
        };
        session.push_node(node.clone());
        session.log("add_thought", Some(node.id.as_str()), Some(format!("parent {}", parent_id)));
        added.push(node);
    }
    session.touch();

    debug!(
        session_id = %session.id,
        parent_id = %parent_id,
        added = added.len(),
        depth = child_depth,
        "Thoughts appended"
    );

    Ok(added)
}

/// Lineage of a node, from the node itself up to the root.
///
/// The walk is bounded by the node's depth, so a corrupted parent link can
/// never loop.
pub fn ancestors<'a>(session: &'a Session, node_id: &str) -> Vec<&'a Node> {
    let mut chain = Vec::new();
    let mut current = session.node(node_id);
    let limit = current.map(|n| n.depth as usize + 1).unwrap_or(0);

    while let Some(node) = current {
        if chain.len() == limit {
            break;
        }
        chain.push(node);
        current = node.parent_id.as_deref().and_then(|id| session.node(id));
    }
    chain
}

/// Nodes from the root down to `node_id`, inclusive.
pub fn path<'a>(session: &'a Session, node_id: &str) -> Vec<&'a Node> {
    let mut chain = ancestors(session, node_id);
    chain.reverse();
    chain
}

/// Sibling nodes of `node_id` (same parent, excluding the node), in creation order.
pub fn siblings<'a>(session: &'a Session, node_id: &str) -> Vec<&'a Node> {
    let parent = session
        .node(node_id)
        .and_then(|n| n.parent_id.as_deref())
        .and_then(|id| session.node(id));

    match parent {
        Some(parent) => parent
            .children_ids
            .iter()
            .filter(|id| id.as_str() != node_id)
            .filter_map(|id| session.node(id))
            .collect(),
        None => Vec::new(),
    }
}
