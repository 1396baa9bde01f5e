//! Backtracking - retire a dead end and reposition the exploration frontier.
//!
//! The target node is resolved before anything is written, so a failed
//! backtrack leaves the session unchanged.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::debug;

use super::tree::siblings;
use crate::error::{ToolError, ToolResult};
use crate::storage::{Evaluation, Node, Session, Viability};

/// Value stored when a node without an evaluation is marked as a dead end.
pub const DEAD_END_DEFAULT_VALUE: u8 = 1;
/// Confidence stored when a node without an evaluation is marked as a dead end.
pub const DEAD_END_DEFAULT_CONFIDENCE: f64 = 0.0;
/// Reasoning stored when a node without an evaluation is marked as a dead end.
pub const DEAD_END_DEFAULT_REASONING: &str = "Marked as dead end by backtrack";

/// Where exploration resumes after a dead end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacktrackStrategy {
    /// The dead end's parent.
    #[default]
    Parent,
    /// The best-valued viable sibling.
    BestAlternative,
    /// The session root.
    Root,
}

impl std::fmt::Display for BacktrackStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BacktrackStrategy::Parent => write!(f, "parent"),
            BacktrackStrategy::BestAlternative => write!(f, "best_alternative"),
            BacktrackStrategy::Root => write!(f, "root"),
        }
    }
}

impl std::str::FromStr for BacktrackStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "parent" => Ok(BacktrackStrategy::Parent),
            "best_alternative" => Ok(BacktrackStrategy::BestAlternative),
            "root" => Ok(BacktrackStrategy::Root),
            _ => Err(format!("Unknown backtrack strategy: {}", s)),
        }
    }
}

/// Mark `dead_end_id` as a dead end and return the node to resume from.
pub fn backtrack(
    session: &mut Session,
    dead_end_id: &str,
    strategy: BacktrackStrategy,
) -> ToolResult<Node> {
    let dead_end = session
        .node(dead_end_id)
        .ok_or_else(|| ToolError::NodeNotFound {
            node_id: dead_end_id.to_string(),
        })?;

    let target = match strategy {
        BacktrackStrategy::Parent => dead_end
            .parent_id
            .as_deref()
            .and_then(|id| session.node(id))
            .ok_or_else(|| ToolError::CannotBacktrackFromRoot {
                node_id: dead_end_id.to_string(),
            })?,
        BacktrackStrategy::BestAlternative => best_alternative(session, dead_end_id)
            .ok_or_else(|| ToolError::NoAlternativeAvailable {
                node_id: dead_end_id.to_string(),
            })?,
        BacktrackStrategy::Root => session.root(),
    }
    .id
    .clone();

    mark_dead_end(session, dead_end_id);

    session.log(
        "backtrack",
        Some(dead_end_id),
        Some(format!("{} -> {}", strategy, target)),
    );
    session.touch();

    debug!(
        session_id = %session.id,
        from = %dead_end_id,
        to = %target,
        strategy = %strategy,
        "Backtracked"
    );

    session
        .node(&target)
        .cloned()
        .ok_or(ToolError::NodeNotFound { node_id: target })
}

/// Best viable sibling: highest recorded value, earliest created on ties.
/// Only evaluated siblings qualify.
fn best_alternative<'a>(session: &'a Session, node_id: &str) -> Option<&'a Node> {
    siblings(session, node_id)
        .into_iter()
        .filter_map(|n| match n.evaluation.as_ref() {
            Some(e) if e.viability != Viability::DeadEnd => Some((e.value, n)),
            _ => None,
        })
        .max_by_key(|(value, n)| (*value, Reverse(n.sequence)))
        .map(|(_, n)| n)
}

/// Force the node's viability to `dead_end`, keeping any other evaluation fields.
fn mark_dead_end(session: &mut Session, node_id: &str) {
    if let Some(node) = session.node_mut(node_id) {
        match node.evaluation.as_mut() {
            Some(evaluation) => evaluation.viability = Viability::DeadEnd,
            None => {
                node.evaluation = Some(Evaluation {
                    value: DEAD_END_DEFAULT_VALUE,
                    confidence: DEAD_END_DEFAULT_CONFIDENCE,
                    viability: Viability::DeadEnd,
                    reasoning: DEAD_END_DEFAULT_REASONING.to_string(),
                })
            }
        }
    }
}
