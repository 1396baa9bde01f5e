//! Evaluation recording - validates scores and attaches them to nodes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ToolError, ToolResult};
use crate::storage::{Evaluation, Node, Session, Viability};

/// Lowest accepted evaluation value.
pub const MIN_VALUE: i64 = 1;
/// Highest accepted evaluation value.
pub const MAX_VALUE: i64 = 10;

/// Unvalidated evaluation fields as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationInput {
    /// Score, must be an integer from 1 to 10.
    pub value: i64,
    /// Confidence, must be within 0.0-1.0.
    pub confidence: f64,
    /// One of `promising`, `uncertain`, `dead_end`.
    pub viability: String,
    /// Optional justification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl EvaluationInput {
    /// Create an input with the required fields.
    pub fn new(value: i64, confidence: f64, viability: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            viability: viability.into(),
            reasoning: None,
        }
    }

    /// Set the reasoning text.
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    /// Check ranges and the viability spelling.
    pub fn validate(&self) -> ToolResult<Evaluation> {
        if !(MIN_VALUE..=MAX_VALUE).contains(&self.value) {
            return Err(ToolError::validation(
                "value",
                format!(
                    "must be an integer from {} to {}, got {}",
                    MIN_VALUE, MAX_VALUE, self.value
                ),
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ToolError::validation(
                "confidence",
                format!("must be within 0.0-1.0, got {}", self.confidence),
            ));
        }
        let viability = self
            .viability
            .parse::<Viability>()
            .map_err(|e| ToolError::validation("viability", e))?;

        Ok(Evaluation {
            value: self.value as u8,
            confidence: self.confidence,
            viability,
            reasoning: self.reasoning.clone().unwrap_or_default(),
        })
    }
}

/// Validate `input` and store it as the evaluation of `node_id`, replacing any
/// earlier one. Tree shape is never touched.
pub fn record(session: &mut Session, node_id: &str, input: &EvaluationInput) -> ToolResult<Node> {
    let evaluation = input.validate()?;

    let node = session
        .node_mut(node_id)
        .ok_or_else(|| ToolError::NodeNotFound {
            node_id: node_id.to_string(),
        })?;
    let replaced = node.evaluation.replace(evaluation.clone()).is_some();
    let updated = node.clone();

    session.log(
        "add_evaluation",
        Some(node_id),
        Some(format!("value {} ({})", evaluation.value, evaluation.viability)),
    );
    session.touch();

    debug!(
        session_id = %session.id,
        node_id = %node_id,
        value = evaluation.value,
        viability = %evaluation.viability,
        replaced,
        "Evaluation recorded"
    );

    Ok(updated)
}
