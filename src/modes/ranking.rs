//! Solution ranking over evaluated nodes.

use serde::{Deserialize, Serialize};

use super::tree::path;
use crate::storage::{Session, Viability};

/// Characters kept per step in a path description.
const PATH_PREVIEW_CHARS: usize = 50;

/// Separator between steps in a path description.
const PATH_SEPARATOR: &str = " → ";

/// One evaluated node with its lineage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedNode {
    /// Position in the ranking, starting at 1.
    pub rank: usize,
    /// Node identifier.
    pub node_id: String,
    /// Node content.
    pub content: String,
    /// Node depth.
    pub depth: u32,
    /// Contents from the root down to the node.
    pub path: Vec<String>,
    /// Abbreviated, human-readable path.
    pub path_description: String,
    /// Recorded value.
    pub value: u8,
    /// Recorded confidence.
    pub confidence: f64,
    /// Recorded viability.
    pub viability: Viability,
    /// Recorded reasoning.
    pub reasoning: String,
}

/// Rank every evaluated node: value descending, then confidence descending,
/// then creation order ascending.
pub fn rank(session: &Session) -> Vec<RankedNode> {
    let mut evaluated: Vec<_> = session
        .nodes()
        .iter()
        .filter_map(|n| n.evaluation.as_ref().map(|e| (n, e)))
        .collect();

    evaluated.sort_by(|(a, ea), (b, eb)| {
        eb.value
            .cmp(&ea.value)
            .then_with(|| eb.confidence.total_cmp(&ea.confidence))
            .then_with(|| a.sequence.cmp(&b.sequence))
    });

    evaluated
        .into_iter()
        .enumerate()
        .map(|(i, (node, evaluation))| {
            let steps: Vec<String> = path(session, &node.id)
                .into_iter()
                .map(|n| n.content.clone())
                .collect();
            RankedNode {
                rank: i + 1,
                node_id: node.id.clone(),
                content: node.content.clone(),
                depth: node.depth,
                path_description: describe_path(&steps),
                path: steps,
                value: evaluation.value,
                confidence: evaluation.confidence,
                viability: evaluation.viability,
                reasoning: evaluation.reasoning.clone(),
            }
        })
        .collect()
}

fn describe_path(steps: &[String]) -> String {
    steps
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| preview(s))
        .collect::<Vec<_>>()
        .join(PATH_SEPARATOR)
}

fn preview(s: &str) -> String {
    if s.chars().count() > PATH_PREVIEW_CHARS {
        format!("{}...", s.chars().take(PATH_PREVIEW_CHARS).collect::<String>())
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::evaluation::{record, EvaluationInput};
    use crate::modes::tree::add_nodes;
    use crate::storage::SessionConfig;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rank_empty_when_nothing_evaluated() {
        let mut s = Session::new("p", SessionConfig::default());
        add_nodes(&mut s, None, &texts(&["a", "b"])).unwrap();
        assert!(rank(&s).is_empty());
    }

    #[test]
    fn test_rank_orders_by_value_then_confidence_then_creation() {
        let mut s = Session::new("p", SessionConfig::default());
        let ids: Vec<String> = add_nodes(&mut s, None, &texts(&["a", "b", "c", "d"]))
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();

        record(&mut s, &ids[0], &EvaluationInput::new(6, 0.9, "uncertain")).unwrap();
        record(&mut s, &ids[1], &EvaluationInput::new(8, 0.5, "promising")).unwrap();
        record(&mut s, &ids[2], &EvaluationInput::new(8, 0.7, "promising")).unwrap();
        record(&mut s, &ids[3], &EvaluationInput::new(6, 0.9, "dead_end")).unwrap();

        let ranked = rank(&s);
        let order: Vec<_> = ranked.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(order, vec!["c", "b", "a", "d"]);
        assert_eq!(
            ranked.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );

        for pair in ranked.windows(2) {
            assert!(pair[0].value >= pair[1].value);
            if pair[0].value == pair[1].value {
                assert!(pair[0].confidence >= pair[1].confidence);
            }
        }
    }

    #[test]
    fn test_rank_includes_path_context() {
        let mut s = Session::new("p", SessionConfig::default());
        let a = add_nodes(&mut s, None, &texts(&["Use SQL"])).unwrap();
        let b = add_nodes(&mut s, Some(a[0].id.as_str()), &texts(&["Pick Postgres"])).unwrap();
        record(&mut s, &b[0].id, &EvaluationInput::new(9, 0.9, "promising")).unwrap();

        let ranked = rank(&s);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].path, vec!["", "Use SQL", "Pick Postgres"]);
        assert_eq!(ranked[0].path_description, "Use SQL → Pick Postgres");
        assert_eq!(ranked[0].depth, 2);
    }

    #[test]
    fn test_preview_truncates_long_steps() {
        let long = "x".repeat(60);
        assert_eq!(preview(&long), format!("{}...", "x".repeat(50)));
        assert_eq!(preview("short"), "short");
        assert_eq!(preview(&"é".repeat(51)).chars().count(), 53);
    }
}
