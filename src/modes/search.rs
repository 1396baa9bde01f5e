//! Frontier selection for `search_next`.
//!
//! The frontier is every non-root node that has not been evaluated yet and
//! has no `dead_end` node in its lineage. Selection is a pure query: the same
//! tree always yields the same node.

use crate::storage::{Node, SearchStrategy, Session};

/// Nodes currently eligible for selection, in creation order.
pub fn frontier(session: &Session) -> Vec<&Node> {
    // Parents always precede children in the arena, so one forward pass
    // settles whether each node sits under a dead end.
    let nodes = session.nodes();
    let mut blocked = vec![false; nodes.len()];

    for (i, node) in nodes.iter().enumerate() {
        let parent_blocked = node
            .parent_id
            .as_deref()
            .and_then(|id| session.node(id))
            .map(|parent| blocked[parent.sequence as usize])
            .unwrap_or(false);
        blocked[i] = parent_blocked || node.is_dead_end();
    }

    nodes
        .iter()
        .zip(blocked)
        .filter(|(node, blocked)| !blocked && !node.is_root() && node.evaluation.is_none())
        .map(|(node, _)| node)
        .collect()
}

/// Pick the next node to explore, or `None` when the frontier is exhausted.
///
/// Breadth-first takes the shallowest node, oldest first. Depth-first takes
/// the deepest node, newest first.
pub fn next_node(session: &Session, strategy: SearchStrategy) -> Option<&Node> {
    let candidates = frontier(session).into_iter();
    match strategy {
        SearchStrategy::BreadthFirst => candidates.min_by_key(|n| (n.depth, n.sequence)),
        SearchStrategy::DepthFirst => candidates.max_by_key(|n| (n.depth, n.sequence)),
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

    /// Tree with nodes at depths 0, 1, 1, 2 (the depth-2 node under the first child).
    fn small_tree() -> (Session, Vec<String>) {
        let mut s = Session::new(
            "p",
            SessionConfig {
                max_depth: 3,
                max_branches_per_node: 3,
                ..SessionConfig::default()
            },
        );
        let level1 = add_nodes(&mut s, None, &texts(&["a", "b"])).unwrap();
        let level2 = add_nodes(&mut s, Some(level1[0].id.as_str()), &texts(&["a1"])).unwrap();
        let ids = vec![
            level1[0].id.clone(),
            level1[1].id.clone(),
            level2[0].id.clone(),
        ];
        (s, ids)
    }

    fn evaluate(s: &mut Session, id: &str, viability: &str) {
        record(s, id, &EvaluationInput::new(5, 0.5, viability)).unwrap();
    }

    #[test]
    fn test_fresh_session_is_exhausted() {
        let s = Session::new("p", SessionConfig::default());
        assert!(frontier(&s).is_empty());
        assert!(next_node(&s, SearchStrategy::BreadthFirst).is_none());
        assert!(next_node(&s, SearchStrategy::DepthFirst).is_none());
    }

    #[test]
    fn test_breadth_first_finishes_depth_before_descending() {
        let (mut s, ids) = small_tree();
        let mut order = Vec::new();

        while let Some(node) = next_node(&s, SearchStrategy::BreadthFirst) {
            let id = node.id.clone();
            order.push(id.clone());
            evaluate(&mut s, &id, "promising");
        }

        assert_eq!(order, ids);
    }

    #[test]
    fn test_depth_first_returns_deepest_newest_first() {
        let (s, ids) = small_tree();
        let first = next_node(&s, SearchStrategy::DepthFirst).unwrap();
        assert_eq!(first.id, ids[2]);
        assert_eq!(first.depth, 2);
    }

    #[test]
    fn test_depth_first_breaks_ties_by_newest() {
        let (mut s, ids) = small_tree();
        evaluate(&mut s, &ids[2], "promising");
        let next = next_node(&s, SearchStrategy::DepthFirst).unwrap();
        assert_eq!(next.id, ids[1]);
    }

    #[test]
    fn test_query_is_stateless() {
        let (s, _) = small_tree();
        let a = next_node(&s, SearchStrategy::BreadthFirst).unwrap().id.clone();
        let b = next_node(&s, SearchStrategy::BreadthFirst).unwrap().id.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dead_end_subtree_is_skipped() {
        let (mut s, ids) = small_tree();
        evaluate(&mut s, &ids[0], "dead_end");

        // Children recorded after the marking are skipped as well.
        let late = add_nodes(&mut s, Some(ids[0].as_str()), &texts(&["a2"])).unwrap();

        let open: Vec<_> = frontier(&s).iter().map(|n| n.id.clone()).collect();
        assert_eq!(open, vec![ids[1].clone()]);
        assert!(!open.contains(&late[0].id));

        assert_eq!(next_node(&s, SearchStrategy::DepthFirst).unwrap().id, ids[1]);
    }

    #[test]
    fn test_evaluated_nodes_leave_frontier() {
        let (mut s, ids) = small_tree();
        evaluate(&mut s, &ids[1], "uncertain");
        let open: Vec<_> = frontier(&s).iter().map(|n| n.id.clone()).collect();
        assert_eq!(open, vec![ids[0].clone(), ids[2].clone()]);
    }
}
