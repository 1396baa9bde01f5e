//! Session store and data model for tree-of-thoughts sessions.
//!
//! This module provides:
//! - The session/node/evaluation data model
//! - Identifier generation for sessions and nodes
//! - The [`Storage`] trait and its in-memory implementation
//!
//! Nodes live in a per-session arena (`Vec<Node>`) with an id-to-index map.
//! Parent and child links are identifiers, never owning pointers. A node's
//! arena index doubles as its creation sequence.

mod memory;


pub use memory::InMemoryStorage;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StorageResult;

// ============================================================================
// Identifier generation
// ============================================================================

/// Generate a new, process-unique session identifier.
pub fn new_session_id() -> String {
    format!("tot_session_{}", Uuid::new_v4().simple())
}

/// Generate a new, process-unique node identifier.
pub fn new_node_id() -> String {
    format!("node_{}", Uuid::new_v4().simple())
}

// ============================================================================
// Enumerations
// ============================================================================

/// Traversal policy used by `search_next`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Shallowest open node first, oldest first within a depth.
    #[default]
    #[serde(alias = "bfs")]
    BreadthFirst,
    /// Deepest open node first, newest first within a depth.
    #[serde(alias = "dfs")]
    DepthFirst,
}

impl std::fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchStrategy::BreadthFirst => write!(f, "breadth_first"),
            SearchStrategy::DepthFirst => write!(f, "depth_first"),
        }
    }
}

impl std::str::FromStr for SearchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "breadth_first" | "bfs" => Ok(SearchStrategy::BreadthFirst),
            "depth_first" | "dfs" => Ok(SearchStrategy::DepthFirst),
            _ => Err(format!("Unknown search strategy: {}", s)),
        }
    }
}

/// How the caller generates candidate thoughts. Advisory metadata only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStrategy {
    /// Independent samples per step.
    #[default]
    Sampling,
    /// Sequential proposals per step.
    Proposing,
}

impl std::fmt::Display for GenerationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationStrategy::Sampling => write!(f, "sampling"),
            GenerationStrategy::Proposing => write!(f, "proposing"),
        }
    }
}

impl std::str::FromStr for GenerationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sampling" => Ok(GenerationStrategy::Sampling),
            "proposing" => Ok(GenerationStrategy::Proposing),
            _ => Err(format!("Unknown generation strategy: {}", s)),
        }
    }
}

/// How the caller scores candidate thoughts. Advisory metadata only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMethod {
    /// Independent value per node.
    #[default]
    Value,
    /// Comparative vote across siblings.
    Vote,
}

impl std::fmt::Display for EvaluationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationMethod::Value => write!(f, "value"),
            EvaluationMethod::Vote => write!(f, "vote"),
        }
    }
}

impl std::str::FromStr for EvaluationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "value" => Ok(EvaluationMethod::Value),
            "vote" => Ok(EvaluationMethod::Vote),
            _ => Err(format!("Unknown evaluation method: {}", s)),
        }
    }
}

/// Tri-state classification of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Viability {
    /// Worth continuing.
    Promising,
    /// Undecided.
    Uncertain,
    /// Excluded from further search, together with its subtree.
    DeadEnd,
}

impl std::fmt::Display for Viability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Viability::Promising => write!(f, "promising"),
            Viability::Uncertain => write!(f, "uncertain"),
            Viability::DeadEnd => write!(f, "dead_end"),
        }
    }
}

impl std::str::FromStr for Viability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "promising" => Ok(Viability::Promising),
            "uncertain" => Ok(Viability::Uncertain),
            "dead_end" => Ok(Viability::DeadEnd),
            _ => Err(format!("Unknown viability: {}", s)),
        }
    }
}

/// Lifecycle status of a session, derived from whether a solution is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No solution recorded yet.
    Active,
    /// A solution has been recorded.
    Completed,
}

// ============================================================================
// Records
// ============================================================================

/// Per-session configuration, fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Default traversal policy for `search_next`.
    pub search_strategy: SearchStrategy,
    /// Advisory generation strategy.
    pub generation_strategy: GenerationStrategy,
    /// Advisory evaluation method.
    pub evaluation_method: EvaluationMethod,
    /// Deepest depth a node may have (root is 0).
    pub max_depth: u32,
    /// Most children any node may have.
    pub max_branches_per_node: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            search_strategy: SearchStrategy::BreadthFirst,
            generation_strategy: GenerationStrategy::Sampling,
            evaluation_method: EvaluationMethod::Value,
            max_depth: 10,
            max_branches_per_node: 5,
        }
    }
}

/// Evaluation attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Score from 1 to 10.
    pub value: u8,
    /// Confidence in the score (0.0-1.0).
    pub confidence: f64,
    /// Viability classification.
    pub viability: Viability,
    /// Free-text justification.
    pub reasoning: String,
}

/// One candidate reasoning step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node identifier, unique within the process.
    pub id: String,
    /// Owning session.
    pub session_id: String,
    /// Parent node, `None` only for the root.
    pub parent_id: Option<String>,
    /// Caller-supplied content.
    pub content: String,
    /// Distance from the root.
    pub depth: u32,
    /// Creation order within the session (root = 0).
    pub sequence: u64,
    /// Child identifiers in creation order.
    pub children_ids: Vec<String>,
    /// Recorded evaluation, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<Evaluation>,
    /// When the node was created.
    pub created_at: DateTime<Utc>,
}

impl Node {
    /// Whether the node carries a `dead_end` evaluation.
    pub fn is_dead_end(&self) -> bool {
        matches!(
            self.evaluation,
            Some(Evaluation {
                viability: Viability::DeadEnd,
                ..
            })
        )
    }

    /// Whether the node is the root of its tree.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// One entry of a session's execution log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Action that produced the entry.
    pub action: String,
    /// Node the action concerned, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    /// Short description of the outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// When the action ran.
    pub timestamp: DateTime<Utc>,
}

/// One search problem instance and its thought tree.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: String,
    /// Problem being solved.
    pub problem_statement: String,
    /// Configuration fixed at creation.
    pub config: SessionConfig,
    /// Identifier of the root node.
    pub root_node_id: String,
    /// Recorded final answer, if any.
    pub solution: Option<String>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last mutated.
    pub updated_at: DateTime<Utc>,
    nodes: Vec<Node>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    history: Vec<HistoryEntry>,
}

/// Condensed view of a session for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session identifier.
    pub id: String,
    /// Problem being solved.
    pub problem_statement: String,
    /// Derived lifecycle status.
    pub status: SessionStatus,
    /// Whether a solution has been recorded.
    pub solution_found: bool,
    /// Number of nodes including the root.
    pub total_nodes: usize,
    /// Number of nodes carrying an evaluation.
    pub total_evaluations: usize,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session together with its empty root node.
    pub fn new(problem_statement: impl Into<String>, config: SessionConfig) -> Self {
        let now = Utc::now();
        let id = new_session_id();
        let root = Node {
            id: new_node_id(),
            session_id: id.clone(),
            parent_id: None,
            content: String::new(),
            depth: 0,
            sequence: 0,
            children_ids: Vec::new(),
            evaluation: None,
            created_at: now,
        };
        let mut session = Self {
            id,
            problem_statement: problem_statement.into(),
            config,
            root_node_id: root.id.clone(),
            solution: None,
            created_at: now,
            updated_at: now,
            nodes: Vec::new(),
            index: HashMap::new(),
            history: Vec::new(),
        };
        session.index.insert(root.id.clone(), 0);
        session.nodes.push(root);
        session
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Look up a node by identifier.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        match self.index.get(id) {
            Some(&i) => Some(&mut self.nodes[i]),
            None => None,
        }
    }

    /// The root node.
    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    /// Execution log in the order actions ran.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Sequence number the next appended node will receive.
    pub fn next_sequence(&self) -> u64 {
        self.nodes.len() as u64
    }

    /// Append a node to the arena and link it under its parent.
    ///
    /// The caller has already validated the parent and the structural limits.
    pub(crate) fn push_node(&mut self, node: Node) {
        debug_assert_eq!(node.sequence, self.next_sequence());
        if let Some(parent_id) = &node.parent_id {
            if let Some(&parent) = self.index.get(parent_id) {
                self.nodes[parent].children_ids.push(node.id.clone());
            }
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    /// Append an entry to the execution log.
    pub(crate) fn log(
        &mut self,
        action: impl Into<String>,
        node_id: Option<&str>,
        detail: Option<String>,
    ) {
        self.history.push(HistoryEntry {
            action: action.into(),
            node_id: node_id.map(str::to_string),
            detail,
            timestamp: Utc::now(),
        });
    }

    /// Refresh `updated_at` after a mutation.
    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Derived lifecycle status.
    pub fn status(&self) -> SessionStatus {
        if self.solution.is_some() {
            SessionStatus::Completed
        } else {
            SessionStatus::Active
        }
    }

    /// Number of nodes including the root.
    pub fn total_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes carrying an evaluation.
    pub fn total_evaluations(&self) -> usize {
        self.nodes.iter().filter(|n| n.evaluation.is_some()).count()
    }

    /// Condensed view for listings.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            problem_statement: self.problem_statement.clone(),
            status: self.status(),
            solution_found: self.solution.is_some(),
            total_nodes: self.total_nodes(),
            total_evaluations: self.total_evaluations(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

// ============================================================================
// Storage Trait
// ============================================================================

/// Shared handle to one session, guarded by its own read/write lock.
pub type SessionHandle = Arc<RwLock<Session>>;

/// Session store abstraction.
///
/// The store owns the identifier-to-session index. Locking the index is
/// momentary; callers hold the per-session lock of the returned handle for
/// the duration of an operation.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Register a new session and return its handle.
    async fn create_session(&self, session: Session) -> StorageResult<SessionHandle>;
    /// Get a session handle by ID.
    async fn get_session(&self, id: &str) -> StorageResult<Option<SessionHandle>>;
    /// Snapshot of all session handles in creation order.
    async fn list_sessions(&self) -> StorageResult<Vec<SessionHandle>>;
}
