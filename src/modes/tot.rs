//! Tree-of-Thoughts mode - stateful branching search over caller-supplied thoughts.
//!
//! This module provides the session-level operations behind the
//! `tree_of_thoughts` tool:
//! - Session creation and inspection
//! - Appending thoughts and recording evaluations
//! - Frontier selection (breadth-first or depth-first)
//! - Backtracking away from dead ends
//! - Solution recording and ranked results
//!
//! Every operation resolves its session handle first, then holds that
//! session's lock (write for mutations, read for inspection) until it returns.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::backtracking::{self, BacktrackStrategy};
use super::evaluation::{self, EvaluationInput};
use super::ranking::{self, RankedNode};
use super::search;
use super::tree;
use super::ModeCore;
use crate::config::{Config, TreeDefaults};
use crate::error::{AppResult, ToolError};
use crate::storage::{
    EvaluationMethod, GenerationStrategy, InMemoryStorage, Node, SearchStrategy, Session,
    SessionConfig, SessionStatus, SessionSummary, Storage,
};

// ============================================================================
// Parameters
// ============================================================================

/// Optional configuration supplied with `create_session`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigurationInput {
    /// `breadth_first` (`bfs`) or `depth_first` (`dfs`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_strategy: Option<String>,
    /// `sampling` or `proposing`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_strategy: Option<String>,
    /// `value` or `vote`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_method: Option<String>,
    /// Deepest allowed depth, at least 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,
    /// Most children per node, at least 1.
    #[serde(default, alias = "max_branches", skip_serializing_if = "Option::is_none")]
    pub max_branches_per_node: Option<u32>,
}

impl ConfigurationInput {
    /// Resolve against server defaults, validating every supplied field.
    pub fn resolve(&self, defaults: &TreeDefaults) -> AppResult<SessionConfig> {
        let mut config = SessionConfig::from(defaults);

        if let Some(s) = &self.search_strategy {
            config.search_strategy = parse_field::<SearchStrategy>("search_strategy", s)?;
        }
        if let Some(s) = &self.generation_strategy {
            config.generation_strategy =
                parse_field::<GenerationStrategy>("generation_strategy", s)?;
        }
        if let Some(s) = &self.evaluation_method {
            config.evaluation_method = parse_field::<EvaluationMethod>("evaluation_method", s)?;
        }
        if let Some(depth) = self.max_depth {
            if depth == 0 {
                return Err(ToolError::validation("max_depth", "must be a positive integer").into());
            }
            config.max_depth = depth;
        }
        if let Some(branches) = self.max_branches_per_node {
            if branches == 0 {
                return Err(ToolError::validation(
                    "max_branches_per_node",
                    "must be a positive integer",
                )
                .into());
            }
            config.max_branches_per_node = branches;
        }

        Ok(config)
    }
}

/// Input for `create_session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionParams {
    /// Problem to solve.
    pub problem_statement: String,
    /// Optional configuration overrides.
    #[serde(default, alias = "config", skip_serializing_if = "Option::is_none")]
    pub configuration: Option<ConfigurationInput>,
}

/// Input for `add_thoughts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddThoughtsParams {
    /// Target session.
    pub session_id: String,
    /// Thoughts to append, in order.
    #[serde(alias = "thoughts")]
    pub contents: Vec<String>,
    /// Parent node, the root when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_node_id: Option<String>,
}

/// Input for `add_evaluation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddEvaluationParams {
    /// Target session.
    pub session_id: String,
    /// Node being evaluated.
    pub node_id: String,
    /// Evaluation fields.
    #[serde(flatten)]
    pub evaluation: EvaluationInput,
}

/// Input for `search_next`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchNextParams {
    /// Target session.
    pub session_id: String,
    /// Strategy for this call only.
    #[serde(default, alias = "search_strategy", skip_serializing_if = "Option::is_none")]
    pub strategy_override: Option<String>,
}

/// Input for `backtrack`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktrackParams {
    /// Target session.
    pub session_id: String,
    /// Node to retire.
    pub dead_end_node_id: String,
    /// `parent` (default), `best_alternative` or `root`.
    #[serde(default, alias = "backtrack_strategy", skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

/// Input for `set_solution`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetSolutionParams {
    /// Target session.
    pub session_id: String,
    /// Final answer text.
    pub solution: String,
}

/// Input for actions that only name a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionParams {
    /// Target session.
    pub session_id: String,
}

fn parse_field<T>(field: &str, raw: &str) -> AppResult<T>
where
    T: std::str::FromStr<Err = String>,
{
    raw.parse::<T>()
        .map_err(|e| ToolError::validation(field, e).into())
}

// ============================================================================
// Results
// ============================================================================

/// Result of `create_session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResult {
    /// New session identifier.
    pub session_id: String,
    /// Identifier of the implicit root node.
    pub root_node_id: String,
    /// Problem statement as stored.
    pub problem_statement: String,
    /// Effective configuration.
    pub configuration: SessionConfig,
    /// Lifecycle status.
    pub status: SessionStatus,
}

/// Result of `add_thoughts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddThoughtsResult {
    /// Session identifier.
    pub session_id: String,
    /// Parent the thoughts were appended under.
    pub parent_node_id: String,
    /// Created nodes in order.
    pub added_nodes: Vec<Node>,
    /// Node count after the call.
    pub total_nodes: usize,
}

/// Result of `add_evaluation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddEvaluationResult {
    /// Session identifier.
    pub session_id: String,
    /// The node with its new evaluation.
    pub node: Node,
    /// Evaluated node count after the call.
    pub total_evaluations: usize,
}

/// Result of `search_next`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchNextResult {
    /// Session identifier.
    pub session_id: String,
    /// Strategy that was applied.
    pub strategy: SearchStrategy,
    /// True when no candidate remains.
    pub exhausted: bool,
    /// Selected node, absent when exhausted.
    pub next_node: Option<Node>,
    /// Number of candidates that were eligible.
    pub frontier_size: usize,
    /// What the caller should do next.
    pub guidance: String,
}

/// Result of `backtrack`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktrackResult {
    /// Session identifier.
    pub session_id: String,
    /// Node that was marked as a dead end.
    pub dead_end_node_id: String,
    /// Strategy that was applied.
    pub strategy: BacktrackStrategy,
    /// Node to resume from.
    pub node: Node,
}

/// Result of `set_solution`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetSolutionResult {
    /// Session identifier.
    pub session_id: String,
    /// Recorded solution.
    pub solution: String,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Text that was replaced, if a solution was already recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_solution: Option<String>,
    /// Node count.
    pub total_nodes: usize,
    /// Evaluated node count.
    pub total_evaluations: usize,
}

/// Result of `get_session`.
#[derive(Debug, Clone, Serialize)]
pub struct GetSessionResult {
    /// Full session dump including nodes and history.
    pub session: Session,
    /// Lifecycle status.
    pub status: SessionStatus,
}

/// Result of `list_sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSessionsResult {
    /// Number of sessions.
    pub total_sessions: usize,
    /// One summary per session, in creation order.
    pub sessions: Vec<SessionSummary>,
}

/// Result of `display_results`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayResultsResult {
    /// Session identifier.
    pub session_id: String,
    /// Problem statement.
    pub problem_statement: String,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Recorded solution, reported separately from the ranking.
    pub solution: Option<String>,
    /// Node count.
    pub total_nodes: usize,
    /// Evaluated node count.
    pub total_evaluations: usize,
    /// Evaluated nodes, best first.
    pub ranked_solutions: Vec<RankedNode>,
}

// ============================================================================
// Mode
// ============================================================================

/// Tree-of-Thoughts mode handler.
#[derive(Clone)]
pub struct TreeOfThoughtsMode {
    /// Core infrastructure (session store).
    core: ModeCore,
    /// Configuration applied when `create_session` omits a field.
    defaults: TreeDefaults,
}

impl TreeOfThoughtsMode {
    /// Create a new tree-of-thoughts mode handler
    pub fn new(storage: InMemoryStorage, config: &Config) -> Self {
        Self {
            core: ModeCore::new(storage),
            defaults: config.tree.clone(),
        }
    }

    /// Create a session and its root node.
    pub async fn create_session(&self, params: CreateSessionParams) -> AppResult<CreateSessionResult> {
        if params.problem_statement.trim().is_empty() {
            return Err(
                ToolError::validation("problem_statement", "Problem statement cannot be empty")
                    .into(),
            );
        }

        let config = params
            .configuration
            .unwrap_or_default()
            .resolve(&self.defaults)?;
        let session = Session::new(params.problem_statement, config);
        let handle = self.core.storage().create_session(session).await?;
        let mut session = handle.write().await;
        let root_id = session.root_node_id.clone();
        session.log("create_session", Some(root_id.as_str()), None);

        info!(
            session_id = %session.id,
            search_strategy = %session.config.search_strategy,
            max_depth = session.config.max_depth,
            max_branches = session.config.max_branches_per_node,
            "Tree-of-thoughts session created"
        );

        Ok(CreateSessionResult {
            session_id: session.id.clone(),
            root_node_id: session.root_node_id.clone(),
            problem_statement: session.problem_statement.clone(),
            configuration: session.config.clone(),
            status: session.status(),
        })
    }

    /// Append thoughts under a parent node (all or nothing).
    pub async fn add_thoughts(&self, params: AddThoughtsParams) -> AppResult<AddThoughtsResult> {
        let handle = self.core.session(&params.session_id).await?;
        let mut session = handle.write().await;

        let added = tree::add_nodes(&mut session, params.parent_node_id.as_deref(), &params.contents)?;
        let parent_node_id = added
            .first()
            .and_then(|n| n.parent_id.clone())
            .unwrap_or_else(|| session.root_node_id.clone());

        info!(
            session_id = %session.id,
            parent_id = %parent_node_id,
            added = added.len(),
            "Thoughts added"
        );

        Ok(AddThoughtsResult {
            session_id: session.id.clone(),
            parent_node_id,
            added_nodes: added,
            total_nodes: session.total_nodes(),
        })
    }

    /// Record (or replace) a node's evaluation.
    pub async fn add_evaluation(&self, params: AddEvaluationParams) -> AppResult<AddEvaluationResult> {
        let handle = self.core.session(&params.session_id).await?;
        let mut session = handle.write().await;

        let node = evaluation::record(&mut session, &params.node_id, &params.evaluation)?;

        Ok(AddEvaluationResult {
            session_id: session.id.clone(),
            node,
            total_evaluations: session.total_evaluations(),
        })
    }

    /// Select the next node to explore.
    pub async fn search_next(&self, params: SearchNextParams) -> AppResult<SearchNextResult> {
        let override_strategy = params
            .strategy_override
            .as_deref()
            .map(|s| parse_field::<SearchStrategy>("strategy_override", s))
            .transpose()?;

        let handle = self.core.session(&params.session_id).await?;
        let mut session = handle.write().await;
        let strategy = override_strategy.unwrap_or(session.config.search_strategy);

        let frontier_size = search::frontier(&session).len();
        let next_node = search::next_node(&session, strategy).cloned();

        let guidance = match &next_node {
            Some(node) => format!(
                "Evaluate node {} (depth {}) with add_evaluation, then expand it with add_thoughts if it is promising",
                node.id, node.depth
            ),
            None => "No unevaluated nodes remain outside dead-end subtrees. Add thoughts under a promising node, or record a solution with set_solution".to_string(),
        };

        // Repeated polls that select the same node leave one entry.
        let selected = next_node.as_ref().map(|n| n.id.as_str());
        let detail = strategy.to_string();
        let repeated = session.history().last().is_some_and(|last| {
            last.action == "search_next"
                && last.node_id.as_deref() == selected
                && last.detail.as_deref() == Some(detail.as_str())
        });
        if !repeated {
            session.log("search_next", selected, Some(detail));
        }

        debug!(
            session_id = %session.id,
            strategy = %strategy,
            frontier_size,
            next = ?next_node.as_ref().map(|n| &n.id),
            "Frontier searched"
        );

        Ok(SearchNextResult {
            session_id: session.id.clone(),
            strategy,
            exhausted: next_node.is_none(),
            next_node,
            frontier_size,
            guidance,
        })
    }

    /// Retire a dead end and return the node to resume from.
    pub async fn backtrack(&self, params: BacktrackParams) -> AppResult<BacktrackResult> {
        let strategy = params
            .strategy
            .as_deref()
            .map(|s| parse_field::<BacktrackStrategy>("strategy", s))
            .transpose()?
            .unwrap_or_default();

        let handle = self.core.session(&params.session_id).await?;
        let mut session = handle.write().await;

        let node = backtracking::backtrack(&mut session, &params.dead_end_node_id, strategy)?;

        info!(
            session_id = %session.id,
            from = %params.dead_end_node_id,
            to = %node.id,
            strategy = %strategy,
            "Backtracked from dead end"
        );

        Ok(BacktrackResult {
            session_id: session.id.clone(),
            dead_end_node_id: params.dead_end_node_id,
            strategy,
            node,
        })
    }

    /// Record the session's final answer. A second call replaces the first.
    pub async fn set_solution(&self, params: SetSolutionParams) -> AppResult<SetSolutionResult> {
        if params.solution.trim().is_empty() {
            return Err(ToolError::validation("solution", "Solution cannot be empty").into());
        }

        let handle = self.core.session(&params.session_id).await?;
        let mut session = handle.write().await;

        let previous_solution = session.solution.replace(params.solution.clone());
        session.log("set_solution", None, None);
        session.touch();

        info!(
            session_id = %session.id,
            replaced = previous_solution.is_some(),
            "Solution recorded"
        );

        Ok(SetSolutionResult {
            session_id: session.id.clone(),
            solution: params.solution,
            status: session.status(),
            previous_solution,
            total_nodes: session.total_nodes(),
            total_evaluations: session.total_evaluations(),
        })
    }

    /// Full dump of one session.
    pub async fn get_session(&self, params: SessionParams) -> AppResult<GetSessionResult> {
        let handle = self.core.session(&params.session_id).await?;
        let session = handle.read().await;

        Ok(GetSessionResult {
            status: session.status(),
            session: session.clone(),
        })
    }

    /// Summaries of all sessions.
    pub async fn list_sessions(&self) -> AppResult<ListSessionsResult> {
        let handles = self.core.storage().list_sessions().await?;

        let mut sessions = Vec::with_capacity(handles.len());
        for handle in handles {
            sessions.push(handle.read().await.summary());
        }

        Ok(ListSessionsResult {
            total_sessions: sessions.len(),
            sessions,
        })
    }

    /// Ranked evaluated nodes plus the recorded solution.
    pub async fn display_results(&self, params: SessionParams) -> AppResult<DisplayResultsResult> {
        let handle = self.core.session(&params.session_id).await?;
        let session = handle.read().await;

        Ok(DisplayResultsResult {
            session_id: session.id.clone(),
            problem_statement: session.problem_statement.clone(),
            status: session.status(),
            solution: session.solution.clone(),
            total_nodes: session.total_nodes(),
            total_evaluations: session.total_evaluations(),
            ranked_solutions: ranking::rank(&session),
        })
    }
}

impl CreateSessionParams {
    /// Create params with just a problem statement
    pub fn new(problem_statement: impl Into<String>) -> Self {
        Self {
            problem_statement: problem_statement.into(),
            configuration: None,
        }
    }

    /// Set the configuration overrides
    pub fn with_configuration(mut self, configuration: ConfigurationInput) -> Self {
        self.configuration = Some(configuration);
        self
    }
}

impl AddThoughtsParams {
    /// Create params appending under the root
    pub fn new(session_id: impl Into<String>, contents: Vec<String>) -> Self {
        Self {
            session_id: session_id.into(),
            contents,
            parent_node_id: None,
        }
    }

    /// Set the parent node
    pub fn with_parent(mut self, parent_node_id: impl Into<String>) -> Self {
        self.parent_node_id = Some(parent_node_id.into());
        self
    }
}
