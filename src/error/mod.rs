use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Tool(#[from] ToolError),

    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),
}

/// Session store errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Session already exists: {session_id}")]
    DuplicateSession { session_id: String },
}

/// MCP protocol errors
#[derive(Debug, Error)]
pub enum McpError {
    #[error("Unknown tool: {tool_name}")]
    UnknownTool { tool_name: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the tree-of-thoughts engine.
///
/// Every variant maps to one machine-readable code via [`ToolError::code`].
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Validation failed: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("Node not found: {node_id}")]
    NodeNotFound { node_id: String },

    #[error("Maximum depth {max_depth} reached: children of {parent_id} would be at depth {requested_depth}")]
    DepthLimitExceeded {
        parent_id: String,
        max_depth: u32,
        requested_depth: u32,
    },

    #[error("Maximum branches {max_branches} would be exceeded: {parent_id} has {existing} children, {requested} requested")]
    BranchLimitExceeded {
        parent_id: String,
        max_branches: u32,
        existing: usize,
        requested: usize,
    },

    #[error("Cannot backtrack to the parent of root node {node_id}")]
    CannotBacktrackFromRoot { node_id: String },

    #[error("No viable alternative sibling for node {node_id}")]
    NoAlternativeAvailable { node_id: String },
}

impl ToolError {
    /// Shorthand for a validation failure on a named field.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ToolError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Machine-readable error code reported in the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            ToolError::Validation { .. } => "VALIDATION_ERROR",
            ToolError::SessionNotFound { .. } | ToolError::NodeNotFound { .. } => "NOT_FOUND",
            ToolError::DepthLimitExceeded { .. } => "DEPTH_LIMIT_EXCEEDED",
            ToolError::BranchLimitExceeded { .. } => "BRANCH_LIMIT_EXCEEDED",
            ToolError::CannotBacktrackFromRoot { .. } => "CANNOT_BACKTRACK_FROM_ROOT",
            ToolError::NoAlternativeAvailable { .. } => "NO_ALTERNATIVE_AVAILABLE",
        }
    }
}

impl AppError {
    /// Machine-readable error code reported in the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Tool(err) => err.code(),
            AppError::Storage(_) | AppError::Config { .. } | AppError::Mcp(_) => "INTERNAL_ERROR",
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for session store operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for engine operations
pub type ToolResult<T> = Result<T, ToolError>;

/// Result type alias for MCP operations
pub type McpResult<T> = Result<T, McpError>;
