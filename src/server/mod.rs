//! Server module for MCP protocol handling.
//!
//! This module provides:
//! - MCP server implementation over stdio
//! - The `tree_of_thoughts` tool handler and action routing
//! - Shared application state

mod handlers;
mod mcp;

pub use handlers::*;
pub use mcp::*;

use std::sync::Arc;

use crate::config::Config;
use crate::modes::TreeOfThoughtsMode;
use crate::storage::InMemoryStorage;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// In-process session store.
    pub storage: InMemoryStorage,
    /// Tree-of-thoughts mode handler.
    pub tot_mode: TreeOfThoughtsMode,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Config, storage: InMemoryStorage) -> Self {
        tracing::info!(
            search_strategy = %config.tree.search_strategy,
            max_depth = config.tree.max_depth,
            max_branches = config.tree.max_branches_per_node,
            "AppState initializing with tree defaults"
        );

        let tot_mode = TreeOfThoughtsMode::new(storage.clone(), &config);

        Self {
            config,
            storage,
            tot_mode,
        }
    }
}

/// Shared application state handle
pub type SharedState = Arc<AppState>;
