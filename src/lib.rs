//! # MCP Tree-of-Thoughts Server
//!
//! A Model Context Protocol (MCP) server that manages Tree-of-Thoughts problem
//! solving sessions. The calling model supplies thoughts and evaluations; the
//! server keeps the tree, enforces its limits and decides what to explore next.
//!
//! ## Features
//!
//! - **Sessions**: Independent trees keyed by generated identifiers
//! - **Thoughts**: Child nodes appended under any node, within depth and branch limits
//! - **Evaluations**: Value, confidence and viability recorded per node
//! - **Search**: Breadth-first or depth-first selection over unevaluated nodes
//! - **Backtracking**: Dead-end retirement with parent, best-alternative or root recovery
//! - **Results**: Evaluated nodes ranked with their full path from the root
//!
//! ## Architecture
//!
//! ```text
//! MCP Client → MCP Server (stdio, JSON-RPC) → tree_of_thoughts handler
//!                                                   ↓
//!                                      In-memory session store
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mcp_tree_of_thoughts::{Config, AppState, McpServer};
//! use mcp_tree_of_thoughts::storage::InMemoryStorage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let state = Arc::new(AppState::new(config, InMemoryStorage::new()));
//!     let server = McpServer::new(state);
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Configuration management for the MCP server.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Tree-of-thoughts engine: tree, evaluation, search, backtracking and ranking.
pub mod modes;
/// MCP server implementation and request handling.
pub mod server;
/// Session data model and in-memory session store.
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use server::{AppState, McpServer, SharedState};
