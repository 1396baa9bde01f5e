use std::env;

use crate::error::AppError;
use crate::storage::{EvaluationMethod, GenerationStrategy, SearchStrategy, SessionConfig};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Log level and output format.
    pub logging: LoggingConfig,
    /// Defaults for new sessions.
    pub tree: TreeDefaults,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `mcp_tree_of_thoughts=debug`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    /// Human-readable lines.
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Session configuration used when `create_session` omits a field
#[derive(Debug, Clone, PartialEq)]
pub struct TreeDefaults {
    /// `TOT_SEARCH_STRATEGY`
    pub search_strategy: SearchStrategy,
    /// `TOT_GENERATION_STRATEGY`
    pub generation_strategy: GenerationStrategy,
    /// `TOT_EVALUATION_METHOD`
    pub evaluation_method: EvaluationMethod,
    /// `TOT_MAX_DEPTH`
    pub max_depth: u32,
    /// `TOT_MAX_BRANCHES`
    pub max_branches_per_node: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let defaults = TreeDefaults::default();
        let tree = TreeDefaults {
            search_strategy: parse_env("TOT_SEARCH_STRATEGY").unwrap_or(defaults.search_strategy),
            generation_strategy: parse_env("TOT_GENERATION_STRATEGY")
                .unwrap_or(defaults.generation_strategy),
            evaluation_method: parse_env("TOT_EVALUATION_METHOD")
                .unwrap_or(defaults.evaluation_method),
            max_depth: parse_env("TOT_MAX_DEPTH").unwrap_or(defaults.max_depth),
            max_branches_per_node: parse_env("TOT_MAX_BRANCHES")
                .unwrap_or(defaults.max_branches_per_node),
        };

        if tree.max_depth == 0 {
            return Err(AppError::Config {
                message: "TOT_MAX_DEPTH must be a positive integer".to_string(),
            });
        }
        if tree.max_branches_per_node == 0 {
            return Err(AppError::Config {
                message: "TOT_MAX_BRANCHES must be a positive integer".to_string(),
            });
        }

        Ok(Config { logging, tree })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Default for TreeDefaults {
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

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            tree: TreeDefaults::default(),
        }
    }
}

impl From<&TreeDefaults> for SessionConfig {
    fn from(defaults: &TreeDefaults) -> Self {
        SessionConfig {
            search_strategy: defaults.search_strategy,
            generation_strategy: defaults.generation_strategy,
            evaluation_method: defaults.evaluation_method,
            max_depth: defaults.max_depth,
            max_branches_per_node: defaults.max_branches_per_node,
        }
    }
}
