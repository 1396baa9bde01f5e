//! Tree-of-Thoughts search engine.
//!
//! The engine is split by concern:
//! - [`tree`]: node creation and lineage queries
//! - [`evaluation`]: validated value/confidence/viability records
//! - [`search`]: frontier selection (breadth-first or depth-first)
//! - [`backtracking`]: dead-end retirement and repositioning
//! - [`ranking`]: solution ranking with path context
//!
//! [`TreeOfThoughtsMode`] ties them to the session store and is the entry
//! point used by the server. It shares infrastructure via [`ModeCore`].

mod backtracking;
mod core;
mod evaluation;
mod ranking;
mod search;
mod tot;
mod tree;

pub use backtracking::*;
pub use core::*;
pub use evaluation::*;
pub use ranking::*;
pub use search::*;
pub use tot::*;
pub use tree::*;

use tracing::warn;

/// Serialize a value to JSON for logging, with warning on failure.
pub(crate) fn serialize_for_log<T: serde::Serialize>(
    value: &T,
    context: &str,
) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        warn!(
            error = %e,
            context = %context,
            "Failed to serialize value for log"
        );
        serde_json::json!({
            "serialization_error": e.to_string(),
            "context": context
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[test]
    fn test_serialize_for_log() {
        #[derive(Serialize)]
        struct Sample {
            value: u8,
        }
        let json = serialize_for_log(&Sample { value: 3 }, "sample");
        assert_eq!(json["value"], 3);
    }

    #[test]
    fn test_serialize_for_log_reports_failure() {
        use std::collections::HashMap;
        // Non-string map keys cannot become JSON object keys.
        let mut map = HashMap::new();
        map.insert(vec![1u8], 1u8);
        let json = serialize_for_log(&map, "bad_map");
        assert_eq!(json["context"], "bad_map");
        assert!(json["serialization_error"].is_string());
    }
}
