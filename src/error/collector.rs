//! # Error Collector
//!
//! Path-qualified error accumulation. Paths are dotted and indexed
//! (`address.street`, `tags.0`, `scores.alice`). A second message at an
//! existing path promotes the entry from a scalar to an array; rendered
//! nested trees merge under the parent path with the same rule.

use indexmap::IndexMap;
use std::fmt;

/// One entry in the tree: a single message or an array of messages.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorEntry {
    One(serde_json::Value),
    Many(Vec<serde_json::Value>),
}

impl ErrorEntry {
    /// All messages at this path, in arrival order.
    pub fn messages(&self) -> Vec<&serde_json::Value> {
        match self {
            ErrorEntry::One(msg) => vec![msg],
            ErrorEntry::Many(msgs) => msgs.iter().collect(),
        }
    }
}

/// Ordered path-to-message mapping, rendered as a JSON object in
/// first-insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorTree {
    entries: IndexMap<String, ErrorEntry>,
}

impl ErrorTree {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, path: &str) -> Option<&ErrorEntry> {
        self.entries.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Appends one message at `path`, promoting to an array on collision.
    pub fn push(&mut self, path: &str, message: serde_json::Value) {
        match self.entries.get_mut(path) {
            None => {
                self.entries.insert(path.to_string(), ErrorEntry::One(message));
            }
            Some(entry) => {
                let mut messages = match std::mem::replace(entry, ErrorEntry::Many(Vec::new())) {
                    ErrorEntry::One(existing) => vec![existing],
                    ErrorEntry::Many(existing) => existing,
                };
                messages.push(message);
                *entry = ErrorEntry::Many(messages);
            }
        }
    }

    /// Merges a rendered entry value: arrays splice message-by-message,
    /// anything else appends as one message.
    fn merge(&mut self, path: &str, rendered: serde_json::Value) {
        match rendered {
            serde_json::Value::Array(items) => {
                for item in items {
                    self.push(path, item);
                }
            }
            other => self.push(path, other),
        }
    }

    /// Deterministic JSON rendering in first-insertion order.
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        for (path, entry) in &self.entries {
            let rendered = match entry {
                ErrorEntry::One(msg) => msg.clone(),
                ErrorEntry::Many(msgs) => serde_json::Value::Array(msgs.clone()),
            };
            object.insert(path.clone(), rendered);
        }
        serde_json::Value::Object(object)
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(&self.to_json()).unwrap_or_else(|_| "{}".to_string())
    }
}

impl fmt::Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json_string())
    }
}

/// Lazily-allocated collector wrapped around an [`ErrorTree`].
///
/// The tree is only allocated on the first error, so the success path pays
/// one pointer-sized check.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    tree: Option<ErrorTree>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        ErrorCollector { tree: None }
    }

    /// O(1); no allocation has happened until the first error.
    pub fn has_errors(&self) -> bool {
        self.tree.is_some()
    }

    fn tree_mut(&mut self) -> &mut ErrorTree {
        self.tree.get_or_insert_with(ErrorTree::default)
    }

    /// Records one message at `path`.
    pub fn add_error(&mut self, path: &str, message: impl Into<String>) {
        self.tree_mut()
            .push(path, serde_json::Value::String(message.into()));
    }

    /// Merges a rendered nested error tree under `path`.
    ///
    /// `payload` must be the JSON rendering of another tree; each of its
    /// keys lands at `path + "." + key`. A payload that does not parse as a
    /// JSON object degrades to a single generic error at `path`.
    pub fn add_suberror(&mut self, path: &str, payload: &str) {
        match serde_json::from_str::<serde_json::Value>(payload) {
            Ok(serde_json::Value::Object(entries)) => {
                for (key, rendered) in entries {
                    let nested_path = format!("{}.{}", path, key);
                    self.tree_mut().merge(&nested_path, rendered);
                }
            }
            _ => self.add_error(path, "Invalid suberror JSON"),
        }
    }

    /// Consumes the collector; `None` when no error was recorded.
    pub fn into_tree(self) -> Option<ErrorTree> {
        self.tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_allocation_until_first_error() {
        let collector = ErrorCollector::new();
        assert!(!collector.has_errors());
        assert!(collector.into_tree().is_none());
    }

    #[test]
    fn test_single_error_stays_scalar() {
        let mut collector = ErrorCollector::new();
        collector.add_error("age", "Expected type int, got str");
        let tree = collector.into_tree().unwrap();
        assert_eq!(
            tree.to_json(),
            serde_json::json!({"age": "Expected type int, got str"})
        );
    }

    #[test]
    fn test_second_error_promotes_to_array() {
        let mut collector = ErrorCollector::new();
        collector.add_error("age", "first");
        collector.add_error("age", "second");
        collector.add_error("age", "third");
        let tree = collector.into_tree().unwrap();
        assert_eq!(
            tree.to_json(),
            serde_json::json!({"age": ["first", "second", "third"]})
        );
    }

    #[test]
    fn test_paths_keep_first_insertion_order() {
        let mut collector = ErrorCollector::new();
        collector.add_error("zebra", "a");
        collector.add_error("apple", "b");
        collector.add_error("zebra", "c");
        let tree = collector.into_tree().unwrap();
        let paths: Vec<_> = tree.paths().collect();
        assert_eq!(paths, vec!["zebra", "apple"]);
    }

    #[test]
    fn test_suberror_merges_under_parent_path() {
        let mut collector = ErrorCollector::new();
        collector.add_suberror(
            "address",
            r#"{"street": "Missing required field", "zip": ["a", "b"]}"#,
        );
        let tree = collector.into_tree().unwrap();
        assert_eq!(
            tree.to_json(),
            serde_json::json!({
                "address.street": "Missing required field",
                "address.zip": ["a", "b"]
            })
        );
    }

    #[test]
    fn test_suberror_collides_with_existing_path() {
        let mut collector = ErrorCollector::new();
        collector.add_error("address.street", "existing");
        collector.add_suberror("address", r#"{"street": "nested"}"#);
        let tree = collector.into_tree().unwrap();
        assert_eq!(
            tree.to_json(),
            serde_json::json!({"address.street": ["existing", "nested"]})
        );
    }

    #[test]
    fn test_malformed_suberror_degrades_to_generic_error() {
        let mut collector = ErrorCollector::new();
        collector.add_suberror("address", "not json at all");
        let tree = collector.into_tree().unwrap();
        assert_eq!(
            tree.to_json(),
            serde_json::json!({"address": "Invalid suberror JSON"})
        );

        let mut collector = ErrorCollector::new();
        collector.add_suberror("address", r#"["an", "array"]"#);
        let tree = collector.into_tree().unwrap();
        assert_eq!(
            tree.to_json(),
            serde_json::json!({"address": "Invalid suberror JSON"})
        );
    }
}
