//! Tree Configuration
//!
//! Settings that shape how a [`NodeTree`](crate::reactive::NodeTree) resolves
//! binders. Every field has a default, so an empty JSON object is a valid
//! configuration.

use serde::{Deserialize, Serialize};

use crate::error::BindResult;

/// How dot-chain binder segments are joined into one selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathJoin {
    /// `body` + `div` resolves as `body div`.
    #[default]
    Descendant,
    /// `body` + `div` resolves as `body > div`.
    Child,
}

impl PathJoin {
    /// The separator placed between two segments.
    pub fn separator(self) -> &'static str {
        match self {
            PathJoin::Descendant => " ",
            PathJoin::Child => " > ",
        }
    }
}

/// Configuration for a node tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Join rule for dot-chain selectors.
    pub path_join: PathJoin,
}

impl TreeConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> BindResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builder-style setter for the path join rule.
    pub fn with_path_join(mut self, path_join: PathJoin) -> Self {
        self.path_join = path_join;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = TreeConfig::from_json("{}").unwrap();
        assert_eq!(config, TreeConfig::default());
        assert_eq!(config.path_join, PathJoin::Descendant);
    }

    #[test]
    fn parses_child_join() {
        let config = TreeConfig::from_json(r#"{"path_join": "child"}"#).unwrap();
        assert_eq!(config.path_join, PathJoin::Child);
        assert_eq!(config.path_join.separator(), " > ");
    }

    #[test]
    fn rejects_unknown_join() {
        let err = TreeConfig::from_json(r#"{"path_join": "sibling"}"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid tree configuration"));
    }
}
