//! Node Tree
//!
//! The tree is the root context that owns reactive nodes by name. Nodes are
//! created lazily: the first [`NodeTree::node`] call for a name builds an
//! empty node, and every later call returns that same node.
//!
//! A tree is constructed explicitly over a document and torn down with
//! [`NodeTree::clear`] or by dropping it. Listeners left behind on elements
//! hold weak node references and go quiet once their node is gone.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::node::ReactiveNode;
use crate::config::TreeConfig;
use crate::dom::Document;

/// Lazily populated mapping from names to reactive nodes.
pub struct NodeTree {
    document: Arc<dyn Document>,
    config: TreeConfig,
    nodes: RwLock<IndexMap<String, ReactiveNode>>,
}

impl NodeTree {
    /// Create an empty tree over `document` with the default configuration.
    pub fn new(document: Arc<dyn Document>) -> Self {
        Self::with_config(document, TreeConfig::default())
    }

    pub fn with_config(document: Arc<dyn Document>, config: TreeConfig) -> Self {
        Self {
            document,
            config,
            nodes: RwLock::new(IndexMap::new()),
        }
    }

    pub fn document(&self) -> &Arc<dyn Document> {
        &self.document
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Get the node stored under `name`, creating it on first access.
    pub fn node(&self, name: &str) -> ReactiveNode {
        if let Some(node) = self.nodes.read().get(name) {
            return node.clone();
        }

        let mut nodes = self.nodes.write();
        nodes
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(name, "creating node");
                ReactiveNode::with_path_join(name, Arc::clone(&self.document), self.config.path_join)
            })
            .clone()
    }

    /// Get the node stored under `name` without creating it.
    pub fn get(&self, name: &str) -> Option<ReactiveNode> {
        self.nodes.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    /// Node names in creation order.
    pub fn names(&self) -> Vec<String> {
        self.nodes.read().keys().cloned().collect()
    }

    /// Drop every node.
    ///
    /// Handles held elsewhere keep their node alive and bound.
    pub fn clear(&self) {
        let dropped = {
            let mut nodes = self.nodes.write();
            std::mem::take(&mut *nodes)
        };
        tracing::debug!(nodes = dropped.len(), "cleared node tree");
    }
}

impl fmt::Debug for NodeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeTree")
            .field("config", &self.config)
            .field("nodes", &self.names())
            .finish()
    }
}
