//! Selector Binder
//!
//! A binder resolves a selector against the node's document and binds the
//! matches. It supports two call shapes that share one resolution path:
//!
//! ```rust,ignore
//! // Path form: segments are joined by the tree's `PathJoin` rule.
//! todo.select().path("ul").path("li").bind()?;   // "ul li"
//!
//! // Call form: a literal selector.
//! todo.select().call("ul > li")?;
//! todo.bind("ul > li")?;                          // shorthand
//! ```
//!
//! Segments accumulated before [`Binder::call`] prefix the literal, so
//! `select().path("form").call("input[type=text]")` resolves
//! `form input[type=text]`.

use smallvec::SmallVec;

use super::node::ReactiveNode;
use crate::config::PathJoin;
use crate::error::BindResult;

/// Fluent selector builder closed over a node.
#[derive(Debug, Clone)]
pub struct Binder {
    node: ReactiveNode,
    join: PathJoin,
    segments: SmallVec<[String; 4]>,
}

impl Binder {
    pub(crate) fn new(node: ReactiveNode, join: PathJoin) -> Self {
        Self {
            node,
            join,
            segments: SmallVec::new(),
        }
    }

    /// Append a path segment.
    pub fn path(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Override the join rule for this binder.
    pub fn join(mut self, join: PathJoin) -> Self {
        self.join = join;
        self
    }

    /// The selector the accumulated segments resolve to.
    pub fn selector(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(self.join.separator())
    }

    /// Resolve the accumulated path and bind its matches.
    ///
    /// Returns the owning node so configuration calls can be chained.
    pub fn bind(self) -> BindResult<ReactiveNode> {
        let selector = self.selector();
        self.node.bind_resolved(&selector)?;
        Ok(self.node)
    }

    /// Resolve a literal selector, prefixed by any accumulated path.
    pub fn call(self, selector: &str) -> BindResult<ReactiveNode> {
        self.path(selector).bind()
    }
}
