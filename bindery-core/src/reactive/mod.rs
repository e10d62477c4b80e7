//! Reactive Nodes
//!
//! This module implements the reactive side of the binding layer: a tree of
//! named nodes, each mirroring its state onto the DOM elements bound to it.
//!
//! # Concepts
//!
//! ## Node Tree
//!
//! A [`NodeTree`] maps names to nodes. Asking for a name that has never been
//! seen creates an empty node; asking again returns the same node.
//!
//! ## Reactive Nodes
//!
//! A [`ReactiveNode`] holds a value and an attribute map. Assigning either
//! one synchronously writes it into every bound element before the call
//! returns. There is no batching and no dirty state.
//!
//! ## Binders
//!
//! A [`Binder`] resolves a selector against the document and binds the
//! matches to its node. Each newly bound element gets one listener that
//! feeds user edits back into the node value.
//!
//! # Implementation Notes
//!
//! The element property used for each direction of sync comes from
//! [`Channel`](crate::dom::Channel), so push and pull always agree. Locks are
//! released before any call into the document, which is what lets a
//! DOM-driven update re-enter the node and push to every element again.

mod binder;
mod node;
mod subscriber;
mod sync;
mod tree;

pub use binder::Binder;
pub use node::{NodeId, ReactiveNode};
pub use subscriber::{Subscriber, SubscriberId};
pub use tree::NodeTree;
