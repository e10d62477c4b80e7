//! Bindery Core
//!
//! This crate provides a minimal reactive binding layer between named state
//! and document elements. It implements:
//!
//! - A lazily populated tree of reactive nodes
//! - Node -> DOM propagation of values and attributes
//! - DOM -> node propagation of user edits
//! - A host document trait, with an in-memory implementation
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Node tree, reactive nodes, binders, and the synchronizer
//! - `dom`: Host document boundary, channel inference, and selectors
//! - `config`: Tree configuration
//! - `error`: Error types
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use bindery_core::dom::{Document, MemoryDocument};
//! use bindery_core::reactive::NodeTree;
//!
//! let doc = Arc::new(MemoryDocument::new());
//! let list = doc.append(doc.root(), "ul").unwrap();
//! let items: Vec<_> = (0..3).map(|_| doc.append(list, "li").unwrap()).collect();
//!
//! let tree = NodeTree::new(doc.clone());
//! tree.node("item").bind("ul > li").unwrap().set_value("X");
//!
//! for item in items {
//!     assert_eq!(doc.inner_html(item).as_deref(), Some("X"));
//! }
//! ```

pub mod config;
pub mod dom;
pub mod error;
pub mod reactive;

pub use config::{PathJoin, TreeConfig};
pub use error::{BindError, BindResult, DomError};
pub use reactive::{Binder, NodeTree, ReactiveNode};
