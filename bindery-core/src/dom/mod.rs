//! Host Document
//!
//! This module defines the boundary between reactive nodes and the document
//! they are bound to. Everything the binding layer needs from a DOM goes
//! through the [`Document`] trait:
//!
//! - Selector queries against the live element tree (full CSS selector
//!   syntax, resolved by the `selectors` engine in [`MemoryDocument`])
//! - Reads and writes of the four sync channels (form value, checked flag,
//!   selected index, inner markup)
//! - Generic attribute writes
//! - Event listener registration
//!
//! [`MemoryDocument`] is an in-process implementation used natively and in
//! tests. A browser host would implement the same trait over its own element
//! handles.
//!
//! # Event Semantics
//!
//! Programmatic writes through the trait never fire listeners. Only events
//! delivered by the host (a real user, or [`MemoryDocument::dispatch`]) do.
//! This mirrors browser behaviour and is what keeps node -> DOM pushes from
//! looping back into the node.

mod channel;
mod memory;
mod selector;

pub use channel::Channel;
pub use memory::MemoryDocument;

use std::fmt;
use std::sync::Arc;

use crate::error::DomError;

/// Opaque handle to an element owned by a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    /// Get the raw handle value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ElementId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// DOM events that signal a user-driven change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Fired on every edit of a text field or editable content.
    Input,
    /// Fired when a selection or checked state is committed.
    Change,
}

impl EventKind {
    /// Every event kind, in registration order.
    pub const ALL: [EventKind; 2] = [EventKind::Input, EventKind::Change];

    /// The DOM event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Input => "input",
            EventKind::Change => "change",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callback invoked with the element an event fired on.
pub type Listener = Arc<dyn Fn(ElementId) + Send + Sync>;

/// The capabilities a host document provides to the binding layer.
///
/// Read methods return `None` for elements the document does not know.
/// Write methods report unknown elements as [`DomError::UnknownElement`].
pub trait Document: Send + Sync {
    /// All elements matching `selector`, in document order, without duplicates.
    fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementId>, DomError>;

    /// Lowercase tag name of the element.
    fn tag_name(&self, element: ElementId) -> Option<String>;

    /// Current value of an attribute.
    fn attribute(&self, element: ElementId, name: &str) -> Option<String>;

    /// Set an attribute, replacing any previous value.
    fn set_attribute(&self, element: ElementId, name: &str, value: &str) -> Result<(), DomError>;

    /// The form control value field (`input`, `textarea`).
    fn form_value(&self, element: ElementId) -> Option<String>;

    fn set_form_value(&self, element: ElementId, value: &str) -> Result<(), DomError>;

    /// The checked flag (`checkbox`, `radio`).
    fn checked(&self, element: ElementId) -> Option<bool>;

    fn set_checked(&self, element: ElementId, checked: bool) -> Result<(), DomError>;

    /// The selected option index of a `select`; `-1` means no selection.
    fn selected_index(&self, element: ElementId) -> Option<i64>;

    fn set_selected_index(&self, element: ElementId, index: i64) -> Result<(), DomError>;

    /// The element's inner markup.
    fn inner_html(&self, element: ElementId) -> Option<String>;

    fn set_inner_html(&self, element: ElementId, html: &str) -> Result<(), DomError>;

    /// Register a listener for `event` on `element`.
    ///
    /// Listeners persist for the element's lifetime; there is no removal.
    fn add_event_listener(
        &self,
        element: ElementId,
        event: EventKind,
        listener: Listener,
    ) -> Result<(), DomError>;
}
