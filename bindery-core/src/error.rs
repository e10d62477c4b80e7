//! Error types shared by the document and reactive layers.

use thiserror::Error;

use crate::dom::ElementId;

/// Failures reported by a host [`Document`](crate::dom::Document).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// The selector could not be parsed.
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// The element handle does not belong to this document.
    #[error("unknown element {0:?}")]
    UnknownElement(ElementId),

    /// Appending `child` under `parent` would make an element its own ancestor.
    #[error("cannot append {child:?} under {parent:?}: would create a cycle")]
    HierarchyCycle { parent: ElementId, child: ElementId },
}

impl DomError {
    pub(crate) fn invalid_selector(selector: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by binding and configuration operations.
#[derive(Debug, Error)]
pub enum BindError {
    #[error(transparent)]
    Dom(#[from] DomError),

    #[error("invalid tree configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result alias for binding operations.
pub type BindResult<T> = Result<T, BindError>;
