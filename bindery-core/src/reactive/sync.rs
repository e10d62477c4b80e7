//! DOM Synchronizer
//!
//! Projects a node's current state onto its bound elements. There are two
//! modes:
//!
//! - Value mode writes the node value into each element through the channel
//!   inferred for that element.
//! - Attribute mode sets every pair of the node's attribute map on each
//!   element. Attributes missing from the map are left untouched.
//!
//! Both modes scan every bound element in insertion order with no diffing
//! and no early exit. A failed write is logged and the scan moves on.

use indexmap::IndexMap;
use serde_json::Value;

use crate::dom::{Channel, Document, ElementId};

/// Write `value` into every element. Returns how many writes succeeded.
pub(crate) fn push_value(doc: &dyn Document, bound: &[ElementId], value: &Value) -> usize {
    let mut written = 0;
    for &element in bound {
        let Some(channel) = Channel::of(doc, element) else {
            tracing::warn!(?element, "skipping value push to unknown element");
            continue;
        };
        match channel.write(doc, element, value) {
            Ok(()) => {
                tracing::trace!(?element, ?channel, "pushed value");
                written += 1;
            }
            Err(error) => tracing::warn!(?element, ?channel, %error, "value push failed"),
        }
    }
    written
}

/// Apply every attribute pair to every element. Returns how many
/// attribute writes succeeded.
pub(crate) fn push_attributes(
    doc: &dyn Document,
    bound: &[ElementId],
    attributes: &IndexMap<String, String>,
) -> usize {
    let mut written = 0;
    for &element in bound {
        for (name, value) in attributes {
            match doc.set_attribute(element, name, value) {
                Ok(()) => {
                    tracing::trace!(?element, name = %name, "pushed attribute");
                    written += 1;
                }
                Err(error) => tracing::warn!(?element, name = %name, %error, "attribute push failed"),
            }
        }
    }
    written
}
