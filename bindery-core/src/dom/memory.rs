//! In-Memory Document
//!
//! A complete [`Document`] backed by an element arena. It is what the binding
//! layer runs against outside a browser, and what the tests drive.
//!
//! # Model
//!
//! - A document starts with a single `html` root element.
//! - Elements are created detached and become queryable once appended below
//!   the root. Queries return elements in document (pre-order) order.
//! - Markup is stored verbatim and not parsed. An element's inner markup reads
//!   as its stored markup followed by its children serialized as HTML.
//!   Setting inner markup to anything else detaches the children, as
//!   replacing `innerHTML` would. Setting it to what it already reads is a
//!   no-op, so a read-then-write echo leaves the tree untouched.
//! - A `select` element's options are its `option` descendants. Until a
//!   selection is assigned, a `select` with options reports index `0`, like a
//!   browser's single-select. Indices outside `0..options` read as `-1`.
//! - Selectors are matched by the `selectors` engine over borrowed element
//!   views. `:checked` matches checkboxes and radios whose checked flag is set.
//! - Listeners fire only through [`MemoryDocument::dispatch`].
//!
//! # Locking
//!
//! The arena and the listener table sit behind separate `RwLock`s. Neither
//! lock is held while a listener runs, so listeners may call back into the
//! document.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use parking_lot::RwLock;
use smallvec::SmallVec;

use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::matching::{ElementSelectorFlags, MatchingContext};
use selectors::OpaqueElement;

use super::channel::Channel;
use super::selector::{
    BinderySelectors, CssIdent, CssValue, PseudoClass, PseudoElement, SelectorGroup,
};
use super::{Document, ElementId, EventKind, Listener};
use crate::error::DomError;

/// Counter for generating element handles.
///
/// Handles are unique across documents so a handle from one document is
/// never mistaken for an element of another.
static ELEMENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_element_id() -> ElementId {
    ElementId::from(ELEMENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
}

#[derive(Debug, Clone)]
struct ElementData {
    tag: String,
    attributes: IndexMap<String, String>,
    inner_html: String,
    form_value: String,
    checked: bool,
    selected_index: Option<i64>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

impl ElementData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: IndexMap::new(),
            inner_html: String::new(),
            form_value: String::new(),
            checked: false,
            selected_index: None,
            parent: None,
            children: Vec::new(),
        }
    }
}

struct Arena {
    root: ElementId,
    elements: HashMap<ElementId, ElementData>,
}

impl Arena {
    fn get(&self, element: ElementId) -> Result<&ElementData, DomError> {
        self.elements
            .get(&element)
            .ok_or(DomError::UnknownElement(element))
    }

    fn get_mut(&mut self, element: ElementId) -> Result<&mut ElementData, DomError> {
        self.elements
            .get_mut(&element)
            .ok_or(DomError::UnknownElement(element))
    }

    /// Whether `ancestor` is `element` or one of its ancestors.
    fn is_ancestor_or_self(&self, ancestor: ElementId, element: ElementId) -> bool {
        let mut current = Some(element);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.elements.get(&id).and_then(|data| data.parent);
        }
        false
    }

    fn detach(&mut self, element: ElementId) {
        let parent = self.elements.get_mut(&element).and_then(|data| data.parent.take());
        if let Some(parent) = parent.and_then(|p| self.elements.get_mut(&p)) {
            parent.children.retain(|child| *child != element);
        }
    }

    /// Pre-order walk from `start`, `start` included.
    fn walk(&self, start: ElementId) -> Vec<ElementId> {
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if let Some(data) = self.elements.get(&id) {
                order.push(id);
                stack.extend(data.children.iter().rev().copied());
            }
        }
        order
    }

    fn element(&self, id: ElementId) -> Option<ElementRef<'_>> {
        self.elements.get(&id).map(|data| ElementRef {
            arena: self,
            id,
            data,
        })
    }

    /// Stored markup followed by the serialized children.
    fn content(&self, data: &ElementData) -> String {
        let mut out = data.inner_html.clone();
        for child in &data.children {
            self.serialize(*child, &mut out);
        }
        out
    }

    fn serialize(&self, element: ElementId, out: &mut String) {
        let Some(data) = self.elements.get(&element) else {
            return;
        };
        out.push('<');
        out.push_str(&data.tag);
        for (name, value) in &data.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&value.replace('&', "&amp;").replace('"', "&quot;"));
            out.push('"');
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&data.tag.as_str()) {
            return;
        }
        out.push_str(&self.content(data));
        out.push_str("</");
        out.push_str(&data.tag);
        out.push('>');
    }

    fn option_count(&self, select: ElementId) -> usize {
        self.walk(select)
            .into_iter()
            .skip(1)
            .filter(|id| self.elements.get(id).map(|d| d.tag == "option").unwrap_or(false))
            .count()
    }
}

/// Elements serialized without content or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Form controls that `:disabled` and `:enabled` apply to.
const FORM_CONTROLS: &[&str] = &[
    "button", "fieldset", "input", "optgroup", "option", "select", "textarea",
];

/// A borrowed view of one arena element, as the selector engine sees it.
#[derive(Clone, Copy)]
struct ElementRef<'a> {
    arena: &'a Arena,
    id: ElementId,
    data: &'a ElementData,
}

impl<'a> ElementRef<'a> {
    fn sibling(&self, offset: isize) -> Option<Self> {
        let parent = self.arena.elements.get(&self.data.parent?)?;
        let at = parent.children.iter().position(|child| *child == self.id)?;
        let id = *parent.children.get(at.checked_add_signed(offset)?)?;
        self.arena.element(id)
    }

    fn is_form_control(&self) -> bool {
        FORM_CONTROLS.contains(&self.data.tag.as_str())
    }
}

impl fmt::Debug for ElementRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementRef")
            .field("id", &self.id)
            .field("tag", &self.data.tag)
            .finish()
    }
}

impl<'a> selectors::Element for ElementRef<'a> {
    type Impl = BinderySelectors;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self.data)
    }

    fn parent_element(&self) -> Option<Self> {
        self.arena.element(self.data.parent?)
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.sibling(-1)
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.sibling(1)
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, name: &CssIdent) -> bool {
        self.data.tag == name.as_str()
    }

    fn has_namespace(&self, namespace: &CssIdent) -> bool {
        namespace.as_str().is_empty()
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.data.tag == other.data.tag
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&CssIdent>,
        local_name: &CssIdent,
        operation: &AttrSelectorOperation<&CssValue>,
    ) -> bool {
        if let NamespaceConstraint::Specific(url) = ns {
            if !url.as_str().is_empty() {
                return false;
            }
        }
        self.data
            .attributes
            .get(local_name.as_str())
            .map_or(false, |value| operation.eval_str(value))
    }

    fn match_non_ts_pseudo_class<F>(
        &self,
        pc: &PseudoClass,
        _context: &mut MatchingContext<BinderySelectors>,
        _flags_setter: &mut F,
    ) -> bool
    where
        F: FnMut(&Self, ElementSelectorFlags),
    {
        let disabled = self.data.attributes.contains_key("disabled");
        match pc {
            PseudoClass::Checked => {
                let input_type = self.data.attributes.get("type").map(String::as_str);
                self.data.checked
                    && Channel::infer(&self.data.tag, input_type) == Channel::Checked
            }
            PseudoClass::Disabled => self.is_form_control() && disabled,
            PseudoClass::Enabled => self.is_form_control() && !disabled,
        }
    }

    fn match_pseudo_element(
        &self,
        pe: &PseudoElement,
        _context: &mut MatchingContext<BinderySelectors>,
    ) -> bool {
        match *pe {}
    }

    fn is_link(&self) -> bool {
        matches!(self.data.tag.as_str(), "a" | "area" | "link")
            && self.data.attributes.contains_key("href")
    }

    fn is_html_slot_element(&self) -> bool {
        false
    }

    fn has_id(&self, id: &CssIdent, case_sensitivity: CaseSensitivity) -> bool {
        self.data
            .attributes
            .get("id")
            .map_or(false, |value| case_sensitivity.eq(id.as_str().as_bytes(), value.as_bytes()))
    }

    fn has_class(&self, name: &CssIdent, case_sensitivity: CaseSensitivity) -> bool {
        self.data.attributes.get("class").map_or(false, |classes| {
            classes
                .split_ascii_whitespace()
                .any(|class| case_sensitivity.eq(name.as_str().as_bytes(), class.as_bytes()))
        })
    }

    fn is_part(&self, _name: &CssIdent) -> bool {
        false
    }

    fn exported_part(&self, _name: &CssIdent) -> Option<CssIdent> {
        None
    }

    fn imported_part(&self, _name: &CssIdent) -> Option<CssIdent> {
        None
    }

    fn is_empty(&self) -> bool {
        self.data.children.is_empty() && self.data.inner_html.is_empty()
    }

    fn is_root(&self) -> bool {
        self.id == self.arena.root
    }
}

type ListenerList = SmallVec<[(EventKind, Listener); 2]>;

/// An element tree held in process memory.
pub struct MemoryDocument {
    arena: RwLock<Arena>,
    listeners: RwLock<HashMap<ElementId, ListenerList>>,
}

impl MemoryDocument {
    /// Create a document containing only its `html` root.
    pub fn new() -> Self {
        let root = next_element_id();
        let mut elements = HashMap::new();
        elements.insert(root, ElementData::new("html"));
        Self {
            arena: RwLock::new(Arena { root, elements }),
            listeners: RwLock::new(HashMap::new()),
        }
    }

    /// The document's root element.
    pub fn root(&self) -> ElementId {
        self.arena.read().root
    }

    /// Create a detached element.
    pub fn create_element(&self, tag: &str) -> ElementId {
        let id = next_element_id();
        self.arena.write().elements.insert(id, ElementData::new(tag));
        id
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&self, parent: ElementId, child: ElementId) -> Result<(), DomError> {
        let mut arena = self.arena.write();
        arena.get(parent)?;
        arena.get(child)?;
        if arena.is_ancestor_or_self(child, parent) {
            return Err(DomError::HierarchyCycle { parent, child });
        }
        arena.detach(child);
        arena.get_mut(child)?.parent = Some(parent);
        arena.get_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Create an element and append it to `parent`.
    pub fn append(&self, parent: ElementId, tag: &str) -> Result<ElementId, DomError> {
        let child = self.create_element(tag);
        self.append_child(parent, child)?;
        Ok(child)
    }

    /// Create an element with attributes and append it to `parent`.
    pub fn append_with(
        &self,
        parent: ElementId,
        tag: &str,
        attributes: &[(&str, &str)],
    ) -> Result<ElementId, DomError> {
        let child = self.append(parent, tag)?;
        for (name, value) in attributes {
            self.set_attribute(child, name, value)?;
        }
        Ok(child)
    }

    /// Detach `element` from its parent. The handle stays valid.
    pub fn remove(&self, element: ElementId) -> Result<(), DomError> {
        let mut arena = self.arena.write();
        arena.get(element)?;
        arena.detach(element);
        Ok(())
    }

    pub fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.arena.read().elements.get(&element).and_then(|data| data.parent)
    }

    pub fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.arena
            .read()
            .elements
            .get(&element)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    /// Number of listeners registered on `element`.
    pub fn listener_count(&self, element: ElementId) -> usize {
        self.listeners
            .read()
            .get(&element)
            .map(|list| list.len())
            .unwrap_or(0)
    }

    /// Deliver `event` to `element` as if the user had triggered it.
    ///
    /// Returns the number of listeners invoked.
    pub fn dispatch(&self, element: ElementId, event: EventKind) -> usize {
        let targets: Vec<Listener> = self
            .listeners
            .read()
            .get(&element)
            .map(|list| {
                list.iter()
                    .filter(|(kind, _)| *kind == event)
                    .map(|(_, listener)| Listener::clone(listener))
                    .collect()
            })
            .unwrap_or_default();

        tracing::trace!(?element, %event, listeners = targets.len(), "dispatching event");

        for listener in &targets {
            listener(element);
        }
        targets.len()
    }

    fn write<F>(&self, element: ElementId, f: F) -> Result<(), DomError>
    where
        F: FnOnce(&mut ElementData),
    {
        let mut arena = self.arena.write();
        f(arena.get_mut(element)?);
        Ok(())
    }

    fn read<T, F>(&self, element: ElementId, f: F) -> Option<T>
    where
        F: FnOnce(&ElementData) -> T,
    {
        self.arena.read().elements.get(&element).map(f)
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arena = self.arena.read();
        f.debug_struct("MemoryDocument")
            .field("root", &arena.root)
            .field("elements", &arena.elements.len())
            .finish()
    }
}

impl Document for MemoryDocument {
    fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementId>, DomError> {
        let group = SelectorGroup::parse(selector)?;
        let arena = self.arena.read();
        Ok(arena
            .walk(arena.root)
            .into_iter()
            .filter(|id| arena.element(*id).map_or(false, |el| group.matches(&el)))
            .collect())
    }

    fn tag_name(&self, element: ElementId) -> Option<String> {
        self.read(element, |data| data.tag.clone())
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        self.read(element, |data| data.attributes.get(&name).cloned())
            .flatten()
    }

    fn set_attribute(&self, element: ElementId, name: &str, value: &str) -> Result<(), DomError> {
        self.write(element, |data| {
            data.attributes
                .insert(name.to_ascii_lowercase(), value.to_string());
        })
    }

    fn form_value(&self, element: ElementId) -> Option<String> {
        self.read(element, |data| data.form_value.clone())
    }

    fn set_form_value(&self, element: ElementId, value: &str) -> Result<(), DomError> {
        self.write(element, |data| data.form_value = value.to_string())
    }

    fn checked(&self, element: ElementId) -> Option<bool> {
        self.read(element, |data| data.checked)
    }

    fn set_checked(&self, element: ElementId, checked: bool) -> Result<(), DomError> {
        self.write(element, |data| data.checked = checked)
    }

    fn selected_index(&self, element: ElementId) -> Option<i64> {
        let arena = self.arena.read();
        let index = arena.elements.get(&element)?.selected_index.unwrap_or(0);
        let options = arena.option_count(element);
        Some(match usize::try_from(index) {
            Ok(i) if i < options => index,
            _ => -1,
        })
    }

    fn set_selected_index(&self, element: ElementId, index: i64) -> Result<(), DomError> {
        let mut arena = self.arena.write();
        let options = arena.option_count(element);
        let data = arena.get_mut(element)?;
        data.selected_index = Some(match usize::try_from(index) {
            Ok(i) if i < options => index,
            _ => -1,
        });
        Ok(())
    }

    fn inner_html(&self, element: ElementId) -> Option<String> {
        let arena = self.arena.read();
        arena.elements.get(&element).map(|data| arena.content(data))
    }

    fn set_inner_html(&self, element: ElementId, html: &str) -> Result<(), DomError> {
        let mut arena = self.arena.write();
        if arena.content(arena.get(element)?) == html {
            return Ok(());
        }
        let children = std::mem::take(&mut arena.get_mut(element)?.children);
        for child in children {
            if let Some(data) = arena.elements.get_mut(&child) {
                data.parent = None;
            }
        }
        arena.get_mut(element)?.inner_html = html.to_string();
        Ok(())
    }

    fn add_event_listener(
        &self,
        element: ElementId,
        event: EventKind,
        listener: Listener,
    ) -> Result<(), DomError> {
        self.arena.read().get(element)?;
        self.listeners
            .write()
            .entry(element)
            .or_default()
            .push((event, listener));
        Ok(())
    }
}
