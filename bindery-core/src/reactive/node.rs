//! Reactive Node
//!
//! A reactive node is the unit of state bound to DOM elements. It holds:
//!
//! - a value, pushed into every bound element when assigned
//! - an attribute map, applied to every bound element when assigned
//! - the ordered set of bound elements
//! - untracked fields that never propagate
//!
//! # Two-Way Sync
//!
//! Binding an element registers one listener per [`EventKind`] on it. When
//! the host fires one, the node re-infers the element's channel and acts only
//! if the event is that channel's event, so an element whose `type` changes
//! after binding is still heard. It then reads the channel back and assigns
//! the result through [`ReactiveNode::set_value`], which re-pushes to every
//! bound element, the originating one included. Rewriting an element with
//! the value it just produced leaves it unchanged.
//!
//! # Handles
//!
//! `ReactiveNode` is a shared handle. Clones refer to the same node, and
//! listeners hold weak references so a dropped tree does not stay alive
//! through the document.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use serde_json::Value;

use super::binder::Binder;
use super::subscriber::{Subscriber, SubscriberId};
use super::sync;
use crate::config::PathJoin;
use crate::dom::{Channel, Document, ElementId, EventKind, Listener};
use crate::error::BindResult;

/// Unique identifier for a reactive node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct NodeState {
    value: Value,
    attributes: IndexMap<String, String>,
    bound: IndexSet<ElementId>,
    fields: IndexMap<String, Value>,
}

struct NodeInner {
    id: NodeId,
    name: String,
    document: Arc<dyn Document>,
    path_join: PathJoin,
    state: RwLock<NodeState>,
    subscribers: RwLock<Vec<Subscriber>>,
}

/// Handle to a reactive node.
#[derive(Clone)]
pub struct ReactiveNode {
    inner: Arc<NodeInner>,
}

impl ReactiveNode {
    /// Create an empty node bound to nothing.
    ///
    /// Nodes are normally obtained from [`NodeTree::node`](super::NodeTree::node).
    pub fn new(name: impl Into<String>, document: Arc<dyn Document>) -> Self {
        Self::with_path_join(name, document, PathJoin::default())
    }

    pub(crate) fn with_path_join(
        name: impl Into<String>,
        document: Arc<dyn Document>,
        path_join: PathJoin,
    ) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                id: NodeId::new(),
                name: name.into(),
                document,
                path_join,
                state: RwLock::new(NodeState::default()),
                subscribers: RwLock::new(Vec::new()),
            }),
        }
    }

    /// This node's unique identifier.
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// The name this node was created under.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The document this node binds against.
    pub fn document(&self) -> &Arc<dyn Document> {
        &self.inner.document
    }

    /// Whether two handles refer to the same node.
    pub fn ptr_eq(&self, other: &ReactiveNode) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ------------------------------------------------------------------------
    // Value
    // ------------------------------------------------------------------------

    /// Get the current value.
    pub fn value(&self) -> Value {
        self.inner.state.read().value.clone()
    }

    /// Store a new value and push it to every bound element.
    ///
    /// There is no equality check: assigning the current value pushes again.
    /// Subscribers are notified after the push.
    pub fn set_value(&self, value: impl Into<Value>) {
        let value = value.into();
        let bound = {
            let mut state = self.inner.state.write();
            state.value = value.clone();
            state.bound.iter().copied().collect::<Vec<_>>()
        };

        let written = sync::push_value(self.inner.document.as_ref(), &bound, &value);
        tracing::trace!(node = %self.inner.name, bound = bound.len(), written, "value assigned");

        self.notify_subscribers(&value);
    }

    /// Set the value using a function of the current value.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&Value) -> Value,
    {
        let next = {
            let state = self.inner.state.read();
            f(&state.value)
        };
        self.set_value(next);
    }

    // ------------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------------

    /// Get the attribute map most recently assigned.
    pub fn attributes(&self) -> IndexMap<String, String> {
        self.inner.state.read().attributes.clone()
    }

    /// Replace the attribute map and apply each pair to every bound element.
    ///
    /// Keys absent from `attributes` are not removed from elements that
    /// received them earlier.
    pub fn set_attributes<I, K, V>(&self, attributes: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let attributes: IndexMap<String, String> = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let bound = {
            let mut state = self.inner.state.write();
            state.attributes = attributes.clone();
            state.bound.iter().copied().collect::<Vec<_>>()
        };

        let written = sync::push_attributes(self.inner.document.as_ref(), &bound, &attributes);
        tracing::trace!(node = %self.inner.name, bound = bound.len(), written, "attributes assigned");
    }

    // ------------------------------------------------------------------------
    // Untracked fields
    // ------------------------------------------------------------------------

    /// Read an untracked field.
    pub fn property(&self, name: &str) -> Option<Value> {
        self.inner.state.read().fields.get(name).cloned()
    }

    /// Store an untracked field. Nothing is pushed to the document.
    pub fn set_property(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.inner
            .state
            .write()
            .fields
            .insert(name.into(), value.into());
    }

    // ------------------------------------------------------------------------
    // Binding
    // ------------------------------------------------------------------------

    /// Start a binder for this node.
    pub fn select(&self) -> Binder {
        Binder::new(self.clone(), self.inner.path_join)
    }

    /// Bind every element matching `selector`.
    ///
    /// Shorthand for `self.select().call(selector)`.
    pub fn bind(&self, selector: &str) -> BindResult<ReactiveNode> {
        self.select().call(selector)
    }

    /// Elements bound to this node, in binding order.
    pub fn bound_elements(&self) -> Vec<ElementId> {
        self.inner.state.read().bound.iter().copied().collect()
    }

    /// Whether `element` is bound to this node.
    pub fn is_bound(&self, element: ElementId) -> bool {
        self.inner.state.read().bound.contains(&element)
    }

    /// Resolve `selector` and bind every match not already bound.
    ///
    /// Returns the elements newly bound by this call.
    pub(crate) fn bind_resolved(&self, selector: &str) -> BindResult<Vec<ElementId>> {
        let selector = selector.trim();
        if selector.is_empty() {
            tracing::debug!(node = %self.inner.name, "empty selector, nothing to bind");
            return Ok(Vec::new());
        }

        let matched = self.inner.document.query_selector_all(selector)?;
        let fresh: Vec<ElementId> = {
            let mut state = self.inner.state.write();
            matched
                .iter()
                .copied()
                .filter(|element| state.bound.insert(*element))
                .collect()
        };

        for &element in &fresh {
            self.listen(element);
        }

        tracing::debug!(
            node = %self.inner.name,
            selector,
            matched = matched.len(),
            bound = fresh.len(),
            "bound selector"
        );
        Ok(fresh)
    }

    /// Register the listeners that pull `element` back into the node.
    fn listen(&self, element: ElementId) {
        let doc = self.inner.document.as_ref();
        for event in EventKind::ALL {
            let weak: Weak<NodeInner> = Arc::downgrade(&self.inner);
            let listener: Listener = Arc::new(move |target: ElementId| {
                if let Some(inner) = weak.upgrade() {
                    ReactiveNode { inner }.pull(target, event);
                }
            });

            if let Err(error) = doc.add_event_listener(element, event, listener) {
                tracing::warn!(node = %self.inner.name, ?element, %event, %error, "listener registration failed");
                return;
            }
        }
    }

    /// Read `element`'s channel and assign it as the node value, if `event`
    /// is the event that channel reports changes on.
    fn pull(&self, element: ElementId, event: EventKind) {
        let doc = self.inner.document.as_ref();
        let Some(channel) = Channel::of(doc, element) else {
            tracing::warn!(node = %self.inner.name, ?element, "event from unknown element ignored");
            return;
        };
        if channel.event() != event {
            return;
        }
        let Some(value) = channel.read(doc, element) else {
            tracing::warn!(node = %self.inner.name, ?element, "event from unreadable element ignored");
            return;
        };
        tracing::trace!(node = %self.inner.name, ?element, %event, "pulled value from element");
        self.set_value(value);
    }

    // ------------------------------------------------------------------------
    // Subscribers
    // ------------------------------------------------------------------------

    /// Register a callback invoked with every value the node is assigned.
    pub fn subscribe<F>(&self, notify: F) -> SubscriberId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let subscriber = Subscriber::new(notify);
        let id = subscriber.id();
        self.inner.subscribers.write().push(subscriber);
        id
    }

    /// Remove a subscriber. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.inner.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| s.id() != id);
        subscribers.len() != before
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }

    fn notify_subscribers(&self, value: &Value) {
        let subscribers = self.inner.subscribers.read().clone();
        for subscriber in &subscribers {
            subscriber.notify(value);
        }
    }
}

impl fmt::Debug for ReactiveNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("ReactiveNode")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("value", &state.value)
            .field("attributes", &state.attributes)
            .field("bound", &state.bound.len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;
    use parking_lot::Mutex;
    use serde_json::json;

    fn setup() -> (Arc<MemoryDocument>, ReactiveNode) {
        let doc = Arc::new(MemoryDocument::new());
        let node = ReactiveNode::new("title", doc.clone());
        (doc, node)
    }

    #[test]
    fn new_node_is_empty() {
        let (_doc, node) = setup();
        assert_eq!(node.name(), "title");
        assert_eq!(node.value(), Value::Null);
        assert!(node.attributes().is_empty());
        assert!(node.bound_elements().is_empty());
    }

    #[test]
    fn set_value_without_bindings() {
        let (_doc, node) = setup();
        node.set_value("hello");
        assert_eq!(node.value(), json!("hello"));
    }

    #[test]
    fn set_value_pushes_to_bound_elements() {
        let (doc, node) = setup();
        let h1 = doc.append(doc.root(), "h1").unwrap();
        let input = doc.append(doc.root(), "input").unwrap();

        node.bind("h1, input").unwrap();
        node.set_value("Welcome");

        assert_eq!(doc.inner_html(h1).as_deref(), Some("Welcome"));
        assert_eq!(doc.form_value(input).as_deref(), Some("Welcome"));
    }

    #[test]
    fn binding_does_not_push_current_value() {
        let (doc, node) = setup();
        let p = doc.append(doc.root(), "p").unwrap();
        node.set_value("early");

        node.bind("p").unwrap();
        assert_eq!(doc.inner_html(p).as_deref(), Some(""));
    }

    #[test]
    fn redundant_writes_still_propagate() {
        let (doc, node) = setup();
        let p = doc.append(doc.root(), "p").unwrap();
        node.bind("p").unwrap();

        node.set_value("same");
        doc.set_inner_html(p, "tampered").unwrap();
        node.set_value("same");

        assert_eq!(doc.inner_html(p).as_deref(), Some("same"));
    }

    #[test]
    fn update_derives_from_current_value() {
        let (_doc, node) = setup();
        node.set_value(1);
        node.update(|v| json!(v.as_i64().unwrap_or(0) + 1));
        assert_eq!(node.value(), json!(2));
    }

    #[test]
    fn bind_is_idempotent() {
        let (doc, node) = setup();
        let li = doc.append(doc.root(), "li").unwrap();

        node.bind("li").unwrap();
        node.bind("li").unwrap();
        node.bind("html > li").unwrap();

        assert_eq!(node.bound_elements(), vec![li]);
        assert_eq!(doc.listener_count(li), EventKind::ALL.len());
    }

    #[test]
    fn bind_returns_owning_node() {
        let (doc, node) = setup();
        doc.append(doc.root(), "p").unwrap();
        let returned = node.bind("p").unwrap();
        assert!(returned.ptr_eq(&node));
    }

    #[test]
    fn empty_or_unmatched_selector_binds_nothing() {
        let (_doc, node) = setup();
        assert!(node.bind("").is_ok());
        assert!(node.bind("   ").is_ok());
        assert!(node.bind("table").is_ok());
        assert!(node.bound_elements().is_empty());
    }

    #[test]
    fn malformed_selector_is_reported() {
        let (_doc, node) = setup();
        assert!(node.bind("ul >").is_err());
        assert!(node.bound_elements().is_empty());
    }

    #[test]
    fn attributes_are_applied_and_never_removed() {
        let (doc, node) = setup();
        let a = doc.append(doc.root(), "span").unwrap();
        let b = doc.append(doc.root(), "span").unwrap();
        node.bind("span").unwrap();

        node.set_attributes([("id", "x"), ("class", "y")]);
        node.set_attributes([("id", "z")]);

        for el in [a, b] {
            assert_eq!(doc.attribute(el, "id").as_deref(), Some("z"));
            assert_eq!(doc.attribute(el, "class").as_deref(), Some("y"));
        }
        assert_eq!(node.attributes().len(), 1);
    }

    #[test]
    fn properties_do_not_propagate() {
        let (doc, node) = setup();
        let p = doc.append(doc.root(), "p").unwrap();
        node.bind("p").unwrap();

        node.set_property("label", "note");

        assert_eq!(node.property("label"), Some(json!("note")));
        assert_eq!(node.property("missing"), None);
        assert_eq!(doc.inner_html(p).as_deref(), Some(""));
        assert_eq!(doc.attribute(p, "label"), None);
    }

    #[test]
    fn input_event_pulls_value_back() {
        let (doc, node) = setup();
        let input = doc.append(doc.root(), "input").unwrap();
        let mirror = doc.append(doc.root(), "span").unwrap();
        node.bind("input, span").unwrap();

        doc.set_form_value(input, "typed").unwrap();
        assert_eq!(doc.dispatch(input, EventKind::Input), 1);

        assert_eq!(node.value(), json!("typed"));
        assert_eq!(doc.inner_html(mirror).as_deref(), Some("typed"));
        assert_eq!(doc.form_value(input).as_deref(), Some("typed"));
    }

    #[test]
    fn select_listens_for_change() {
        let (doc, node) = setup();
        let select = doc.append(doc.root(), "select").unwrap();
        for _ in 0..3 {
            doc.append(select, "option").unwrap();
        }
        node.bind("select").unwrap();

        doc.set_selected_index(select, 1).unwrap();
        doc.dispatch(select, EventKind::Input);
        assert_eq!(node.value(), Value::Null);

        doc.set_selected_index(select, 2).unwrap();
        assert_eq!(doc.dispatch(select, EventKind::Change), 1);
        assert_eq!(node.value(), json!(2));

        node.set_value("1");
        assert_eq!(doc.selected_index(select), Some(1));
    }

    #[test]
    fn retyped_input_is_heard_on_its_new_event() {
        let (doc, node) = setup();
        let input = doc.append(doc.root(), "input").unwrap();
        node.bind("input").unwrap();

        doc.set_attribute(input, "type", "checkbox").unwrap();
        doc.set_checked(input, true).unwrap();

        doc.dispatch(input, EventKind::Input);
        assert_eq!(node.value(), Value::Null);

        doc.dispatch(input, EventKind::Change);
        assert_eq!(node.value(), json!(true));
    }

    #[test]
    fn container_echo_keeps_children() {
        let (doc, node) = setup();
        let ul = doc.append(doc.root(), "ul").unwrap();
        let items: Vec<_> = (0..3).map(|_| doc.append(ul, "li").unwrap()).collect();
        node.bind("ul").unwrap();

        doc.dispatch(ul, EventKind::Input);

        assert_eq!(node.value(), json!("<li></li><li></li><li></li>"));
        assert_eq!(doc.children(ul), items);
    }

    #[test]
    fn subscribers_see_every_assignment() {
        let (doc, node) = setup();
        let input = doc.append(doc.root(), "input").unwrap();
        node.bind("input").unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = node.subscribe(move |v| sink.lock().push(v.clone()));
        assert_eq!(node.subscriber_count(), 1);

        node.set_value("a");
        doc.set_form_value(input, "b").unwrap();
        doc.dispatch(input, EventKind::Input);

        assert!(node.unsubscribe(id));
        assert!(!node.unsubscribe(id));
        node.set_value("c");

        assert_eq!(*seen.lock(), vec![json!("a"), json!("b")]);
    }

    #[test]
    fn listener_is_inert_after_node_is_dropped() {
        let (doc, node) = setup();
        let input = doc.append(doc.root(), "input").unwrap();
        node.bind("input").unwrap();
        drop(node);

        doc.set_form_value(input, "late").unwrap();
        assert_eq!(doc.dispatch(input, EventKind::Input), 1);
        assert_eq!(doc.form_value(input).as_deref(), Some("late"));
    }

    #[test]
    fn clones_share_state() {
        let (_doc, node) = setup();
        let other = node.clone();
        other.set_value(true);
        assert_eq!(node.value(), json!(true));
        assert!(node.ptr_eq(&other));
        assert_eq!(node.id(), other.id());
    }
}
