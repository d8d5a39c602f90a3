//! The rendering backend contract and the two strategies that use it.
//!
//! The engine never touches platform nodes except through
//! [`RenderStrategy`]. With [`RenderStrategy::Direct`] operations are applied
//! straight to an in-memory [`Document`]; with [`RenderStrategy::Mediated`]
//! they are forwarded to a user supplied [`Renderer`]. Both must produce the
//! same observable tree for the same sequence of checks.

use crate::dom::{Document, ListenerId, NodeHandle};
use crate::value::Value;

/// Where an event listener is registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListenTarget {
    /// A rendered node.
    Node(NodeHandle),
    /// A global target such as `window`, `document` or `body`.
    Global(String),
}

/// Platform operations the engine needs.
///
/// Implementations should be lenient about handles they do not know;
/// the engine may pass a handle whose node the platform already dropped
/// while a view is torn down.
pub trait Renderer: Send {
    /// Element root views render into.
    fn root_element(&mut self) -> NodeHandle;

    /// Create a detached element.
    fn create_element(&mut self, name: &str) -> NodeHandle;

    /// Create a detached text node.
    fn create_text(&mut self, value: &str) -> NodeHandle;

    /// Create a detached comment, used to mark anchors.
    fn create_comment(&mut self, value: &str) -> NodeHandle;

    /// Append `child` to `parent`.
    fn append_child(&mut self, parent: NodeHandle, child: NodeHandle);

    /// Insert `child` before `reference` under `parent`.
    fn insert_before(&mut self, parent: NodeHandle, child: NodeHandle, reference: NodeHandle);

    /// Unlink `child` from `parent`.
    fn remove_child(&mut self, parent: NodeHandle, child: NodeHandle);

    /// Parent of a node.
    fn parent_node(&self, node: NodeHandle) -> Option<NodeHandle>;

    /// Next sibling of a node.
    fn next_sibling(&self, node: NodeHandle) -> Option<NodeHandle>;

    /// Set an attribute.
    fn set_attribute(&mut self, el: NodeHandle, name: &str, value: &str);

    /// Remove an attribute.
    fn remove_attribute(&mut self, el: NodeHandle, name: &str);

    /// Add a class.
    fn add_class(&mut self, el: NodeHandle, name: &str);

    /// Remove a class.
    fn remove_class(&mut self, el: NodeHandle, name: &str);

    /// Set an inline style.
    fn set_style(&mut self, el: NodeHandle, style: &str, value: &str);

    /// Remove an inline style.
    fn remove_style(&mut self, el: NodeHandle, style: &str);

    /// Set an element property.
    fn set_property(&mut self, el: NodeHandle, name: &str, value: &Value);

    /// Replace the content of a text node.
    fn set_value(&mut self, node: NodeHandle, value: &str);

    /// Register an event listener.
    fn listen(&mut self, target: ListenTarget, event: &str) -> ListenerId;

    /// Unregister an event listener.
    fn unlisten(&mut self, listener: ListenerId);

    /// Release a node that the engine no longer references.
    fn destroy_node(&mut self, node: NodeHandle) {
        let _ = node;
    }

    /// Record a debug attribute for a binding. Only called when debug info
    /// is enabled.
    fn set_binding_debug_info(&mut self, el: NodeHandle, name: &str, value: &str) {
        self.set_attribute(el, name, value);
    }

    /// Backing document, when the renderer keeps one.
    fn document(&self) -> Option<&Document> {
        None
    }
}

/// How the engine reaches the platform.
pub enum RenderStrategy {
    /// Apply operations directly to an owned document.
    Direct(Document),
    /// Forward operations to a renderer.
    Mediated(Box<dyn Renderer>),
}

impl Default for RenderStrategy {
    fn default() -> Self {
        RenderStrategy::Direct(Document::new())
    }
}

impl std::fmt::Debug for RenderStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderStrategy::Direct(_) => f.write_str("Direct"),
            RenderStrategy::Mediated(_) => f.write_str("Mediated"),
        }
    }
}

impl RenderStrategy {
    /// Whether operations go straight to a document.
    pub fn is_direct(&self) -> bool {
        matches!(self, RenderStrategy::Direct(_))
    }

    /// The document operations end up in, if reachable.
    pub fn document(&self) -> Option<&Document> {
        match self {
            RenderStrategy::Direct(doc) => Some(doc),
            RenderStrategy::Mediated(r) => r.document(),
        }
    }

    pub(crate) fn root_element(&mut self) -> NodeHandle {
        match self {
            RenderStrategy::Direct(doc) => doc.root(),
            RenderStrategy::Mediated(r) => r.root_element(),
        }
    }

    pub(crate) fn create_element(&mut self, name: &str) -> NodeHandle {
        tracing::trace!(name, "create element");
        match self {
            RenderStrategy::Direct(doc) => doc.create_element(name),
            RenderStrategy::Mediated(r) => r.create_element(name),
        }
    }

    pub(crate) fn create_text(&mut self, value: &str) -> NodeHandle {
        match self {
            RenderStrategy::Direct(doc) => doc.create_text(value),
            RenderStrategy::Mediated(r) => r.create_text(value),
        }
    }

    pub(crate) fn create_comment(&mut self, value: &str) -> NodeHandle {
        match self {
            RenderStrategy::Direct(doc) => doc.create_comment(value),
            RenderStrategy::Mediated(r) => r.create_comment(value),
        }
    }

    pub(crate) fn append_child(&mut self, parent: NodeHandle, child: NodeHandle) {
        match self {
            RenderStrategy::Direct(doc) => doc.append_child(parent, child),
            RenderStrategy::Mediated(r) => r.append_child(parent, child),
        }
    }

    pub(crate) fn insert_before(&mut self, parent: NodeHandle, child: NodeHandle, reference: NodeHandle) {
        match self {
            RenderStrategy::Direct(doc) => doc.insert_before(parent, child, reference),
            RenderStrategy::Mediated(r) => r.insert_before(parent, child, reference),
        }
    }

    pub(crate) fn remove_child(&mut self, parent: NodeHandle, child: NodeHandle) {
        match self {
            RenderStrategy::Direct(doc) => doc.remove_child(parent, child),
            RenderStrategy::Mediated(r) => r.remove_child(parent, child),
        }
    }

    pub(crate) fn parent_node(&self, node: NodeHandle) -> Option<NodeHandle> {
        match self {
            RenderStrategy::Direct(doc) => doc.parent_node(node),
            RenderStrategy::Mediated(r) => r.parent_node(node),
        }
    }

    pub(crate) fn next_sibling(&self, node: NodeHandle) -> Option<NodeHandle> {
        match self {
            RenderStrategy::Direct(doc) => doc.next_sibling(node),
            RenderStrategy::Mediated(r) => r.next_sibling(node),
        }
    }

    pub(crate) fn set_attribute(&mut self, el: NodeHandle, name: &str, value: &str) {
        tracing::trace!(?el, name, value, "set attribute");
        match self {
            RenderStrategy::Direct(doc) => doc.set_attribute(el, name, value),
            RenderStrategy::Mediated(r) => r.set_attribute(el, name, value),
        }
    }

    pub(crate) fn remove_attribute(&mut self, el: NodeHandle, name: &str) {
        match self {
            RenderStrategy::Direct(doc) => doc.remove_attribute(el, name),
            RenderStrategy::Mediated(r) => r.remove_attribute(el, name),
        }
    }

    pub(crate) fn add_class(&mut self, el: NodeHandle, name: &str) {
        match self {
            RenderStrategy::Direct(doc) => doc.add_class(el, name),
            RenderStrategy::Mediated(r) => r.add_class(el, name),
        }
    }

    pub(crate) fn remove_class(&mut self, el: NodeHandle, name: &str) {
        match self {
            RenderStrategy::Direct(doc) => doc.remove_class(el, name),
            RenderStrategy::Mediated(r) => r.remove_class(el, name),
        }
    }

    pub(crate) fn set_style(&mut self, el: NodeHandle, style: &str, value: &str) {
        match self {
            RenderStrategy::Direct(doc) => doc.set_style(el, style, value),
            RenderStrategy::Mediated(r) => r.set_style(el, style, value),
        }
    }

    pub(crate) fn remove_style(&mut self, el: NodeHandle, style: &str) {
        match self {
            RenderStrategy::Direct(doc) => doc.remove_style(el, style),
            RenderStrategy::Mediated(r) => r.remove_style(el, style),
        }
    }

    pub(crate) fn set_property(&mut self, el: NodeHandle, name: &str, value: &Value) {
        tracing::trace!(?el, name, "set property");
        match self {
            RenderStrategy::Direct(doc) => doc.set_property(el, name, value),
            RenderStrategy::Mediated(r) => r.set_property(el, name, value),
        }
    }

    pub(crate) fn set_value(&mut self, node: NodeHandle, value: &str) {
        tracing::trace!(?node, value, "set text");
        match self {
            RenderStrategy::Direct(doc) => doc.set_value(node, value),
            RenderStrategy::Mediated(r) => r.set_value(node, value),
        }
    }

    pub(crate) fn listen(&mut self, target: ListenTarget, event: &str) -> ListenerId {
        match self {
            RenderStrategy::Direct(doc) => doc.listen(target, event),
            RenderStrategy::Mediated(r) => r.listen(target, event),
        }
    }

    pub(crate) fn unlisten(&mut self, listener: ListenerId) {
        match self {
            RenderStrategy::Direct(doc) => doc.unlisten(listener),
            RenderStrategy::Mediated(r) => r.unlisten(listener),
        }
    }

    pub(crate) fn destroy_node(&mut self, node: NodeHandle) {
        match self {
            RenderStrategy::Direct(doc) => doc.destroy_node(node),
            RenderStrategy::Mediated(r) => r.destroy_node(node),
        }
    }

    pub(crate) fn set_binding_debug_info(&mut self, el: NodeHandle, name: &str, value: &str) {
        match self {
            RenderStrategy::Direct(doc) => doc.set_attribute(el, name, value),
            RenderStrategy::Mediated(r) => r.set_binding_debug_info(el, name, value),
        }
    }
}
