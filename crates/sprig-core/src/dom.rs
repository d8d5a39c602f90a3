//! In-memory document: the platform the engine patches.
//!
//! [`Document`] is a node arena of elements, text and comments. It is the
//! target of the direct rendering strategy, sits behind [`DomRenderer`] for
//! the renderer-mediated strategy, serializes to HTML for server rendering,
//! and feeds the terminal presenter.
//!
//! The document is lenient: operations on handles that no longer exist are
//! ignored (and traced) instead of failing, so a stale handle can never take
//! rendering down.

use crate::renderer::{ListenTarget, Renderer};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Handle to a node in a [`Document`] (or any other backend).
///
/// Document slots are reused; the generation keeps a handle to a freed
/// node from resolving to whatever took its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle {
    index: u32,
    generation: u32,
}

impl NodeHandle {
    /// Build a handle from a backend-specific raw id.
    pub fn from_raw(raw: u64) -> Self {
        Self {
            index: raw as u32,
            generation: (raw >> 32) as u32,
        }
    }

    /// Raw id: generation in the high half, slot in the low half.
    pub fn raw(self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }
}

/// Handle to a registered event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u32);

impl ListenerId {
    /// Build an id from a backend-specific raw value.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw value.
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Payload of a document node.
#[derive(Debug, Clone)]
pub enum DomNodeKind {
    /// Element with attributes, classes, inline styles and properties.
    Element {
        /// Tag name.
        name: String,
        /// Attributes in insertion order.
        attrs: Vec<(String, String)>,
        /// Class list in insertion order.
        classes: Vec<String>,
        /// Inline styles in insertion order.
        styles: Vec<(String, String)>,
        /// Properties (not serialized).
        properties: BTreeMap<String, Value>,
    },
    /// Text node.
    Text(String),
    /// Comment node.
    Comment(String),
}

#[derive(Debug, Clone)]
struct DomNode {
    kind: DomNodeKind,
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
    listeners: Vec<ListenerId>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<DomNode>,
}

#[derive(Debug, Clone)]
struct Listener {
    target: ListenTarget,
    event: String,
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A mutable tree of platform nodes.
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeHandle,
    listeners: BTreeMap<ListenerId, Listener>,
    next_listener: u32,
    generation: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document with a `<body>` root element.
    pub fn new() -> Self {
        let mut doc = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeHandle::from_raw(0),
            listeners: BTreeMap::new(),
            next_listener: 1,
            generation: 0,
        };
        doc.root = doc.create_element("body");
        doc
    }

    /// The root element every root view renders into.
    pub fn root(&self) -> NodeHandle {
        self.root
    }

    /// Incremented on every mutation; lets drivers skip redundant redraws.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of live nodes, including the root.
    pub fn node_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Number of allocated slots, live or free.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Whether the handle refers to a live node.
    pub fn contains(&self, node: NodeHandle) -> bool {
        self.get(node).is_some()
    }

    /// Payload of a node.
    pub fn kind(&self, node: NodeHandle) -> Option<&DomNodeKind> {
        self.get(node).map(|n| &n.kind)
    }

    /// Children of a node.
    pub fn children(&self, node: NodeHandle) -> &[NodeHandle] {
        self.get(node).map_or(&[], |n| n.children.as_slice())
    }

    fn get(&self, node: NodeHandle) -> Option<&DomNode> {
        self.slots
            .get(node.index as usize)
            .filter(|s| s.generation == node.generation)
            .and_then(|s| s.node.as_ref())
    }

    fn get_mut(&mut self, node: NodeHandle) -> Option<&mut DomNode> {
        let found = self
            .slots
            .get_mut(node.index as usize)
            .filter(|s| s.generation == node.generation)
            .and_then(|s| s.node.as_mut());
        if found.is_none() {
            tracing::trace!(?node, "ignoring operation on missing node");
        }
        found
    }

    fn alloc(&mut self, kind: DomNodeKind) -> NodeHandle {
        self.generation += 1;
        let node = DomNode {
            kind,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeHandle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeHandle { index, generation: 0 }
        }
    }

    fn free_slot(&mut self, node: NodeHandle) -> Option<DomNode> {
        let slot = self
            .slots
            .get_mut(node.index as usize)
            .filter(|s| s.generation == node.generation)?;
        let removed = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(node.index);
        Some(removed)
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: &str) -> NodeHandle {
        self.alloc(DomNodeKind::Element {
            name: name.to_string(),
            attrs: Vec::new(),
            classes: Vec::new(),
            styles: Vec::new(),
            properties: BTreeMap::new(),
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, value: &str) -> NodeHandle {
        self.alloc(DomNodeKind::Text(value.to_string()))
    }

    /// Create a detached comment.
    pub fn create_comment(&mut self, value: &str) -> NodeHandle {
        self.alloc(DomNodeKind::Comment(value.to_string()))
    }

    fn detach(&mut self, child: NodeHandle) {
        let Some(parent) = self.get(child).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|c| *c != child);
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = None;
        }
    }

    /// Append `child` as the last child of `parent`, moving it if attached
    /// elsewhere.
    pub fn append_child(&mut self, parent: NodeHandle, child: NodeHandle) {
        if !self.contains(parent) || !self.contains(child) {
            return;
        }
        self.detach(child);
        if let Some(p) = self.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = Some(parent);
        }
        self.generation += 1;
    }

    /// Insert `child` before `reference` under `parent`. Falls back to
    /// appending when `reference` is not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeHandle, child: NodeHandle, reference: NodeHandle) {
        if !self.contains(parent) || !self.contains(child) {
            return;
        }
        self.detach(child);
        if let Some(p) = self.get_mut(parent) {
            match p.children.iter().position(|c| *c == reference) {
                Some(pos) => p.children.insert(pos, child),
                None => p.children.push(child),
            }
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = Some(parent);
        }
        self.generation += 1;
    }

    /// Unlink `child` from `parent`. The node stays alive and can be
    /// re-inserted.
    pub fn remove_child(&mut self, parent: NodeHandle, child: NodeHandle) {
        if self.parent_node(child) == Some(parent) {
            self.detach(child);
            self.generation += 1;
        }
    }

    /// Parent of a node.
    pub fn parent_node(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.get(node).and_then(|n| n.parent)
    }

    /// Next sibling of a node.
    pub fn next_sibling(&self, node: NodeHandle) -> Option<NodeHandle> {
        let parent = self.parent_node(node)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|c| *c == node)?;
        siblings.get(pos + 1).copied()
    }

    fn element_mut(&mut self, el: NodeHandle) -> Option<ElementParts<'_>> {
        match &mut self.get_mut(el)?.kind {
            DomNodeKind::Element {
                attrs,
                classes,
                styles,
                properties,
                ..
            } => Some(ElementParts {
                attrs,
                classes,
                styles,
                properties,
            }),
            _ => None,
        }
    }

    /// Set (or replace) an attribute. The `class` attribute replaces the
    /// class list.
    pub fn set_attribute(&mut self, el: NodeHandle, name: &str, value: &str) {
        if let Some(parts) = self.element_mut(el) {
            if name == "class" {
                *parts.classes = value.split_whitespace().map(str::to_string).collect();
            } else {
                upsert(parts.attrs, name, value);
            }
            self.generation += 1;
        }
    }

    /// Remove an attribute.
    pub fn remove_attribute(&mut self, el: NodeHandle, name: &str) {
        if let Some(parts) = self.element_mut(el) {
            if name == "class" {
                parts.classes.clear();
            } else {
                parts.attrs.retain(|(k, _)| k != name);
            }
            self.generation += 1;
        }
    }

    /// Add a class (no-op when present).
    pub fn add_class(&mut self, el: NodeHandle, name: &str) {
        if let Some(parts) = self.element_mut(el) {
            if !parts.classes.iter().any(|c| c == name) {
                parts.classes.push(name.to_string());
            }
            self.generation += 1;
        }
    }

    /// Remove a class.
    pub fn remove_class(&mut self, el: NodeHandle, name: &str) {
        if let Some(parts) = self.element_mut(el) {
            parts.classes.retain(|c| c != name);
            self.generation += 1;
        }
    }

    /// Set (or replace) an inline style.
    pub fn set_style(&mut self, el: NodeHandle, style: &str, value: &str) {
        if let Some(parts) = self.element_mut(el) {
            upsert(parts.styles, style, value);
            self.generation += 1;
        }
    }

    /// Remove an inline style.
    pub fn remove_style(&mut self, el: NodeHandle, style: &str) {
        if let Some(parts) = self.element_mut(el) {
            parts.styles.retain(|(k, _)| k != style);
            self.generation += 1;
        }
    }

    /// Set an element property.
    pub fn set_property(&mut self, el: NodeHandle, name: &str, value: &Value) {
        if let Some(parts) = self.element_mut(el) {
            parts.properties.insert(name.to_string(), value.clone());
            self.generation += 1;
        }
    }

    /// Replace the content of a text or comment node.
    pub fn set_value(&mut self, node: NodeHandle, value: &str) {
        let Some(n) = self.get_mut(node) else {
            return;
        };
        match &mut n.kind {
            DomNodeKind::Text(text) | DomNodeKind::Comment(text) => {
                *text = value.to_string();
                self.generation += 1;
            }
            DomNodeKind::Element { name, .. } => {
                tracing::warn!(element = %name, "set_value called on an element");
            }
        }
    }

    /// Free a node and its subtree. Missing handles are ignored.
    pub fn destroy_node(&mut self, node: NodeHandle) {
        if node == self.root || !self.contains(node) {
            return;
        }
        self.detach(node);
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(removed) = self.free_slot(current) {
                for listener in &removed.listeners {
                    self.listeners.remove(listener);
                }
                stack.extend(removed.children);
            }
        }
        self.generation += 1;
    }

    /// Register a listener.
    pub fn listen(&mut self, target: ListenTarget, event: &str) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        if let ListenTarget::Node(node) = target {
            if let Some(n) = self.get_mut(node) {
                n.listeners.push(id);
            }
        }
        self.listeners.insert(
            id,
            Listener {
                target,
                event: event.to_string(),
            },
        );
        id
    }

    /// Unregister a listener.
    pub fn unlisten(&mut self, listener: ListenerId) {
        let Some(removed) = self.listeners.remove(&listener) else {
            return;
        };
        if let ListenTarget::Node(node) = removed.target {
            if let Some(n) = self.get_mut(node) {
                n.listeners.retain(|l| *l != listener);
            }
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Listeners that receive `event` raised on `node`, bubbling from the
    /// node up to the root.
    pub fn fire(&self, node: NodeHandle, event: &str) -> Vec<ListenerId> {
        let mut path = Vec::new();
        let mut current = Some(node);
        while let Some(n) = current {
            if !self.contains(n) {
                break;
            }
            path.push(n);
            current = self.parent_node(n);
        }
        path.iter()
            .filter_map(|n| self.get(*n))
            .flat_map(|n| n.listeners.iter().copied())
            .filter(|id| self.listeners.get(id).is_some_and(|l| l.event == event))
            .collect()
    }

    /// Listeners registered for `event` on a global target such as `window`.
    pub fn global_listeners(&self, target: &str, event: &str) -> Vec<ListenerId> {
        self.listeners
            .iter()
            .filter(|(_, l)| {
                matches!(&l.target, ListenTarget::Global(t) if t == target) && l.event == event
            })
            .map(|(id, _)| *id)
            .collect()
    }

    /// Attribute value of an element.
    pub fn attribute(&self, el: NodeHandle, name: &str) -> Option<&str> {
        match self.kind(el)? {
            DomNodeKind::Element { attrs, .. } => {
                attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
            }
            _ => None,
        }
    }

    /// Whether an element has a class.
    pub fn has_class(&self, el: NodeHandle, name: &str) -> bool {
        matches!(self.kind(el), Some(DomNodeKind::Element { classes, .. }) if classes.iter().any(|c| c == name))
    }

    /// Inline style value of an element.
    pub fn style(&self, el: NodeHandle, name: &str) -> Option<&str> {
        match self.kind(el)? {
            DomNodeKind::Element { styles, .. } => {
                styles.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
            }
            _ => None,
        }
    }

    /// Property value of an element.
    pub fn property(&self, el: NodeHandle, name: &str) -> Option<&Value> {
        match self.kind(el)? {
            DomNodeKind::Element { properties, .. } => properties.get(name),
            _ => None,
        }
    }

    /// First element with the given tag name, in document order.
    pub fn find_element(&self, name: &str) -> Option<NodeHandle> {
        self.find_elements(name).into_iter().next()
    }

    /// All elements with the given tag name, in document order.
    pub fn find_elements(&self, name: &str) -> Vec<NodeHandle> {
        let mut found = Vec::new();
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if let Some(DomNodeKind::Element { name: tag, .. }) = self.kind(node) {
                if tag == name && node != self.root {
                    found.push(node);
                }
            }
            stack.extend(self.children(node).iter().rev());
        }
        found
    }

    /// Concatenated text of a subtree.
    pub fn text_content(&self, node: NodeHandle) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeHandle, out: &mut String) {
        match self.kind(node) {
            Some(DomNodeKind::Text(text)) => out.push_str(text),
            Some(DomNodeKind::Element { .. }) => {
                for child in self.children(node) {
                    self.collect_text(*child, out);
                }
            }
            _ => {}
        }
    }

    /// Serialize the content of the root element.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in self.children(self.root) {
            self.write_html(*child, &mut out);
        }
        out
    }

    /// Serialize one node and its subtree.
    pub fn outer_html(&self, node: NodeHandle) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeHandle, out: &mut String) {
        match self.kind(node) {
            Some(DomNodeKind::Text(text)) => out.push_str(&escape(text, false)),
            Some(DomNodeKind::Comment(text)) => {
                let _ = write!(out, "<!--{text}-->");
            }
            Some(DomNodeKind::Element {
                name,
                attrs,
                classes,
                styles,
                ..
            }) => {
                let _ = write!(out, "<{name}");
                for (k, v) in attrs {
                    let _ = write!(out, " {k}=\"{}\"", escape(v, true));
                }
                if !classes.is_empty() {
                    let _ = write!(out, " class=\"{}\"", escape(&classes.join(" "), true));
                }
                if !styles.is_empty() {
                    let css = styles
                        .iter()
                        .map(|(k, v)| format!("{k}: {v};"))
                        .collect::<Vec<_>>()
                        .join(" ");
                    let _ = write!(out, " style=\"{}\"", escape(&css, true));
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&name.as_str()) {
                    return;
                }
                for child in self.children(node) {
                    self.write_html(*child, out);
                }
                let _ = write!(out, "</{name}>");
            }
            None => {}
        }
    }
}

struct ElementParts<'a> {
    attrs: &'a mut Vec<(String, String)>,
    classes: &'a mut Vec<String>,
    styles: &'a mut Vec<(String, String)>,
    properties: &'a mut BTreeMap<String, Value>,
}

fn upsert(list: &mut Vec<(String, String)>, key: &str, value: &str) {
    match list.iter_mut().find(|(k, _)| k == key) {
        Some((_, v)) => *v = value.to_string(),
        None => list.push((key.to_string(), value.to_string())),
    }
}

fn escape(s: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// A [`Renderer`] that applies every operation to an owned [`Document`].
///
/// This is the renderer-mediated counterpart of the direct strategy; both
/// must leave the document in the same state for the same bindings.
#[derive(Debug, Default)]
pub struct DomRenderer {
    document: Document,
}

impl DomRenderer {
    /// Renderer over a fresh document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer over an existing document.
    pub fn with_document(document: Document) -> Self {
        Self { document }
    }

    /// Give back the document.
    pub fn into_document(self) -> Document {
        self.document
    }
}

impl Renderer for DomRenderer {
    fn root_element(&mut self) -> NodeHandle {
        self.document.root()
    }

    fn create_element(&mut self, name: &str) -> NodeHandle {
        self.document.create_element(name)
    }

    fn create_text(&mut self, value: &str) -> NodeHandle {
        self.document.create_text(value)
    }

    fn create_comment(&mut self, value: &str) -> NodeHandle {
        self.document.create_comment(value)
    }

    fn append_child(&mut self, parent: NodeHandle, child: NodeHandle) {
        self.document.append_child(parent, child);
    }

    fn insert_before(&mut self, parent: NodeHandle, child: NodeHandle, reference: NodeHandle) {
        self.document.insert_before(parent, child, reference);
    }

    fn remove_child(&mut self, parent: NodeHandle, child: NodeHandle) {
        self.document.remove_child(parent, child);
    }

    fn parent_node(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.document.parent_node(node)
    }

    fn next_sibling(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.document.next_sibling(node)
    }

    fn set_attribute(&mut self, el: NodeHandle, name: &str, value: &str) {
        self.document.set_attribute(el, name, value);
    }

    fn remove_attribute(&mut self, el: NodeHandle, name: &str) {
        self.document.remove_attribute(el, name);
    }

    fn add_class(&mut self, el: NodeHandle, name: &str) {
        self.document.add_class(el, name);
    }

    fn remove_class(&mut self, el: NodeHandle, name: &str) {
        self.document.remove_class(el, name);
    }

    fn set_style(&mut self, el: NodeHandle, style: &str, value: &str) {
        self.document.set_style(el, style, value);
    }

    fn remove_style(&mut self, el: NodeHandle, style: &str) {
        self.document.remove_style(el, style);
    }

    fn set_property(&mut self, el: NodeHandle, name: &str, value: &Value) {
        self.document.set_property(el, name, value);
    }

    fn set_value(&mut self, node: NodeHandle, value: &str) {
        self.document.set_value(node, value);
    }

    fn listen(&mut self, target: ListenTarget, event: &str) -> ListenerId {
        self.document.listen(target, event)
    }

    fn unlisten(&mut self, listener: ListenerId) {
        self.document.unlisten(listener);
    }

    fn destroy_node(&mut self, node: NodeHandle) {
        self.document.destroy_node(node);
    }

    fn document(&self) -> Option<&Document> {
        Some(&self.document)
    }
}
