//! Immutable view definitions produced by the
//! [`ViewDefinitionBuilder`](crate::builder::ViewDefinitionBuilder).
//!
//! A [`ViewDefinition`] is a pre-order flattening of one template: an
//! ordered list of [`NodeDef`]s where every node records its parent index and
//! the size of its subtree, so descendants can be found with index
//! arithmetic alone. Definitions are shared through [`Arc`] by every view
//! instantiated from them.

use crate::directive::Directive;
use crate::scope::{Bindings, EventScope, Scope};
use crate::value::Value;
use bitflags::bitflags;
use std::fmt;
use std::sync::Arc;

bitflags! {
    /// Per-node type and capability flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u32 {
        /// Element node.
        const TYPE_ELEMENT = 1 << 0;
        /// Text node.
        const TYPE_TEXT = 1 << 1;
        /// Anchor (placeholder for embedded views).
        const TYPE_ANCHOR = 1 << 2;
        /// Directive or component provider.
        const TYPE_DIRECTIVE = 1 << 3;
        /// Provider that owns a component view.
        const TYPE_COMPONENT = 1 << 4;
        /// Element hosting a component view.
        const COMPONENT_HOST = 1 << 5;
        /// Anchor with a template of its own.
        const EMBEDDED_TEMPLATE = 1 << 6;
        /// Node has at least one binding.
        const HAS_BINDINGS = 1 << 7;
        /// Element listens to at least one event.
        const HAS_OUTPUTS = 1 << 8;
    }
}

bitflags! {
    /// Per-definition flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ViewFlags: u8 {
        /// The definition is a host view wrapping a top-level component.
        const HOST = 1 << 0;
        /// Views of this definition are only checked after an input change,
        /// an event, or an explicit `mark_for_check`.
        const ON_PUSH = 1 << 1;
    }
}

/// What a binding writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// Element property (`[value]="..."`).
    Property,
    /// Element attribute; `Null` removes it.
    Attribute,
    /// Class toggle driven by truthiness.
    Class,
    /// Inline style; `Null` removes it, the suffix is appended as a unit.
    Style,
    /// One interpolation slot of a text node.
    Text,
    /// Directive input.
    Input,
}

/// One bound expression attached to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingDef {
    pub(crate) kind: BindingKind,
    pub(crate) name: Arc<str>,
    pub(crate) suffix: Option<Arc<str>>,
}

impl BindingDef {
    fn new(kind: BindingKind, name: &str) -> Self {
        Self {
            kind,
            name: Arc::from(name),
            suffix: None,
        }
    }

    /// Element property binding.
    pub fn property(name: &str) -> Self {
        Self::new(BindingKind::Property, name)
    }

    /// Element attribute binding.
    pub fn attribute(name: &str) -> Self {
        Self::new(BindingKind::Attribute, name)
    }

    /// Class toggle binding.
    pub fn class(name: &str) -> Self {
        Self::new(BindingKind::Class, name)
    }

    /// Style binding without unit.
    pub fn style(name: &str) -> Self {
        Self::new(BindingKind::Style, name)
    }

    /// Style binding with a unit suffix such as `px`.
    pub fn style_with_unit(name: &str, unit: &str) -> Self {
        Self {
            suffix: Some(Arc::from(unit)),
            ..Self::new(BindingKind::Style, name)
        }
    }

    /// Directive input binding.
    pub fn input(name: &str) -> Self {
        Self::new(BindingKind::Input, name)
    }

    pub(crate) fn text() -> Self {
        Self::new(BindingKind::Text, "text")
    }

    /// Binding kind.
    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    /// Binding name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit suffix for style bindings.
    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }
}

/// An event an element listens to, optionally on a global target such as
/// `window` or `document`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDef {
    pub(crate) target: Option<Arc<str>>,
    pub(crate) event_name: Arc<str>,
}

impl OutputDef {
    /// Event name as seen by the event dispatcher: `target:event` for global
    /// targets, otherwise just `event`.
    pub fn full_name(&self) -> String {
        match &self.target {
            Some(target) => format!("{target}:{}", self.event_name),
            None => self.event_name.to_string(),
        }
    }

    /// Global target, if any.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Bare event name.
    pub fn event_name(&self) -> &str {
        &self.event_name
    }
}

/// Factory creating a fresh directive instance for each view.
pub type DirectiveFactory = Arc<dyn Fn() -> Box<dyn Directive> + Send + Sync>;

/// Evaluates the bindings of a view against its component and context.
pub type UpdateFn = Arc<dyn Fn(&mut Bindings, &Scope<'_>) + Send + Sync>;

/// Handles an event raised on `node` named `event_name`.
///
/// Returns `false` to request that the default action be prevented.
pub type HandleEventFn = Arc<dyn Fn(&mut EventScope<'_>, usize, &str, &Value) -> bool + Send + Sync>;

/// Element node payload.
#[derive(Clone)]
pub struct ElementDef {
    pub(crate) name: Arc<str>,
    pub(crate) attrs: Vec<(Arc<str>, Arc<str>)>,
    pub(crate) outputs: Vec<OutputDef>,
    pub(crate) component_view: Option<Arc<ViewDefinition>>,
}

impl ElementDef {
    /// Tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Static attributes in declaration order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (&**k, &**v))
    }

    /// Declared event listeners.
    pub fn outputs(&self) -> &[OutputDef] {
        &self.outputs
    }

    /// Definition of the component view hosted by this element.
    pub fn component_view(&self) -> Option<&Arc<ViewDefinition>> {
        self.component_view.as_ref()
    }
}

/// Text node payload: static pieces around the interpolated bindings.
///
/// A text node with `n` constants has `n - 1` bindings and renders as
/// `c0 + v0 + c1 + v1 + ... + c(n-1)`.
#[derive(Debug, Clone)]
pub struct TextDef {
    pub(crate) constants: Vec<Arc<str>>,
}

impl TextDef {
    /// Static text pieces.
    pub fn constants(&self) -> impl Iterator<Item = &str> {
        self.constants.iter().map(|c| &**c)
    }
}

/// Anchor payload.
#[derive(Clone)]
pub struct AnchorDef {
    pub(crate) template: Option<Arc<ViewDefinition>>,
}

impl AnchorDef {
    /// Template instantiated by default when a directive creates a view.
    pub fn template(&self) -> Option<&Arc<ViewDefinition>> {
        self.template.as_ref()
    }
}

/// Provider (directive or component) payload.
#[derive(Clone)]
pub struct ProviderDef {
    pub(crate) token: Arc<str>,
    pub(crate) factory: DirectiveFactory,
}

impl ProviderDef {
    /// Diagnostic name of the provider.
    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Node payload by kind.
#[derive(Clone)]
pub enum NodeKind {
    /// Platform element.
    Element(ElementDef),
    /// Platform text node.
    Text(TextDef),
    /// Placeholder for embedded views.
    Anchor(AnchorDef),
    /// Directive or component instance.
    Provider(ProviderDef),
}

/// One node of a [`ViewDefinition`].
#[derive(Clone)]
pub struct NodeDef {
    pub(crate) index: usize,
    pub(crate) parent: Option<usize>,
    pub(crate) child_count: usize,
    pub(crate) binding_index: usize,
    pub(crate) bindings: Vec<BindingDef>,
    pub(crate) flags: NodeFlags,
    pub(crate) child_flags: NodeFlags,
    pub(crate) kind: NodeKind,
}

impl NodeDef {
    /// Position in the definition.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Parent node index, `None` for root nodes.
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Number of descendants (the whole subtree, not just direct children).
    pub fn child_count(&self) -> usize {
        self.child_count
    }

    /// Offset of this node's first binding in the view's value storage.
    pub fn binding_index(&self) -> usize {
        self.binding_index
    }

    /// Declared bindings.
    pub fn bindings(&self) -> &[BindingDef] {
        &self.bindings
    }

    /// Own flags.
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    /// Union of all descendant flags.
    pub fn child_flags(&self) -> NodeFlags {
        self.child_flags
    }

    /// Payload.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }
}

impl fmt::Debug for NodeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            NodeKind::Element(el) => format!("element <{}>", el.name),
            NodeKind::Text(text) => format!("text {:?}", text.constants),
            NodeKind::Anchor(anchor) => format!("anchor (template: {})", anchor.template.is_some()),
            NodeKind::Provider(p) => format!("provider {}", p.token),
        };
        f.debug_struct("NodeDef")
            .field("index", &self.index)
            .field("parent", &self.parent)
            .field("child_count", &self.child_count)
            .field("binding_index", &self.binding_index)
            .field("bindings", &self.bindings)
            .field("flags", &self.flags)
            .field("kind", &kind)
            .finish()
    }
}

/// Immutable description of one view.
pub struct ViewDefinition {
    pub(crate) nodes: Vec<NodeDef>,
    pub(crate) update_directives: Option<UpdateFn>,
    pub(crate) update_renderer: Option<UpdateFn>,
    pub(crate) handle_event: Option<HandleEventFn>,
    pub(crate) flags: ViewFlags,
    pub(crate) node_flags: NodeFlags,
    pub(crate) binding_count: usize,
    pub(crate) root_nodes: Vec<usize>,
}

impl ViewDefinition {
    /// Nodes in pre-order.
    pub fn nodes(&self) -> &[NodeDef] {
        &self.nodes
    }

    /// Node by index.
    pub fn node(&self, index: usize) -> Option<&NodeDef> {
        self.nodes.get(index)
    }

    /// Definition flags.
    pub fn flags(&self) -> ViewFlags {
        self.flags
    }

    /// Union of all node flags.
    pub fn node_flags(&self) -> NodeFlags {
        self.node_flags
    }

    /// Total number of bindings across all nodes.
    pub fn binding_count(&self) -> usize {
        self.binding_count
    }

    /// Indices of nodes without a parent.
    pub fn root_nodes(&self) -> &[usize] {
        &self.root_nodes
    }

    /// Whether an event dispatcher is present.
    pub fn has_event_handler(&self) -> bool {
        self.handle_event.is_some()
    }
}

impl fmt::Debug for ViewDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewDefinition")
            .field("nodes", &self.nodes)
            .field("flags", &self.flags)
            .field("binding_count", &self.binding_count)
            .field("update_directives", &self.update_directives.is_some())
            .field("update_renderer", &self.update_renderer.is_some())
            .field("handle_event", &self.handle_event.is_some())
            .finish()
    }
}
