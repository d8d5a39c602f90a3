//! Building and validating [`ViewDefinition`]s.
//!
//! Nodes are given in pre-order. Every node declares how many descendants
//! follow it (`child_count` counts the whole subtree), which is all the
//! builder needs to recover parent links:
//!
//! ```rust,ignore
//! // <div>
//! //   <span>{{ name }}</span>
//! // </div>
//! let def = ViewDefinitionBuilder::new()
//!     .node(NodeSpec::element(2, "div"))
//!     .node(NodeSpec::element(1, "span"))
//!     .node(NodeSpec::text(&["", ""]))
//!     .update_renderer(|b, scope| b.value(2, scope.local("name")))
//!     .build()?;
//! ```

use crate::def::{
    AnchorDef, BindingDef, BindingKind, DirectiveFactory, ElementDef, HandleEventFn, NodeDef,
    NodeFlags, NodeKind, OutputDef, ProviderDef, TextDef, UpdateFn, ViewDefinition, ViewFlags,
};
use crate::directive::Directive;
use crate::error::BuildError;
use crate::scope::{Bindings, EventScope, Scope};
use crate::value::Value;
use std::sync::Arc;

enum SpecKind {
    Element {
        name: Arc<str>,
        attrs: Vec<(Arc<str>, Arc<str>)>,
        outputs: Vec<OutputDef>,
        component_view: Option<Arc<ViewDefinition>>,
    },
    Text {
        constants: Vec<Arc<str>>,
    },
    Anchor {
        template: Option<Arc<ViewDefinition>>,
    },
    Provider {
        token: Arc<str>,
        factory: DirectiveFactory,
        component: bool,
    },
}

impl SpecKind {
    fn into_node_kind(self) -> NodeKind {
        match self {
            SpecKind::Element {
                name,
                attrs,
                outputs,
                component_view,
            } => NodeKind::Element(ElementDef {
                name,
                attrs,
                outputs,
                component_view,
            }),
            SpecKind::Text { constants } => NodeKind::Text(TextDef { constants }),
            SpecKind::Anchor { template } => NodeKind::Anchor(AnchorDef { template }),
            SpecKind::Provider { token, factory, .. } => NodeKind::Provider(ProviderDef { token, factory }),
        }
    }
}

/// One node as declared by a template, before validation.
pub struct NodeSpec {
    child_count: usize,
    bindings: Vec<BindingDef>,
    kind: SpecKind,
}

impl NodeSpec {
    /// An element with `child_count` descendants.
    pub fn element(child_count: usize, name: &str) -> Self {
        Self {
            child_count,
            bindings: Vec::new(),
            kind: SpecKind::Element {
                name: Arc::from(name),
                attrs: Vec::new(),
                outputs: Vec::new(),
                component_view: None,
            },
        }
    }

    /// A text node. `constants` are the static pieces around the
    /// interpolations, so `["Hello ", "!"]` declares one binding. An empty
    /// slice is an empty static text.
    pub fn text(constants: &[&str]) -> Self {
        let constants: Vec<Arc<str>> = if constants.is_empty() {
            vec![Arc::from("")]
        } else {
            constants.iter().map(|c| Arc::from(*c)).collect()
        };
        let bindings = (1..constants.len()).map(|_| BindingDef::text()).collect();
        Self {
            child_count: 0,
            bindings,
            kind: SpecKind::Text { constants },
        }
    }

    /// An anchor. Its direct children may only be directives; `template` is
    /// what those directives instantiate by default.
    pub fn anchor(child_count: usize, template: Option<Arc<ViewDefinition>>) -> Self {
        Self {
            child_count,
            bindings: Vec::new(),
            kind: SpecKind::Anchor { template },
        }
    }

    /// A directive on the enclosing element or anchor.
    pub fn directive<D, F>(token: &str, factory: F) -> Self
    where
        D: Directive,
        F: Fn() -> D + Send + Sync + 'static,
    {
        Self::provider(token, factory, false)
    }

    /// The component of the enclosing host element.
    pub fn component<D, F>(token: &str, factory: F) -> Self
    where
        D: Directive,
        F: Fn() -> D + Send + Sync + 'static,
    {
        Self::provider(token, factory, true)
    }

    fn provider<D, F>(token: &str, factory: F, component: bool) -> Self
    where
        D: Directive,
        F: Fn() -> D + Send + Sync + 'static,
    {
        let factory: DirectiveFactory = Arc::new(move || Box::new(factory()) as Box<dyn Directive>);
        Self {
            child_count: 0,
            bindings: Vec::new(),
            kind: SpecKind::Provider {
                token: Arc::from(token),
                factory,
                component,
            },
        }
    }

    /// Add a static attribute (elements only; ignored elsewhere).
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        if let SpecKind::Element { attrs, .. } = &mut self.kind {
            attrs.push((Arc::from(name), Arc::from(value)));
        }
        self
    }

    /// Add a binding.
    pub fn bind(mut self, binding: BindingDef) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Shorthand for binding a directive input.
    pub fn input(self, name: &str) -> Self {
        self.bind(BindingDef::input(name))
    }

    /// Listen to `event` on the element.
    pub fn output(self, event: &str) -> Self {
        self.push_output(None, event)
    }

    /// Listen to `event` on a global target such as `window`.
    pub fn output_on(self, target: &str, event: &str) -> Self {
        self.push_output(Some(Arc::from(target)), event)
    }

    fn push_output(mut self, target: Option<Arc<str>>, event: &str) -> Self {
        if let SpecKind::Element { outputs, .. } = &mut self.kind {
            outputs.push(OutputDef {
                target,
                event_name: Arc::from(event),
            });
        }
        self
    }

    /// Make the element a component host rendering `view`.
    pub fn component_view(mut self, view: Arc<ViewDefinition>) -> Self {
        if let SpecKind::Element { component_view, .. } = &mut self.kind {
            *component_view = Some(view);
        }
        self
    }

    fn flags(&self) -> NodeFlags {
        let mut flags = match &self.kind {
            SpecKind::Element {
                outputs,
                component_view,
                ..
            } => {
                let mut f = NodeFlags::TYPE_ELEMENT;
                if component_view.is_some() {
                    f |= NodeFlags::COMPONENT_HOST;
                }
                if !outputs.is_empty() {
                    f |= NodeFlags::HAS_OUTPUTS;
                }
                f
            }
            SpecKind::Text { .. } => NodeFlags::TYPE_TEXT,
            SpecKind::Anchor { template } => {
                if template.is_some() {
                    NodeFlags::TYPE_ANCHOR | NodeFlags::EMBEDDED_TEMPLATE
                } else {
                    NodeFlags::TYPE_ANCHOR
                }
            }
            SpecKind::Provider { component, .. } => {
                if *component {
                    NodeFlags::TYPE_DIRECTIVE | NodeFlags::TYPE_COMPONENT
                } else {
                    NodeFlags::TYPE_DIRECTIVE
                }
            }
        };
        if !self.bindings.is_empty() {
            flags |= NodeFlags::HAS_BINDINGS;
        }
        flags
    }

    fn allows_binding(&self, kind: BindingKind) -> bool {
        match self.kind {
            SpecKind::Element { .. } => matches!(
                kind,
                BindingKind::Property | BindingKind::Attribute | BindingKind::Class | BindingKind::Style
            ),
            SpecKind::Text { .. } => kind == BindingKind::Text,
            SpecKind::Anchor { .. } => false,
            SpecKind::Provider { .. } => kind == BindingKind::Input,
        }
    }
}

/// Assembles a [`ViewDefinition`] from node specs and evaluators.
#[derive(Default)]
pub struct ViewDefinitionBuilder {
    nodes: Vec<NodeSpec>,
    update_directives: Option<UpdateFn>,
    update_renderer: Option<UpdateFn>,
    handle_event: Option<HandleEventFn>,
    flags: ViewFlags,
}

impl ViewDefinitionBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next node in pre-order.
    pub fn node(mut self, spec: NodeSpec) -> Self {
        self.nodes.push(spec);
        self
    }

    /// Append several nodes in pre-order.
    pub fn nodes(mut self, specs: impl IntoIterator<Item = NodeSpec>) -> Self {
        self.nodes.extend(specs);
        self
    }

    /// Evaluator for directive inputs.
    pub fn update_directives<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Bindings, &Scope<'_>) + Send + Sync + 'static,
    {
        self.update_directives = Some(Arc::new(f));
        self
    }

    /// Evaluator for element and text bindings.
    pub fn update_renderer<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Bindings, &Scope<'_>) + Send + Sync + 'static,
    {
        self.update_renderer = Some(Arc::new(f));
        self
    }

    /// Event dispatcher for the outputs declared in this view.
    pub fn handle_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut EventScope<'_>, usize, &str, &Value) -> bool + Send + Sync + 'static,
    {
        self.handle_event = Some(Arc::new(f));
        self
    }

    /// Definition flags.
    pub fn flags(mut self, flags: ViewFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Validate the node list and produce the definition.
    pub fn build(self) -> Result<ViewDefinition, BuildError> {
        let total = self.nodes.len();
        let mut nodes: Vec<NodeDef> = Vec::with_capacity(total);
        // (index, end) of the open ancestors
        let mut open: Vec<(usize, usize)> = Vec::new();
        let mut binding_index = 0;
        let mut root_nodes = Vec::new();
        let mut node_flags = NodeFlags::empty();

        for (i, spec) in self.nodes.into_iter().enumerate() {
            let Some(end) = i.checked_add(spec.child_count).filter(|&e| e < total) else {
                return Err(BuildError::structure(
                    i,
                    format!("child count {} runs past the last node", spec.child_count),
                ));
            };
            while open.last().is_some_and(|&(_, parent_end)| i > parent_end) {
                open.pop();
            }
            let parent = open.last().copied();
            if let Some((p, parent_end)) = parent {
                if end > parent_end {
                    return Err(BuildError::structure(
                        i,
                        format!("subtree exceeds the range of parent {p}"),
                    ));
                }
            }
            let flags = spec.flags();
            let parent_index = parent.map(|(p, _)| p);

            match &spec.kind {
                SpecKind::Text { .. } | SpecKind::Provider { .. } if spec.child_count > 0 => {
                    return Err(BuildError::structure(i, "text and provider nodes cannot have children"));
                }
                SpecKind::Provider { component, .. } => {
                    let parent_flags = parent_index.map(|p| nodes[p].flags).unwrap_or_default();
                    if !parent_flags.intersects(NodeFlags::TYPE_ELEMENT | NodeFlags::TYPE_ANCHOR) {
                        return Err(BuildError::structure(
                            i,
                            "providers must be placed on an element or an anchor",
                        ));
                    }
                    if *component && !parent_flags.contains(NodeFlags::COMPONENT_HOST) {
                        return Err(BuildError::structure(
                            i,
                            "component providers must be placed on a component host element",
                        ));
                    }
                }
                _ => {}
            }
            if let Some(p) = parent_index {
                if nodes[p].flags.contains(NodeFlags::TYPE_ANCHOR)
                    && !flags.contains(NodeFlags::TYPE_DIRECTIVE)
                {
                    return Err(BuildError::structure(i, "anchors may only contain directives"));
                }
            }
            if let Some(bad) = spec.bindings.iter().find(|b| !spec.allows_binding(b.kind)) {
                return Err(BuildError::structure(
                    i,
                    format!("binding {:?} `{}` is not allowed on this node", bad.kind, bad.name),
                ));
            }

            if parent_index.is_none() {
                root_nodes.push(i);
            }
            if spec.child_count > 0 {
                open.push((i, end));
            }
            node_flags |= flags;
            let NodeSpec {
                child_count,
                bindings,
                kind,
            } = spec;
            let node_binding_index = binding_index;
            binding_index += bindings.len();
            nodes.push(NodeDef {
                index: i,
                parent: parent_index,
                child_count,
                binding_index: node_binding_index,
                bindings,
                flags,
                child_flags: NodeFlags::empty(),
                kind: kind.into_node_kind(),
            });
        }

        for i in (0..nodes.len()).rev() {
            if let Some(p) = nodes[i].parent {
                let inherited = nodes[i].flags | nodes[i].child_flags;
                nodes[p].child_flags |= inherited;
            }
        }

        for node in &nodes {
            if !node.flags.contains(NodeFlags::COMPONENT_HOST) {
                continue;
            }
            let components = nodes
                .iter()
                .filter(|n| n.parent == Some(node.index) && n.flags.contains(NodeFlags::TYPE_COMPONENT))
                .count();
            if components != 1 {
                return Err(BuildError::structure(
                    node.index,
                    format!("component host must carry exactly one component provider, found {components}"),
                ));
            }
        }

        Ok(ViewDefinition {
            nodes,
            update_directives: self.update_directives,
            update_renderer: self.update_renderer,
            handle_event: self.handle_event,
            flags: self.flags,
            node_flags,
            binding_count: binding_index,
            root_nodes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;
    impl Directive for Noop {}

    fn reason(err: BuildError) -> (usize, String) {
        let BuildError::InvalidViewStructure { index, reason } = err;
        (index, reason)
    }

    #[test]
    fn recovers_parents_and_child_flags() {
        // <div><span>{{x}}</span><p></p></div><b></b>
        let def = ViewDefinitionBuilder::new()
            .node(NodeSpec::element(3, "div"))
            .node(NodeSpec::element(1, "span"))
            .node(NodeSpec::text(&["", ""]))
            .node(NodeSpec::element(0, "p"))
            .node(NodeSpec::element(0, "b"))
            .build()
            .unwrap();
        let parents: Vec<_> = def.nodes().iter().map(NodeDef::parent).collect();
        assert_eq!(parents, vec![None, Some(0), Some(1), Some(0), None]);
        assert_eq!(def.root_nodes(), &[0, 4]);
        assert!(def.nodes()[0].child_flags().contains(NodeFlags::TYPE_TEXT));
        assert!(!def.nodes()[3].child_flags().contains(NodeFlags::TYPE_TEXT));
        assert_eq!(def.binding_count(), 1);
        assert!(def.node_flags().contains(NodeFlags::HAS_BINDINGS));
    }

    #[test]
    fn binding_indices_are_contiguous() {
        let def = ViewDefinitionBuilder::new()
            .node(NodeSpec::element(0, "a").bind(BindingDef::property("href")).bind(BindingDef::class("on")))
            .node(NodeSpec::text(&["", " and ", ""]))
            .build()
            .unwrap();
        assert_eq!(def.nodes()[0].binding_index(), 0);
        assert_eq!(def.nodes()[1].binding_index(), 2);
        assert_eq!(def.binding_count(), 4);
    }

    #[test]
    fn child_count_past_the_end_is_rejected() {
        let err = ViewDefinitionBuilder::new()
            .node(NodeSpec::element(2, "div"))
            .node(NodeSpec::element(0, "span"))
            .build()
            .unwrap_err();
        assert_eq!(reason(err).0, 0);
    }

    #[test]
    fn huge_child_count_is_rejected() {
        let err = ViewDefinitionBuilder::new()
            .node(NodeSpec::element(1, "div"))
            .node(NodeSpec::element(usize::MAX, "span"))
            .build()
            .unwrap_err();
        assert_eq!(reason(err).0, 1);
    }

    #[test]
    fn subtree_outside_parent_is_rejected() {
        let err = ViewDefinitionBuilder::new()
            .node(NodeSpec::element(1, "div"))
            .node(NodeSpec::element(1, "span"))
            .node(NodeSpec::element(0, "i"))
            .build()
            .unwrap_err();
        assert_eq!(reason(err).0, 1);
    }

    #[test]
    fn providers_need_an_element_or_anchor() {
        let err = ViewDefinitionBuilder::new()
            .node(NodeSpec::directive("Noop", || Noop))
            .build()
            .unwrap_err();
        assert_eq!(reason(err).0, 0);

        let ok = ViewDefinitionBuilder::new()
            .node(NodeSpec::anchor(1, None))
            .node(NodeSpec::directive("Noop", || Noop))
            .build();
        assert!(ok.is_ok());
    }

    #[test]
    fn anchors_only_hold_directives() {
        let err = ViewDefinitionBuilder::new()
            .node(NodeSpec::anchor(1, None))
            .node(NodeSpec::element(0, "div"))
            .build()
            .unwrap_err();
        assert_eq!(reason(err).0, 1);
    }

    #[test]
    fn component_hosts_need_exactly_one_component() {
        let view = Arc::new(ViewDefinitionBuilder::new().build().unwrap());
        let missing = ViewDefinitionBuilder::new()
            .node(NodeSpec::element(0, "my-cmp").component_view(view.clone()))
            .build()
            .unwrap_err();
        assert_eq!(reason(missing).0, 0);

        let misplaced = ViewDefinitionBuilder::new()
            .node(NodeSpec::element(1, "div"))
            .node(NodeSpec::component("Noop", || Noop))
            .build()
            .unwrap_err();
        assert_eq!(reason(misplaced).0, 1);

        let def = ViewDefinitionBuilder::new()
            .node(NodeSpec::element(1, "my-cmp").component_view(view))
            .node(NodeSpec::component("Noop", || Noop))
            .build()
            .unwrap();
        assert!(def.nodes()[0].flags().contains(NodeFlags::COMPONENT_HOST));
        assert!(def.nodes()[1].flags().contains(NodeFlags::TYPE_COMPONENT));
    }

    #[test]
    fn bindings_must_fit_the_node_kind() {
        let err = ViewDefinitionBuilder::new()
            .node(NodeSpec::element(0, "div").input("value"))
            .build()
            .unwrap_err();
        assert!(reason(err).1.contains("Input"));

        let err = ViewDefinitionBuilder::new()
            .node(NodeSpec::anchor(0, None).bind(BindingDef::property("x")))
            .build()
            .unwrap_err();
        assert_eq!(reason(err).0, 0);
    }

    #[test]
    fn text_nodes_cannot_have_children() {
        let mut text = NodeSpec::text(&["a"]);
        text.child_count = 1;
        let err = ViewDefinitionBuilder::new()
            .node(NodeSpec::element(2, "div"))
            .node(text)
            .node(NodeSpec::element(0, "i"))
            .build()
            .unwrap_err();
        assert_eq!(reason(err).0, 1);
    }
}
