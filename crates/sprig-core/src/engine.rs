//! The view engine: creates views, owns them, and routes events.
//!
//! Change detection lives in [`check`](crate::check) and embedded-view
//! management in [`container`](crate::container); both extend [`Engine`].

use crate::def::{NodeFlags, NodeKind, ViewDefinition, ViewFlags};
use crate::directive::Directive;
use crate::dom::{Document, ListenerId, NodeHandle};
use crate::error::{BuildError, CheckError, ViewError};
use crate::renderer::{ListenTarget, RenderStrategy};
use crate::scope::EventScope;
use crate::value::Value;
use crate::view::{ComponentSource, NodeData, ViewArena, ViewData, ViewId, ViewKind, ViewState};
use std::collections::HashMap;
use std::sync::Arc;

/// A function producing a view definition, cached by
/// [`Engine::resolve_definition`].
pub type ViewDefinitionFactory = fn() -> Result<ViewDefinition, BuildError>;

/// Engine configuration.
///
/// # Example
///
/// ```rust,ignore
/// let engine = Engine::new(EngineOptions {
///     debug_info: true,
///     ..Default::default()
/// });
/// ```
#[derive(Debug)]
pub struct EngineOptions {
    /// Run the verification pass after every [`Engine::tick`].
    /// Defaults to `cfg!(debug_assertions)`.
    pub dev_mode: bool,
    /// Reflect property and input bindings into `ng-reflect-*` attributes.
    pub debug_info: bool,
    /// How rendering operations reach the platform.
    pub strategy: RenderStrategy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            dev_mode: cfg!(debug_assertions),
            debug_info: false,
            strategy: RenderStrategy::default(),
        }
    }
}

#[derive(Debug, Clone)]
struct ListenerBinding {
    view: ViewId,
    node: usize,
    event: Arc<str>,
}

/// Where a view's component instance is stored.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ComponentLocation {
    Owned(ViewId),
    Provider(ViewId, usize),
}

/// Owns every view and the rendering backend.
pub struct Engine {
    pub(crate) views: ViewArena,
    pub(crate) backend: RenderStrategy,
    pub(crate) dev_mode: bool,
    pub(crate) debug_info: bool,
    listeners: HashMap<ListenerId, ListenerBinding>,
    definitions: HashMap<usize, Arc<ViewDefinition>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl Engine {
    /// Create an engine.
    pub fn new(options: EngineOptions) -> Self {
        Self {
            views: ViewArena::default(),
            backend: options.strategy,
            dev_mode: options.dev_mode,
            debug_info: options.debug_info,
            listeners: HashMap::new(),
            definitions: HashMap::new(),
        }
    }

    /// Whether [`tick`](Engine::tick) runs the verification pass.
    pub fn dev_mode(&self) -> bool {
        self.dev_mode
    }

    /// Whether bindings are reflected into debug attributes.
    pub fn debug_info(&self) -> bool {
        self.debug_info
    }

    /// The rendering backend.
    pub fn strategy(&self) -> &RenderStrategy {
        &self.backend
    }

    /// The document views render into, when the backend exposes one.
    pub fn document(&self) -> Option<&Document> {
        self.backend.document()
    }

    /// Build a definition once and reuse it on later calls with the same
    /// factory.
    pub fn resolve_definition(
        &mut self,
        factory: ViewDefinitionFactory,
    ) -> Result<Arc<ViewDefinition>, BuildError> {
        let key = factory as usize;
        if let Some(def) = self.definitions.get(&key) {
            return Ok(def.clone());
        }
        let def = Arc::new(factory()?);
        self.definitions.insert(key, def.clone());
        Ok(def)
    }

    /// Instantiate `def` as a root view under the backend's root element,
    /// with `component` as the instance its bindings evaluate against.
    ///
    /// No bindings are applied until the first check.
    pub fn create_root_view(&mut self, def: Arc<ViewDefinition>, component: Box<dyn Directive>) -> ViewId {
        let host = self.backend.root_element();
        self.create_view(
            def,
            ViewKind::Root,
            None,
            None,
            Value::Null,
            ComponentSource::Owned(component),
            Some(host),
        )
    }

    /// Create a view, its render nodes, its listeners and its component
    /// views. Root render nodes are appended to `host` when given.
    pub(crate) fn create_view(
        &mut self,
        def: Arc<ViewDefinition>,
        kind: ViewKind,
        parent: Option<ViewId>,
        parent_node: Option<usize>,
        context: Value,
        component: ComponentSource,
        host: Option<NodeHandle>,
    ) -> ViewId {
        let mut nodes: Vec<NodeData> = Vec::with_capacity(def.nodes.len());
        for node in &def.nodes {
            let parent_render = match node.parent {
                Some(p) => nodes.get(p).and_then(NodeData::render),
                None => host,
            };
            let data = match &node.kind {
                NodeKind::Element(el) => {
                    let render = self.backend.create_element(&el.name);
                    for (name, value) in &el.attrs {
                        self.backend.set_attribute(render, name, value);
                    }
                    NodeData::Element {
                        render,
                        component_view: None,
                    }
                }
                NodeKind::Text(text) => {
                    let initial = text.constants.first().map_or("", |c| &**c);
                    NodeData::Text {
                        render: self.backend.create_text(initial),
                    }
                }
                NodeKind::Anchor(_) => NodeData::Anchor {
                    render: self.backend.create_comment(""),
                    views: Vec::new(),
                },
                NodeKind::Provider(provider) => NodeData::Provider {
                    instance: Some((provider.factory)()),
                },
            };
            if let (Some(render), Some(parent_render)) = (data.render(), parent_render) {
                self.backend.append_child(parent_render, render);
            }
            nodes.push(data);
        }

        let id = self.views.insert(ViewData {
            old_values: vec![Value::Null; def.binding_count],
            def: def.clone(),
            kind,
            parent,
            parent_node,
            context,
            component,
            nodes,
            state: ViewState::initial(),
            listeners: Vec::new(),
        });

        for node in &def.nodes {
            let NodeKind::Element(el) = &node.kind else {
                continue;
            };
            let Some(render) = self.render_node(id, node.index) else {
                continue;
            };
            for output in &el.outputs {
                let target = match &output.target {
                    Some(t) => ListenTarget::Global(t.to_string()),
                    None => ListenTarget::Node(render),
                };
                let listener = self.backend.listen(target, &output.event_name);
                self.listeners.insert(
                    listener,
                    ListenerBinding {
                        view: id,
                        node: node.index,
                        event: Arc::from(output.full_name()),
                    },
                );
                if let Some(view) = self.views.get_mut(id) {
                    view.listeners.push(listener);
                }
            }

            let Some(component_def) = &el.component_view else {
                continue;
            };
            let provider = def
                .nodes
                .iter()
                .find(|n| n.parent == Some(node.index) && n.flags.contains(NodeFlags::TYPE_COMPONENT))
                .map(|n| n.index);
            let source = match provider {
                Some(p) => ComponentSource::Provider { view: id, node: p },
                None => ComponentSource::None,
            };
            let child = self.create_view(
                component_def.clone(),
                ViewKind::Component,
                Some(id),
                Some(node.index),
                Value::Null,
                source,
                Some(render),
            );
            if let Some(NodeData::Element { component_view, .. }) =
                self.views.get_mut(id).and_then(|v| v.nodes.get_mut(node.index))
            {
                *component_view = Some(child);
            }
        }

        tracing::debug!(view = ?id, ?kind, nodes = def.nodes.len(), "view created");
        id
    }

    /// Update the view, then verify it when dev mode is on.
    pub fn tick(&mut self, id: ViewId) -> Result<(), CheckError> {
        self.check_and_update_view(id)?;
        if self.dev_mode {
            self.check_no_changes_view(id)?;
        }
        Ok(())
    }

    /// Destroy a view and everything it hosts.
    ///
    /// Embedded views are first removed from their container; root and
    /// component views have their root nodes unlinked from the document.
    pub fn destroy_view(&mut self, id: ViewId) -> Result<(), ViewError> {
        let _span = tracing::debug_span!("destroy_view", view = ?id).entered();
        let view = self.live(id)?;
        match (view.kind, view.parent, view.parent_node) {
            (ViewKind::Embedded, Some(parent), Some(anchor)) => {
                let index = self
                    .anchor_views(parent, anchor)?
                    .iter()
                    .position(|v| *v == id);
                if let Some(index) = index {
                    self.detach_embedded_view(parent, anchor, index)?;
                }
            }
            (ViewKind::Embedded, _, _) => {}
            (ViewKind::Component, parent, host) => {
                self.render_detach(id);
                if let (Some(parent), Some(host)) = (parent, host) {
                    if let Some(NodeData::Element { component_view, .. }) =
                        self.views.get_mut(parent).and_then(|v| v.nodes.get_mut(host))
                    {
                        *component_view = None;
                    }
                }
            }
            (ViewKind::Root, _, _) => self.render_detach(id),
        }
        self.destroy_internal(id);
        Ok(())
    }

    /// Tear down a view that is no longer reachable from any container.
    pub(crate) fn destroy_internal(&mut self, id: ViewId) {
        let Some(view) = self.views.get_mut(id) else {
            return;
        };
        if view.state.contains(ViewState::DESTROYED) {
            return;
        }
        view.state.insert(ViewState::DESTROYED);

        let hosted: Vec<ViewId> = view
            .nodes
            .iter()
            .flat_map(|n| match n {
                NodeData::Anchor { views, .. } => views.clone(),
                _ => Vec::new(),
            })
            .collect();
        let components: Vec<ViewId> = view
            .nodes
            .iter()
            .filter_map(|n| match n {
                NodeData::Element { component_view, .. } => *component_view,
                _ => None,
            })
            .collect();
        for child in hosted.into_iter().chain(components) {
            self.destroy_internal(child);
        }

        let Some(mut view) = self.views.remove(id) else {
            return;
        };
        for node in &mut view.nodes {
            if let NodeData::Provider {
                instance: Some(instance),
            } = node
            {
                instance.on_destroy();
            }
        }
        if let ComponentSource::Owned(component) = &mut view.component {
            component.on_destroy();
        }
        for listener in view.listeners.drain(..) {
            self.backend.unlisten(listener);
            self.listeners.remove(&listener);
        }
        for node in &view.nodes {
            if let Some(render) = node.render() {
                self.backend.destroy_node(render);
            }
        }
        tracing::debug!(view = ?id, "view destroyed");
    }

    /// Deliver an event received through a registered listener.
    ///
    /// Returns `false` when the handler asked to prevent the default action.
    pub fn dispatch_event(&mut self, listener: ListenerId, event: &Value) -> Result<bool, ViewError> {
        let binding = self
            .listeners
            .get(&listener)
            .cloned()
            .ok_or(ViewError::UnknownListener(listener))?;
        self.dispatch_to_node(binding.view, binding.node, &binding.event, event)
    }

    /// Run the view's event handler for `event_name` on `node`, then mark
    /// the view and its ancestors for check.
    pub fn dispatch_to_node(
        &mut self,
        view: ViewId,
        node: usize,
        event_name: &str,
        event: &Value,
    ) -> Result<bool, ViewError> {
        let data = self.live(view)?;
        if node >= data.def.nodes.len() {
            return Err(ViewError::UnknownNode { view, node });
        }
        let handler = data.def.handle_event.clone();
        let context = data.context.clone();
        let mut result = true;
        if let Some(handler) = handler {
            tracing::trace!(?view, node, event = event_name, "dispatching event");
            let component = self.component_slot_mut(view);
            let mut scope = EventScope {
                component,
                context: &context,
            };
            result = handler(&mut scope, node, event_name, event);
        }
        self.mark_for_check(view);
        Ok(result)
    }

    /// Raise `event_name` on a rendered node, bubbling to its ancestors.
    /// Returns how many listeners were dispatched.
    pub fn fire(&mut self, node: NodeHandle, event_name: &str, event: &Value) -> Result<usize, ViewError> {
        let targets = self
            .backend
            .document()
            .map(|doc| doc.fire(node, event_name))
            .unwrap_or_default();
        self.dispatch_all(targets, event)
    }

    /// Raise `event_name` on a global target such as `window`.
    pub fn fire_global(&mut self, target: &str, event_name: &str, event: &Value) -> Result<usize, ViewError> {
        let targets = self
            .backend
            .document()
            .map(|doc| doc.global_listeners(target, event_name))
            .unwrap_or_default();
        self.dispatch_all(targets, event)
    }

    fn dispatch_all(&mut self, targets: Vec<ListenerId>, event: &Value) -> Result<usize, ViewError> {
        let mut count = 0;
        for listener in targets {
            // an earlier handler may have torn the listener down
            if self.listeners.contains_key(&listener) {
                self.dispatch_event(listener, event)?;
                count += 1;
            }
        }
        Ok(count)
    }

    /// Re-enable checks on the view and every on-push ancestor.
    pub fn mark_for_check(&mut self, id: ViewId) {
        let mut current = Some(id);
        while let Some(view) = current.and_then(|c| self.views.get_mut(c)) {
            if view.def.flags.contains(ViewFlags::ON_PUSH) {
                view.state.insert(ViewState::CHECKS_ENABLED);
            }
            current = view.parent;
        }
    }

    /// Exclude a view (and its subtree) from checks run through its parent.
    pub fn detach_change_detector(&mut self, id: ViewId) -> Result<(), ViewError> {
        self.live_mut(id)?.state.remove(ViewState::ATTACHED);
        Ok(())
    }

    /// Undo [`detach_change_detector`](Engine::detach_change_detector).
    pub fn reattach_change_detector(&mut self, id: ViewId) -> Result<(), ViewError> {
        self.live_mut(id)?.state.insert(ViewState::ATTACHED);
        Ok(())
    }

    pub(crate) fn live(&self, id: ViewId) -> Result<&ViewData, ViewError> {
        self.views.get(id).ok_or(ViewError::ViewDestroyed(id))
    }

    pub(crate) fn live_mut(&mut self, id: ViewId) -> Result<&mut ViewData, ViewError> {
        self.views.get_mut(id).ok_or(ViewError::ViewDestroyed(id))
    }

    pub(crate) fn component_location(&self, id: ViewId) -> Option<ComponentLocation> {
        let mut current = id;
        loop {
            match &self.views.get(current)?.component {
                ComponentSource::None => return None,
                ComponentSource::Owned(_) => return Some(ComponentLocation::Owned(current)),
                ComponentSource::Provider { view, node } => {
                    return Some(ComponentLocation::Provider(*view, *node))
                }
                ComponentSource::Declaration(declaring) => current = *declaring,
            }
        }
    }

    pub(crate) fn component_ref(&self, id: ViewId) -> Option<&(dyn Directive + 'static)> {
        match self.component_location(id)? {
            ComponentLocation::Owned(v) => match &self.views.get(v)?.component {
                ComponentSource::Owned(c) => Some(&**c),
                _ => None,
            },
            ComponentLocation::Provider(v, n) => self.directive_dyn(v, n),
        }
    }

    fn component_slot_mut(&mut self, id: ViewId) -> Option<&mut (dyn Directive + 'static)> {
        match self.component_location(id)? {
            ComponentLocation::Owned(v) => match &mut self.views.get_mut(v)?.component {
                ComponentSource::Owned(c) => Some(&mut **c),
                _ => None,
            },
            ComponentLocation::Provider(v, n) => match self.views.get_mut(v)?.nodes.get_mut(n)? {
                NodeData::Provider {
                    instance: Some(instance),
                } => Some(&mut **instance),
                _ => None,
            },
        }
    }

    fn directive_dyn(&self, view: ViewId, node: usize) -> Option<&(dyn Directive + 'static)> {
        match self.views.get(view)?.nodes.get(node)? {
            NodeData::Provider {
                instance: Some(instance),
            } => Some(&**instance),
            _ => None,
        }
    }

    /// The component instance a view's bindings evaluate against.
    pub fn component<T: 'static>(&self, id: ViewId) -> Option<&T> {
        self.component_ref(id)?.downcast_ref::<T>()
    }

    /// Mutable access to a view's component. Changes show up on the next
    /// check; on-push views also need [`mark_for_check`](Engine::mark_for_check).
    pub fn component_mut<T: 'static>(&mut self, id: ViewId) -> Option<&mut T> {
        self.component_slot_mut(id)?.downcast_mut::<T>()
    }

    /// Directive instance of a provider node.
    pub fn directive<T: 'static>(&self, view: ViewId, node: usize) -> Option<&T> {
        self.directive_dyn(view, node)?.downcast_ref::<T>()
    }

    /// Render node of an element, text or anchor node.
    pub fn render_node(&self, view: ViewId, node: usize) -> Option<NodeHandle> {
        self.views.get(view)?.nodes.get(node)?.render()
    }

    /// Component view hosted by an element.
    pub fn component_view(&self, view: ViewId, node: usize) -> Option<ViewId> {
        match self.views.get(view)?.nodes.get(node)? {
            NodeData::Element { component_view, .. } => *component_view,
            _ => None,
        }
    }

    /// Lifecycle and check state of a view.
    pub fn view_state(&self, id: ViewId) -> Option<ViewState> {
        self.views.get(id).map(|v| v.state)
    }

    /// How a view was created.
    pub fn view_kind(&self, id: ViewId) -> Option<ViewKind> {
        self.views.get(id).map(|v| v.kind)
    }

    /// Definition a view was instantiated from.
    pub fn definition(&self, id: ViewId) -> Option<&Arc<ViewDefinition>> {
        self.views.get(id).map(|v| &v.def)
    }

    /// Context of an embedded view.
    pub fn context(&self, id: ViewId) -> Option<&Value> {
        self.views.get(id).map(|v| &v.context)
    }

    /// Parent view and the anchor or host node in it.
    pub fn parent(&self, id: ViewId) -> Option<(ViewId, usize)> {
        let view = self.views.get(id)?;
        Some((view.parent?, view.parent_node?))
    }

    /// Whether the handle refers to a live view.
    pub fn is_alive(&self, id: ViewId) -> bool {
        self.views.contains(id)
    }

    /// Number of live views.
    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// Number of listeners the engine has registered with the backend.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("views", &self.views.len())
            .field("backend", &self.backend)
            .field("dev_mode", &self.dev_mode)
            .field("debug_info", &self.debug_info)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{NodeSpec, ViewDefinitionBuilder};
    use crate::def::BindingDef;
    use crate::testing::TestView;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Clicks {
        count: i64,
        keys: Vec<String>,
    }

    impl Directive for Clicks {}

    // <button (click) (window:keydown)>Count: {{count}}</button>
    fn clicker(flags: ViewFlags) -> ViewDefinition {
        ViewDefinitionBuilder::new()
            .node(
                NodeSpec::element(1, "button")
                    .output("click")
                    .output_on("window", "keydown"),
            )
            .node(NodeSpec::text(&["Count: ", ""]))
            .update_renderer(|b, scope| b.value(1, scope.component::<Clicks>().unwrap().count))
            .handle_event(|scope, _node, event, payload| {
                let Some(clicks) = scope.component_mut::<Clicks>() else {
                    return true;
                };
                match event {
                    "click" => {
                        clicks.count += 1;
                        true
                    }
                    "window:keydown" => {
                        let key = payload.get("key").and_then(Value::as_str).unwrap_or_default();
                        clicks.keys.push(key.to_string());
                        false
                    }
                    _ => true,
                }
            })
            .flags(flags)
            .build()
            .unwrap()
    }

    #[test]
    fn root_views_render_under_the_document_root() {
        let mut view = TestView::new(clicker(ViewFlags::empty()), Clicks::default());
        view.detect_changes().unwrap();
        let root = view.root();
        let engine = view.engine();
        assert_eq!(engine.view_kind(root), Some(ViewKind::Root));
        assert_eq!(engine.listener_count(), 2);
        let button = engine.render_node(root, 0).unwrap();
        let doc = view.document().unwrap();
        assert_eq!(doc.parent_node(button), Some(doc.root()));
        assert_eq!(view.html(), "<button>Count: 0</button>");
    }

    #[test]
    fn events_bubble_to_element_listeners() {
        let mut view = TestView::new(clicker(ViewFlags::empty()), Clicks::default());
        view.detect_changes().unwrap();
        let root = view.root();
        // raised on the text node, handled by the button
        assert_eq!(view.fire(root, 1, "click", Value::Null).unwrap(), 1);
        assert_eq!(view.fire(root, 0, "click", Value::Null).unwrap(), 1);
        assert_eq!(view.fire(root, 0, "dblclick", Value::Null).unwrap(), 0);
        view.detect_changes().unwrap();
        assert_eq!(view.html(), "<button>Count: 2</button>");
    }

    #[test]
    fn global_listeners_receive_target_events() {
        let mut view = TestView::new(clicker(ViewFlags::empty()), Clicks::default());
        view.detect_changes().unwrap();
        let key = Value::map([("key", "q")]);
        assert_eq!(view.fire_global("window", "keydown", key.clone()).unwrap(), 1);
        assert_eq!(view.fire_global("document", "keydown", key).unwrap(), 0);
        assert_eq!(view.component::<Clicks>().unwrap().keys, ["q"]);
    }

    #[test]
    fn handlers_can_prevent_the_default_action() {
        let mut view = TestView::new(clicker(ViewFlags::empty()), Clicks::default());
        let root = view.root();
        let engine = view.engine_mut();
        assert_eq!(engine.dispatch_to_node(root, 0, "click", &Value::Null), Ok(true));
        assert_eq!(
            engine.dispatch_to_node(root, 0, "window:keydown", &Value::Null),
            Ok(false)
        );
        assert_eq!(
            engine.dispatch_to_node(root, 7, "click", &Value::Null),
            Err(ViewError::UnknownNode { view: root, node: 7 })
        );
        let unknown = ListenerId::from_raw(999);
        assert_eq!(
            engine.dispatch_event(unknown, &Value::Null),
            Err(ViewError::UnknownListener(unknown))
        );
    }

    #[test]
    fn events_mark_on_push_views_for_check() {
        let child = Arc::new(clicker(ViewFlags::ON_PUSH));
        let def = ViewDefinitionBuilder::new()
            .node(NodeSpec::element(1, "clicker").component_view(child))
            .node(NodeSpec::component("Clicks", Clicks::default))
            .build()
            .unwrap();
        let mut view = TestView::new(def, Clicks::default());
        view.detect_changes().unwrap();
        let child = view.engine().component_view(view.root(), 0).unwrap();
        assert_eq!(view.engine().view_kind(child), Some(ViewKind::Component));

        view.engine_mut().component_mut::<Clicks>(child).unwrap().count = 10;
        view.detect_changes().unwrap();
        assert_eq!(view.html(), "<clicker><button>Count: 0</button></clicker>");

        view.fire(child, 0, "click", Value::Null).unwrap();
        view.detect_changes().unwrap();
        assert_eq!(view.html(), "<clicker><button>Count: 11</button></clicker>");
        // the root component is untouched
        assert_eq!(view.component::<Clicks>().unwrap().count, 0);
    }

    #[test]
    fn destroying_a_component_view_empties_its_host() {
        let def = ViewDefinitionBuilder::new()
            .node(NodeSpec::element(1, "clicker").component_view(Arc::new(clicker(ViewFlags::empty()))))
            .node(NodeSpec::component("Clicks", Clicks::default))
            .build()
            .unwrap();
        let mut view = TestView::new(def, Clicks::default());
        view.detect_changes().unwrap();
        let root = view.root();
        let child = view.engine().component_view(root, 0).unwrap();

        view.engine_mut().destroy_view(child).unwrap();
        assert_eq!(view.engine().component_view(root, 0), None);
        assert_eq!(view.engine().listener_count(), 0);
        assert_eq!(view.html(), "<clicker></clicker>");
        view.detect_changes().unwrap();
        assert_eq!(
            view.engine_mut().destroy_view(child),
            Err(ViewError::ViewDestroyed(child))
        );
    }

    #[test]
    fn handles_of_destroyed_views_stay_dead() {
        let mut engine = Engine::default();
        let def = Arc::new(clicker(ViewFlags::empty()));
        let first = engine.create_root_view(def.clone(), Box::new(Clicks::default()));
        engine.destroy_view(first).unwrap();
        let second = engine.create_root_view(def, Box::new(Clicks::default()));
        assert_ne!(first, second);
        assert!(!engine.is_alive(first));
        assert!(engine.is_alive(second));
        assert!(engine.component::<Clicks>(first).is_none());
        assert_eq!(engine.view_count(), 1);
    }

    #[test]
    fn verification_only_runs_in_dev_mode() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let def = Arc::new(
            ViewDefinitionBuilder::new()
                .node(NodeSpec::element(0, "div").bind(BindingDef::property("n")))
                .update_renderer(move |b, _| b.value(0, counter.fetch_add(1, Ordering::SeqCst)))
                .build()
                .unwrap(),
        );
        let mut engine = Engine::new(EngineOptions {
            dev_mode: false,
            ..EngineOptions::default()
        });
        let root = engine.create_root_view(def, Box::new(Clicks::default()));
        engine.tick(root).unwrap();
        engine.tick(root).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(engine.check_no_changes_view(root).is_err());
    }

    fn shared_definition() -> Result<ViewDefinition, BuildError> {
        ViewDefinitionBuilder::new().node(NodeSpec::element(0, "hr")).build()
    }

    #[test]
    fn definitions_are_resolved_once() {
        let mut engine = Engine::default();
        let a = engine.resolve_definition(shared_definition).unwrap();
        let b = engine.resolve_definition(shared_definition).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
