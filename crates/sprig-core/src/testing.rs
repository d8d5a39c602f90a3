use crate::def::ViewDefinition;
use crate::directive::Directive;
use crate::dom::{Document, ListenerId, NodeHandle};
use crate::engine::{Engine, EngineOptions};
use crate::error::{CheckError, ViewError};
use crate::present::DocumentView;
use crate::renderer::{ListenTarget, RenderStrategy, Renderer};
use crate::value::Value;
use crate::view::ViewId;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::Widget;
use std::sync::{Arc, Mutex};

/// One call made by the engine to a [`Renderer`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOp {
    /// `create_element` with the tag name.
    CreateElement(String),
    /// `create_text` with the initial text.
    CreateText(String),
    /// `create_comment`.
    CreateComment,
    /// `append_child`.
    AppendChild,
    /// `insert_before`.
    InsertBefore,
    /// `remove_child`.
    RemoveChild,
    /// `set_attribute`.
    SetAttribute { name: String, value: String },
    /// `remove_attribute` with the attribute name.
    RemoveAttribute(String),
    /// `add_class` with the class name.
    AddClass(String),
    /// `remove_class` with the class name.
    RemoveClass(String),
    /// `set_style` with the value as written.
    SetStyle { name: String, value: String },
    /// `remove_style` with the style name.
    RemoveStyle(String),
    /// `set_property` with the value stringified.
    SetProperty { name: String, value: String },
    /// `set_value` on a text or comment node.
    SetValue(String),
    /// `listen` with the event name.
    Listen(String),
    /// `unlisten`.
    Unlisten,
    /// `destroy_node`.
    DestroyNode,
    /// `set_binding_debug_info`.
    DebugInfo { name: String, value: String },
}

/// Shared view of the operations a [`RecordingRenderer`] has seen.
#[derive(Debug, Clone, Default)]
pub struct RenderLog(Arc<Mutex<Vec<RenderOp>>>);

impl RenderLog {
    /// Every operation recorded so far.
    pub fn ops(&self) -> Vec<RenderOp> {
        self.0.lock().map(|ops| ops.clone()).unwrap_or_default()
    }

    /// Drain the recorded operations.
    pub fn take(&self) -> Vec<RenderOp> {
        self.0
            .lock()
            .map(|mut ops| std::mem::take(&mut *ops))
            .unwrap_or_default()
    }

    /// Number of recorded operations matching `pred`.
    pub fn count(&self, pred: impl Fn(&RenderOp) -> bool) -> usize {
        self.0
            .lock()
            .map(|ops| ops.iter().filter(|op| pred(op)).count())
            .unwrap_or_default()
    }

    fn push(&self, op: RenderOp) {
        if let Ok(mut ops) = self.0.lock() {
            ops.push(op);
        }
    }
}

/// A renderer that applies operations to a [`Document`] and records them.
///
/// ```rust,ignore
/// let (renderer, log) = RecordingRenderer::new();
/// let mut engine = Engine::new(EngineOptions {
///     strategy: RenderStrategy::Mediated(Box::new(renderer)),
///     ..Default::default()
/// });
/// // ...
/// assert_eq!(log.count(|op| matches!(op, RenderOp::SetValue(_))), 1);
/// ```
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    document: Document,
    log: RenderLog,
}

impl RecordingRenderer {
    /// A renderer over a fresh document and the log it writes to.
    pub fn new() -> (Self, RenderLog) {
        let renderer = Self::default();
        let log = renderer.log.clone();
        (renderer, log)
    }
}

impl Renderer for RecordingRenderer {
    fn root_element(&mut self) -> NodeHandle {
        self.document.root()
    }

    fn create_element(&mut self, name: &str) -> NodeHandle {
        self.log.push(RenderOp::CreateElement(name.to_string()));
        self.document.create_element(name)
    }

    fn create_text(&mut self, value: &str) -> NodeHandle {
        self.log.push(RenderOp::CreateText(value.to_string()));
        self.document.create_text(value)
    }

    fn create_comment(&mut self, value: &str) -> NodeHandle {
        self.log.push(RenderOp::CreateComment);
        self.document.create_comment(value)
    }

    fn append_child(&mut self, parent: NodeHandle, child: NodeHandle) {
        self.log.push(RenderOp::AppendChild);
        self.document.append_child(parent, child);
    }

    fn insert_before(&mut self, parent: NodeHandle, child: NodeHandle, reference: NodeHandle) {
        self.log.push(RenderOp::InsertBefore);
        self.document.insert_before(parent, child, reference);
    }

    fn remove_child(&mut self, parent: NodeHandle, child: NodeHandle) {
        self.log.push(RenderOp::RemoveChild);
        self.document.remove_child(parent, child);
    }

    fn parent_node(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.document.parent_node(node)
    }

    fn next_sibling(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.document.next_sibling(node)
    }

    fn set_attribute(&mut self, el: NodeHandle, name: &str, value: &str) {
        self.log.push(RenderOp::SetAttribute {
            name: name.to_string(),
            value: value.to_string(),
        });
        self.document.set_attribute(el, name, value);
    }

    fn remove_attribute(&mut self, el: NodeHandle, name: &str) {
        self.log.push(RenderOp::RemoveAttribute(name.to_string()));
        self.document.remove_attribute(el, name);
    }

    fn add_class(&mut self, el: NodeHandle, name: &str) {
        self.log.push(RenderOp::AddClass(name.to_string()));
        self.document.add_class(el, name);
    }

    fn remove_class(&mut self, el: NodeHandle, name: &str) {
        self.log.push(RenderOp::RemoveClass(name.to_string()));
        self.document.remove_class(el, name);
    }

    fn set_style(&mut self, el: NodeHandle, style: &str, value: &str) {
        self.log.push(RenderOp::SetStyle {
            name: style.to_string(),
            value: value.to_string(),
        });
        self.document.set_style(el, style, value);
    }

    fn remove_style(&mut self, el: NodeHandle, style: &str) {
        self.log.push(RenderOp::RemoveStyle(style.to_string()));
        self.document.remove_style(el, style);
    }

    fn set_property(&mut self, el: NodeHandle, name: &str, value: &Value) {
        self.log.push(RenderOp::SetProperty {
            name: name.to_string(),
            value: value.render_string(),
        });
        self.document.set_property(el, name, value);
    }

    fn set_value(&mut self, node: NodeHandle, value: &str) {
        self.log.push(RenderOp::SetValue(value.to_string()));
        self.document.set_value(node, value);
    }

    fn listen(&mut self, target: ListenTarget, event: &str) -> ListenerId {
        self.log.push(RenderOp::Listen(event.to_string()));
        self.document.listen(target, event)
    }

    fn unlisten(&mut self, listener: ListenerId) {
        self.log.push(RenderOp::Unlisten);
        self.document.unlisten(listener);
    }

    fn destroy_node(&mut self, node: NodeHandle) {
        self.log.push(RenderOp::DestroyNode);
        self.document.destroy_node(node);
    }

    fn set_binding_debug_info(&mut self, el: NodeHandle, name: &str, value: &str) {
        self.log.push(RenderOp::DebugInfo {
            name: name.to_string(),
            value: value.to_string(),
        });
        self.document.set_attribute(el, name, value);
    }

    fn document(&self) -> Option<&Document> {
        Some(&self.document)
    }
}

/// A headless harness that drives one root view without a terminal.
///
/// `TestView` runs every part of the create/check/event/destroy cycle in a
/// plain `#[test]` function: no tokio runtime or TTY required. Dev mode is
/// always on, so [`detect_changes`](TestView::detect_changes) also runs the
/// verification pass.
///
/// # Example
///
/// ```rust,ignore
/// use sprig_core::testing::TestView;
///
/// let mut view = TestView::new(counter_view(), Counter::default());
/// view.detect_changes().unwrap();
/// view.fire_global("window", "keydown", Value::Null).unwrap();
/// view.detect_changes().unwrap();
/// assert_eq!(view.html(), "<p>Count: 1</p>");
/// ```
pub struct TestView {
    engine: Engine,
    root: ViewId,
    log: RenderLog,
}

impl TestView {
    /// Create the root view over a recording renderer.
    ///
    /// Creation never fails for a validated definition; no bindings are
    /// applied until [`detect_changes`](TestView::detect_changes).
    pub fn new<D: Directive>(def: impl Into<Arc<ViewDefinition>>, component: D) -> Self {
        Self::with_options(def, component, EngineOptions::default())
    }

    /// Like [`new`](TestView::new), with custom options. The rendering
    /// strategy is always replaced by a recording renderer.
    pub fn with_options<D: Directive>(
        def: impl Into<Arc<ViewDefinition>>,
        component: D,
        options: EngineOptions,
    ) -> Self {
        let (renderer, log) = RecordingRenderer::new();
        let mut engine = Engine::new(EngineOptions {
            dev_mode: true,
            strategy: RenderStrategy::Mediated(Box::new(renderer)),
            ..options
        });
        let root = engine.create_root_view(def.into(), Box::new(component));
        Self { engine, root, log }
    }

    /// Update and verify the root view.
    pub fn detect_changes(&mut self) -> Result<(), CheckError> {
        self.engine.tick(self.root)
    }

    /// Run only the verification pass.
    pub fn check_no_changes(&self) -> Result<(), CheckError> {
        self.engine.check_no_changes_view(self.root)
    }

    /// The root component.
    pub fn component<T: 'static>(&self) -> Option<&T> {
        self.engine.component::<T>(self.root)
    }

    /// Mutable access to the root component for direct test setup.
    pub fn component_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.engine.component_mut::<T>(self.root)
    }

    /// Mutate the root component, mark the root for check and run
    /// [`detect_changes`](TestView::detect_changes).
    pub fn update<T: 'static>(&mut self, f: impl FnOnce(&mut T)) -> Result<(), CheckError> {
        if let Some(component) = self.component_mut::<T>() {
            f(component);
        }
        self.engine.mark_for_check(self.root);
        self.detect_changes()
    }

    /// The root view handle.
    pub fn root(&self) -> ViewId {
        self.root
    }

    /// The engine under test.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Mutable access to the engine under test.
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// The rendered document.
    pub fn document(&self) -> Option<&Document> {
        self.engine.document()
    }

    /// Serialized content of the root element.
    pub fn html(&self) -> String {
        self.document().map(Document::to_html).unwrap_or_default()
    }

    /// Every renderer operation so far.
    pub fn ops(&self) -> Vec<RenderOp> {
        self.log.ops()
    }

    /// Drain the renderer operations recorded so far.
    pub fn take_ops(&mut self) -> Vec<RenderOp> {
        self.log.take()
    }

    /// Raise an event on the render node of `node` in `view`.
    pub fn fire(&mut self, view: ViewId, node: usize, event: &str, payload: Value) -> Result<usize, ViewError> {
        let target = self
            .engine
            .render_node(view, node)
            .ok_or(ViewError::UnknownNode { view, node })?;
        self.engine.fire(target, event, &payload)
    }

    /// Raise an event on a global target such as `window`.
    pub fn fire_global(&mut self, target: &str, event: &str, payload: Value) -> Result<usize, ViewError> {
        self.engine.fire_global(target, event, &payload)
    }

    /// Render the document into a ratatui [`Buffer`].
    pub fn render(&self, width: u16, height: u16) -> Buffer {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        if let Some(document) = self.document() {
            DocumentView::new(document).render(area, &mut buf);
        }
        buf
    }

    /// Render the document and return the visible content as a plain string.
    ///
    /// Rows are separated by newlines; trailing whitespace within each row is
    /// preserved.
    pub fn render_string(&self, width: u16, height: u16) -> String {
        let buf = self.render(width, height);
        let area = Rect::new(0, 0, width, height);
        let mut output = String::new();
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                output.push_str(buf[(x, y)].symbol());
            }
            if y < area.bottom() - 1 {
                output.push('\n');
            }
        }
        output
    }
}
