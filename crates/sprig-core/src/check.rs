//! Dirty checking.
//!
//! An update pass ([`Engine::check_and_update_view`]) walks a view in a fixed
//! order:
//!
//! 1. directive inputs and lifecycle hooks, in node order, executing the
//!    container commands the hooks return;
//! 2. embedded views of every anchor;
//! 3. element and text bindings;
//! 4. component views.
//!
//! A binding is written to the backend only when its value is not
//! [identical](Value::identical) to the one recorded by the previous pass,
//! or when the view is being checked for the first time.
//!
//! The verification pass ([`Engine::check_no_changes_view`]) walks the same
//! tree without touching anything and fails on the first binding whose
//! value moved since the update pass.

use crate::command::Command;
use crate::debug::{reflect_attribute_name, reflect_attribute_value};
use crate::def::{BindingDef, BindingKind, NodeDef, NodeFlags, NodeKind, UpdateFn, ViewDefinition, ViewFlags};
use crate::directive::{SimpleChange, SimpleChanges};
use crate::dom::NodeHandle;
use crate::engine::Engine;
use crate::error::{CheckError, ExpressionChangedError, ViewError};
use crate::renderer::RenderStrategy;
use crate::scope::{Bindings, Scope};
use crate::value::{dev_mode_equal, Value};
use crate::view::{NodeData, ViewData, ViewId, ViewState};
use std::sync::Arc;

/// Compare `value` with the stored value of binding `binding` of `node` and
/// store it. Returns `true` when the binding must be written.
///
/// # Panics
///
/// Panics if `binding` is out of range for `node`.
pub(crate) fn check_and_update_binding(view: &mut ViewData, node: &NodeDef, binding: usize, value: Value) -> bool {
    assert!(binding < node.bindings.len(), "binding {binding} out of range");
    let slot = node.binding_index + binding;
    let changed = view.state.contains(ViewState::FIRST_CHECK) || !view.old_values[slot].identical(&value);
    if changed {
        view.old_values[slot] = value;
    }
    changed
}

/// Like [`check_and_update_binding`], but describes the change for
/// `on_changes`.
///
/// # Panics
///
/// Panics if `binding` is out of range for `node`.
pub(crate) fn check_and_update_binding_change(
    view: &mut ViewData,
    node: &NodeDef,
    binding: usize,
    value: Value,
) -> Option<SimpleChange> {
    let slot = node.binding_index + binding;
    let previous = view.old_values.get(slot).cloned().unwrap_or_default();
    let first_change = view.state.contains(ViewState::FIRST_CHECK);
    check_and_update_binding(view, node, binding, value).then(|| SimpleChange {
        previous,
        current: view.old_values[slot].clone(),
        first_change,
    })
}

/// Verify that binding `binding` of `node` still evaluates to the value the
/// last update pass recorded.
///
/// # Panics
///
/// Panics if `binding` is out of range for `node`.
pub(crate) fn check_binding_no_changes(
    view: &ViewData,
    node: &NodeDef,
    binding: usize,
    value: &Value,
) -> Result<(), ExpressionChangedError> {
    let old = &view.old_values[node.binding_index + binding];
    let first_check = view.state.contains(ViewState::FIRST_CHECK);
    if first_check || !dev_mode_equal(old, value) {
        return Err(ExpressionChangedError {
            node: node.index,
            binding: node.bindings[binding].name.to_string(),
            old: old.clone(),
            new: value.clone(),
            first_check,
        });
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum Evaluator {
    Directives,
    Renderer,
}

impl Evaluator {
    fn name(self) -> &'static str {
        match self {
            Evaluator::Directives => "directives",
            Evaluator::Renderer => "renderer",
        }
    }

    fn accepts(self, node: &NodeDef) -> bool {
        match self {
            Evaluator::Directives => node.flags.contains(NodeFlags::TYPE_DIRECTIVE),
            Evaluator::Renderer => node.flags.intersects(NodeFlags::TYPE_ELEMENT | NodeFlags::TYPE_TEXT),
        }
    }
}

/// Match evaluator output against the definition: one entry per bound node
/// of the evaluator's kind, each with exactly the declared number of values.
fn collect_bindings(
    def: &ViewDefinition,
    bindings: Bindings,
    evaluator: Evaluator,
) -> Result<Vec<Option<Vec<Value>>>, CheckError> {
    let mut by_node: Vec<Option<Vec<Value>>> = vec![None; def.nodes.len()];
    for (index, values) in bindings.entries {
        let node = def
            .nodes
            .get(index)
            .filter(|n| evaluator.accepts(n))
            .ok_or(CheckError::MisplacedBinding {
                node: index,
                evaluator: evaluator.name(),
            })?;
        if values.len() != node.bindings.len() {
            return Err(CheckError::BindingCount {
                node: index,
                expected: node.bindings.len(),
                actual: values.len(),
            });
        }
        by_node[index] = Some(values);
    }
    if let Some(missing) = def
        .nodes
        .iter()
        .find(|n| evaluator.accepts(n) && !n.bindings.is_empty() && by_node[n.index].is_none())
    {
        return Err(CheckError::BindingCount {
            node: missing.index,
            expected: missing.bindings.len(),
            actual: 0,
        });
    }
    Ok(by_node)
}

fn text_value(constants: &[Arc<str>], values: &[Value]) -> String {
    let mut out = String::new();
    for (i, constant) in constants.iter().enumerate() {
        out.push_str(constant);
        if let Some(value) = values.get(i) {
            out.push_str(&value.render_string());
        }
    }
    out
}

fn patch_element(backend: &mut RenderStrategy, debug_info: bool, el: NodeHandle, binding: &BindingDef, value: &Value) {
    let name = binding.name();
    match binding.kind {
        BindingKind::Property => {
            backend.set_property(el, name, value);
            if debug_info {
                backend.set_binding_debug_info(el, &reflect_attribute_name(name), &reflect_attribute_value(value));
            }
        }
        BindingKind::Attribute => {
            if value.is_null() {
                backend.remove_attribute(el, name);
            } else {
                backend.set_attribute(el, name, &value.render_string());
            }
        }
        BindingKind::Class => {
            if value.is_truthy() {
                backend.add_class(el, name);
            } else {
                backend.remove_class(el, name);
            }
        }
        BindingKind::Style => {
            if value.is_null() {
                backend.remove_style(el, name);
            } else {
                let mut css = value.render_string();
                if let Some(unit) = binding.suffix() {
                    css.push_str(unit);
                }
                backend.set_style(el, name, &css);
            }
        }
        BindingKind::Text | BindingKind::Input => {}
    }
}

impl Engine {
    /// Run an update pass over `id` and every attached descendant.
    ///
    /// The view itself is always checked; descendants are skipped while
    /// detached from change detection or, for on-push views, until marked.
    pub fn check_and_update_view(&mut self, id: ViewId) -> Result<(), CheckError> {
        let _span = tracing::trace_span!("check_and_update_view", view = ?id).entered();
        self.live(id)?;
        self.update_view(id)
    }

    /// Run the verification pass over `id` and every attached descendant.
    pub fn check_no_changes_view(&self, id: ViewId) -> Result<(), CheckError> {
        let _span = tracing::trace_span!("check_no_changes_view", view = ?id).entered();
        self.live(id)?;
        self.verify_view(id)
    }

    fn evaluate(&self, id: ViewId, f: &UpdateFn) -> Result<Bindings, ViewError> {
        let view = self.live(id)?;
        let scope = Scope {
            component: self.component_ref(id),
            context: &view.context,
            def: &view.def,
        };
        let mut bindings = Bindings::new();
        f(&mut bindings, &scope);
        Ok(bindings)
    }

    fn evaluate_for(
        &self,
        id: ViewId,
        def: &ViewDefinition,
        evaluator: Evaluator,
    ) -> Result<Vec<Option<Vec<Value>>>, CheckError> {
        let f = match evaluator {
            Evaluator::Directives => def.update_directives.as_ref(),
            Evaluator::Renderer => def.update_renderer.as_ref(),
        };
        let bindings = match f {
            Some(f) => self.evaluate(id, f)?,
            None => Bindings::new(),
        };
        collect_bindings(def, bindings, evaluator)
    }

    fn update_view(&mut self, id: ViewId) -> Result<(), CheckError> {
        let def = self.live(id)?.def.clone();

        let mut directive_values = self.evaluate_for(id, &def, Evaluator::Directives)?;
        for node in def.nodes.iter().filter(|n| n.flags.contains(NodeFlags::TYPE_DIRECTIVE)) {
            let values = directive_values[node.index].take();
            self.update_directive(id, node, values)?;
        }

        for child in self.hosted_views(id) {
            if self.checked_with_parent(child) {
                self.update_view(child)?;
            }
        }

        let renderer_values = self.evaluate_for(id, &def, Evaluator::Renderer)?;
        self.update_renderer(id, &def, renderer_values)?;

        for child in self.component_views(id) {
            if self.checked_with_parent(child) {
                self.update_view(child)?;
            }
        }

        let view = self.live_mut(id)?;
        view.state.remove(ViewState::FIRST_CHECK);
        if def.flags.contains(ViewFlags::ON_PUSH) {
            view.state.remove(ViewState::CHECKS_ENABLED);
        }
        Ok(())
    }

    fn update_directive(&mut self, id: ViewId, node: &NodeDef, values: Option<Vec<Value>>) -> Result<(), CheckError> {
        let view = self.live_mut(id)?;
        let first_check = view.state.contains(ViewState::FIRST_CHECK);
        let instance = match view.nodes.get_mut(node.index) {
            Some(NodeData::Provider { instance }) => instance.take(),
            _ => None,
        };
        let Some(mut instance) = instance else {
            return Ok(());
        };

        let mut changes = SimpleChanges::new();
        for (i, value) in values.into_iter().flatten().enumerate() {
            if let Some(change) = check_and_update_binding_change(view, node, i, value) {
                instance.set_input(&node.bindings[i].name, &change.current);
                changes.insert(node.bindings[i].name.clone(), change);
            }
        }
        let mut commands = Vec::with_capacity(3);
        if !changes.is_empty() {
            commands.push(instance.on_changes(&changes));
        }
        if first_check {
            commands.push(instance.on_init());
        }
        commands.push(instance.do_check());

        if let Some(NodeData::Provider { instance: slot }) = view.nodes.get_mut(node.index) {
            *slot = Some(instance);
        }

        if !changes.is_empty() {
            self.after_input_change(id, node, &changes);
        }

        let command = Command::batch(commands);
        if command.is_none() {
            return Ok(());
        }
        let anchor = node
            .parent
            .filter(|p| self.live(id).is_ok_and(|v| matches!(v.nodes.get(*p), Some(NodeData::Anchor { .. }))))
            .ok_or(ViewError::NoViewContainer { node: node.index })?;
        for op in command.into_ops() {
            self.apply_container_op(id, anchor, op)?;
        }
        Ok(())
    }

    /// Debug reflection for inputs and on-push wake-up of component views.
    fn after_input_change(&mut self, id: ViewId, node: &NodeDef, changes: &SimpleChanges) {
        let Some(parent) = node.parent else {
            return;
        };
        let host = match self.views.get(id).and_then(|v| v.nodes.get(parent)) {
            Some(NodeData::Element { render, component_view }) => Some((*render, *component_view)),
            _ => None,
        };
        let Some((render, component_view)) = host else {
            return;
        };
        if self.debug_info {
            for (name, change) in changes {
                self.backend.set_binding_debug_info(
                    render,
                    &reflect_attribute_name(name),
                    &reflect_attribute_value(&change.current),
                );
            }
        }
        if node.flags.contains(NodeFlags::TYPE_COMPONENT) {
            if let Some(child) = component_view.and_then(|c| self.views.get_mut(c)) {
                if child.def.flags.contains(ViewFlags::ON_PUSH) {
                    child.state.insert(ViewState::CHECKS_ENABLED);
                }
            }
        }
    }

    fn update_renderer(
        &mut self,
        id: ViewId,
        def: &ViewDefinition,
        mut values: Vec<Option<Vec<Value>>>,
    ) -> Result<(), CheckError> {
        let debug_info = self.debug_info;
        let view = self.views.get_mut(id).ok_or(ViewError::ViewDestroyed(id))?;
        let backend = &mut self.backend;
        for node in &def.nodes {
            let Some(node_values) = values[node.index].take() else {
                continue;
            };
            match (&node.kind, view.nodes.get(node.index)) {
                (NodeKind::Element(_), Some(NodeData::Element { render, .. })) => {
                    let render = *render;
                    for (i, value) in node_values.into_iter().enumerate() {
                        if check_and_update_binding(view, node, i, value) {
                            let value = &view.old_values[node.binding_index + i];
                            patch_element(backend, debug_info, render, &node.bindings[i], value);
                        }
                    }
                }
                (NodeKind::Text(text), Some(NodeData::Text { render })) => {
                    let render = *render;
                    let mut changed = false;
                    for (i, value) in node_values.into_iter().enumerate() {
                        changed |= check_and_update_binding(view, node, i, value);
                    }
                    if changed {
                        let start = node.binding_index;
                        let current = &view.old_values[start..start + node.bindings.len()];
                        backend.set_value(render, &text_value(&text.constants, current));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn verify_view(&self, id: ViewId) -> Result<(), CheckError> {
        let view = self.live(id)?;
        let def = &view.def;

        let directive_values = self.evaluate_for(id, def, Evaluator::Directives)?;
        Self::verify_values(view, def, &directive_values)?;

        for child in self.hosted_views(id) {
            if self.checked_with_parent(child) {
                self.verify_view(child)?;
            }
        }

        let renderer_values = self.evaluate_for(id, def, Evaluator::Renderer)?;
        Self::verify_values(view, def, &renderer_values)?;

        for child in self.component_views(id) {
            if self.checked_with_parent(child) {
                self.verify_view(child)?;
            }
        }
        Ok(())
    }

    fn verify_values(view: &ViewData, def: &ViewDefinition, values: &[Option<Vec<Value>>]) -> Result<(), CheckError> {
        for node in &def.nodes {
            let Some(node_values) = &values[node.index] else {
                continue;
            };
            for (i, value) in node_values.iter().enumerate() {
                check_binding_no_changes(view, node, i, value)?;
            }
        }
        Ok(())
    }

    fn hosted_views(&self, id: ViewId) -> Vec<ViewId> {
        self.views.get(id).map_or_else(Vec::new, |view| {
            view.nodes
                .iter()
                .flat_map(|n| match n {
                    NodeData::Anchor { views, .. } => views.as_slice(),
                    _ => &[][..],
                })
                .copied()
                .collect()
        })
    }

    fn component_views(&self, id: ViewId) -> Vec<ViewId> {
        self.views.get(id).map_or_else(Vec::new, |view| {
            view.nodes
                .iter()
                .filter_map(|n| match n {
                    NodeData::Element { component_view, .. } => *component_view,
                    _ => None,
                })
                .collect()
        })
    }

    fn checked_with_parent(&self, id: ViewId) -> bool {
        self.views.get(id).is_some_and(ViewData::is_checked_with_parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{NodeSpec, ViewDefinitionBuilder};
    use crate::directive::Directive;
    use crate::dom::DomRenderer;
    use crate::engine::EngineOptions;
    use crate::testing::{RenderOp, TestView};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct App {
        title: String,
        active: bool,
        items: Value,
        width: Value,
    }

    impl Directive for App {}

    fn app<'a>(scope: &Scope<'a>) -> &'a App {
        scope.component::<App>().unwrap()
    }

    fn titled(title: &str) -> App {
        App {
            title: title.into(),
            ..App::default()
        }
    }

    // <div [title] [class.active] [style.width.px]><span>Hello {{title}}!</span></div>
    fn greeting() -> ViewDefinition {
        ViewDefinitionBuilder::new()
            .node(
                NodeSpec::element(2, "div")
                    .bind(BindingDef::property("title"))
                    .bind(BindingDef::class("active"))
                    .bind(BindingDef::style_with_unit("width", "px")),
            )
            .node(NodeSpec::element(1, "span"))
            .node(NodeSpec::text(&["Hello ", "!"]))
            .update_renderer(|b, scope| {
                let app = app(scope);
                b.node(
                    0,
                    [Value::from(app.title.as_str()), Value::from(app.active), app.width.clone()],
                );
                b.value(2, app.title.as_str());
            })
            .build()
            .unwrap()
    }

    #[test]
    fn nothing_is_applied_before_the_first_check() {
        let view = TestView::new(greeting(), titled("world"));
        assert_eq!(view.html(), "<div><span>Hello </span></div>");
    }

    #[test]
    fn first_check_applies_every_binding() {
        let mut view = TestView::new(greeting(), titled("world"));
        view.detect_changes().unwrap();
        assert_eq!(view.html(), "<div><span>Hello world!</span></div>");

        let div = view.engine().render_node(view.root(), 0).unwrap();
        let doc = view.document().unwrap();
        assert_eq!(doc.property(div, "title").and_then(Value::as_str), Some("world"));
        // false and null bindings are still written on the first pass
        let ops = view.ops();
        assert!(ops.contains(&RenderOp::RemoveClass("active".into())));
        assert!(ops.contains(&RenderOp::RemoveStyle("width".into())));
    }

    #[test]
    fn unchanged_bindings_are_not_written_again() {
        let mut view = TestView::new(greeting(), titled("world"));
        view.detect_changes().unwrap();
        view.take_ops();
        view.detect_changes().unwrap();
        assert!(view.take_ops().is_empty());
    }

    #[test]
    fn only_changed_bindings_are_written() {
        let mut view = TestView::new(greeting(), titled("world"));
        view.detect_changes().unwrap();
        view.take_ops();

        view.update::<App>(|a| {
            a.active = true;
            a.width = Value::from(40);
        })
        .unwrap();
        assert_eq!(
            view.take_ops(),
            vec![
                RenderOp::AddClass("active".into()),
                RenderOp::SetStyle {
                    name: "width".into(),
                    value: "40px".into()
                },
            ]
        );
        assert_eq!(
            view.html(),
            "<div class=\"active\" style=\"width: 40px;\"><span>Hello world!</span></div>"
        );
    }

    #[test]
    fn lists_compare_by_identity() {
        let def = ViewDefinitionBuilder::new()
            .node(NodeSpec::element(0, "ul").bind(BindingDef::property("items")))
            .update_renderer(|b, scope| b.value(0, app(scope).items.clone()))
            .build()
            .unwrap();
        let mut view = TestView::new(
            def,
            App {
                items: Value::list([1, 2]),
                ..App::default()
            },
        );
        view.detect_changes().unwrap();
        view.take_ops();

        // same reference: no write
        view.detect_changes().unwrap();
        assert!(view.take_ops().is_empty());

        // equal content, new list: written
        view.update::<App>(|a| a.items = Value::list([1, 2])).unwrap();
        let writes = view.take_ops();
        assert_eq!(writes.len(), 1);
        assert!(matches!(&writes[0], RenderOp::SetProperty { name, .. } if name == "items"));
    }

    #[test]
    fn text_interpolation_joins_constants_and_values() {
        let def = ViewDefinitionBuilder::new()
            .node(NodeSpec::text(&["a", "b", "c"]))
            .update_renderer(|b, scope| {
                let app = app(scope);
                b.node(0, [Value::from(app.active), Value::from(app.title.as_str())]);
            })
            .build()
            .unwrap();
        let mut view = TestView::new(def, titled("x"));
        view.detect_changes().unwrap();
        assert_eq!(view.html(), "afalsebxc");

        view.take_ops();
        view.update::<App>(|a| a.active = true).unwrap();
        assert_eq!(view.take_ops(), vec![RenderOp::SetValue("atruebxc".into())]);
    }

    #[test]
    fn embedded_views_are_patched_before_their_host_element() {
        // <div [title]="title"><ng-template>{{$implicit}}</ng-template></div>
        let row = Arc::new(
            ViewDefinitionBuilder::new()
                .node(NodeSpec::text(&["", ""]))
                .update_renderer(|b, scope| b.value(0, scope.local("$implicit")))
                .build()
                .unwrap(),
        );
        let def = ViewDefinitionBuilder::new()
            .node(NodeSpec::element(1, "div").bind(BindingDef::property("title")))
            .node(NodeSpec::anchor(0, Some(row.clone())))
            .update_renderer(|b, scope| b.value(0, app(scope).title.as_str()))
            .build()
            .unwrap();
        let mut view = TestView::new(def, titled("t"));
        let root = view.root();
        view.engine_mut()
            .create_embedded_view(root, 1, &row, Value::from("x"), None)
            .unwrap();
        view.take_ops();

        view.detect_changes().unwrap();
        assert_eq!(
            view.take_ops(),
            vec![
                RenderOp::SetValue("x".into()),
                RenderOp::SetProperty {
                    name: "title".into(),
                    value: "t".into()
                },
            ]
        );
    }

    #[test]
    fn attribute_null_removes_the_attribute() {
        let def = ViewDefinitionBuilder::new()
            .node(NodeSpec::element(0, "a").bind(BindingDef::attribute("href")))
            .update_renderer(|b, scope| {
                let title = &app(scope).title;
                b.value(0, (!title.is_empty()).then(|| title.as_str()));
            })
            .build()
            .unwrap();
        let mut view = TestView::new(def, titled("/home"));
        view.detect_changes().unwrap();
        assert_eq!(view.html(), "<a href=\"/home\"></a>");
        view.update::<App>(|a| a.title.clear()).unwrap();
        assert_eq!(view.html(), "<a></a>");
    }

    #[test]
    fn unstable_binding_fails_verification() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let def = ViewDefinitionBuilder::new()
            .node(NodeSpec::element(0, "div").bind(BindingDef::property("n")))
            .update_renderer(move |b, _| b.value(0, counter.fetch_add(1, Ordering::SeqCst)))
            .build()
            .unwrap();
        let mut view = TestView::new(def, App::default());
        let Err(CheckError::ExpressionChanged(err)) = view.detect_changes() else {
            panic!("expected an expression-changed error");
        };
        assert_eq!(err.node, 0);
        assert_eq!(err.binding, "n");
        assert_eq!(err.old.as_number(), Some(0.0));
        assert_eq!(err.new.as_number(), Some(1.0));
        assert!(!err.first_check);
        assert!(err
            .to_string()
            .ends_with("Previous value: 'n: 0'. Current value: 'n: 1'."));
    }

    #[test]
    fn verification_before_any_update_reports_first_check() {
        let view = TestView::new(greeting(), titled("world"));
        let Err(CheckError::ExpressionChanged(err)) = view.check_no_changes() else {
            panic!("expected an expression-changed error");
        };
        assert!(err.first_check);
        assert!(err.to_string().contains("created after its parent"));
    }

    #[test]
    fn fresh_equal_lists_pass_verification() {
        let def = ViewDefinitionBuilder::new()
            .node(NodeSpec::element(0, "ul").bind(BindingDef::property("items")))
            .update_renderer(|b, _| b.value(0, Value::list(["a", "b"])))
            .build()
            .unwrap();
        let mut view = TestView::new(def, App::default());
        view.detect_changes().unwrap();
        // identity differs on every evaluation, so the update pass writes again
        view.take_ops();
        view.detect_changes().unwrap();
        assert_eq!(view.take_ops().len(), 1);
    }

    #[test]
    fn evaluator_output_is_validated() {
        let too_many = ViewDefinitionBuilder::new()
            .node(NodeSpec::element(0, "div").bind(BindingDef::property("a")))
            .update_renderer(|b, _| b.node(0, [1, 2]))
            .build()
            .unwrap();
        let err = TestView::new(too_many, App::default()).detect_changes().unwrap_err();
        assert!(matches!(
            err,
            CheckError::BindingCount {
                node: 0,
                expected: 1,
                actual: 2
            }
        ));

        let missing = ViewDefinitionBuilder::new()
            .node(NodeSpec::element(0, "div").bind(BindingDef::property("a")))
            .build()
            .unwrap();
        let err = TestView::new(missing, App::default()).detect_changes().unwrap_err();
        assert!(matches!(err, CheckError::BindingCount { node: 0, actual: 0, .. }));

        let misplaced = ViewDefinitionBuilder::new()
            .node(NodeSpec::element(1, "div"))
            .node(NodeSpec::directive("d", App::default).input("x"))
            .update_directives(|b, _| b.value(1, 1))
            .update_renderer(|b, _| b.value(1, 1))
            .build()
            .unwrap();
        let err = TestView::new(misplaced, App::default()).detect_changes().unwrap_err();
        assert!(matches!(
            err,
            CheckError::MisplacedBinding {
                node: 1,
                evaluator: "renderer"
            }
        ));
    }

    struct Recorder {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn push(&self, entry: impl Into<String>) {
            self.log.lock().unwrap().push(entry.into());
        }
    }

    impl Directive for Recorder {
        fn set_input(&mut self, name: &str, value: &Value) {
            self.push(format!("set {name}={}", value.render_string()));
        }

        fn on_changes(&mut self, changes: &SimpleChanges) -> Command {
            let names: Vec<String> = changes
                .iter()
                .map(|(k, c)| format!("{k}:{}", c.first_change))
                .collect();
            self.push(format!("changes {}", names.join(",")));
            Command::none()
        }

        fn on_init(&mut self) -> Command {
            self.push("init");
            Command::none()
        }

        fn do_check(&mut self) -> Command {
            self.push("check");
            Command::none()
        }

        fn on_destroy(&mut self) {
            self.push("destroy");
        }
    }

    fn recorded(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
        std::mem::take(&mut *log.lock().unwrap())
    }

    #[test]
    fn directive_hooks_run_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let factory_log = log.clone();
        let def = ViewDefinitionBuilder::new()
            .node(NodeSpec::element(1, "div"))
            .node(
                NodeSpec::directive("recorder", move || Recorder {
                    log: factory_log.clone(),
                })
                .input("title")
                .input("active"),
            )
            .update_directives(|b, scope| {
                let app = app(scope);
                b.node(1, [Value::from(app.title.as_str()), Value::from(app.active)]);
            })
            .build()
            .unwrap();
        let mut view = TestView::new(def, titled("a"));

        view.detect_changes().unwrap();
        assert_eq!(
            recorded(&log),
            ["set title=a", "set active=false", "changes active:true,title:true", "init", "check"]
        );

        view.update::<App>(|a| a.title = "b".into()).unwrap();
        assert_eq!(recorded(&log), ["set title=b", "changes title:false", "check"]);

        view.detect_changes().unwrap();
        assert_eq!(recorded(&log), ["check"]);

        let root = view.root();
        view.engine_mut().destroy_view(root).unwrap();
        assert_eq!(recorded(&log), ["destroy"]);
    }

    #[derive(Default)]
    struct Child {
        label: String,
        count: i64,
    }

    impl Directive for Child {
        fn set_input(&mut self, name: &str, value: &Value) {
            if name == "label" {
                self.label = value.render_string();
            }
        }
    }

    // <child-cmp [label]="title"></child-cmp>, child: <p>{{label}} {{count}}</p>
    fn with_child(flags: ViewFlags) -> ViewDefinition {
        let child = ViewDefinitionBuilder::new()
            .node(NodeSpec::element(1, "p"))
            .node(NodeSpec::text(&["", " ", ""]))
            .update_renderer(|b, scope| {
                let child = scope.component::<Child>().unwrap();
                b.node(1, [Value::from(child.label.as_str()), Value::from(child.count)]);
            })
            .flags(flags)
            .build()
            .unwrap();
        ViewDefinitionBuilder::new()
            .node(NodeSpec::element(1, "child-cmp").component_view(Arc::new(child)))
            .node(NodeSpec::component("Child", Child::default).input("label"))
            .update_directives(|b, scope| b.value(1, app(scope).title.as_str()))
            .build()
            .unwrap()
    }

    #[test]
    fn component_views_see_their_own_component() {
        let mut view = TestView::new(with_child(ViewFlags::empty()), titled("hi"));
        view.detect_changes().unwrap();
        assert_eq!(view.html(), "<child-cmp><p>hi 0</p></child-cmp>");

        let child = view.engine().component_view(view.root(), 0).unwrap();
        view.engine_mut().component_mut::<Child>(child).unwrap().count = 3;
        view.detect_changes().unwrap();
        assert_eq!(view.html(), "<child-cmp><p>hi 3</p></child-cmp>");
    }

    #[test]
    fn on_push_views_wait_for_inputs_or_marks() {
        let mut view = TestView::new(with_child(ViewFlags::ON_PUSH), titled("hi"));
        view.detect_changes().unwrap();
        assert_eq!(view.html(), "<child-cmp><p>hi 0</p></child-cmp>");

        let child = view.engine().component_view(view.root(), 0).unwrap();
        assert!(!view.engine().view_state(child).unwrap().contains(ViewState::CHECKS_ENABLED));

        // internal change alone is not picked up
        view.engine_mut().component_mut::<Child>(child).unwrap().count = 3;
        view.detect_changes().unwrap();
        assert_eq!(view.html(), "<child-cmp><p>hi 0</p></child-cmp>");

        view.engine_mut().mark_for_check(child);
        view.detect_changes().unwrap();
        assert_eq!(view.html(), "<child-cmp><p>hi 3</p></child-cmp>");

        // an input change re-enables the view
        view.update::<App>(|a| a.title = "yo".into()).unwrap();
        assert_eq!(view.html(), "<child-cmp><p>yo 3</p></child-cmp>");
    }

    #[test]
    fn detached_views_are_skipped_until_reattached() {
        let mut view = TestView::new(with_child(ViewFlags::empty()), titled("hi"));
        view.detect_changes().unwrap();
        let child = view.engine().component_view(view.root(), 0).unwrap();

        view.engine_mut().detach_change_detector(child).unwrap();
        view.engine_mut().component_mut::<Child>(child).unwrap().count = 1;
        view.detect_changes().unwrap();
        assert_eq!(view.html(), "<child-cmp><p>hi 0</p></child-cmp>");

        // explicit checks still run on a detached view
        view.engine_mut().check_and_update_view(child).unwrap();
        assert_eq!(view.html(), "<child-cmp><p>hi 1</p></child-cmp>");

        view.engine_mut().reattach_change_detector(child).unwrap();
        view.engine_mut().component_mut::<Child>(child).unwrap().count = 2;
        view.detect_changes().unwrap();
        assert_eq!(view.html(), "<child-cmp><p>hi 2</p></child-cmp>");
    }

    #[test]
    fn debug_info_reflects_properties_and_inputs() {
        let options = EngineOptions {
            debug_info: true,
            ..EngineOptions::default()
        };
        let mut view = TestView::with_options(greeting(), titled("world"), options);
        view.detect_changes().unwrap();
        let div = view.engine().render_node(view.root(), 0).unwrap();
        assert_eq!(
            view.document().unwrap().attribute(div, "ng-reflect-title"),
            Some("world")
        );

        let mut view = TestView::with_options(
            with_child(ViewFlags::empty()),
            titled("hi"),
            EngineOptions {
                debug_info: true,
                ..EngineOptions::default()
            },
        );
        view.detect_changes().unwrap();
        let host = view.engine().render_node(view.root(), 0).unwrap();
        assert_eq!(
            view.document().unwrap().attribute(host, "ng-reflect-label"),
            Some("hi")
        );
    }

    #[test]
    fn debug_info_is_off_by_default() {
        let mut view = TestView::new(greeting(), titled("world"));
        view.detect_changes().unwrap();
        assert!(!view.ops().iter().any(|op| matches!(op, RenderOp::DebugInfo { .. })));
    }

    fn drive(strategy: RenderStrategy) -> String {
        let mut engine = Engine::new(EngineOptions {
            dev_mode: true,
            debug_info: false,
            strategy,
        });
        let root = engine.create_root_view(Arc::new(greeting()), Box::new(titled("one")));
        engine.tick(root).unwrap();
        engine.component_mut::<App>(root).unwrap().active = true;
        engine.tick(root).unwrap();
        engine.component_mut::<App>(root).unwrap().title = "two".into();
        engine.component_mut::<App>(root).unwrap().width = Value::from(7);
        engine.tick(root).unwrap();
        engine.document().map(|d| d.to_html()).unwrap_or_default()
    }

    #[test]
    fn direct_and_mediated_rendering_agree() {
        let direct = drive(RenderStrategy::default());
        let mediated = drive(RenderStrategy::Mediated(Box::new(DomRenderer::new())));
        assert_eq!(direct, mediated);
        assert_eq!(
            direct,
            "<div class=\"active\" style=\"width: 7px;\"><span>Hello two!</span></div>"
        );
    }

    #[test]
    fn destroyed_views_cannot_be_checked() {
        let mut view = TestView::new(greeting(), titled("world"));
        let root = view.root();
        view.engine_mut().destroy_view(root).unwrap();
        assert!(matches!(
            view.detect_changes(),
            Err(CheckError::View(ViewError::ViewDestroyed(id))) if id == root
        ));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn counter_view() -> ViewDefinition {
            ViewDefinitionBuilder::new()
                .node(NodeSpec::text(&["n=", ""]))
                .update_renderer(|b, scope| b.value(0, app(scope).title.as_str()))
                .build()
                .unwrap()
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn writes_happen_exactly_when_values_change(values in prop::collection::vec("[ab]{0,2}", 1..16)) {
                let mut view = TestView::new(counter_view(), titled(&values[0]));
                view.detect_changes().unwrap();
                for value in &values[1..] {
                    let value = value.clone();
                    view.update::<App>(move |a| a.title = value).unwrap();
                }
                let expected = 1 + values.windows(2).filter(|w| w[0] != w[1]).count();
                let writes = view.ops().iter().filter(|op| matches!(op, RenderOp::SetValue(_))).count();
                prop_assert_eq!(writes, expected);
                let last = values.last().cloned().unwrap_or_default();
                prop_assert_eq!(view.html(), format!("n={last}"));
            }

            #[test]
            fn a_second_pass_never_writes(title in "[a-z]{0,6}", active in any::<bool>(), width in proptest::option::of(0i32..500)) {
                let mut view = TestView::new(greeting(), App {
                    title,
                    active,
                    width: width.into(),
                    ..App::default()
                });
                view.detect_changes().unwrap();
                view.take_ops();
                view.detect_changes().unwrap();
                prop_assert!(view.take_ops().is_empty());
            }
        }
    }
}
