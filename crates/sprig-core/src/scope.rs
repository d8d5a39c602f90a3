//! What binding evaluators and event handlers see.

use crate::def::{NodeKind, ViewDefinition};
use crate::directive::Directive;
use crate::value::{TemplateRef, Value};

/// Collects the values produced by an [`UpdateFn`](crate::def::UpdateFn).
///
/// Evaluators report one entry per bound node, with exactly as many values
/// as the node declares bindings.
///
/// ```rust,ignore
/// builder.update_renderer(|b: &mut Bindings, scope: &Scope<'_>| {
///     let app = scope.component::<App>().unwrap();
///     b.node(1, [Value::from(app.title.as_str())]);
/// })
/// ```
#[derive(Debug, Default)]
pub struct Bindings {
    pub(crate) entries: Vec<(usize, Vec<Value>)>,
}

impl Bindings {
    /// Empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report all binding values of `node_index`.
    pub fn node<V: Into<Value>>(&mut self, node_index: usize, values: impl IntoIterator<Item = V>) {
        self.entries
            .push((node_index, values.into_iter().map(Into::into).collect()));
    }

    /// Report the single binding value of `node_index`.
    pub fn value(&mut self, node_index: usize, value: impl Into<Value>) {
        self.entries.push((node_index, vec![value.into()]));
    }

    /// Number of reported nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read-only view of the state a binding evaluator works with.
pub struct Scope<'a> {
    pub(crate) component: Option<&'a (dyn Directive + 'static)>,
    pub(crate) context: &'a Value,
    pub(crate) def: &'a ViewDefinition,
}

impl<'a> Scope<'a> {
    /// The component instance this view belongs to, downcast to `T`.
    pub fn component<T: 'static>(&self) -> Option<&'a T> {
        self.component.and_then(|c| c.downcast_ref::<T>())
    }

    /// The untyped component instance.
    pub fn component_dyn(&self) -> Option<&'a (dyn Directive + 'static)> {
        self.component
    }

    /// Context of an embedded view (`Null` for component and root views).
    pub fn context(&self) -> &'a Value {
        self.context
    }

    /// Shorthand for `context().get(key)`, returning `Null` when missing.
    pub fn local(&self, key: &str) -> Value {
        self.context.get(key).cloned().unwrap_or_default()
    }

    /// Template of the anchor at `node_index`, for passing to directive
    /// inputs (e.g. an else branch). `Null` when the node has none.
    pub fn template(&self, node_index: usize) -> Value {
        match self.def.node(node_index).map(|n| &n.kind) {
            Some(NodeKind::Anchor(anchor)) => anchor
                .template
                .clone()
                .map_or(Value::Null, |t| Value::Template(TemplateRef::new(t))),
            _ => Value::Null,
        }
    }
}

/// Mutable state an event handler works with.
pub struct EventScope<'a> {
    pub(crate) component: Option<&'a mut (dyn Directive + 'static)>,
    pub(crate) context: &'a Value,
}

impl EventScope<'_> {
    /// Mutable access to the component instance, downcast to `T`.
    pub fn component_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.component.as_deref_mut().and_then(|c| c.downcast_mut::<T>())
    }

    /// Shared access to the component instance, downcast to `T`.
    pub fn component<T: 'static>(&self) -> Option<&T> {
        self.component.as_deref().and_then(|c| c.downcast_ref::<T>())
    }

    /// Context of the embedded view the event was raised in.
    pub fn context(&self) -> &Value {
        self.context
    }

    /// Shorthand for `context().get(key)`, returning `Null` when missing.
    pub fn local(&self, key: &str) -> Value {
        self.context.get(key).cloned().unwrap_or_default()
    }
}
