//! List rendering.

use sprig_core::{Command, Directive, NodeSpec, SimpleChanges, Value};

/// Input carrying the list.
pub const FOR_OF: &str = "forOf";

/// Renders the anchor's template once per item of the [`FOR_OF`] list.
///
/// Views are reconciled by position: when the list changes, existing views
/// get a fresh context, missing ones are appended and surplus ones are
/// removed from the end. Each view's context is
///
/// | Key | Value |
/// |-----|-------|
/// | `$implicit` | the item |
/// | `index` | position in the list |
/// | `count` | list length |
/// | `first`, `last` | position flags |
/// | `even`, `odd` | parity of `index` |
///
/// `Null` renders nothing; any other non-list value renders as a
/// single-item list.
#[derive(Debug, Default)]
pub struct ForOf {
    items: Vec<Value>,
    rendered: usize,
}

impl ForOf {
    fn context(&self, index: usize) -> Value {
        let count = self.items.len();
        Value::map([
            ("$implicit", self.items[index].clone()),
            ("index", Value::from(index)),
            ("count", Value::from(count)),
            ("first", Value::from(index == 0)),
            ("last", Value::from(index + 1 == count)),
            ("even", Value::from(index % 2 == 0)),
            ("odd", Value::from(index % 2 == 1)),
        ])
    }
}

impl Directive for ForOf {
    fn set_input(&mut self, name: &str, value: &Value) {
        if name != FOR_OF {
            return;
        }
        self.items = match value {
            Value::Null => Vec::new(),
            Value::List(items) => items.to_vec(),
            other => vec![other.clone()],
        };
    }

    fn on_changes(&mut self, _changes: &SimpleChanges) -> Command {
        let wanted = self.items.len();
        let mut cmds = Vec::with_capacity(wanted.max(self.rendered));
        for index in 0..wanted.min(self.rendered) {
            cmds.push(Command::set_context(index, self.context(index)));
        }
        for index in self.rendered..wanted {
            cmds.push(Command::create_view(self.context(index)));
        }
        for index in (wanted..self.rendered).rev() {
            cmds.push(Command::remove_view(index));
        }
        tracing::trace!(from = self.rendered, to = wanted, "forOf reconcile");
        self.rendered = wanted;
        Command::batch(cmds)
    }
}

/// `ForOf` provider node bound to [`FOR_OF`].
pub fn for_of() -> NodeSpec {
    NodeSpec::directive("ForOf", ForOf::default).input(FOR_OF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_core::testing::{RenderOp, TestView};
    use sprig_core::{BindingDef, ViewDefinition, ViewDefinitionBuilder};
    use std::sync::Arc;

    #[derive(Default)]
    struct Todo {
        items: Value,
    }

    impl Directive for Todo {}

    // <li [class.odd]="odd">{{index}}/{{count}} {{$implicit}}</li>
    fn row() -> Arc<ViewDefinition> {
        Arc::new(
            ViewDefinitionBuilder::new()
                .node(NodeSpec::element(1, "li").bind(BindingDef::class("odd")))
                .node(NodeSpec::text(&["", "/", " ", ""]))
                .update_renderer(|b, scope| {
                    b.value(0, scope.local("odd"));
                    b.node(1, [scope.local("index"), scope.local("count"), scope.local("$implicit")]);
                })
                .build()
                .unwrap(),
        )
    }

    fn todo_list() -> ViewDefinition {
        ViewDefinitionBuilder::new()
            .node(NodeSpec::element(2, "ul"))
            .node(NodeSpec::anchor(1, Some(row())))
            .node(for_of())
            .update_directives(|b, scope| b.value(2, scope.component::<Todo>().unwrap().items.clone()))
            .build()
            .unwrap()
    }

    fn todo(items: &[&str]) -> Value {
        Value::list(items.iter().copied())
    }

    #[test]
    fn renders_one_view_per_item() {
        let mut view = TestView::new(todo_list(), Todo { items: todo(&["milk", "eggs", "tea"]) });
        view.detect_changes().unwrap();
        assert_eq!(
            view.html(),
            "<ul><!----><li>0/3 milk</li><li class=\"odd\">1/3 eggs</li><li>2/3 tea</li></ul>"
        );
    }

    #[test]
    fn reconciles_by_position() {
        let mut view = TestView::new(todo_list(), Todo { items: todo(&["milk", "eggs", "tea"]) });
        view.detect_changes().unwrap();
        let before = view.engine().embedded_views(view.root(), 1).unwrap().to_vec();

        view.update::<Todo>(|t| t.items = todo(&["milk", "bread"])).unwrap();
        assert_eq!(
            view.html(),
            "<ul><!----><li>0/2 milk</li><li class=\"odd\">1/2 bread</li></ul>"
        );
        let after = view.engine().embedded_views(view.root(), 1).unwrap().to_vec();
        assert_eq!(after, before[..2]);
        assert!(!view.engine().is_alive(before[2]));

        view.update::<Todo>(|t| t.items = Value::Null).unwrap();
        assert_eq!(view.html(), "<ul><!----></ul>");
        assert_eq!(view.engine().view_count(), 1);
    }

    #[test]
    fn unchanged_list_is_not_reconciled() {
        let mut view = TestView::new(todo_list(), Todo { items: todo(&["a", "b"]) });
        view.detect_changes().unwrap();
        view.take_ops();
        view.detect_changes().unwrap();
        assert!(view.take_ops().is_empty());

        // a new list with the same items refreshes contexts but writes nothing
        view.update::<Todo>(|t| t.items = todo(&["a", "b"])).unwrap();
        assert!(!view
            .take_ops()
            .iter()
            .any(|op| matches!(op, RenderOp::SetValue(_) | RenderOp::CreateElement(_))));
    }
}
