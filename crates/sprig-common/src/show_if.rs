//! Conditional rendering of an anchor's template.

use sprig_core::{Command, Directive, NodeSpec, SimpleChanges, TemplateRef, Value};

/// Input carrying the condition.
pub const SHOW_IF: &str = "showIf";
/// Input carrying the template shown while the condition is falsy.
pub const SHOW_IF_ELSE: &str = "showIfElse";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Branch {
    #[default]
    Nothing,
    Then,
    Else,
}

/// Shows the anchor's template while [`SHOW_IF`] is truthy, and the
/// [`SHOW_IF_ELSE`] template (if any) otherwise.
///
/// The shown view gets the context `{ $implicit: condition, showIf:
/// condition }`. A view is only recreated when the branch flips or the else
/// template is replaced.
///
/// ```rust,ignore
/// // <ng-template [showIf]="user" [showIfElse]="login">..</ng-template>
/// ViewDefinitionBuilder::new()
///     .node(NodeSpec::anchor(1, Some(user_card)))
///     .node(show_if_else())
///     .node(NodeSpec::anchor(0, Some(login)))
///     .update_directives(|b, scope| {
///         b.node(1, [scope.component::<App>().unwrap().user.clone(), scope.template(2)]);
///     })
/// ```
#[derive(Debug, Default)]
pub struct ShowIf {
    condition: Value,
    else_template: Option<TemplateRef>,
    shown: Branch,
}

impl ShowIf {
    fn context(&self) -> Value {
        Value::map([("$implicit", self.condition.clone()), (SHOW_IF, self.condition.clone())])
    }

    fn wanted(&self) -> Branch {
        if self.condition.is_truthy() {
            Branch::Then
        } else if self.else_template.is_some() {
            Branch::Else
        } else {
            Branch::Nothing
        }
    }
}

impl Directive for ShowIf {
    fn set_input(&mut self, name: &str, value: &Value) {
        match name {
            SHOW_IF => self.condition = value.clone(),
            SHOW_IF_ELSE => self.else_template = value.as_template().cloned(),
            _ => {}
        }
    }

    fn on_changes(&mut self, changes: &SimpleChanges) -> Command {
        let wanted = self.wanted();
        let replaced_else = wanted == Branch::Else && changes.contains_key(SHOW_IF_ELSE);
        if wanted == self.shown && !replaced_else {
            return match wanted {
                Branch::Nothing => Command::none(),
                _ => Command::set_context(0, self.context()),
            };
        }
        tracing::trace!(from = ?self.shown, to = ?wanted, "showIf branch change");
        self.shown = wanted;
        let create = match (wanted, &self.else_template) {
            (Branch::Then, _) => Command::create_view(self.context()),
            (Branch::Else, Some(template)) => Command::create_view_from(template.clone(), self.context()),
            _ => Command::none(),
        };
        Command::batch([Command::clear(), create])
    }
}

/// `ShowIf` provider node bound to [`SHOW_IF`].
pub fn show_if() -> NodeSpec {
    NodeSpec::directive("ShowIf", ShowIf::default).input(SHOW_IF)
}

/// `ShowIf` provider node bound to [`SHOW_IF`] and [`SHOW_IF_ELSE`], in
/// that order.
pub fn show_if_else() -> NodeSpec {
    show_if().input(SHOW_IF_ELSE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_core::testing::TestView;
    use sprig_core::{ViewDefinition, ViewDefinitionBuilder};
    use std::sync::Arc;

    #[derive(Default)]
    struct App {
        user: Value,
        with_else: bool,
    }

    impl Directive for App {}

    fn text(content: &str) -> Arc<ViewDefinition> {
        Arc::new(
            ViewDefinitionBuilder::new()
                .node(NodeSpec::element(1, "b"))
                .node(NodeSpec::text(&[content, ""]))
                .update_renderer(|b, scope| b.value(1, scope.local("$implicit")))
                .build()
                .unwrap(),
        )
    }

    // <div><ng-template [showIf]="user" [showIfElse]="with_else ? login : null">
    //   <b>hi {{user}}</b></ng-template><ng-template #login><b>login</b></ng-template></div>
    fn greeting() -> ViewDefinition {
        ViewDefinitionBuilder::new()
            .node(NodeSpec::element(3, "div"))
            .node(NodeSpec::anchor(1, Some(text("hi "))))
            .node(show_if_else())
            .node(NodeSpec::anchor(0, Some(text("login"))))
            .update_directives(|b, scope| {
                let app = scope.component::<App>().unwrap();
                let login = if app.with_else { scope.template(3) } else { Value::Null };
                b.node(2, [app.user.clone(), login]);
            })
            .build()
            .unwrap()
    }

    fn shown(view: &TestView) -> String {
        view.html().replace("<!---->", "")
    }

    #[test]
    fn follows_the_condition() {
        let mut view = TestView::new(greeting(), App::default());
        view.detect_changes().unwrap();
        assert_eq!(shown(&view), "<div></div>");

        view.update::<App>(|a| a.user = Value::from("ann")).unwrap();
        assert_eq!(shown(&view), "<div><b>hi ann</b></div>");

        view.update::<App>(|a| a.user = Value::Null).unwrap();
        assert_eq!(shown(&view), "<div></div>");
        assert_eq!(view.engine().view_count(), 1);
    }

    #[test]
    fn truthy_updates_keep_the_view() {
        let mut view = TestView::new(
            greeting(),
            App {
                user: Value::from("ann"),
                ..App::default()
            },
        );
        view.detect_changes().unwrap();
        let before = view.engine().embedded_views(view.root(), 1).unwrap().to_vec();

        view.update::<App>(|a| a.user = Value::from("bob")).unwrap();
        assert_eq!(shown(&view), "<div><b>hi bob</b></div>");
        assert_eq!(view.engine().embedded_views(view.root(), 1).unwrap(), before.as_slice());
    }

    #[test]
    fn falls_back_to_the_else_template() {
        let mut view = TestView::new(
            greeting(),
            App {
                with_else: true,
                ..App::default()
            },
        );
        view.detect_changes().unwrap();
        assert_eq!(shown(&view), "<div><b>login</b></div>");

        view.update::<App>(|a| a.user = Value::from("ann")).unwrap();
        assert_eq!(shown(&view), "<div><b>hi ann</b></div>");

        view.update::<App>(|a| a.with_else = false).unwrap();
        assert_eq!(shown(&view), "<div><b>hi ann</b></div>");

        view.update::<App>(|a| a.user = Value::from(false)).unwrap();
        assert_eq!(shown(&view), "<div></div>");
    }
}
