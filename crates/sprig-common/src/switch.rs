//! Choosing one of several templates by value.

use sprig_core::{Command, Directive, NodeSpec, SimpleChanges, TemplateRef, Value};

/// Input carrying the value to match.
pub const SWITCH: &str = "switch";
/// Input carrying the cases, a list built with [`case`].
pub const SWITCH_CASES: &str = "switchCases";
/// Input carrying the template used when no case matches.
pub const SWITCH_DEFAULT: &str = "switchDefault";

/// One entry of the [`SWITCH_CASES`] list: show `template` when the switch
/// value is identical to `when`.
pub fn case(when: impl Into<Value>, template: Value) -> Value {
    Value::list([when.into(), template])
}

/// Shows the template of the first case whose value is
/// [identical](Value::identical) to [`SWITCH`], or the [`SWITCH_DEFAULT`]
/// template when none matches.
///
/// The view is only replaced when the chosen template changes, so a case
/// list rebuilt on every check costs nothing. Shown views get a `Null`
/// context.
///
/// ```rust,ignore
/// // <ng-container [switch]="mode">
/// //   <ng-template case="edit">..</ng-template>
/// //   <ng-template default>..</ng-template>
/// .update_directives(|b, scope| {
///     let mode = scope.component::<App>().unwrap().mode.as_str();
///     b.node(1, [Value::from(mode), Value::list([case("edit", scope.template(2))]), scope.template(3)]);
/// })
/// ```
#[derive(Debug, Default)]
pub struct Switch {
    value: Value,
    cases: Vec<(Value, TemplateRef)>,
    default: Option<TemplateRef>,
    shown: Option<TemplateRef>,
}

impl Switch {
    fn selected(&self) -> Option<&TemplateRef> {
        self.cases
            .iter()
            .find(|(when, _)| when.identical(&self.value))
            .map(|(_, template)| template)
            .or(self.default.as_ref())
    }
}

impl Directive for Switch {
    fn set_input(&mut self, name: &str, value: &Value) {
        match name {
            SWITCH => self.value = value.clone(),
            SWITCH_CASES => {
                self.cases = value
                    .as_list()
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|entry| match entry.as_list()? {
                        [when, template] => Some((when.clone(), template.as_template()?.clone())),
                        _ => None,
                    })
                    .collect();
            }
            SWITCH_DEFAULT => self.default = value.as_template().cloned(),
            _ => {}
        }
    }

    fn on_changes(&mut self, _changes: &SimpleChanges) -> Command {
        let selected = self.selected().cloned();
        let unchanged = match (&selected, &self.shown) {
            (Some(a), Some(b)) => a.ptr_eq(b),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return Command::none();
        }
        tracing::trace!(value = ?self.value, "switch case change");
        self.shown = selected.clone();
        let create = selected.map_or_else(Command::none, |t| Command::create_view_from(t, Value::Null));
        Command::batch([Command::clear(), create])
    }
}

/// `Switch` provider node bound to [`SWITCH`], [`SWITCH_CASES`] and
/// [`SWITCH_DEFAULT`], in that order.
pub fn switch() -> NodeSpec {
    NodeSpec::directive("Switch", Switch::default)
        .input(SWITCH)
        .input(SWITCH_CASES)
        .input(SWITCH_DEFAULT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_core::testing::TestView;
    use sprig_core::{ViewDefinition, ViewDefinitionBuilder};
    use std::sync::Arc;

    #[derive(Default)]
    struct App {
        mode: String,
    }

    impl Directive for App {}

    fn label(text: &str) -> Arc<ViewDefinition> {
        Arc::new(
            ViewDefinitionBuilder::new()
                .node(NodeSpec::element(1, "i"))
                .node(NodeSpec::text(&[text]))
                .build()
                .unwrap(),
        )
    }

    fn modes() -> ViewDefinition {
        ViewDefinitionBuilder::new()
            .node(NodeSpec::anchor(1, None))
            .node(switch())
            .node(NodeSpec::anchor(0, Some(label("edit"))))
            .node(NodeSpec::anchor(0, Some(label("view"))))
            .node(NodeSpec::anchor(0, Some(label("?"))))
            .update_directives(|b, scope| {
                let mode = scope.component::<App>().unwrap().mode.as_str();
                let cases = Value::list([case("edit", scope.template(2)), case("view", scope.template(3))]);
                b.node(1, [Value::from(mode), cases, scope.template(4)]);
            })
            .build()
            .unwrap()
    }

    fn shown(view: &TestView) -> String {
        view.html().replace("<!---->", "")
    }

    #[test]
    fn shows_the_matching_case() {
        let mut view = TestView::new(modes(), App { mode: "view".into() });
        view.detect_changes().unwrap();
        assert_eq!(shown(&view), "<i>view</i>");

        view.update::<App>(|a| a.mode = "edit".into()).unwrap();
        assert_eq!(shown(&view), "<i>edit</i>");
        assert_eq!(view.engine().view_count(), 2);
    }

    #[test]
    fn falls_back_to_the_default() {
        let mut view = TestView::new(modes(), App { mode: "nope".into() });
        view.detect_changes().unwrap();
        assert_eq!(shown(&view), "<i>?</i>");
    }

    #[test]
    fn rebuilt_cases_keep_the_view() {
        let mut view = TestView::new(modes(), App { mode: "edit".into() });
        view.detect_changes().unwrap();
        let before = view.engine().embedded_views(view.root(), 0).unwrap().to_vec();
        view.detect_changes().unwrap();
        view.detect_changes().unwrap();
        assert_eq!(view.engine().embedded_views(view.root(), 0).unwrap(), before.as_slice());
    }
}
