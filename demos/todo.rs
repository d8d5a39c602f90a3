//! # Todo Demo
//!
//! Structural directives and external updates:
//! - [`ForOf`](sprig::directives::ForOf) renders one `<li>` per item
//! - [`ShowIf`](sprig::directives::ShowIf) swaps in an "all done" message
//! - A background task adds items through a [`ProgramHandle`]
//!
//! Run with: `cargo run --example todo` (Ctrl+C quits)

use sprig::directives::{for_of, show_if_else};
use sprig::{BindingDef, Directive, NodeSpec, Program, Value, ViewDefinition, ViewDefinitionBuilder};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Todo {
    items: Vec<String>,
    done: usize,
}

impl Todo {
    fn open(&self) -> Value {
        Value::list(self.items.iter().skip(self.done).map(String::as_str))
    }
}

impl Directive for Todo {}

// <li [class.dim]="odd">{{index + 1}}. {{$implicit}}</li>
fn item_view() -> Result<Arc<ViewDefinition>, sprig::BuildError> {
    let def = ViewDefinitionBuilder::new()
        .node(NodeSpec::element(1, "li").bind(BindingDef::class("dim")))
        .node(NodeSpec::text(&["", ". ", ""]))
        .update_renderer(|b, scope| {
            let position = scope.local("index").as_number().unwrap_or_default() + 1.0;
            b.value(0, scope.local("odd"));
            b.node(1, [Value::from(position), scope.local("$implicit")]);
        })
        .build()?;
    Ok(Arc::new(def))
}

fn message(text: &str) -> Result<Arc<ViewDefinition>, sprig::BuildError> {
    let def = ViewDefinitionBuilder::new()
        .node(NodeSpec::element(1, "p"))
        .node(NodeSpec::text(&[text]))
        .build()?;
    Ok(Arc::new(def))
}

// <h1>Todo</h1>
// <ng-template [showIf]="open" [showIfElse]="done">
//   <ul><ng-template [forOf]="open"><li>..</li></ng-template></ul>
// </ng-template>
// <ng-template #done><p>All done!</p></ng-template>
// <p class="dim">space completes the first item</p>
fn todo_view() -> Result<ViewDefinition, sprig::BuildError> {
    let list = ViewDefinitionBuilder::new()
        .node(NodeSpec::element(2, "ul"))
        .node(NodeSpec::anchor(1, Some(item_view()?)))
        .node(for_of())
        .update_directives(|b, scope| {
            let open = scope.component::<Todo>().map(Todo::open).unwrap_or_default();
            b.value(2, open);
        })
        .build()?;

    ViewDefinitionBuilder::new()
        .node(NodeSpec::element(1, "h1").output_on("window", "keydown"))
        .node(NodeSpec::text(&["Todo"]))
        .node(NodeSpec::anchor(1, Some(Arc::new(list))))
        .node(show_if_else())
        .node(NodeSpec::anchor(0, Some(message("All done!")?)))
        .node(NodeSpec::element(1, "p").attr("class", "dim"))
        .node(NodeSpec::text(&["space completes the first item"]))
        .update_directives(|b, scope| {
            let remaining = scope.component::<Todo>().map_or(0, |t| t.items.len() - t.done);
            b.node(3, [Value::from(remaining), scope.template(4)]);
        })
        .handle_event(|scope, _node, _event, payload| {
            if payload.get("key").and_then(Value::as_str) == Some(" ") {
                if let Some(todo) = scope.component_mut::<Todo>() {
                    todo.done = (todo.done + 1).min(todo.items.len());
                }
            }
            true
        })
        .build()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let todo = Todo {
        items: vec!["milk".into(), "eggs".into()],
        done: 0,
    };
    let program = Program::new(todo_view()?, todo)?;
    let handle = program.handle();

    tokio::spawn(async move {
        for item in ["bread", "tea", "jam"] {
            tokio::time::sleep(Duration::from_secs(2)).await;
            handle.update::<Todo>(move |todo| todo.items.push(item.to_string()));
        }
    });

    program.run().await?;
    Ok(())
}
