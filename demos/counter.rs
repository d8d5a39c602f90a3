//! # Counter Demo
//!
//! A minimal counter demonstrating the core sprig pieces:
//! - Declaring a template with [`ViewDefinitionBuilder`] and [`NodeSpec`]
//! - Text, class and style bindings evaluated against the root component
//! - Handling `window:keydown` events and letting the driver re-check
//!
//! Run with: `cargo run --example counter` (Ctrl+C quits)

use sprig::{BindingDef, Directive, NodeSpec, ProgramOptions, Value, ViewDefinition, ViewDefinitionBuilder};

/// Root component.
#[derive(Default)]
struct Counter {
    count: i64,
}

impl Directive for Counter {}

// <main (window:keydown)>
//   <h1>Counter</h1>
//   <p [style.color]="color">Count: {{count}}</p>
//   <p class="dim">+/- to change, r to reset, Ctrl+C to quit</p>
// </main>
fn counter_view() -> Result<ViewDefinition, sprig::BuildError> {
    ViewDefinitionBuilder::new()
        .node(NodeSpec::element(6, "main").output_on("window", "keydown"))
        .node(NodeSpec::element(1, "h1"))
        .node(NodeSpec::text(&["Counter"]))
        .node(NodeSpec::element(1, "p").bind(BindingDef::style("color")))
        .node(NodeSpec::text(&["Count: ", ""]))
        .node(NodeSpec::element(1, "p").attr("class", "dim"))
        .node(NodeSpec::text(&["+/- to change, r to reset, Ctrl+C to quit"]))
        .update_renderer(|b, scope| {
            let count = scope.component::<Counter>().map_or(0, |c| c.count);
            let color = match count.signum() {
                1 => "green",
                -1 => "red",
                _ => "white",
            };
            b.value(3, color);
            b.value(4, count);
        })
        .handle_event(|scope, _node, _event, payload| {
            let Some(counter) = scope.component_mut::<Counter>() else {
                return true;
            };
            match payload.get("key").and_then(Value::as_str) {
                Some("+") | Some("=") | Some("ArrowUp") => counter.count += 1,
                Some("-") | Some("ArrowDown") => counter.count -= 1,
                Some("r") => counter.count = 0,
                _ => {}
            }
            true
        })
        .build()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = ProgramOptions {
        title: Some("sprig counter".into()),
        ..ProgramOptions::default()
    };
    let (engine, root) = sprig::run_with(counter_view()?, Counter::default(), options).await?;
    let count = engine.component::<Counter>(root).map_or(0, |c| c.count);
    println!("Final count: {count}");
    Ok(())
}
