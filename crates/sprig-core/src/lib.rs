//! Core view engine for the **sprig** UI toolkit.
//!
//! `sprig-core` turns compiled templates into live views and keeps them in
//! sync with application state by dirty checking.  A template is described
//! once as an immutable [`ViewDefinition`]; every view instantiated from it
//! records the last value of each binding and writes to the rendering
//! backend only when a value changed.
//!
//! # Key types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`ViewDefinitionBuilder`] | Validates a pre-order node list into a [`ViewDefinition`] |
//! | [`Engine`] | Owns views, runs change detection, manages embedded views and events |
//! | [`Directive`] | Behavior attached to a node (inputs, lifecycle hooks, [`Command`]s) |
//! | [`Value`] | Dynamically typed binding value with reference-identity comparison |
//! | [`Renderer`] | Platform contract; [`RenderStrategy`] picks direct or mediated rendering |
//! | [`Document`] | In-memory element tree used by the direct strategy |
//! | [`Program`] | Drives a root view on a real terminal |
//! | [`TestView`](testing::TestView) | Headless harness for unit-testing views |
//!
//! # Change detection
//!
//! 1. **create** -- [`Engine::create_root_view`] instantiates the nodes,
//!    listeners and component views of a definition.  No binding is applied
//!    yet.
//! 2. **update** -- [`Engine::check_and_update_view`] runs directive hooks,
//!    checks embedded views, applies changed element and text bindings, then
//!    checks component views.
//! 3. **verify** -- in dev mode [`Engine::tick`] follows every update with
//!    [`Engine::check_no_changes_view`], which fails if any binding would
//!    evaluate differently.
//! 4. **event** -- listeners route events to the view's handler, which
//!    mutates state and marks the view for check.
//! 5. **destroy** -- [`Engine::destroy_view`] tears a view down together
//!    with everything it hosts.
//!
//! # Quick example
//!
//! ```ignore
//! use sprig_core::{Directive, NodeSpec, Value, ViewDefinitionBuilder};
//! use sprig_core::testing::TestView;
//!
//! #[derive(Default)]
//! struct Counter { count: i64 }
//! impl Directive for Counter {}
//!
//! // <p (click)="count += 1">Count: {{ count }}</p>
//! let def = ViewDefinitionBuilder::new()
//!     .node(NodeSpec::element(1, "p").output("click"))
//!     .node(NodeSpec::text(&["Count: ", ""]))
//!     .update_renderer(|b, scope| {
//!         let counter = scope.component::<Counter>().unwrap();
//!         b.value(1, counter.count);
//!     })
//!     .handle_event(|scope, _node, _event, _payload| {
//!         scope.component_mut::<Counter>().unwrap().count += 1;
//!         true
//!     })
//!     .build()?;
//!
//! let mut view = TestView::new(def, Counter::default());
//! view.detect_changes()?;
//! view.fire(view.root(), 0, "click", Value::Null)?;
//! view.detect_changes()?;
//! assert_eq!(view.html(), "<p>Count: 1</p>");
//! ```

pub mod builder;
pub mod check;
pub mod command;
pub mod container;
pub mod debug;
pub mod def;
pub mod directive;
pub mod dom;
pub mod engine;
pub mod error;
pub mod event;
pub mod present;
pub mod renderer;
pub mod runtime;
pub mod scope;
pub mod testing;
pub mod value;
pub mod view;

pub use builder::{NodeSpec, ViewDefinitionBuilder};
pub use command::{Command, ContainerOp};
pub use def::{BindingDef, BindingKind, NodeDef, NodeFlags, NodeKind, ViewDefinition, ViewFlags};
pub use directive::{Directive, SimpleChange, SimpleChanges};
pub use dom::{Document, DomNodeKind, DomRenderer, ListenerId, NodeHandle};
pub use engine::{Engine, EngineOptions, ViewDefinitionFactory};
pub use error::{BuildError, CheckError, ExpressionChangedError, SerializeError, ViewError};
pub use event::DomEvent;
pub use present::DocumentView;
pub use renderer::{ListenTarget, RenderStrategy, Renderer};
pub use runtime::{log_to_file, OutputTarget, Program, ProgramError, ProgramHandle, ProgramOptions};
pub use scope::{Bindings, EventScope, Scope};
pub use value::{dev_mode_equal, TemplateRef, Value};
pub use view::{ViewId, ViewKind, ViewState};

/// Run a root view on the terminal with default options.
pub async fn run<D: Directive>(
    def: impl Into<std::sync::Arc<ViewDefinition>>,
    component: D,
) -> Result<(Engine, ViewId), ProgramError> {
    Program::new(def, component)?.run().await
}

/// Run with custom options.
pub async fn run_with<D: Directive>(
    def: impl Into<std::sync::Arc<ViewDefinition>>,
    component: D,
    options: ProgramOptions,
) -> Result<(Engine, ViewId), ProgramError> {
    Program::with_options(def, component, options)?.run().await
}
