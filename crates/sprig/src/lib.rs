//! **sprig** -- A template view engine with dirty checking, rendered with
//! [`ratatui`].
//!
//! This is the umbrella crate that re-exports everything you need to build a
//! sprig application from a single dependency:
//!
//! ```toml
//! [dependencies]
//! sprig = "0.1"
//! ```
//!
//! # Re-exports
//!
//! * All public items from [`sprig_core`] are available at the crate root
//!   ([`ViewDefinitionBuilder`], [`NodeSpec`], [`Engine`], [`Directive`],
//!   [`Command`], [`Value`], [`Program`], [`run`], [`run_with`], etc.).
//! * The [`directives`] module re-exports everything from [`sprig_common`]
//!   ([`ShowIf`](directives::ShowIf), [`ForOf`](directives::ForOf),
//!   [`Switch`](directives::Switch)).
//! * [`ratatui`], [`crossterm`], and [`tokio`] are re-exported so downstream
//!   crates do not need to depend on them directly.
//!
//! # Quick start
//!
//! ```ignore
//! use sprig::{Directive, NodeSpec, ViewDefinitionBuilder};
//!
//! struct Hello;
//! impl Directive for Hello {}
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let def = ViewDefinitionBuilder::new()
//!         .node(NodeSpec::element(1, "h1"))
//!         .node(NodeSpec::text(&["Hello, sprig!"]))
//!         .build()?;
//!     sprig::run(def, Hello).await?;
//!     Ok(())
//! }
//! ```

pub use sprig_core::*;
pub mod directives {
    pub use sprig_common::*;
}

// Re-export dependencies for use in demos and downstream crates
pub use crossterm;
pub use ratatui;
pub use tokio;
