//! Built-in directives for the **sprig** view engine.
//!
//! Every directive in this crate implements [`sprig_core::Directive`] and
//! sits on an anchor, driving the anchor's embedded views through the
//! [`sprig_core::Command`]s it returns.  Each module also offers a helper
//! that returns the ready-to-use provider [`NodeSpec`](sprig_core::NodeSpec).
//!
//! # Directives
//!
//! | Module | Directive | Description |
//! |--------|-----------|-------------|
//! | [`show_if`] | [`ShowIf`] | Conditional template with optional else branch |
//! | [`for_of`] | [`ForOf`] | One view per list item, reconciled by position |
//! | [`switch`] | [`Switch`] | One template out of several, chosen by value |

pub mod for_of;
pub mod show_if;
pub mod switch;

pub use for_of::{for_of, ForOf, FOR_OF};
pub use show_if::{show_if, show_if_else, ShowIf, SHOW_IF, SHOW_IF_ELSE};
pub use switch::{case, switch, Switch, SWITCH, SWITCH_CASES, SWITCH_DEFAULT};
