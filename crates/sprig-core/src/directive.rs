use crate::command::Command;
use crate::value::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Upcast helper so that `dyn Directive` can be downcast to its concrete type.
///
/// Implemented for every `'static` type; never implement it by hand.
pub trait AsAny {
    /// Borrow as `dyn Any`.
    fn as_any(&self) -> &dyn Any;
    /// Mutably borrow as `dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A value change delivered to [`Directive::on_changes`].
#[derive(Debug, Clone)]
pub struct SimpleChange {
    /// Value before this check (`Null` on the first check).
    pub previous: Value,
    /// Value applied by this check.
    pub current: Value,
    /// `true` during the first check of the owning view.
    pub first_change: bool,
}

/// Input changes keyed by input name.
pub type SimpleChanges = BTreeMap<Arc<str>, SimpleChange>;

/// A directive or component instance living in a provider node.
///
/// Every hook has a no-op default. Hooks that may restructure the anchor
/// the directive sits on return a [`Command`]; the engine executes it right
/// after the hook returns, before any embedded view is checked.
///
/// The engine calls the hooks in this order during each update pass:
///
/// 1. [`set_input`](Directive::set_input) for every changed input,
/// 2. [`on_changes`](Directive::on_changes) if at least one input changed,
/// 3. [`on_init`](Directive::on_init) on the first check only,
/// 4. [`do_check`](Directive::do_check) on every check.
///
/// [`on_destroy`](Directive::on_destroy) runs once when the owning view is
/// destroyed, after all of its embedded and component views.
///
/// # Example
///
/// ```rust,ignore
/// use sprig_core::{Command, Directive, SimpleChanges, Value};
///
/// #[derive(Default)]
/// struct Counter { count: i64 }
///
/// impl Directive for Counter {}
/// ```
pub trait Directive: AsAny + Send + 'static {
    /// Receive the new value of an input binding.
    fn set_input(&mut self, name: &str, value: &Value) {
        let _ = (name, value);
    }

    /// Called after inputs changed, with every changed input.
    fn on_changes(&mut self, changes: &SimpleChanges) -> Command {
        let _ = changes;
        Command::none()
    }

    /// Called once, during the first check of the owning view.
    fn on_init(&mut self) -> Command {
        Command::none()
    }

    /// Called on every update pass.
    fn do_check(&mut self) -> Command {
        Command::none()
    }

    /// Called when the owning view is destroyed.
    fn on_destroy(&mut self) {}
}

impl dyn Directive {
    /// Downcast to the concrete directive type.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutably downcast to the concrete directive type.
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}
