//! Error types for definition building, checking and view management.

use crate::dom::ListenerId;
use crate::value::Value;
use crate::view::ViewId;

/// Errors raised while turning a node list into a
/// [`ViewDefinition`](crate::def::ViewDefinition).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// The pre-order node list does not describe a well-formed tree.
    #[error("invalid view structure at node {index}: {reason}")]
    InvalidViewStructure {
        /// Index of the offending node.
        index: usize,
        /// Human-readable description of the problem.
        reason: String,
    },
}

impl BuildError {
    pub(crate) fn structure(index: usize, reason: impl Into<String>) -> Self {
        BuildError::InvalidViewStructure {
            index,
            reason: reason.into(),
        }
    }
}

/// Errors from operations that address views, anchors or listeners.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    /// The handle refers to a view that was destroyed (or never existed).
    #[error("view {0:?} has been destroyed")]
    ViewDestroyed(ViewId),
    /// The node index is out of range for the view's definition.
    #[error("node {node} does not exist in view {view:?}")]
    UnknownNode {
        /// View that was addressed.
        view: ViewId,
        /// Requested node index.
        node: usize,
    },
    /// The addressed node is not an anchor and cannot host embedded views.
    #[error("node {node} of view {view:?} is not an anchor")]
    NotAnchor {
        /// View that was addressed.
        view: ViewId,
        /// Requested node index.
        node: usize,
    },
    /// A directive asked for a view container but is not placed on an anchor.
    #[error("directive at node {node} is not hosted by an anchor")]
    NoViewContainer {
        /// Index of the directive node.
        node: usize,
    },
    /// The anchor has no template and the command did not provide one.
    #[error("anchor {node} has no template to instantiate")]
    NoTemplate {
        /// Index of the anchor node.
        node: usize,
    },
    /// An embedded-view index was outside the container bounds.
    #[error("index {index} is out of range for a container of {len} views")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of views currently in the container.
        len: usize,
    },
    /// The view is already inserted into a container.
    #[error("view {0:?} is already attached to a container")]
    AlreadyAttached(ViewId),
    /// The view would end up inside its own subtree.
    #[error("view {0:?} cannot be attached below itself")]
    CyclicAttach(ViewId),
    /// Only embedded views can be inserted into containers.
    #[error("view {0:?} is not an embedded view")]
    NotEmbedded(ViewId),
    /// The listener id is not registered with the engine.
    #[error("listener {0:?} is not registered")]
    UnknownListener(ListenerId),
}

/// Raised by the verification pass when a binding changed after it was checked.
///
/// Carries the previous and current values and whether the view had never
/// completed an update pass.
#[derive(Debug, Clone, thiserror::Error)]
#[error(
    "ExpressionChangedAfterItHasBeenCheckedError: Expression has changed after it was checked. \
     Previous value: '{binding}: {}'. Current value: '{binding}: {}'.{}",
    .old.render_string(),
    .new.render_string(),
    first_check_hint(.first_check)
)]
pub struct ExpressionChangedError {
    /// Node owning the binding.
    pub node: usize,
    /// Binding name (property, attribute, input, or `text`).
    pub binding: String,
    /// Value recorded by the last update pass.
    pub old: Value,
    /// Value seen by the verification pass.
    pub new: Value,
    /// `true` when the view was created after its parent had been checked.
    pub first_check: bool,
}

fn first_check_hint(first_check: &bool) -> &'static str {
    if *first_check {
        " It seems like the view has been created after its parent and its children have been dirty checked. \
         Has it been created in a change detection hook?"
    } else {
        ""
    }
}

/// Errors from [`Engine::check_and_update_view`](crate::engine::Engine::check_and_update_view)
/// and [`Engine::check_no_changes_view`](crate::engine::Engine::check_no_changes_view).
#[derive(Debug, Clone, thiserror::Error)]
pub enum CheckError {
    /// A binding produced a different value in the verification pass.
    #[error(transparent)]
    ExpressionChanged(#[from] ExpressionChangedError),
    /// An evaluator supplied the wrong number of values for a node.
    #[error("node {node} expects {expected} binding values, got {actual}")]
    BindingCount {
        /// Node index.
        node: usize,
        /// Number of bindings declared on the node.
        expected: usize,
        /// Number of values the evaluator supplied.
        actual: usize,
    },
    /// An evaluator bound a node that does not exist or cannot take values
    /// in that evaluator.
    #[error("node {node} cannot be bound by the {evaluator} evaluator")]
    MisplacedBinding {
        /// Node index.
        node: usize,
        /// `"directives"` or `"renderer"`.
        evaluator: &'static str,
    },
    /// A view or container operation failed during the check.
    #[error(transparent)]
    View(#[from] ViewError),
}

/// Returned by [`Value::try_serialize`](crate::value::Value::try_serialize)
/// for values without a textual form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot serialize {kind} value")]
pub struct SerializeError {
    pub(crate) kind: &'static str,
}
