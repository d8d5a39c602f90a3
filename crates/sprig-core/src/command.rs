use crate::value::{TemplateRef, Value};

/// A structural change returned from a [`Directive`](crate::Directive) hook.
///
/// Commands act on the view container of the anchor the directive sits on.
/// They are executed by the engine in order, immediately after the hook that
/// produced them returns.
///
/// # Examples
///
/// ```rust,ignore
/// // Do nothing:
/// let cmd = Command::none();
///
/// // Show the anchor's own template once:
/// let cmd = Command::batch([Command::clear(), Command::create_view(Value::Null)]);
///
/// // Drop the last of three views:
/// let cmd = Command::remove_view(2);
/// ```
#[derive(Debug, Default)]
pub struct Command {
    pub(crate) inner: CommandInner,
}

#[derive(Debug, Default)]
pub(crate) enum CommandInner {
    #[default]
    None,
    Container(ContainerOp),
    Batch(Vec<Command>),
}

/// Operations on an anchor's list of embedded views.
#[derive(Debug, Clone)]
pub enum ContainerOp {
    /// Instantiate a template and insert it at `index` (or at the end).
    ///
    /// `template: None` uses the anchor's own template.
    Create {
        /// Template to instantiate.
        template: Option<TemplateRef>,
        /// Context of the new view.
        context: Value,
        /// Insertion position.
        index: Option<usize>,
    },
    /// Destroy the view at the given position.
    Remove(usize),
    /// Move a view to another position.
    Move {
        /// Current position.
        from: usize,
        /// New position.
        to: usize,
    },
    /// Replace the context of the view at `index`.
    SetContext {
        /// Position of the view.
        index: usize,
        /// New context.
        context: Value,
    },
    /// Destroy every view in the container.
    Clear,
}

impl Command {
    /// No-op command.
    pub fn none() -> Self {
        Command {
            inner: CommandInner::None,
        }
    }

    /// `true` for [`Command::none`].
    pub fn is_none(&self) -> bool {
        matches!(self.inner, CommandInner::None)
    }

    /// Wrap a raw container operation.
    pub fn container(op: ContainerOp) -> Self {
        Command {
            inner: CommandInner::Container(op),
        }
    }

    /// Append a view of the anchor's own template.
    pub fn create_view(context: impl Into<Value>) -> Self {
        Self::container(ContainerOp::Create {
            template: None,
            context: context.into(),
            index: None,
        })
    }

    /// Append a view of another template.
    pub fn create_view_from(template: TemplateRef, context: impl Into<Value>) -> Self {
        Self::container(ContainerOp::Create {
            template: Some(template),
            context: context.into(),
            index: None,
        })
    }

    /// Insert a view of the anchor's own template at `index`.
    pub fn insert_view(index: usize, context: impl Into<Value>) -> Self {
        Self::container(ContainerOp::Create {
            template: None,
            context: context.into(),
            index: Some(index),
        })
    }

    /// Destroy the view at `index`.
    pub fn remove_view(index: usize) -> Self {
        Self::container(ContainerOp::Remove(index))
    }

    /// Move the view at `from` to `to`.
    pub fn move_view(from: usize, to: usize) -> Self {
        Self::container(ContainerOp::Move { from, to })
    }

    /// Replace the context of the view at `index`.
    pub fn set_context(index: usize, context: impl Into<Value>) -> Self {
        Self::container(ContainerOp::SetContext {
            index,
            context: context.into(),
        })
    }

    /// Destroy every view in the container.
    pub fn clear() -> Self {
        Self::container(ContainerOp::Clear)
    }

    /// Run several commands in order.
    pub fn batch(cmds: impl IntoIterator<Item = Command>) -> Self {
        let mut cmds: Vec<_> = cmds.into_iter().filter(|c| !c.is_none()).collect();
        match cmds.len() {
            0 => Command::none(),
            1 => cmds.pop().unwrap_or_default(),
            _ => Command {
                inner: CommandInner::Batch(cmds),
            },
        }
    }

    /// Flatten into the ordered list of container operations.
    pub fn into_ops(self) -> Vec<ContainerOp> {
        let mut ops = Vec::new();
        self.collect_ops(&mut ops);
        ops
    }

    fn collect_ops(self, ops: &mut Vec<ContainerOp>) {
        match self.inner {
            CommandInner::None => {}
            CommandInner::Container(op) => ops.push(op),
            CommandInner::Batch(cmds) => {
                for cmd in cmds {
                    cmd.collect_ops(ops);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_of_nothing_is_none() {
        assert!(Command::batch([Command::none(), Command::none()]).is_none());
    }

    #[test]
    fn batch_of_one_unwraps() {
        let cmd = Command::batch([Command::none(), Command::clear()]);
        assert!(matches!(cmd.inner, CommandInner::Container(ContainerOp::Clear)));
    }

    #[test]
    fn nested_batches_flatten_in_order() {
        let cmd = Command::batch([
            Command::clear(),
            Command::batch([Command::remove_view(1), Command::move_view(0, 2)]),
            Command::set_context(0, 5),
        ]);
        let ops = cmd.into_ops();
        assert_eq!(ops.len(), 4);
        assert!(matches!(ops[0], ContainerOp::Clear));
        assert!(matches!(ops[1], ContainerOp::Remove(1)));
        assert!(matches!(ops[2], ContainerOp::Move { from: 0, to: 2 }));
        assert!(matches!(ops[3], ContainerOp::SetContext { index: 0, .. }));
    }
}
