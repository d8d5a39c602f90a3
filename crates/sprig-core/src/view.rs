//! Runtime view instances and the arena that owns them.

use crate::def::ViewDefinition;
use crate::directive::Directive;
use crate::dom::{ListenerId, NodeHandle};
use crate::value::Value;
use bitflags::bitflags;
use std::sync::Arc;

/// Generational handle to a view in an [`Engine`](crate::engine::Engine).
///
/// Handles of destroyed views never alias a later view: every reused slot
/// bumps its generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId {
    index: u32,
    generation: u32,
}

bitflags! {
    /// Lifecycle and change-detection state of a view.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ViewState: u8 {
        /// No update pass has completed yet.
        const FIRST_CHECK = 1 << 0;
        /// The view takes part in change detection.
        const ATTACHED = 1 << 1;
        /// The view is checked when its parent is checked.
        const CHECKS_ENABLED = 1 << 2;
        /// The view has been torn down.
        const DESTROYED = 1 << 3;
    }
}

impl ViewState {
    pub(crate) fn initial() -> Self {
        ViewState::FIRST_CHECK | ViewState::ATTACHED | ViewState::CHECKS_ENABLED
    }
}

/// How a view came into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// Created with `create_root_view`.
    Root,
    /// Instantiated from an anchor's template into a container.
    Embedded,
    /// Rendered inside a component host element.
    Component,
}

/// Where a view finds its component instance.
pub(crate) enum ComponentSource {
    /// No component (templates without a declaring view).
    None,
    /// The view owns it (root views).
    Owned(Box<dyn Directive>),
    /// The component provider of a host element in another view.
    Provider { view: ViewId, node: usize },
    /// Same component as the view that declared the template.
    Declaration(ViewId),
}

/// Per-node runtime state.
pub(crate) enum NodeData {
    Element {
        render: NodeHandle,
        component_view: Option<ViewId>,
    },
    Text {
        render: NodeHandle,
    },
    Anchor {
        render: NodeHandle,
        views: Vec<ViewId>,
    },
    Provider {
        instance: Option<Box<dyn Directive>>,
    },
}

impl NodeData {
    pub(crate) fn render(&self) -> Option<NodeHandle> {
        match self {
            NodeData::Element { render, .. }
            | NodeData::Text { render }
            | NodeData::Anchor { render, .. } => Some(*render),
            NodeData::Provider { .. } => None,
        }
    }
}

/// A live instance of a [`ViewDefinition`].
pub(crate) struct ViewData {
    pub(crate) def: Arc<ViewDefinition>,
    pub(crate) kind: ViewKind,
    pub(crate) parent: Option<ViewId>,
    /// Anchor (embedded views) or host element (component views) in `parent`.
    pub(crate) parent_node: Option<usize>,
    pub(crate) context: Value,
    pub(crate) component: ComponentSource,
    pub(crate) nodes: Vec<NodeData>,
    pub(crate) old_values: Vec<Value>,
    pub(crate) state: ViewState,
    pub(crate) listeners: Vec<ListenerId>,
}

impl ViewData {
    /// Embedded view currently inserted in a container.
    pub(crate) fn is_contained(&self) -> bool {
        self.kind == ViewKind::Embedded && self.parent.is_some()
    }

    pub(crate) fn is_checked_with_parent(&self) -> bool {
        self.state
            .contains(ViewState::ATTACHED | ViewState::CHECKS_ENABLED)
    }
}

struct Slot {
    generation: u32,
    view: Option<ViewData>,
}

/// Slot arena of views addressed by [`ViewId`].
#[derive(Default)]
pub(crate) struct ViewArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl ViewArena {
    pub(crate) fn insert(&mut self, view: ViewData) -> ViewId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.view = Some(view);
            ViewId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                view: Some(view),
            });
            ViewId {
                index,
                generation: 0,
            }
        }
    }

    pub(crate) fn get(&self, id: ViewId) -> Option<&ViewData> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.view.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: ViewId) -> Option<&mut ViewData> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.view.as_mut())
    }

    pub(crate) fn remove(&mut self, id: ViewId) -> Option<ViewData> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)?;
        let view = slot.view.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(view)
    }

    pub(crate) fn contains(&self, id: ViewId) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.view.is_some()).count()
    }
}
