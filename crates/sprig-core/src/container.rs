//! Embedded views hosted by anchors.
//!
//! An anchor renders as an empty comment. Views inserted into its container
//! render as siblings that follow the comment, in container order, so a
//! view's root nodes always go right after the last root node of the view
//! before it (or right after the comment for the first view).
//!
//! Lifecycle of an embedded view:
//!
//! ```text
//!  create ──► attached ◄──► detached
//!                │             │
//!                └──► destroyed ◄┘
//! ```

use crate::command::ContainerOp;
use crate::def::{NodeKind, ViewDefinition};
use crate::dom::NodeHandle;
use crate::engine::Engine;
use crate::error::ViewError;
use crate::value::Value;
use crate::view::{ComponentSource, NodeData, ViewId, ViewKind};
use std::sync::Arc;

impl Engine {
    /// Views currently hosted by `anchor` in `view`, in render order.
    pub fn embedded_views(&self, view: ViewId, anchor: usize) -> Result<&[ViewId], ViewError> {
        self.anchor_views(view, anchor)
    }

    pub(crate) fn anchor_views(&self, view: ViewId, anchor: usize) -> Result<&[ViewId], ViewError> {
        match self.live(view)?.nodes.get(anchor) {
            Some(NodeData::Anchor { views, .. }) => Ok(views),
            Some(_) => Err(ViewError::NotAnchor { view, node: anchor }),
            None => Err(ViewError::UnknownNode { view, node: anchor }),
        }
    }

    fn anchor_views_mut(&mut self, view: ViewId, anchor: usize) -> Result<&mut Vec<ViewId>, ViewError> {
        match self.live_mut(view)?.nodes.get_mut(anchor) {
            Some(NodeData::Anchor { views, .. }) => Ok(views),
            Some(_) => Err(ViewError::NotAnchor { view, node: anchor }),
            None => Err(ViewError::UnknownNode { view, node: anchor }),
        }
    }

    /// Instantiate `template` and insert it into the container of `anchor`
    /// at `index` (appended when `None`).
    ///
    /// The new view evaluates its bindings against the component of `view`
    /// and the given `context`. It is checked with its container from the
    /// next pass on.
    pub fn create_embedded_view(
        &mut self,
        view: ViewId,
        anchor: usize,
        template: &Arc<ViewDefinition>,
        context: impl Into<Value>,
        index: Option<usize>,
    ) -> Result<ViewId, ViewError> {
        let len = self.anchor_views(view, anchor)?.len();
        let index = index.unwrap_or(len);
        if index > len {
            return Err(ViewError::IndexOutOfRange { index, len });
        }
        let id = self.create_view(
            template.clone(),
            ViewKind::Embedded,
            None,
            None,
            context.into(),
            ComponentSource::Declaration(view),
            None,
        );
        self.attach_embedded_view(view, anchor, index, id)?;
        Ok(id)
    }

    /// Insert a detached embedded view into the container of `anchor`.
    pub fn attach_embedded_view(
        &mut self,
        view: ViewId,
        anchor: usize,
        index: usize,
        embedded: ViewId,
    ) -> Result<(), ViewError> {
        let len = self.anchor_views(view, anchor)?.len();
        let data = self.live(embedded)?;
        if data.kind != ViewKind::Embedded {
            return Err(ViewError::NotEmbedded(embedded));
        }
        if data.is_contained() {
            return Err(ViewError::AlreadyAttached(embedded));
        }
        if index > len {
            return Err(ViewError::IndexOutOfRange { index, len });
        }
        let mut ancestor = Some(view);
        while let Some(current) = ancestor {
            if current == embedded {
                return Err(ViewError::CyclicAttach(embedded));
            }
            ancestor = self.views.get(current).and_then(|v| v.parent);
        }

        self.anchor_views_mut(view, anchor)?.insert(index, embedded);
        let data = self.live_mut(embedded)?;
        data.parent = Some(view);
        data.parent_node = Some(anchor);
        self.render_attach(view, anchor, index, embedded);
        tracing::trace!(?view, anchor, index, ?embedded, "embedded view attached");
        Ok(())
    }

    /// Take the view at `index` out of the container without destroying it.
    /// Its render nodes leave the document until it is attached again.
    pub fn detach_embedded_view(&mut self, view: ViewId, anchor: usize, index: usize) -> Result<ViewId, ViewError> {
        let views = self.anchor_views_mut(view, anchor)?;
        let len = views.len();
        if index >= len {
            return Err(ViewError::IndexOutOfRange { index, len });
        }
        let embedded = views.remove(index);
        self.render_detach(embedded);
        if let Some(data) = self.views.get_mut(embedded) {
            data.parent = None;
            data.parent_node = None;
        }
        tracing::trace!(?view, anchor, index, ?embedded, "embedded view detached");
        Ok(embedded)
    }

    /// Move the view at `from` to position `to` of the same container.
    pub fn move_embedded_view(&mut self, view: ViewId, anchor: usize, from: usize, to: usize) -> Result<ViewId, ViewError> {
        let len = self.anchor_views(view, anchor)?.len();
        if from >= len {
            return Err(ViewError::IndexOutOfRange { index: from, len });
        }
        if to >= len {
            return Err(ViewError::IndexOutOfRange { index: to, len });
        }
        let embedded = self.detach_embedded_view(view, anchor, from)?;
        self.attach_embedded_view(view, anchor, to, embedded)?;
        Ok(embedded)
    }

    /// Detach and destroy the view at `index`.
    pub fn remove_embedded_view(&mut self, view: ViewId, anchor: usize, index: usize) -> Result<(), ViewError> {
        let embedded = self.detach_embedded_view(view, anchor, index)?;
        self.destroy_internal(embedded);
        Ok(())
    }

    /// Replace the context of an embedded view.
    pub fn set_context(&mut self, view: ViewId, context: impl Into<Value>) -> Result<(), ViewError> {
        self.live_mut(view)?.context = context.into();
        Ok(())
    }

    pub(crate) fn apply_container_op(&mut self, view: ViewId, anchor: usize, op: ContainerOp) -> Result<(), ViewError> {
        match op {
            ContainerOp::Create {
                template,
                context,
                index,
            } => {
                let template = match template {
                    Some(t) => t.definition().clone(),
                    None => self.anchor_template(view, anchor)?,
                };
                self.create_embedded_view(view, anchor, &template, context, index)?;
            }
            ContainerOp::Remove(index) => self.remove_embedded_view(view, anchor, index)?,
            ContainerOp::Move { from, to } => {
                self.move_embedded_view(view, anchor, from, to)?;
            }
            ContainerOp::SetContext { index, context } => {
                let views = self.anchor_views(view, anchor)?;
                let embedded = *views.get(index).ok_or(ViewError::IndexOutOfRange {
                    index,
                    len: views.len(),
                })?;
                self.set_context(embedded, context)?;
            }
            ContainerOp::Clear => {
                for index in (0..self.anchor_views(view, anchor)?.len()).rev() {
                    self.remove_embedded_view(view, anchor, index)?;
                }
            }
        }
        Ok(())
    }

    fn anchor_template(&self, view: ViewId, anchor: usize) -> Result<Arc<ViewDefinition>, ViewError> {
        let def = &self.live(view)?.def;
        match def.node(anchor).map(|n| &n.kind) {
            Some(NodeKind::Anchor(a)) => a.template.clone().ok_or(ViewError::NoTemplate { node: anchor }),
            Some(_) => Err(ViewError::NotAnchor { view, node: anchor }),
            None => Err(ViewError::UnknownNode { view, node: anchor }),
        }
    }

    /// Root render nodes of a view in document order, including the root
    /// nodes of views hosted by its root anchors.
    pub fn root_render_nodes(&self, id: ViewId) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        self.collect_root_render_nodes(id, &mut out);
        out
    }

    fn collect_root_render_nodes(&self, id: ViewId, out: &mut Vec<NodeHandle>) {
        let Some(view) = self.views.get(id) else {
            return;
        };
        for &index in view.def.root_nodes() {
            match &view.nodes[index] {
                NodeData::Element { render, .. } | NodeData::Text { render } => out.push(*render),
                NodeData::Anchor { render, views } => {
                    out.push(*render);
                    for hosted in views {
                        self.collect_root_render_nodes(*hosted, out);
                    }
                }
                NodeData::Provider { .. } => {}
            }
        }
    }

    fn render_attach(&mut self, view: ViewId, anchor: usize, index: usize, embedded: ViewId) {
        let Ok(views) = self.anchor_views(view, anchor) else {
            return;
        };
        let Some(comment) = self.render_node(view, anchor) else {
            return;
        };
        let previous = views[..index]
            .iter()
            .rev()
            .find_map(|v| self.root_render_nodes(*v).last().copied())
            .unwrap_or(comment);
        // not in the document yet; attaching the enclosing view will place us
        let Some(parent) = self.backend.parent_node(comment) else {
            return;
        };
        let next = self.backend.next_sibling(previous);
        for node in self.root_render_nodes(embedded) {
            match next {
                Some(next) => self.backend.insert_before(parent, node, next),
                None => self.backend.append_child(parent, node),
            }
        }
    }

    pub(crate) fn render_detach(&mut self, id: ViewId) {
        for node in self.root_render_nodes(id) {
            if let Some(parent) = self.backend.parent_node(node) {
                self.backend.remove_child(parent, node);
            }
        }
    }
}
