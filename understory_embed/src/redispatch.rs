// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer input: events from the document, native events, and geometry.
//!
//! The document sees the pointer over a placeholder element and forwards it
//! on that child's channel, already in surface coordinates. Those events go
//! straight to the child's widget with no hit testing.
//!
//! The native toolkit may deliver the same clicks a second time, as button
//! events on the container coming from one of its embedded surfaces.
//! [`EmbedView::should_suppress_native`] identifies those so the host can
//! swallow them.

use alloc::vec::Vec;

use kurbo::{Point, Vec2};
use understory_embed_protocol::{PointerEvent, PointerKind};
use understory_embed_surface::{PixelRect, SurfaceBackend, SurfaceId};

use crate::registry::ChildId;
use crate::sink::DocumentSink;
use crate::view::EmbedView;
use crate::widget::EmbeddedWidget;

/// Where a native pointer event was delivered from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NativeSource {
    /// The container's own window.
    Container,
    /// An offscreen surface.
    Surface(SurfaceId),
}

impl<W: EmbeddedWidget, B: SurfaceBackend, D: DocumentSink> EmbedView<W, B, D> {
    /// Deliver a pointer event from the document to the child bound to `element_id`.
    pub(crate) fn redispatch_pointer(&mut self, element_id: &str, event: &PointerEvent) {
        let Some(child) = self.children.find_by_element(element_id) else {
            log::debug!("pointer event for unknown child `{element_id}`");
            return;
        };
        if let Some(record) = self.children.get_mut(child) {
            let handled = record.widget.handle_pointer(event);
            log::trace!("{:?} for `{element_id}` handled: {handled}", event.kind);
        }
    }

    /// Returns `true` if a native event of `kind` from `source` must be dropped.
    ///
    /// Button presses and releases coming from this container's own surfaces
    /// have already been delivered through the document.
    #[must_use]
    pub fn should_suppress_native(&self, source: NativeSource, kind: PointerKind) -> bool {
        let from_own_surface = match source {
            NativeSource::Container => false,
            NativeSource::Surface(surface) => self.surfaces.is_alive(surface),
        };
        from_own_surface && matches!(kind, PointerKind::Press | PointerKind::Release)
    }

    /// The first child, in registry order, whose surface contains `pt`
    /// (container space, edges inclusive).
    #[must_use]
    pub fn pick(&self, pt: Point) -> Option<ChildId> {
        let order = self
            .children
            .ids()
            .iter()
            .filter_map(|&child| self.children.get(child)?.surface);
        let surface = self.surfaces.pick(pt, order)?;
        self.children.find_by_surface(surface)
    }

    /// Translate a point from a child's surface space into container space.
    #[must_use]
    pub fn to_container(&self, child: ChildId, pt: Point) -> Point {
        match self.surface(child) {
            Some(surface) => self.surfaces.to_embedder(surface, pt),
            None => pt + self.origin(child),
        }
    }

    /// Translate a point from container space into a child's surface space.
    #[must_use]
    pub fn from_container(&self, child: ChildId, pt: Point) -> Point {
        match self.surface(child) {
            Some(surface) => self.surfaces.from_embedder(surface, pt),
            None => pt - self.origin(child),
        }
    }

    fn origin(&self, child: ChildId) -> Vec2 {
        self.allocation(child)
            .map(|a| a.origin().to_vec2())
            .unwrap_or(Vec2::ZERO)
    }

    /// Children with surfaces, back to front, for compositing the container.
    ///
    /// This is the reverse of hit-testing order.
    #[must_use]
    pub fn paint_order(&self) -> Vec<(ChildId, SurfaceId, PixelRect)> {
        self.children
            .ids()
            .iter()
            .rev()
            .filter_map(|&child| {
                let record = self.children.get(child)?;
                Some((child, record.surface?, record.allocation))
            })
            .collect()
    }
}
