// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The seam between the container and the native widgets it embeds.

use core::sync::atomic::{AtomicU32, Ordering};

use understory_embed_protocol::PointerEvent;
use understory_embed_surface::PixelSize;

/// Identity of one container, used as a widget's parent link.
///
/// The link is a plain value: the container owns its children, and a child
/// only remembers which container it belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContainerId(u32);

impl ContainerId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// What the container needs from an embedded native widget.
///
/// The widget draws into the offscreen surface the container gives it and
/// reports damage through [`EmbedView::damage`](crate::EmbedView::damage);
/// everything else flows through these methods.
pub trait EmbeddedWidget {
    /// The container this widget belongs to, if any.
    fn parent(&self) -> Option<ContainerId>;

    /// Set or clear the parent link. Called by the container on add and remove.
    fn set_parent(&mut self, parent: Option<ContainerId>);

    /// Whether the widget is shown.
    fn is_visible(&self) -> bool;

    /// Show or hide the widget.
    fn set_visible(&mut self, visible: bool);

    /// The size the widget wants, measured now.
    fn preferred_size(&self) -> PixelSize;

    /// The smallest size the widget accepts.
    fn minimum_size(&self) -> PixelSize {
        self.preferred_size()
    }

    /// Lay the widget out at `size`, with its origin at the surface origin.
    fn size_allocate(&mut self, size: PixelSize);

    /// Handle a pointer event in surface coordinates. Returns `true` if handled.
    fn handle_pointer(&mut self, event: &PointerEvent) -> bool;
}
