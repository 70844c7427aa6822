// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test doubles shared by the integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use serde_json::json;
use understory_embed::{
    CallTicket, ContainerId, DocumentSink, EmbedConfig, EmbedView, EmbeddedWidget, SizingPolicy,
};
use understory_embed_protocol::{PointerEvent, ScriptCall};
use understory_embed_surface::{MemoryBackend, PixelFormat, PixelSize};

/// Records every batch handed to the document.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub batches: Vec<(CallTicket, Vec<ScriptCall>)>,
}

impl RecordingSink {
    /// Every call, in order.
    pub fn calls(&self) -> Vec<ScriptCall> {
        self.batches
            .iter()
            .flat_map(|(_, calls)| calls.iter().cloned())
            .collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&mut self) {
        self.batches.clear();
    }

    /// `child_set_visible` values sent for `id`, in order.
    pub fn visibility(&self, id: &str) -> Vec<bool> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ScriptCall::ChildSetVisible { id: call_id, visible } if call_id == id => {
                    Some(visible)
                }
                _ => None,
            })
            .collect()
    }

    /// `child_resize` calls sent for `id` as `(size, minimum)`.
    pub fn resizes(&self, id: &str) -> Vec<(PixelSize, PixelSize)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ScriptCall::ChildResize {
                    id: call_id,
                    width,
                    height,
                    min_width,
                    min_height,
                } if call_id == id => Some((
                    PixelSize::new(width, height),
                    PixelSize::new(min_width, min_height),
                )),
                _ => None,
            })
            .collect()
    }

    /// Ticket of the most recent batch.
    pub fn last_ticket(&self) -> Option<CallTicket> {
        self.batches.last().map(|(ticket, _)| *ticket)
    }
}

impl DocumentSink for RecordingSink {
    fn run_script(&mut self, namespace: &str, calls: &[ScriptCall], ticket: CallTicket) {
        assert_eq!(namespace, "embed");
        self.batches.push((ticket, calls.to_vec()));
    }
}

/// A widget with a scripted size that records what the container does to it.
#[derive(Debug)]
pub struct TestWidget {
    pub parent: Option<ContainerId>,
    pub visible: bool,
    pub preferred: PixelSize,
    pub minimum: PixelSize,
    pub allocated: Vec<PixelSize>,
    pub pointer: Vec<PointerEvent>,
}

impl TestWidget {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            parent: None,
            visible: true,
            preferred: PixelSize::new(width, height),
            minimum: PixelSize::new(width / 2, height / 2),
            allocated: Vec::new(),
            pointer: Vec::new(),
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

impl EmbeddedWidget for TestWidget {
    fn parent(&self) -> Option<ContainerId> {
        self.parent
    }

    fn set_parent(&mut self, parent: Option<ContainerId>) {
        self.parent = parent;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn preferred_size(&self) -> PixelSize {
        self.preferred
    }

    fn minimum_size(&self) -> PixelSize {
        self.minimum
    }

    fn size_allocate(&mut self, size: PixelSize) {
        self.allocated.push(size);
    }

    fn handle_pointer(&mut self, event: &PointerEvent) -> bool {
        self.pointer.push(*event);
        true
    }
}

pub type View = EmbedView<TestWidget, MemoryBackend, RecordingSink>;

/// A document-authoritative view over RGBA8 memory surfaces.
pub fn view() -> View {
    view_with(SizingPolicy::DocumentAuthoritative, PixelFormat::Rgba8)
}

pub fn view_with(sizing: SizingPolicy, format: PixelFormat) -> View {
    view_from(EmbedConfig::builder().sizing(sizing).build(), format)
}

pub fn view_from(config: EmbedConfig, format: PixelFormat) -> View {
    EmbedView::new(config, MemoryBackend::new(format), RecordingSink::default())
}

/// Deliver `script_loaded`.
pub fn make_ready(view: &mut View) {
    view.handle_message("embed_script_loaded", &json!({})).unwrap();
}

/// A realized, ready view with one visible child `box` of 40x30, sink cleared.
pub fn ready_with_box() -> (View, understory_embed::ChildId) {
    let mut view = view();
    let child = view.add_with_id(TestWidget::new(40, 30), "box").unwrap();
    make_ready(&mut view);
    view.realize();
    view.sink_mut().clear();
    (view, child)
}
