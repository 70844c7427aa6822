// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The inbound half of the document channel: message handling, readiness,
//! call completion, and the resource scheme.

use alloc::string::ToString;

use serde_json::Value;
use understory_embed_protocol::{
    ChildBox, ChildInit, ChildPosition, DrawDone, InboundMessage, KindSet, ProtocolError,
    ResourceError, ResourceRequest, ResourceResponse, ScriptBatch, ScriptCall,
};
use understory_embed_surface::{CaptureError, SurfaceBackend};

use crate::layout::SizingPolicy;
use crate::sink::{CallTicket, DocumentSink};
use crate::view::EmbedView;
use crate::widget::EmbeddedWidget;

impl<W: EmbeddedWidget, B: SurfaceBackend, D: DocumentSink> EmbedView<W, B, D> {
    /// Handle a message the document posted to the handler `name`.
    ///
    /// Undecodable messages are logged as warnings, dropped, and returned as
    /// errors; the channel stays usable. Until the document is ready, every
    /// message except `script_loaded` is ignored.
    pub fn handle_message(&mut self, name: &str, payload: &Value) -> Result<(), ProtocolError> {
        match InboundMessage::decode(self.config.protocol(), name, payload) {
            Ok(message) => {
                self.dispatch(message);
                Ok(())
            }
            Err(err) => {
                log::warn!("dropping message `{name}`: {err}");
                Err(err)
            }
        }
    }

    /// Act on a decoded message.
    pub fn dispatch(&mut self, message: InboundMessage) {
        let kind = message.kind();
        if !self.ready && !KindSet::BEFORE_READY.contains(kind) {
            log::trace!("ignoring `{kind}` before the document is ready");
            return;
        }
        match message {
            InboundMessage::ScriptLoaded => self.script_loaded(),
            InboundMessage::ChildrenInit(entries) => self.children_init(&entries),
            InboundMessage::UpdatePositions(positions) => {
                for position in &positions {
                    self.update_position(position);
                }
            }
            InboundMessage::Position(position) => self.update_position(&position),
            InboundMessage::ChildrenMoveResize(boxes) => {
                for report in &boxes {
                    self.move_resize(report);
                }
            }
            InboundMessage::ChildDrawDone(done) => self.draw_done(&done),
            InboundMessage::UpdateCanvasDone => self.draw_done(&DrawDone::default()),
            InboundMessage::Pointer { id, event } => self.redispatch_pointer(&id, &event),
        }
    }

    fn script_loaded(&mut self) {
        self.scope = self.scope.next();
        self.ready = true;
        log::debug!("document ready, call scope {:?}", self.scope);
    }

    /// The document started loading a new page.
    ///
    /// Every in-flight call, container-wide and per child, is cancelled and
    /// the channel stays inert until the new page reports `script_loaded`.
    /// Snapshots announced to the old page are released, since it will never
    /// acknowledge them.
    pub fn load_started(&mut self) {
        self.scope = self.scope.next();
        self.ready = false;
        for child in self.children.ids().to_vec() {
            if let Some(record) = self.children.get_mut(child) {
                record.calls = record.calls.next();
            }
        }
        let released = self.snapshots.clear();
        log::debug!("navigation: cancelled calls, released {released} snapshots");
    }

    /// Report the outcome of a batch handed to the sink.
    ///
    /// Returns `true` if the ticket was still current. Stale outcomes
    /// (issued before a navigation, a resize of the same child, or the
    /// child's removal) are discarded.
    pub fn on_call_finished(&mut self, ticket: CallTicket, result: Result<(), &str>) -> bool {
        let current = ticket.scope == self.scope
            && ticket.child.is_none_or(|(child, calls)| {
                self.children.get(child).is_some_and(|r| r.calls == calls)
            });
        if !current {
            log::debug!("discarding stale call outcome {ticket:?}");
            return false;
        }
        if let Err(message) = result {
            log::warn!("error running script: {message}");
        }
        true
    }

    fn children_init(&mut self, entries: &[ChildInit]) {
        let native = self.config.sizing() == SizingPolicy::NativeAuthoritative;
        let mut batch = ScriptBatch::new();
        for entry in entries {
            let Some(child) = self.children.find_by_element(&entry.id) else {
                log::debug!("children_init: no child `{}`", entry.id);
                continue;
            };
            let Some(record) = self.children.get_mut(child) else {
                continue;
            };
            if record.surface.is_none() || record.allocation.size().is_empty() {
                continue;
            }
            let visible = record.widget.is_visible();
            record.shown = visible;
            batch.push(ScriptCall::set_visible(entry.id.as_str(), visible));
            let document_sized = !native && (entry.use_dom_size || record.uses_document_size);
            if visible && !document_sized {
                batch.push(ScriptCall::resize(
                    entry.id.as_str(),
                    record.allocation.size(),
                    record.minimum,
                ));
            }
        }
        self.send(&batch, None);
    }

    fn update_position(&mut self, position: &ChildPosition) {
        let Some(child) = self.children.find_by_element(&position.id) else {
            log::debug!("position for unknown child `{}`", position.id);
            return;
        };
        let Some(record) = self.children.get_mut(child) else {
            return;
        };
        record.allocation.x = position.x;
        record.allocation.y = position.y;
        if let Some(surface) = record.surface {
            self.surfaces.set_origin(surface, position.x, position.y);
        }
    }

    fn move_resize(&mut self, report: &ChildBox) {
        let Some(child) = self.children.find_by_element(&report.id) else {
            log::debug!("box for unknown child `{}`", report.id);
            return;
        };
        let Some(record) = self.children.get_mut(child) else {
            return;
        };
        let resized = record.apply_document_box(&self.config, report);
        if let Some(surface) = record.surface {
            self.surfaces.set_origin(surface, report.x, report.y);
        }
        if resized {
            self.allocate_child(child);
        }
    }

    fn draw_done(&mut self, done: &DrawDone) {
        match (done.id.as_deref(), done.token) {
            (_, Some(token)) => {
                self.snapshots.release(token);
            }
            (Some(id), None) => {
                if let Some(child) = self.children.find_by_element(id) {
                    self.snapshots.release_owner(child);
                }
            }
            (None, None) => {
                self.snapshots.clear();
            }
        }
    }

    /// Serve a resource-scheme fetch.
    ///
    /// `uri?token` returns (and releases) that pending snapshot; a bare
    /// `uri` captures the child's whole surface as it is now. Both require
    /// the child to have a surface.
    pub fn fetch_resource(&mut self, uri: &str) -> Result<ResourceResponse, ResourceError> {
        let request = ResourceRequest::parse(uri, self.config.protocol().scheme())?;
        let child = self
            .children
            .find_by_element(&request.id)
            .ok_or_else(|| ResourceError::UnknownChild(request.id.clone()))?;
        let surface = self
            .children
            .get(child)
            .and_then(|r| r.surface)
            .ok_or_else(|| ResourceError::NoSurface(request.id.clone()))?;
        if let Some(token) = request.token {
            let snapshot = self.snapshots.take_owned_by(child, token).ok_or(
                ResourceError::SnapshotNotFound {
                    id: request.id,
                    token,
                },
            )?;
            return Ok(ResourceResponse::from_pixels(snapshot.pixels));
        }
        match self.surfaces.capture(surface, None) {
            Ok(pixels) => Ok(ResourceResponse::from_pixels(pixels)),
            Err(CaptureError::Pixels(err)) => Err(ResourceError::PixelFormat {
                id: request.id,
                detail: err.to_string(),
            }),
            Err(CaptureError::NoSurface(_)) => Err(ResourceError::NoSurface(request.id)),
            Err(CaptureError::EmptyRegion | CaptureError::ReadFailed) => {
                Err(ResourceError::CaptureFailed(request.id))
            }
        }
    }
}
