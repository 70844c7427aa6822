// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The container: child ownership, surfaces, layout passes, and damage.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use understory_embed_protocol::{ScriptBatch, ScriptCall};
use understory_embed_surface::{
    CaptureError, Damage, OffscreenSurface, PixelRect, SnapshotTable, SnapshotToken,
    SurfaceBackend, SurfaceId, SurfaceSet,
};

use crate::config::EmbedConfig;
use crate::error::{AddError, EmbedError};
use crate::registry::{ChildId, ChildRegistry};
use crate::sink::{CallTicket, DocumentSink, Generation};
use crate::widget::{ContainerId, EmbeddedWidget};

/// A container that shows native widgets inside elements of a document.
///
/// Each child is bound to a placeholder element by its element id. Once the
/// container is realized, every identified child renders into its own
/// offscreen surface from `B`; damage is captured into pending snapshots and
/// announced to the document through `D`, which fetches the pixels back
/// through [`EmbedView::fetch_resource`].
///
/// Nothing is sent to the document until it reports that its script is
/// loaded, and everything in flight is cancelled when it navigates away
/// ([`EmbedView::load_started`]).
pub struct EmbedView<W: EmbeddedWidget, B: SurfaceBackend, D: DocumentSink> {
    pub(crate) id: ContainerId,
    pub(crate) config: EmbedConfig,
    pub(crate) backend: B,
    pub(crate) sink: D,
    pub(crate) surfaces: SurfaceSet<B::Surface>,
    pub(crate) children: ChildRegistry<W>,
    pub(crate) snapshots: SnapshotTable<ChildId>,
    pub(crate) realized: bool,
    pub(crate) ready: bool,
    pub(crate) scope: Generation,
}

impl<W: EmbeddedWidget, B: SurfaceBackend, D: DocumentSink> fmt::Debug for EmbedView<W, B, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbedView")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("children", &self.children.len())
            .field("surfaces", &self.surfaces.len())
            .field("snapshots", &self.snapshots.len())
            .field("realized", &self.realized)
            .field("ready", &self.ready)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl<W: EmbeddedWidget, B: SurfaceBackend, D: DocumentSink> EmbedView<W, B, D> {
    /// Create an unrealized container with no children.
    pub fn new(config: EmbedConfig, backend: B, sink: D) -> Self {
        Self {
            id: ContainerId::next(),
            config,
            backend,
            sink,
            surfaces: SurfaceSet::new(),
            children: ChildRegistry::default(),
            snapshots: SnapshotTable::new(),
            realized: false,
            ready: false,
            scope: Generation::default(),
        }
    }

    /// This container's identity, as seen in its children's parent links.
    #[must_use]
    pub fn id(&self) -> ContainerId {
        self.id
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &EmbedConfig {
        &self.config
    }

    /// The document sink.
    #[must_use]
    pub fn sink(&self) -> &D {
        &self.sink
    }

    /// The document sink, mutably.
    pub fn sink_mut(&mut self) -> &mut D {
        &mut self.sink
    }

    /// The surface backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns `true` while attached to a live display.
    #[must_use]
    pub fn is_realized(&self) -> bool {
        self.realized
    }

    /// Returns `true` once the document's script has loaded.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Number of snapshots waiting to be fetched or acknowledged.
    #[must_use]
    pub fn pending_snapshots(&self) -> usize {
        self.snapshots.len()
    }

    // --- children -------------------------------------------------------

    /// Add a widget with no element id.
    ///
    /// It takes part in layout but is never shown in the document until it
    /// is given an id with [`EmbedView::set_element_id`].
    ///
    /// Adding a widget that already has a parent is a caller bug: it panics in
    /// debug builds and is rejected in release builds.
    pub fn add(&mut self, widget: W) -> Result<ChildId, AddError<W>> {
        self.insert(widget, None)
    }

    /// Add a widget bound to the element `element_id`.
    ///
    /// Rejected with a warning if another child already uses that id.
    pub fn add_with_id(
        &mut self,
        widget: W,
        element_id: impl Into<String>,
    ) -> Result<ChildId, AddError<W>> {
        self.insert(widget, Some(element_id.into()).filter(|id| !id.is_empty()))
    }

    fn insert(&mut self, mut widget: W, element_id: Option<String>) -> Result<ChildId, AddError<W>> {
        if widget.parent().is_some() {
            log::error!("rejecting add: widget already has a parent");
            debug_assert!(false, "widget already has a parent");
            return Err(AddError {
                widget,
                error: EmbedError::AlreadyParented,
            });
        }
        if let Some(id) = element_id.as_deref() {
            if self.children.find_by_element(id).is_some() {
                log::warn!("element id `{id}` is not unique");
                return Err(AddError {
                    widget,
                    error: EmbedError::DuplicateElementId(id.into()),
                });
            }
        }
        widget.set_parent(Some(self.id));
        let shown = widget.is_visible();
        let child = self.children.insert(widget, element_id, shown);
        if self.realized {
            self.surface_child(child);
        }
        Ok(child)
    }

    /// Remove a child, returning its widget with the parent link cleared.
    ///
    /// In-flight calls for the child are cancelled, its surface is destroyed,
    /// and its pending snapshots are released. Removing something that is not
    /// a child panics in debug builds and is rejected in release builds.
    pub fn remove(&mut self, child: ChildId) -> Result<W, EmbedError> {
        let Some(mut record) = self.children.remove(child) else {
            log::error!("rejecting remove: {child:?} is not a child");
            debug_assert!(false, "not a child of this container");
            return Err(EmbedError::NotAChild(child));
        };
        if let Some(surface) = record.surface.take() {
            self.surfaces.destroy(&mut self.backend, surface);
        }
        let released = self.snapshots.release_owner(child);
        if released > 0 {
            log::debug!("released {released} snapshots of removed {child:?}");
        }
        record.widget.set_parent(None);
        Ok(record.widget)
    }

    /// Returns `true` if `child` is in this container.
    #[must_use]
    pub fn contains(&self, child: ChildId) -> bool {
        self.children.contains(child)
    }

    /// Number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns `true` if there are no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.len() == 0
    }

    /// Children in registry order, most recently added first.
    ///
    /// This is also hit-testing order.
    pub fn children(&self) -> impl Iterator<Item = ChildId> + '_ {
        self.children.ids().iter().copied()
    }

    /// Borrow a child's widget.
    #[must_use]
    pub fn widget(&self, child: ChildId) -> Option<&W> {
        self.children.get(child).map(|r| &r.widget)
    }

    /// Mutate a child's widget.
    ///
    /// A visibility change made inside `f` is mirrored to the document
    /// afterwards, exactly as [`EmbedView::notify_visibility_changed`] would.
    pub fn with_widget_mut<R>(&mut self, child: ChildId, f: impl FnOnce(&mut W) -> R) -> Option<R> {
        let record = self.children.get_mut(child)?;
        let out = f(&mut record.widget);
        self.notify_visibility_changed(child);
        Some(out)
    }

    /// Show or hide a child.
    pub fn set_child_visible(&mut self, child: ChildId, visible: bool) {
        self.with_widget_mut(child, |w| w.set_visible(visible));
    }

    /// Mirror a child's visibility onto its element if it changed.
    ///
    /// Hosts whose widgets change visibility on their own call this from the
    /// widget's visibility notification. Sends one `child_set_visible` per
    /// actual change, and only while the document is ready.
    pub fn notify_visibility_changed(&mut self, child: ChildId) {
        let Some(record) = self.children.get_mut(child) else {
            return;
        };
        let visible = record.widget.is_visible();
        if visible == record.shown {
            return;
        }
        record.shown = visible;
        let Some(element) = record.element_id.clone() else {
            return;
        };
        if self.ready {
            self.send(&[ScriptCall::set_visible(element, visible)], None);
        }
    }

    /// A child's element id.
    #[must_use]
    pub fn element_id(&self, child: ChildId) -> Option<&str> {
        self.children.get(child)?.element()
    }

    /// Bind a child to a different element, or unbind it with `None`.
    ///
    /// An id already used by another child is rejected with a warning and the
    /// previous binding is kept. Gaining an id while realized creates the
    /// child's surface and mirrors its visibility. Losing it destroys the
    /// surface, releases the child's snapshots, and hides the old element.
    /// Renaming releases the snapshots and moves visibility from the old
    /// element to the new one.
    pub fn set_element_id(&mut self, child: ChildId, element_id: Option<&str>) -> Result<(), EmbedError> {
        let element_id = element_id.filter(|id| !id.is_empty());
        let previous = match self.children.set_element_id(child, element_id.map(String::from)) {
            Ok(previous) => previous,
            Err(err) => {
                log::warn!("{err}");
                return Err(err);
            }
        };
        let Some(record) = self.children.get_mut(child) else {
            return Ok(());
        };
        let mut batch = ScriptBatch::new();
        match (previous, element_id) {
            (previous, None) => {
                let Some(surface) = record.surface.take() else {
                    self.snapshots.release_owner(child);
                    return Ok(());
                };
                self.surfaces.destroy(&mut self.backend, surface);
                self.snapshots.release_owner(child);
                if let Some(previous) = previous.filter(|_| self.ready) {
                    batch.push(ScriptCall::set_visible(previous, false));
                }
            }
            (None, Some(_)) => {
                if self.realized {
                    self.surface_child(child);
                }
                return Ok(());
            }
            (Some(previous), Some(current)) => {
                if previous == current {
                    return Ok(());
                }
                self.snapshots.release_owner(child);
                if record.surface.is_some() && self.ready {
                    batch.push(ScriptCall::set_visible(previous, false));
                    let visible = record.widget.is_visible();
                    record.shown = visible;
                    if visible {
                        batch.push(ScriptCall::set_visible(current, true));
                    }
                }
            }
        }
        self.send(&batch, None);
        Ok(())
    }

    /// Find the child bound to `element_id`.
    #[must_use]
    pub fn find_child(&self, element_id: &str) -> Option<ChildId> {
        self.children.find_by_element(element_id)
    }

    /// Find the child rendering into `surface`.
    #[must_use]
    pub fn child_for_surface(&self, surface: SurfaceId) -> Option<ChildId> {
        self.children.find_by_surface(surface)
    }

    /// A child's allocation in container space.
    #[must_use]
    pub fn allocation(&self, child: ChildId) -> Option<PixelRect> {
        self.children.get(child).map(|r| r.allocation)
    }

    /// Whether the document has taken over a child's size.
    #[must_use]
    pub fn uses_document_size(&self, child: ChildId) -> Option<bool> {
        self.children.get(child).map(|r| r.uses_document_size)
    }

    /// A child's surface, while realized and identified.
    #[must_use]
    pub fn surface(&self, child: ChildId) -> Option<SurfaceId> {
        self.children.get(child)?.surface
    }

    /// The child's render target, for the widget to draw into.
    pub fn surface_mut(&mut self, child: ChildId) -> Option<&mut B::Surface> {
        let surface = self.children.get(child)?.surface?;
        self.surfaces.get_mut(surface)
    }

    // --- lifecycle ------------------------------------------------------

    /// Attach to a live display: create a surface for every identified child.
    ///
    /// Children are first laid out at their current size. Visible
    /// identified children are announced with `child_set_visible(id, true)`
    /// when the document is ready.
    pub fn realize(&mut self) {
        if self.realized {
            return;
        }
        self.realized = true;
        let mut batch = ScriptBatch::new();
        for child in self.children.ids().to_vec() {
            if let Some(call) = self.ensure_surface(child) {
                batch.push(call);
            }
        }
        self.send(&batch, None);
    }

    /// Detach from the display: destroy every surface.
    ///
    /// Identified children are hidden in the document when it is ready.
    /// Pending snapshots own their pixels and stay until acknowledged.
    pub fn unrealize(&mut self) {
        if !self.realized {
            return;
        }
        self.realized = false;
        let mut batch = ScriptBatch::new();
        for &child in self.children.ids() {
            let Some(record) = self.children.get(child) else {
                continue;
            };
            if record.surface.is_some() && self.ready {
                if let Some(element) = record.element() {
                    batch.push(ScriptCall::set_visible(element, false));
                }
            }
        }
        for child in self.children.ids().to_vec() {
            if let Some(surface) = self.children.get_mut(child).and_then(|r| r.surface.take()) {
                self.surfaces.destroy(&mut self.backend, surface);
            }
        }
        self.send(&batch, None);
    }

    /// Create a child's surface and mirror its visibility, as one step.
    fn surface_child(&mut self, child: ChildId) {
        if let Some(call) = self.ensure_surface(child) {
            self.send(&[call], None);
        }
    }

    /// Create the surface of an identified child if it has none.
    ///
    /// Returns the `child_set_visible` call to announce it, if one is due.
    fn ensure_surface(&mut self, child: ChildId) -> Option<ScriptCall> {
        let record = self.children.get_mut(child)?;
        let element = record.element_id.clone()?;
        if record.surface.is_some() {
            return None;
        }
        // Pick up any preference change since the last layout pass.
        record.negotiate();
        let Some(surface) = self.surfaces.create(&mut self.backend, record.allocation) else {
            log::warn!("could not create a surface for `{element}`");
            return None;
        };
        record.surface = Some(surface);
        let visible = record.widget.is_visible();
        record.shown = visible;
        (self.ready && visible).then(|| ScriptCall::set_visible(element, true))
    }

    /// Tear the container down: cancel every call, release every snapshot,
    /// destroy every surface, and detach every widget.
    ///
    /// Also runs on drop. The detached widgets are returned, newest first.
    pub fn dispose(&mut self) -> Vec<W> {
        self.scope = self.scope.next();
        self.ready = false;
        self.realized = false;
        self.snapshots.clear();
        let mut widgets = Vec::with_capacity(self.children.len());
        for (_, mut record) in self.children.drain() {
            if let Some(surface) = record.surface.take() {
                self.surfaces.destroy(&mut self.backend, surface);
            }
            record.widget.set_parent(None);
            widgets.push(record.widget);
        }
        self.surfaces.clear(&mut self.backend);
        widgets
    }

    // --- layout -----------------------------------------------------------

    /// Run a layout pass over every child.
    pub fn size_allocate(&mut self) {
        for child in self.children.ids().to_vec() {
            self.allocate_child(child);
        }
    }

    /// Run a layout pass for one child.
    ///
    /// When the size changes, the surface is resized, in-flight calls for the
    /// child are cancelled, and (unless the document owns the child's size)
    /// a `child_resize` is sent.
    pub(crate) fn allocate_child(&mut self, child: ChildId) {
        let Some(record) = self.children.get_mut(child) else {
            return;
        };
        let Some(size) = record.negotiate() else {
            return;
        };
        let Some(surface) = record.surface else {
            return;
        };
        self.surfaces.set_placement(surface, record.allocation);
        if !self.ready {
            return;
        }
        record.calls = record.calls.next();
        if record.uses_document_size {
            return;
        }
        let Some(element) = record.element_id.clone() else {
            return;
        };
        let call = ScriptCall::resize(element, size, record.minimum);
        self.send(&[call], Some(child));
    }

    // --- damage -----------------------------------------------------------

    /// Capture a damaged child and announce the new bitmap.
    ///
    /// Only realized, identified, visible children are captured, and only
    /// once the document is ready. Returns the token of the new snapshot.
    pub fn damage(&mut self, child: ChildId, damage: &Damage) -> Option<SnapshotToken> {
        if !self.ready {
            return None;
        }
        let record = self.children.get(child)?;
        let element = record.element()?;
        if !record.widget.is_visible() {
            return None;
        }
        let surface = record.surface?;
        let size = self.surfaces.get(surface)?.size();
        let region = damage.bounds(size)?;
        let pixels = match self.surfaces.capture(surface, Some(region)) {
            Ok(pixels) => pixels,
            Err(CaptureError::Pixels(err)) => {
                log::warn!("dropping damage of `{element}`: {err}");
                return None;
            }
            Err(err) => {
                log::debug!("dropping damage of `{element}`: {err}");
                return None;
            }
        };
        let call_element = String::from(element);
        let token = self.snapshots.insert(child, region, pixels);
        self.send(&[ScriptCall::draw(call_element, token, region)], Some(child));
        Some(token)
    }

    // --- outbound -----------------------------------------------------------

    /// Hand calls to the sink under the current generations.
    pub(crate) fn send(&mut self, calls: &[ScriptCall], child: Option<ChildId>) {
        if calls.is_empty() {
            return;
        }
        let ticket = CallTicket {
            scope: self.scope,
            child: child.and_then(|c| Some((c, self.children.get(c)?.calls))),
        };
        let namespace = self.config.protocol().namespace();
        self.sink.run_script(namespace, calls, ticket);
    }
}

impl<W: EmbeddedWidget, B: SurfaceBackend, D: DocumentSink> Drop for EmbedView<W, B, D> {
    fn drop(&mut self) {
        self.dispose();
    }
}
