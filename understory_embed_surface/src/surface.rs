// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Offscreen surfaces: the backend seam and the set of live surfaces.

use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Vec2};

use crate::pixels::{PixelBuffer, PixelError};
use crate::types::{PixelRect, PixelSize, SurfaceId};

/// An alpha-capable render target that is never shown on screen directly.
///
/// Widgets render into it; the surface set reads pixels back out of it.
pub trait OffscreenSurface {
    /// Current size in pixels.
    fn size(&self) -> PixelSize;

    /// Resize the target in place.
    ///
    /// Implementations should keep whatever is rendered into the target
    /// attached across the resize.
    fn resize(&mut self, size: PixelSize);

    /// Read back the pixels covered by `region` (surface-local, already
    /// clipped to the surface).
    ///
    /// Returns `None` if the backend cannot read pixels right now.
    fn read_pixels(&self, region: PixelRect) -> Option<PixelBuffer>;
}

/// Factory for offscreen surfaces, typically backed by a live display connection.
pub trait SurfaceBackend {
    /// Surface type produced by this backend.
    type Surface: OffscreenSurface;

    /// Allocate an alpha-capable offscreen target of `size`.
    ///
    /// Returns `None` when the backend cannot allocate one (for example when
    /// the display went away).
    fn create_surface(&mut self, size: PixelSize) -> Option<Self::Surface>;

    /// Release a surface. The default implementation just drops it.
    fn destroy_surface(&mut self, surface: Self::Surface) {
        drop(surface);
    }
}

/// Error returned when reading pixels back from a surface fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureError {
    /// The surface handle is stale or was never created.
    NoSurface(SurfaceId),
    /// The requested region does not overlap the surface.
    EmptyRegion,
    /// The backend could not read pixels.
    ReadFailed,
    /// The backend produced pixels that cannot be delivered as RGBA8.
    Pixels(PixelError),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSurface(id) => write!(f, "surface {id:?} does not exist"),
            Self::EmptyRegion => f.write_str("capture region does not overlap the surface"),
            Self::ReadFailed => f.write_str("backend could not read surface pixels"),
            Self::Pixels(err) => write!(f, "unexpected pixel data: {err}"),
        }
    }
}

impl core::error::Error for CaptureError {}

impl From<PixelError> for CaptureError {
    fn from(err: PixelError) -> Self {
        Self::Pixels(err)
    }
}

#[derive(Debug)]
struct Entry<S> {
    surface: S,
    /// Where the surface is embedded, in container space.
    placement: PixelRect,
}

#[derive(Debug)]
struct Slot<S> {
    generation: u32,
    entry: Option<Entry<S>>,
}

/// The set of live offscreen surfaces owned by one container.
///
/// Each surface remembers where it is embedded in the container
/// ([`SurfaceSet::set_placement`]); that placement drives coordinate
/// translation and hit testing.
#[derive(Debug)]
pub struct SurfaceSet<S> {
    slots: Vec<Slot<S>>,
    free: Vec<u32>,
    live: usize,
}

impl<S> Default for SurfaceSet<S> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }
}

impl<S: OffscreenSurface> SurfaceSet<S> {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live surfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if no surface is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Returns `true` if `id` refers to a live surface.
    #[must_use]
    pub fn is_alive(&self, id: SurfaceId) -> bool {
        self.entry(id).is_some()
    }

    fn entry(&self, id: SurfaceId) -> Option<&Entry<S>> {
        let slot = self.slots.get(id.idx())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.entry.as_ref()
    }

    fn entry_mut(&mut self, id: SurfaceId) -> Option<&mut Entry<S>> {
        let slot = self.slots.get_mut(id.idx())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.entry.as_mut()
    }

    /// Allocate a new surface embedded at `placement`, sized to the placement's size.
    pub fn create<B>(&mut self, backend: &mut B, placement: PixelRect) -> Option<SurfaceId>
    where
        B: SurfaceBackend<Surface = S>,
    {
        let surface = backend.create_surface(placement.size())?;
        let entry = Entry { surface, placement };
        let id = if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.entry = Some(entry);
            SurfaceId::new(idx, slot.generation)
        } else {
            let idx = u32::try_from(self.slots.len()).ok()?;
            self.slots.push(Slot {
                generation: 1,
                entry: Some(entry),
            });
            SurfaceId::new(idx, 1)
        };
        self.live += 1;
        log::trace!("created surface {id:?} at {placement:?}");
        Some(id)
    }

    /// Destroy a surface. Returns `false` if `id` was already stale.
    pub fn destroy<B>(&mut self, backend: &mut B, id: SurfaceId) -> bool
    where
        B: SurfaceBackend<Surface = S>,
    {
        let Some(slot) = self.slots.get_mut(id.idx()) else {
            return false;
        };
        if slot.generation != id.generation() {
            return false;
        }
        let Some(entry) = slot.entry.take() else {
            return false;
        };
        backend.destroy_surface(entry.surface);
        self.free.push(id.0);
        self.live -= 1;
        log::trace!("destroyed surface {id:?}");
        true
    }

    /// Destroy every surface.
    pub fn clear<B>(&mut self, backend: &mut B)
    where
        B: SurfaceBackend<Surface = S>,
    {
        for idx in 0..self.slots.len() {
            let slot = &self.slots[idx];
            let id = SurfaceId::new(u32::try_from(idx).unwrap_or(u32::MAX), slot.generation);
            self.destroy(backend, id);
        }
    }

    /// Borrow a live surface.
    #[must_use]
    pub fn get(&self, id: SurfaceId) -> Option<&S> {
        self.entry(id).map(|e| &e.surface)
    }

    /// Mutably borrow a live surface.
    pub fn get_mut(&mut self, id: SurfaceId) -> Option<&mut S> {
        self.entry_mut(id).map(|e| &mut e.surface)
    }

    /// The placement last recorded for `id`.
    #[must_use]
    pub fn placement(&self, id: SurfaceId) -> Option<PixelRect> {
        self.entry(id).map(|e| e.placement)
    }

    /// Record where a surface is embedded.
    ///
    /// When the size differs from the surface's current size the surface is
    /// resized in place. Returns `true` if a resize happened.
    pub fn set_placement(&mut self, id: SurfaceId, placement: PixelRect) -> bool {
        let Some(entry) = self.entry_mut(id) else {
            return false;
        };
        entry.placement = placement;
        if entry.surface.size() == placement.size() {
            return false;
        }
        entry.surface.resize(placement.size());
        true
    }

    /// Resize a surface without moving it.
    ///
    /// A no-op returning `false` when the size is unchanged or `id` is stale.
    pub fn resize(&mut self, id: SurfaceId, size: PixelSize) -> bool {
        let Some(placement) = self.placement(id) else {
            return false;
        };
        self.set_placement(
            id,
            PixelRect::new(placement.x, placement.y, size.width, size.height),
        )
    }

    /// Move a surface without resizing it.
    pub fn set_origin(&mut self, id: SurfaceId, x: i32, y: i32) {
        if let Some(entry) = self.entry_mut(id) {
            entry.placement.x = x;
            entry.placement.y = y;
        }
    }

    /// Translate a point from surface-local space into container space.
    ///
    /// Unknown surfaces translate as the identity.
    #[must_use]
    pub fn to_embedder(&self, id: SurfaceId, pt: Point) -> Point {
        pt + self.offset(id)
    }

    /// Translate a point from container space into surface-local space.
    ///
    /// Unknown surfaces translate as the identity.
    #[must_use]
    pub fn from_embedder(&self, id: SurfaceId, pt: Point) -> Point {
        pt - self.offset(id)
    }

    fn offset(&self, id: SurfaceId) -> Vec2 {
        self.placement(id)
            .map(|p| p.origin().to_vec2())
            .unwrap_or(Vec2::ZERO)
    }

    /// Find the first surface in `order` whose placement contains `pt` (container space).
    ///
    /// Stale ids in `order` are skipped.
    pub fn pick(&self, pt: Point, order: impl IntoIterator<Item = SurfaceId>) -> Option<SurfaceId> {
        order.into_iter().find(|&id| {
            self.placement(id)
                .is_some_and(|placement| placement.contains_inclusive(pt))
        })
    }

    /// Read back `region` of a surface (or all of it) as packed straight-alpha RGBA8.
    pub fn capture(
        &self,
        id: SurfaceId,
        region: Option<PixelRect>,
    ) -> Result<PixelBuffer, CaptureError> {
        let surface = self.get(id).ok_or(CaptureError::NoSurface(id))?;
        let bounds = PixelRect::from_size(surface.size());
        let region = match region {
            Some(r) => r.intersect(bounds),
            None => Some(bounds).filter(|b| !b.is_empty()),
        }
        .ok_or(CaptureError::EmptyRegion)?;
        let pixels = surface
            .read_pixels(region)
            .ok_or(CaptureError::ReadFailed)?;
        pixels.into_straight_rgba().map_err(CaptureError::from)
    }

    /// Iterate live surface ids in slot order.
    pub fn ids(&self) -> impl Iterator<Item = SurfaceId> + '_ {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            slot.entry.as_ref()?;
            Some(SurfaceId::new(u32::try_from(idx).ok()?, slot.generation))
        })
    }
}
