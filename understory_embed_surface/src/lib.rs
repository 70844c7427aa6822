// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_embed_surface --heading-base-level=0

//! Understory Embed Surface: offscreen render targets for widgets shown inside a document.
//!
//! A native widget that is displayed inside an element of a rendered document
//! does not draw to the screen. It draws into an offscreen surface owned by
//! the embedding container, and the container copies pixels out of that
//! surface whenever it is damaged so the document can paint them into its
//! placeholder element.
//!
//! This crate holds the pieces of that pipeline that know nothing about
//! documents or widgets:
//!
//! - [`SurfaceBackend`] / [`OffscreenSurface`]: the seam to whatever actually
//!   allocates render targets (a display connection, a GPU context, or the
//!   in-memory [`MemoryBackend`]).
//! - [`SurfaceSet`]: the live surfaces of one container, addressed by
//!   generational [`SurfaceId`]s. Each surface records its placement in
//!   container space, which drives [`SurfaceSet::to_embedder`] /
//!   [`SurfaceSet::from_embedder`] coordinate translation and
//!   [`SurfaceSet::pick`] hit testing.
//! - [`Damage`]: regions of a surface that changed since the last capture.
//! - [`PixelBuffer`]: captured pixels, normalized to packed straight-alpha RGBA8.
//! - [`SnapshotTable`]: captured bitmaps waiting to be fetched by the document,
//!   each released exactly once.
//!
//! ## Minimal example
//!
//! ```rust
//! use kurbo::Point;
//! use understory_embed_surface::{MemoryBackend, PixelRect, SurfaceSet};
//!
//! let mut backend = MemoryBackend::default();
//! let mut surfaces = SurfaceSet::new();
//!
//! // A 100x40 widget whose placeholder sits at (10, 20) in the container.
//! let id = surfaces
//!     .create(&mut backend, PixelRect::new(10, 20, 100, 40))
//!     .unwrap();
//!
//! // Pointer positions in the container map into the surface and back.
//! let local = surfaces.from_embedder(id, Point::new(15.0, 25.0));
//! assert_eq!(local, Point::new(5.0, 5.0));
//! assert_eq!(surfaces.pick(Point::new(15.0, 25.0), [id]), Some(id));
//!
//! // Capture the top-left corner as RGBA8.
//! let pixels = surfaces.capture(id, Some(PixelRect::new(0, 0, 8, 8))).unwrap();
//! assert_eq!(pixels.as_bytes().len(), 8 * 8 * 4);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod damage;
mod memory;
mod pixels;
mod snapshot;
mod surface;
mod types;

pub use damage::Damage;
pub use memory::{MemoryBackend, MemorySurface};
pub use pixels::{PixelBuffer, PixelError, PixelFormat};
pub use snapshot::{PendingSnapshot, SnapshotTable, SnapshotToken};
pub use surface::{CaptureError, OffscreenSurface, SurfaceBackend, SurfaceSet};
pub use types::{PixelRect, PixelSize, SurfaceId};
