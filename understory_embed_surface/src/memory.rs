// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory raster backend for headless hosts and tests.

use alloc::vec::Vec;

use crate::pixels::{PixelBuffer, PixelFormat};
use crate::surface::{OffscreenSurface, SurfaceBackend};
use crate::types::{PixelRect, PixelSize};

/// A surface backed by a plain byte vector.
#[derive(Clone, Debug)]
pub struct MemorySurface {
    format: PixelFormat,
    size: PixelSize,
    data: Vec<u8>,
}

impl MemorySurface {
    /// Create a cleared surface.
    ///
    /// Returns `None` when the storage size does not fit in `usize`.
    #[must_use]
    pub fn new(format: PixelFormat, size: PixelSize) -> Option<Self> {
        Some(Self {
            format,
            size,
            data: alloc::vec![0; Self::byte_len(format, size)?],
        })
    }

    fn byte_len(format: PixelFormat, size: PixelSize) -> Option<usize> {
        (size.width as usize)
            .checked_mul(size.height as usize)?
            .checked_mul(format.bytes_per_pixel())
    }

    fn stride(&self) -> usize {
        self.size.width as usize * self.format.bytes_per_pixel()
    }

    /// Fill every pixel with the same 4-byte value in the surface's native layout.
    ///
    /// Only meaningful for 4-byte formats; wider formats repeat the pattern.
    pub fn fill(&mut self, px: [u8; 4]) {
        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }

    /// Write one 4-byte pixel at `(x, y)`. Out-of-bounds writes are ignored.
    pub fn put_pixel(&mut self, x: u32, y: u32, px: [u8; 4]) {
        if x >= self.size.width || y >= self.size.height {
            return;
        }
        let bpp = self.format.bytes_per_pixel();
        let start = y as usize * self.stride() + x as usize * bpp;
        self.data[start..start + 4].copy_from_slice(&px);
    }
}

impl OffscreenSurface for MemorySurface {
    fn size(&self) -> PixelSize {
        self.size
    }

    fn resize(&mut self, size: PixelSize) {
        // Keep the overlapping top-left block, clear the rest.
        let Some(mut next) = Self::new(self.format, size) else {
            log::warn!("cannot resize a memory surface to {size:?}");
            return;
        };
        let bpp = self.format.bytes_per_pixel();
        let row = self.size.width.min(size.width) as usize * bpp;
        for y in 0..self.size.height.min(size.height) as usize {
            let src = y * self.stride();
            let dst = y * next.stride();
            next.data[dst..dst + row].copy_from_slice(&self.data[src..src + row]);
        }
        *self = next;
    }

    fn read_pixels(&self, region: PixelRect) -> Option<PixelBuffer> {
        let whole = PixelBuffer::new(self.format, self.size, self.stride(), self.data.clone()).ok()?;
        whole.crop(region)
    }
}

/// Backend producing [`MemorySurface`]s in one fixed pixel format.
#[derive(Clone, Debug)]
pub struct MemoryBackend {
    format: PixelFormat,
    created: usize,
    destroyed: usize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(PixelFormat::Rgba8)
    }
}

impl MemoryBackend {
    /// Create a backend whose surfaces use `format`.
    #[must_use]
    pub fn new(format: PixelFormat) -> Self {
        Self {
            format,
            created: 0,
            destroyed: 0,
        }
    }

    /// Number of surfaces created so far.
    #[must_use]
    pub fn created(&self) -> usize {
        self.created
    }

    /// Number of surfaces destroyed so far.
    #[must_use]
    pub fn destroyed(&self) -> usize {
        self.destroyed
    }
}

impl SurfaceBackend for MemoryBackend {
    type Surface = MemorySurface;

    fn create_surface(&mut self, size: PixelSize) -> Option<MemorySurface> {
        let surface = MemorySurface::new(self.format, size)?;
        self.created += 1;
        Some(surface)
    }

    fn destroy_surface(&mut self, surface: MemorySurface) {
        self.destroyed += 1;
        drop(surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_keeps_overlapping_pixels() {
        let mut s = MemorySurface::new(PixelFormat::Rgba8, PixelSize::new(2, 2)).unwrap();
        s.put_pixel(0, 0, [1, 2, 3, 4]);
        s.put_pixel(1, 1, [9, 9, 9, 9]);
        s.resize(PixelSize::new(1, 3));
        assert_eq!(s.size(), PixelSize::new(1, 3));
        let px = s.read_pixels(PixelRect::new(0, 0, 1, 3)).unwrap();
        assert_eq!(px.as_bytes(), &[1, 2, 3, 4, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn backend_counts_lifecycle() {
        let mut backend = MemoryBackend::default();
        let s = backend.create_surface(PixelSize::new(1, 1)).unwrap();
        backend.destroy_surface(s);
        assert_eq!((backend.created(), backend.destroyed()), (1, 1));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn unrepresentable_sizes_are_refused() {
        let huge = PixelSize::new(u32::MAX, u32::MAX);
        let mut backend = MemoryBackend::default();
        assert!(backend.create_surface(huge).is_none());
        assert_eq!(backend.created(), 0);

        let mut s = backend.create_surface(PixelSize::new(2, 2)).unwrap();
        s.resize(huge);
        assert_eq!(s.size(), PixelSize::new(2, 2));
    }
}
