// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel buffers captured from surfaces and their normalization to straight RGBA8.
//!
//! Documents consume bitmaps as tightly packed, 8 bits per channel RGBA with
//! straight (unpremultiplied) alpha. Backends rarely produce exactly that, so
//! every capture goes through [`PixelBuffer::into_straight_rgba`], which strips
//! row padding and divides out premultiplied alpha. Formats that cannot be
//! converted losslessly into that layout are rejected.

use alloc::vec::Vec;
use core::fmt;

use crate::types::{PixelRect, PixelSize};

/// Memory layout of a pixel buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PixelFormat {
    /// 8-bit RGBA, straight alpha. This is what documents expect.
    Rgba8,
    /// 8-bit RGBA, premultiplied alpha.
    Rgba8Premultiplied,
    /// 8-bit BGRA, premultiplied alpha (common for native 32-bit surfaces).
    Bgra8Premultiplied,
    /// 16 bits per channel RGBA.
    Rgba16,
}

impl PixelFormat {
    /// Bytes per pixel.
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8 | Self::Rgba8Premultiplied | Self::Bgra8Premultiplied => 4,
            Self::Rgba16 => 8,
        }
    }
}

/// Error produced when a pixel buffer cannot be built or normalized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PixelError {
    /// The format cannot be delivered as 8-bit RGBA.
    UnsupportedFormat(PixelFormat),
    /// The backing storage is shorter than the declared geometry requires.
    BufferTooSmall {
        /// Bytes required by size and stride.
        expected: usize,
        /// Bytes actually provided.
        actual: usize,
    },
    /// The stride is smaller than one row of pixels.
    StrideTooSmall {
        /// Minimum stride for the width and format.
        minimum: usize,
        /// Stride provided.
        stride: usize,
    },
    /// The declared geometry needs more bytes than fit in `usize`.
    TooLarge(PixelSize),
}

impl fmt::Display for PixelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat(format) => {
                write!(f, "pixel format {format:?} is not 8-bit RGBA")
            }
            Self::BufferTooSmall { expected, actual } => {
                write!(f, "pixel buffer holds {actual} bytes, expected {expected}")
            }
            Self::StrideTooSmall { minimum, stride } => {
                write!(f, "row stride {stride} is below the minimum of {minimum}")
            }
            Self::TooLarge(size) => {
                write!(f, "{}x{} pixels do not fit in memory", size.width, size.height)
            }
        }
    }
}

impl core::error::Error for PixelError {}

/// A rectangular block of pixels with an explicit row stride.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    format: PixelFormat,
    size: PixelSize,
    stride: usize,
    data: Vec<u8>,
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("format", &self.format)
            .field("size", &self.size)
            .field("stride", &self.stride)
            .field("len", &self.data.len())
            .finish_non_exhaustive()
    }
}

impl PixelBuffer {
    /// Wrap raw pixel storage, validating it against the declared geometry.
    pub fn new(
        format: PixelFormat,
        size: PixelSize,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Self, PixelError> {
        let row = (size.width as usize)
            .checked_mul(format.bytes_per_pixel())
            .ok_or(PixelError::TooLarge(size))?;
        if stride < row {
            return Err(PixelError::StrideTooSmall {
                minimum: row,
                stride,
            });
        }
        let expected = match size.height as usize {
            0 => 0,
            h => stride
                .checked_mul(h - 1)
                .and_then(|n| n.checked_add(row))
                .ok_or(PixelError::TooLarge(size))?,
        };
        if data.len() < expected {
            return Err(PixelError::BufferTooSmall {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            format,
            size,
            stride,
            data,
        })
    }

    /// A tightly packed, fully transparent straight-alpha RGBA8 buffer.
    ///
    /// Returns `None` when the buffer would not fit in memory's address space.
    #[must_use]
    pub fn transparent(size: PixelSize) -> Option<Self> {
        Some(Self {
            format: PixelFormat::Rgba8,
            size,
            stride: size.width as usize * 4,
            data: alloc::vec![0; size.rgba_len()?],
        })
    }

    /// Pixel layout.
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Dimensions in pixels.
    #[must_use]
    pub fn size(&self) -> PixelSize {
        self.size
    }

    /// Bytes between the start of consecutive rows.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Raw bytes, including any row padding.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw bytes, including any row padding.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the buffer and return its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Returns `true` if the bytes are already what a document consumes.
    #[must_use]
    pub fn is_packed_rgba(&self) -> bool {
        self.format == PixelFormat::Rgba8 && self.stride == self.size.width as usize * 4
    }

    /// Copy out the part of this buffer covered by `region`.
    ///
    /// The region is clipped to the buffer first; `None` is returned when
    /// nothing remains.
    #[must_use]
    pub fn crop(&self, region: PixelRect) -> Option<Self> {
        let region = region.intersect(PixelRect::from_size(self.size))?;
        let bpp = self.format.bytes_per_pixel();
        let row = region.width as usize * bpp;
        let x0 = usize::try_from(region.x).ok()? * bpp;
        let y0 = usize::try_from(region.y).ok()?;
        let mut data = Vec::with_capacity(row * region.height as usize);
        for y in y0..y0 + region.height as usize {
            let start = y * self.stride + x0;
            data.extend_from_slice(&self.data[start..start + row]);
        }
        Some(Self {
            format: self.format,
            size: region.size(),
            stride: row,
            data,
        })
    }

    /// Normalize to tightly packed RGBA8 with straight alpha.
    ///
    /// Row padding is stripped and premultiplied alpha is divided out.
    /// Formats that are not 8-bit RGBA are rejected.
    pub fn into_straight_rgba(self) -> Result<Self, PixelError> {
        let premultiplied = match self.format {
            PixelFormat::Rgba8 => false,
            PixelFormat::Rgba8Premultiplied => true,
            other => return Err(PixelError::UnsupportedFormat(other)),
        };
        if !premultiplied && self.is_packed_rgba() {
            return Ok(self);
        }
        let row = self.size.width as usize * 4;
        let mut data = Vec::with_capacity(self.size.rgba_len().unwrap_or_default());
        for y in 0..self.size.height as usize {
            let start = y * self.stride;
            data.extend_from_slice(&self.data[start..start + row]);
        }
        if premultiplied {
            for px in data.chunks_exact_mut(4) {
                unpremultiply(px);
            }
        }
        Ok(Self {
            format: PixelFormat::Rgba8,
            size: self.size,
            stride: row,
            data,
        })
    }
}

fn unpremultiply(px: &mut [u8]) {
    let a = u32::from(px[3]);
    match a {
        0 => {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
        }
        255 => {}
        _ => {
            for c in &mut px[..3] {
                let v = (u32::from(*c) * 255 + a / 2) / a;
                *c = u8::try_from(v.min(255)).unwrap_or(u8::MAX);
            }
        }
    }
}
