// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for surfaces: handles and integer pixel geometry.

use kurbo::{Point, Rect, Size};

/// Identifier for an offscreen surface.
///
/// This is a small, copyable handle that stays stable while the surface lives
/// and becomes invalid when the surface is destroyed.
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On create, a fresh slot is allocated with generation `1`.
/// - On destroy, the slot is freed; any existing `SurfaceId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `SurfaceId`.
///
/// Stale `SurfaceId`s never alias a different live surface because the generation must match.
/// Use [`SurfaceSet::is_alive`](crate::SurfaceSet::is_alive) to check liveness.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SurfaceId(pub(crate) u32, pub(crate) u32);

impl SurfaceId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}

/// A size in whole device pixels.
///
/// Zero in either dimension means "not yet sized".
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct PixelSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelSize {
    /// The empty size.
    pub const ZERO: Self = Self::new(0, 0);

    /// Create a size from a width and height.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either dimension is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of bytes needed for a tightly packed RGBA8 image of this size.
    ///
    /// `None` if that does not fit in `usize`.
    #[must_use]
    pub const fn rgba_len(self) -> Option<usize> {
        match (self.width as usize).checked_mul(self.height as usize) {
            Some(pixels) => pixels.checked_mul(4),
            None => None,
        }
    }

    /// Convert to a Kurbo size.
    #[must_use]
    pub fn to_kurbo(self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

/// An integer rectangle: origin plus size.
///
/// Used both for damage regions in surface-local space and for child
/// allocations in container space, where the origin may be negative (for
/// example when the document is scrolled past the element).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct PixelRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelRect {
    /// The empty rectangle at the origin.
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    /// Create a rectangle from its origin and size.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle at the origin covering `size`.
    #[must_use]
    pub const fn from_size(size: PixelSize) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// The size of this rectangle.
    #[must_use]
    pub const fn size(self) -> PixelSize {
        PixelSize::new(self.width, self.height)
    }

    /// Returns `true` if either dimension is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.size().is_empty()
    }

    /// The origin as a Kurbo point.
    #[must_use]
    pub fn origin(self) -> Point {
        Point::new(f64::from(self.x), f64::from(self.y))
    }

    /// Convert to a Kurbo rectangle.
    #[must_use]
    pub fn to_kurbo(self) -> Rect {
        Rect::from_origin_size(self.origin(), self.size().to_kurbo())
    }

    /// Returns `true` if `pt` lies inside this rectangle, edges included.
    ///
    /// Pointer coordinates reported by the document land exactly on the right
    /// and bottom edges when the pointer sits on the last pixel column or row,
    /// so both edges count as inside.
    #[must_use]
    pub fn contains_inclusive(self, pt: Point) -> bool {
        let r = self.to_kurbo();
        pt.x >= r.x0 && pt.x <= r.x1 && pt.y >= r.y0 && pt.y <= r.y1
    }

    /// Intersection of two rectangles, or `None` when they do not overlap.
    #[must_use]
    pub fn intersect(self, other: Self) -> Option<Self> {
        let x0 = i64::from(self.x).max(i64::from(other.x));
        let y0 = i64::from(self.y).max(i64::from(other.y));
        let x1 = (i64::from(self.x) + i64::from(self.width))
            .min(i64::from(other.x) + i64::from(other.width));
        let y1 = (i64::from(self.y) + i64::from(self.height))
            .min(i64::from(other.y) + i64::from(other.height));
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Self::new(
            i32::try_from(x0).ok()?,
            i32::try_from(y0).ok()?,
            u32::try_from(x1 - x0).ok()?,
            u32::try_from(y1 - y0).ok()?,
        ))
    }

    /// Smallest rectangle covering both.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (i64::from(self.x) + i64::from(self.width))
            .max(i64::from(other.x) + i64::from(other.width));
        let y1 = (i64::from(self.y) + i64::from(self.height))
            .max(i64::from(other.y) + i64::from(other.height));
        Self::new(
            x0,
            y0,
            u32::try_from(x1 - i64::from(x0)).unwrap_or(u32::MAX),
            u32::try_from(y1 - i64::from(y0)).unwrap_or(u32::MAX),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_when_either_dimension_is_zero() {
        assert!(PixelSize::new(0, 10).is_empty());
        assert!(PixelSize::new(10, 0).is_empty());
        assert!(!PixelSize::new(1, 1).is_empty());
        assert_eq!(PixelSize::new(3, 2).rgba_len(), Some(24));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn rgba_len_reports_overflow() {
        assert_eq!(PixelSize::new(u32::MAX, u32::MAX).rgba_len(), None);
    }

    #[test]
    fn contains_includes_far_edges() {
        let r = PixelRect::new(10, 20, 100, 50);
        assert!(r.contains_inclusive(Point::new(10.0, 20.0)));
        assert!(r.contains_inclusive(Point::new(110.0, 70.0)));
        assert!(!r.contains_inclusive(Point::new(110.5, 70.0)));
        assert!(!r.contains_inclusive(Point::new(9.0, 30.0)));
    }

    #[test]
    fn intersect_clips_and_rejects_disjoint() {
        let a = PixelRect::new(0, 0, 10, 10);
        let b = PixelRect::new(5, -5, 10, 10);
        assert_eq!(a.intersect(b), Some(PixelRect::new(5, 0, 5, 5)));
        assert_eq!(a.intersect(PixelRect::new(10, 0, 5, 5)), None);
    }

    #[test]
    fn union_ignores_empty_operands() {
        let a = PixelRect::new(0, 0, 10, 10);
        assert_eq!(a.union(PixelRect::ZERO), a);
        assert_eq!(
            a.union(PixelRect::new(-5, 5, 10, 10)),
            PixelRect::new(-5, 0, 15, 15)
        );
    }
}
