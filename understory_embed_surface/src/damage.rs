// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage summaries reported by a surface backend.

use alloc::vec::Vec;

use crate::types::{PixelRect, PixelSize};

/// A batch of regions of one surface that need to be recaptured.
///
/// `Damage` is intentionally coarse: rectangles may overlap and are not
/// deduplicated. Use [`Damage::bounds`] to collapse a batch into the single
/// region that is actually captured and announced to the document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Damage {
    /// Surface-local rectangles whose pixels changed.
    pub dirty_rects: Vec<PixelRect>,
}

impl Damage {
    /// Damage covering an entire surface of the given size.
    #[must_use]
    pub fn full(size: PixelSize) -> Self {
        Self {
            dirty_rects: alloc::vec![PixelRect::from_size(size)],
        }
    }

    /// Add a damaged rectangle; empty rectangles are ignored.
    pub fn add(&mut self, rect: PixelRect) {
        if !rect.is_empty() {
            self.dirty_rects.push(rect);
        }
    }

    /// Returns `true` if nothing was damaged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dirty_rects.is_empty()
    }

    /// Returns the union of all damage rects.
    #[must_use]
    pub fn union_rect(&self) -> Option<PixelRect> {
        let mut it = self.dirty_rects.iter().copied();
        let first = it.next()?;
        Some(it.fold(first, PixelRect::union))
    }

    /// The union of all damage rects clipped to a surface of `size`.
    ///
    /// Returns `None` when nothing visible was damaged.
    #[must_use]
    pub fn bounds(&self, size: PixelSize) -> Option<PixelRect> {
        self.union_rect()?.intersect(PixelRect::from_size(size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_unions_then_clips() {
        let mut damage = Damage::default();
        damage.add(PixelRect::new(-4, 2, 8, 2));
        damage.add(PixelRect::new(6, 6, 10, 10));
        damage.add(PixelRect::ZERO);
        assert_eq!(damage.dirty_rects.len(), 2);
        assert_eq!(
            damage.bounds(PixelSize::new(10, 10)),
            Some(PixelRect::new(0, 2, 10, 8))
        );
    }

    #[test]
    fn empty_damage_has_no_bounds() {
        assert_eq!(Damage::default().bounds(PixelSize::new(4, 4)), None);
        assert_eq!(
            Damage::full(PixelSize::new(4, 4)).bounds(PixelSize::new(4, 4)),
            Some(PixelRect::new(0, 0, 4, 4))
        );
    }
}
