// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout negotiation: who decides an embedded child's size.
//!
//! Two layout engines have an opinion about every embedded child. The widget
//! toolkit measures a preferred size; the document lays out a placeholder
//! element with its own rules. A [`SizingPolicy`] picks the authority once
//! per container.
//!
//! ## Native-authoritative
//!
//! Each layout pass measures the widget. If the preferred size equals the
//! current allocation nothing happens; otherwise the widget, its surface, and
//! (through `child_resize`) the placeholder are all forced to that size.
//!
//! ## Document-authoritative
//!
//! The document reports each placeholder's rendered box. A nonzero report
//! that differs from the allocation is adopted at once, and the child is
//! marked as document-sized: later layout passes re-lay the widget out at
//! the reported size and never push a size back. A zero dimension falls back
//! to the widget's minimum. Until a usable report arrives, children follow the
//! native-authoritative path.
//!
//! Either way the document's origin reports always update the allocation's
//! `x`/`y`, and the negotiation reaches a fixed point: a pass with nothing
//! new to say does nothing.

use understory_embed_protocol::ChildBox;
use understory_embed_surface::PixelSize;

use crate::config::EmbedConfig;
use crate::registry::ChildRecord;
use crate::widget::EmbeddedWidget;

/// Which layout engine decides embedded children's sizes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SizingPolicy {
    /// The widget's preferred size always wins.
    NativeAuthoritative,
    /// The document's rendered box wins once it reports one; the widget's
    /// preferred size is the fallback.
    #[default]
    DocumentAuthoritative,
}

impl<W: EmbeddedWidget> ChildRecord<W> {
    /// Run one layout pass for this child.
    ///
    /// Returns the new size if the widget was re-laid-out, `None` when the
    /// pass was a no-op.
    pub(crate) fn negotiate(&mut self) -> Option<PixelSize> {
        let preferred = self.widget.preferred_size();
        self.minimum = self.widget.minimum_size();
        let size = if self.uses_document_size {
            let mut size = self.allocation.size();
            if size.width == 0 {
                size.width = self.minimum.width;
            }
            if size.height == 0 {
                size.height = self.minimum.height;
            }
            if size == self.laid_out {
                return None;
            }
            size
        } else {
            if preferred == self.allocation.size() && preferred == self.laid_out {
                return None;
            }
            preferred
        };
        self.lay_out(size);
        Some(size)
    }

    /// Give the widget `size` and record it as the allocation's size.
    pub(crate) fn lay_out(&mut self, size: PixelSize) {
        self.allocation.width = size.width;
        self.allocation.height = size.height;
        self.widget.size_allocate(size);
        self.laid_out = size;
    }

    /// Apply a rendered box reported by the document.
    ///
    /// The origin is always stored. Sizes beyond the configured surface limit
    /// are dropped with a warning. Returns `true` if the size was adopted and
    /// the child needs a layout pass.
    pub(crate) fn apply_document_box(&mut self, config: &EmbedConfig, report: &ChildBox) -> bool {
        self.allocation.x = report.x;
        self.allocation.y = report.y;
        if config.sizing() == SizingPolicy::NativeAuthoritative {
            return false;
        }
        let Some(size) = report.size() else {
            return false;
        };
        let limit = config.max_surface_size();
        if size.width > limit.width || size.height > limit.height {
            log::warn!(
                "ignoring {}x{} box for `{}`: larger than {}x{}",
                size.width,
                size.height,
                report.id,
                limit.width,
                limit.height
            );
            return false;
        }
        if size == self.allocation.size() {
            return false;
        }
        self.uses_document_size = true;
        self.allocation.width = size.width;
        self.allocation.height = size.height;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ChildRegistry;
    use crate::widget::ContainerId;
    use alloc::string::String;
    use understory_embed_protocol::PointerEvent;
    use understory_embed_surface::PixelRect;

    #[derive(Debug)]
    struct Fixed {
        preferred: PixelSize,
        allocations: usize,
    }

    impl EmbeddedWidget for Fixed {
        fn parent(&self) -> Option<ContainerId> {
            None
        }
        fn set_parent(&mut self, _: Option<ContainerId>) {}
        fn is_visible(&self) -> bool {
            true
        }
        fn set_visible(&mut self, _: bool) {}
        fn preferred_size(&self) -> PixelSize {
            self.preferred
        }
        fn minimum_size(&self) -> PixelSize {
            PixelSize::new(5, 6)
        }
        fn size_allocate(&mut self, _: PixelSize) {
            self.allocations += 1;
        }
        fn handle_pointer(&mut self, _: &PointerEvent) -> bool {
            false
        }
    }

    fn report(width: u32, height: u32) -> ChildBox {
        ChildBox {
            id: String::from("box"),
            x: 10,
            y: 20,
            width,
            height,
        }
    }

    fn document() -> EmbedConfig {
        EmbedConfig::default()
    }

    fn native() -> EmbedConfig {
        EmbedConfig::builder()
            .sizing(SizingPolicy::NativeAuthoritative)
            .build()
    }

    fn registry() -> (ChildRegistry<Fixed>, crate::registry::ChildId) {
        let mut reg = ChildRegistry::default();
        let id = reg.insert(
            Fixed {
                preferred: PixelSize::new(40, 30),
                allocations: 0,
            },
            Some("box".into()),
            true,
        );
        (reg, id)
    }

    #[test]
    fn native_pass_reaches_a_fixed_point() {
        let (mut reg, id) = registry();
        let rec = reg.get_mut(id).unwrap();
        assert_eq!(rec.negotiate(), Some(PixelSize::new(40, 30)));
        assert_eq!(rec.negotiate(), None);
        rec.widget.preferred = PixelSize::new(41, 30);
        assert_eq!(rec.negotiate(), Some(PixelSize::new(41, 30)));
        assert_eq!(rec.widget.allocations, 2);
    }

    #[test]
    fn zero_height_report_keeps_size_but_stores_origin() {
        let (mut reg, id) = registry();
        let rec = reg.get_mut(id).unwrap();
        rec.negotiate();
        assert!(!rec.apply_document_box(&document(), &report(200, 0)));
        assert_eq!(rec.allocation, PixelRect::new(10, 20, 40, 30));
        assert!(!rec.uses_document_size);
    }

    #[test]
    fn document_size_takes_over() {
        let (mut reg, id) = registry();
        let rec = reg.get_mut(id).unwrap();
        rec.negotiate();
        assert!(rec.apply_document_box(&document(), &report(200, 100)));
        assert!(rec.uses_document_size);
        assert_eq!(rec.negotiate(), Some(PixelSize::new(200, 100)));
        // The widget's own preference no longer matters.
        rec.widget.preferred = PixelSize::new(1, 1);
        assert_eq!(rec.negotiate(), None);
        assert_eq!(rec.allocation.size(), PixelSize::new(200, 100));
    }

    #[test]
    fn native_policy_ignores_reported_sizes() {
        let (mut reg, id) = registry();
        let rec = reg.get_mut(id).unwrap();
        rec.negotiate();
        assert!(!rec.apply_document_box(&native(), &report(200, 100)));
        assert_eq!(rec.allocation, PixelRect::new(10, 20, 40, 30));
    }

    #[test]
    fn first_pass_records_the_minimum() {
        let (mut reg, id) = registry();
        let rec = reg.get_mut(id).unwrap();
        rec.negotiate();
        assert_eq!(rec.minimum, PixelSize::new(5, 6));
    }

    #[test]
    fn oversized_reports_are_dropped() {
        let (mut reg, id) = registry();
        let rec = reg.get_mut(id).unwrap();
        rec.negotiate();
        let config = EmbedConfig::builder()
            .max_surface_size(PixelSize::new(100, 100))
            .build();
        assert!(!rec.apply_document_box(&config, &report(101, 50)));
        assert!(!rec.uses_document_size);
        assert_eq!(rec.allocation, PixelRect::new(10, 20, 40, 30));
        assert!(rec.apply_document_box(&config, &report(100, 100)));
    }
}
