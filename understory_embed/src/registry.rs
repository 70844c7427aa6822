// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Child registry: the container's records of its embedded widgets.

use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;
use understory_embed_surface::{PixelRect, PixelSize, SurfaceId};

use crate::error::EmbedError;
use crate::sink::Generation;

/// Identifier for an embedded child.
///
/// A slot index plus a generation, so an id kept past the child's removal
/// never names a child added later.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ChildId(u32, u32);

impl ChildId {
    const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Everything the container tracks for one child.
#[derive(Debug)]
pub(crate) struct ChildRecord<W> {
    pub(crate) widget: W,
    pub(crate) element_id: Option<String>,
    /// Origin from the document, size from the layout negotiation.
    pub(crate) allocation: PixelRect,
    /// Size last handed to the widget's own layout.
    pub(crate) laid_out: PixelSize,
    pub(crate) minimum: PixelSize,
    pub(crate) surface: Option<SurfaceId>,
    /// Visibility last observed (and mirrored, when the channel was ready).
    pub(crate) shown: bool,
    pub(crate) uses_document_size: bool,
    /// Per-child call generation; bumped to cancel in-flight calls.
    pub(crate) calls: Generation,
}

impl<W> ChildRecord<W> {
    /// The element id, if the child is surfaced to the document.
    pub(crate) fn element(&self) -> Option<&str> {
        self.element_id.as_deref()
    }
}

#[derive(Debug)]
struct Slot<W> {
    generation: u32,
    record: Option<ChildRecord<W>>,
}

/// Generational storage for child records, with document order and an
/// element id index.
///
/// Order is most-recently-added first.
#[derive(Debug)]
pub(crate) struct ChildRegistry<W> {
    slots: Vec<Slot<W>>,
    free: Vec<u32>,
    order: Vec<ChildId>,
    by_element: HashMap<String, ChildId>,
}

impl<W> Default for ChildRegistry<W> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
            by_element: HashMap::new(),
        }
    }
}

impl<W> ChildRegistry<W> {
    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn contains(&self, id: ChildId) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn get(&self, id: ChildId) -> Option<&ChildRecord<W>> {
        let slot = self.slots.get(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        slot.record.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: ChildId) -> Option<&mut ChildRecord<W>> {
        let slot = self.slots.get_mut(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        slot.record.as_mut()
    }

    /// Insert a record at the front of the order.
    ///
    /// The caller has already checked that `element_id` is free.
    pub(crate) fn insert(&mut self, widget: W, element_id: Option<String>, shown: bool) -> ChildId {
        let record = ChildRecord {
            widget,
            element_id: element_id.clone(),
            allocation: PixelRect::ZERO,
            laid_out: PixelSize::ZERO,
            minimum: PixelSize::ZERO,
            surface: None,
            shown,
            uses_document_size: false,
            calls: Generation::default(),
        };
        let id = if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.record = Some(record);
            ChildId(idx, slot.generation)
        } else {
            let idx = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                generation: 1,
                record: Some(record),
            });
            ChildId(idx, 1)
        };
        if let Some(element) = element_id {
            self.by_element.insert(element, id);
        }
        self.order.insert(0, id);
        id
    }

    pub(crate) fn remove(&mut self, id: ChildId) -> Option<ChildRecord<W>> {
        let slot = self.slots.get_mut(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        let record = slot.record.take()?;
        self.free.push(id.0);
        self.order.retain(|&c| c != id);
        if let Some(element) = record.element() {
            self.by_element.remove(element);
        }
        Some(record)
    }

    pub(crate) fn find_by_element(&self, element: &str) -> Option<ChildId> {
        self.by_element.get(element).copied()
    }

    pub(crate) fn find_by_surface(&self, surface: SurfaceId) -> Option<ChildId> {
        self.order
            .iter()
            .copied()
            .find(|&id| self.get(id).is_some_and(|r| r.surface == Some(surface)))
    }

    /// Change a child's element id. Returns the previous id.
    pub(crate) fn set_element_id(
        &mut self,
        id: ChildId,
        element: Option<String>,
    ) -> Result<Option<String>, EmbedError> {
        if let Some(element) = element.as_deref() {
            if self.find_by_element(element).is_some_and(|owner| owner != id) {
                return Err(EmbedError::DuplicateElementId(element.into()));
            }
        }
        let record = self.get_mut(id).ok_or(EmbedError::NotAChild(id))?;
        let previous = core::mem::replace(&mut record.element_id, element.clone());
        if let Some(previous) = previous.as_deref() {
            self.by_element.remove(previous);
        }
        if let Some(element) = element {
            self.by_element.insert(element, id);
        }
        Ok(previous)
    }

    /// Children in order, most recently added first.
    pub(crate) fn ids(&self) -> &[ChildId] {
        &self.order
    }

    /// Remove every record, in order.
    pub(crate) fn drain(&mut self) -> Vec<(ChildId, ChildRecord<W>)> {
        let order = core::mem::take(&mut self.order);
        let mut out = Vec::with_capacity(order.len());
        for id in order {
            if let Some(record) = self.slots[id.idx()].record.take() {
                self.free.push(id.0);
                out.push((id, record));
            }
        }
        self.by_element.clear();
        out
    }
}
