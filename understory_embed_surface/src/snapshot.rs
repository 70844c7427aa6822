// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pending snapshots: captured bitmaps waiting for the document to fetch them.
//!
//! ## Lifetime
//!
//! A snapshot enters the table when damage is captured and leaves it exactly once,
//! through whichever of these happens first:
//!
//! - [`SnapshotTable::take`]: the document fetched it; ownership moves into the response body.
//! - [`SnapshotTable::release`]: the document acknowledged the draw.
//! - [`SnapshotTable::release_owner`]: the child that produced it went away.
//! - [`SnapshotTable::clear`]: the container was torn down.
//!
//! Every later attempt to take or release the same token is a safe no-op.
//!
//! ```
//! use understory_embed_surface::{PixelBuffer, PixelRect, PixelSize, SnapshotTable};
//!
//! let mut table = SnapshotTable::<&str>::new();
//! let size = PixelSize::new(2, 2);
//! let pixels = PixelBuffer::transparent(size).unwrap();
//! let token = table.insert("box", PixelRect::from_size(size), pixels);
//!
//! assert!(table.take(token).is_some());
//! // Fetching again finds nothing, and a late acknowledgement is harmless.
//! assert!(table.take(token).is_none());
//! assert!(!table.release(token));
//! ```

use core::fmt;
use core::str::FromStr;

use hashbrown::HashMap;

use crate::pixels::PixelBuffer;
use crate::types::PixelRect;

/// Opaque handle naming one pending snapshot.
///
/// Tokens come from a per-table counter that only moves forward, so a token is
/// never reused while the table lives. The textual form (used in resource
/// URIs) is the decimal counter value.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct SnapshotToken(u64);

impl SnapshotToken {
    /// The raw counter value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Build a token from its raw counter value. Zero is never issued.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Option<Self> {
        if raw == 0 { None } else { Some(Self(raw)) }
    }
}

impl fmt::Display for SnapshotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SnapshotToken {
    type Err = core::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u64 = s.parse()?;
        // "0" parses but never names a snapshot; map it to an unused token.
        Ok(Self::from_raw(raw).unwrap_or(Self(u64::MAX)))
    }
}

/// A captured bitmap awaiting retrieval.
#[derive(Clone, Debug)]
pub struct PendingSnapshot<K> {
    /// Token announced to the document.
    pub token: SnapshotToken,
    /// Child that produced the snapshot.
    pub owner: K,
    /// Surface-local region the pixels cover.
    pub region: PixelRect,
    /// Packed straight-alpha RGBA8 pixels.
    pub pixels: PixelBuffer,
}

/// Owned table of pending snapshots keyed by token.
#[derive(Debug)]
pub struct SnapshotTable<K> {
    pending: HashMap<SnapshotToken, PendingSnapshot<K>>,
    counter: u64,
}

impl<K> Default for SnapshotTable<K> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
            counter: 0,
        }
    }
}

impl<K: Copy + PartialEq + fmt::Debug> SnapshotTable<K> {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshots still pending.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Store a snapshot and return its fresh token.
    pub fn insert(&mut self, owner: K, region: PixelRect, pixels: PixelBuffer) -> SnapshotToken {
        self.counter += 1;
        let token = SnapshotToken(self.counter);
        self.pending.insert(
            token,
            PendingSnapshot {
                token,
                owner,
                region,
                pixels,
            },
        );
        token
    }

    /// Borrow a pending snapshot.
    #[must_use]
    pub fn get(&self, token: SnapshotToken) -> Option<&PendingSnapshot<K>> {
        self.pending.get(&token)
    }

    /// Remove a snapshot, transferring ownership to the caller.
    pub fn take(&mut self, token: SnapshotToken) -> Option<PendingSnapshot<K>> {
        self.pending.remove(&token)
    }

    /// Like [`SnapshotTable::take`], but only if the snapshot belongs to `owner`.
    ///
    /// A snapshot requested under the wrong owner stays pending.
    pub fn take_owned_by(&mut self, owner: K, token: SnapshotToken) -> Option<PendingSnapshot<K>> {
        if self.pending.get(&token)?.owner != owner {
            return None;
        }
        self.pending.remove(&token)
    }

    /// Drop a snapshot. Returns `false` (and does nothing) if it was already gone.
    pub fn release(&mut self, token: SnapshotToken) -> bool {
        let released = self.pending.remove(&token).is_some();
        if !released {
            log::debug!("snapshot {token} already released");
        }
        released
    }

    /// Drop every snapshot produced by `owner`. Returns how many were dropped.
    pub fn release_owner(&mut self, owner: K) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, snap| snap.owner != owner);
        before - self.pending.len()
    }

    /// Drop everything. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PixelSize;
    use alloc::string::ToString;

    fn snap() -> (PixelRect, PixelBuffer) {
        let size = PixelSize::new(1, 1);
        (PixelRect::from_size(size), PixelBuffer::transparent(size).unwrap())
    }

    #[test]
    fn tokens_increase_and_are_never_zero() {
        let mut table = SnapshotTable::new();
        let (r, p) = snap();
        let a = table.insert(1_u32, r, p.clone());
        let b = table.insert(1_u32, r, p);
        assert!(a.get() >= 1);
        assert!(b > a);
        assert_eq!(a.to_string().parse::<SnapshotToken>(), Ok(a));
        assert_eq!(SnapshotToken::from_raw(0), None);
    }

    #[test]
    fn release_is_exactly_once() {
        let mut table = SnapshotTable::new();
        let (r, p) = snap();
        let t = table.insert(7_u32, r, p);
        assert!(table.release(t));
        assert!(!table.release(t));
        assert!(table.take(t).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn take_owned_by_checks_owner() {
        let mut table = SnapshotTable::new();
        let (r, p) = snap();
        let t = table.insert(7_u32, r, p);
        assert!(table.take_owned_by(8, t).is_none());
        assert_eq!(table.len(), 1);
        assert_eq!(table.take_owned_by(7, t).map(|s| s.owner), Some(7));
    }

    #[test]
    fn release_owner_only_drops_that_owner() {
        let mut table = SnapshotTable::new();
        let (r, p) = snap();
        table.insert(1_u32, r, p.clone());
        table.insert(1_u32, r, p.clone());
        let keep = table.insert(2_u32, r, p);
        assert_eq!(table.release_owner(1), 2);
        assert!(table.get(keep).is_some());
        assert_eq!(table.clear(), 1);
    }
}
