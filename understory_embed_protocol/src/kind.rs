// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Message kinds and compact sets of them.

use core::fmt;
use core::ops::{BitOr, BitOrAssign};

/// Which side of the boundary sends a message.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Sent by the document, handled by the container.
    Inbound,
    /// Sent by the container, handled by the document's script.
    Outbound,
}

/// The closed vocabulary of messages exchanged with the document.
///
/// Every message name that can cross the boundary maps to exactly one kind.
/// Names are decoded into kinds once, when a message arrives, and all later
/// dispatch matches on the kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum MessageKind {
    /// The document finished installing its side of the protocol.
    ScriptLoaded = 0,
    /// The document asks for the current size and visibility of a batch of children.
    ChildrenInit = 1,
    /// Batched element origins.
    UpdatePositions = 2,
    /// A single element origin.
    Position = 3,
    /// Batched element origins and sizes.
    ChildrenMoveResize = 4,
    /// Acknowledgement of one child's draw.
    ChildDrawDone = 5,
    /// Acknowledgement of every pending draw.
    UpdateCanvasDone = 6,
    /// A pointer event targeted at one child.
    Pointer = 7,
    /// Force a placeholder element to a size.
    ChildResize = 8,
    /// Show or hide a placeholder element.
    ChildSetVisible = 9,
    /// Announce a new bitmap for a placeholder element.
    ChildDraw = 10,
}

impl MessageKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::ScriptLoaded,
        Self::ChildrenInit,
        Self::UpdatePositions,
        Self::Position,
        Self::ChildrenMoveResize,
        Self::ChildDrawDone,
        Self::UpdateCanvasDone,
        Self::Pointer,
        Self::ChildResize,
        Self::ChildSetVisible,
        Self::ChildDraw,
    ];

    /// The wire name, without any namespace prefix.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ScriptLoaded => "script_loaded",
            Self::ChildrenInit => "children_init",
            Self::UpdatePositions => "update_positions",
            Self::Position => "position",
            Self::ChildrenMoveResize => "children_move_resize",
            Self::ChildDrawDone => "child_draw_done",
            Self::UpdateCanvasDone => "update_canvas_done",
            Self::Pointer => "pointer",
            Self::ChildResize => "child_resize",
            Self::ChildSetVisible => "child_set_visible",
            Self::ChildDraw => "child_draw",
        }
    }

    /// Look a kind up by its unprefixed wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Which side sends this kind.
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::ChildResize | Self::ChildSetVisible | Self::ChildDraw => Direction::Outbound,
            _ => Direction::Inbound,
        }
    }

    /// Returns `true` for kinds whose wire name carries a child id suffix.
    ///
    /// Child-scoped channels are named `<name>:<id>`.
    #[must_use]
    pub const fn is_child_scoped(self) -> bool {
        matches!(self, Self::Pointer)
    }

    /// A set holding only this kind.
    #[must_use]
    pub const fn into_set(self) -> KindSet {
        KindSet(1 << self as u16)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A compact set of [`MessageKind`]s.
///
/// ```
/// use understory_embed_protocol::{KindSet, MessageKind};
///
/// let acks = MessageKind::ChildDrawDone.into_set() | MessageKind::UpdateCanvasDone.into_set();
/// assert!(acks.contains(MessageKind::UpdateCanvasDone));
/// assert!(!acks.contains(MessageKind::ChildDraw));
/// assert_eq!(KindSet::OUTBOUND.len(), 3);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct KindSet(u16);

impl KindSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Kinds the document sends.
    pub const INBOUND: Self = Self(0b000_1111_1111);

    /// Kinds the container sends.
    pub const OUTBOUND: Self = Self(0b111_0000_0000);

    /// Kinds that are acted upon before the document has signalled readiness.
    pub const BEFORE_READY: Self = Self(1 << MessageKind::ScriptLoaded as u16);

    /// Returns `true` if the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if `kind` is in the set.
    #[must_use]
    pub const fn contains(self, kind: MessageKind) -> bool {
        self.0 & (1 << kind as u16) != 0
    }

    /// Add a kind.
    pub fn insert(&mut self, kind: MessageKind) {
        self.0 |= 1 << kind as u16;
    }

    /// Remove a kind.
    pub fn remove(&mut self, kind: MessageKind) {
        self.0 &= !(1 << kind as u16);
    }

    /// Number of kinds in the set.
    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Iterate the kinds in declaration order.
    pub fn iter(self) -> impl Iterator<Item = MessageKind> {
        MessageKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl BitOr for KindSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for KindSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl FromIterator<MessageKind> for KindSet {
    fn from_iter<I: IntoIterator<Item = MessageKind>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl fmt::Debug for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
