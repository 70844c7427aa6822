// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The outbound half of the document channel, and call generations.
//!
//! Script calls are fire-and-forget from the container's point of view: the
//! host runs them on its own loop and may report back later through
//! [`EmbedView::on_call_finished`](crate::EmbedView::on_call_finished).
//! Every batch carries a [`CallTicket`] recording the generations it was
//! issued under, so an outcome that arrives after a navigation, a resize of
//! the same child, or the child's removal is recognized as stale and dropped.

use alloc::string::String;
use alloc::vec::Vec;

use understory_embed_protocol::{ScriptCall, render_batch};

use crate::registry::ChildId;

/// A monotonically increasing epoch. Bumping it cancels everything issued
/// under the previous value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(u64);

impl Generation {
    /// The following generation.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// The raw counter.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// The generations a batch of calls was issued under.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallTicket {
    pub(crate) scope: Generation,
    pub(crate) child: Option<(ChildId, Generation)>,
}

impl CallTicket {
    /// The container-wide scope.
    #[must_use]
    pub fn scope(&self) -> Generation {
        self.scope
    }

    /// The child the calls are scoped to, for per-child calls.
    #[must_use]
    pub fn child(&self) -> Option<ChildId> {
        self.child.map(|(child, _)| child)
    }
}

/// Where outbound calls go.
pub trait DocumentSink {
    /// Run `calls`, in order, in the document's script on `namespace`.
    fn run_script(&mut self, namespace: &str, calls: &[ScriptCall], ticket: CallTicket);
}

/// A sink that renders each batch to script text and queues it.
///
/// Hosts whose script engine lives on their own loop can drain the queue and
/// evaluate each script there, passing the ticket back with the outcome.
#[derive(Clone, Debug, Default)]
pub struct ScriptQueue {
    pending: Vec<(CallTicket, String)>,
}

impl ScriptQueue {
    /// Number of queued scripts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take every queued script, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = (CallTicket, String)> + '_ {
        self.pending.drain(..)
    }
}

impl DocumentSink for ScriptQueue {
    fn run_script(&mut self, namespace: &str, calls: &[ScriptCall], ticket: CallTicket) {
        self.pending.push((ticket, render_batch(calls, namespace)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use understory_embed_surface::PixelSize;

    #[test]
    fn generations_advance() {
        let g = Generation::default();
        assert!(g.next() > g);
        assert_eq!(g.next().get(), 1);
    }

    #[test]
    fn queue_renders_batches_in_order() {
        let mut queue = ScriptQueue::default();
        let ticket = CallTicket {
            scope: Generation::default(),
            child: None,
        };
        queue.run_script("embed", &[ScriptCall::set_visible("a", true)], ticket);
        queue.run_script(
            "embed",
            &[ScriptCall::resize(
                "a",
                PixelSize::new(2, 3),
                PixelSize::new(1, 1),
            )],
            ticket,
        );
        let scripts: Vec<_> = queue.drain().map(|(_, s)| s).collect();
        assert_eq!(
            scripts,
            [
                "embed.child_set_visible (\"a\", true);\n",
                "embed.child_resize (\"a\", 2, 3, 1, 1);\n",
            ]
        );
        assert!(queue.is_empty());
    }
}
