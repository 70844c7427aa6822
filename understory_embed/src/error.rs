// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors returned by container operations.

use alloc::string::String;
use core::fmt;

use crate::registry::ChildId;

/// Why a container operation was rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EmbedError {
    /// The widget is already owned by a container.
    AlreadyParented,
    /// The child is not (or no longer) in this container.
    NotAChild(ChildId),
    /// Another live child already uses this element id.
    DuplicateElementId(String),
}

impl fmt::Display for EmbedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyParented => f.write_str("widget already has a parent"),
            Self::NotAChild(child) => write!(f, "{child:?} is not a child of this container"),
            Self::DuplicateElementId(id) => write!(f, "element id `{id}` is not unique"),
        }
    }
}

impl core::error::Error for EmbedError {}

/// A rejected add, handing the widget back to the caller.
pub struct AddError<W> {
    /// The widget that was not added.
    pub widget: W,
    /// Why it was rejected.
    pub error: EmbedError,
}

impl<W> AddError<W> {
    /// Take the widget back.
    pub fn into_widget(self) -> W {
        self.widget
    }
}

impl<W> fmt::Debug for AddError<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<W> fmt::Display for AddError<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not add widget: {}", self.error)
    }
}

impl<W> core::error::Error for AddError<W> {}
