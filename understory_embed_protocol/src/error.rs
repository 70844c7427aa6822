// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors produced while decoding messages from the document.

use alloc::string::String;
use core::fmt;

use crate::kind::MessageKind;

/// A message from the document that could not be decoded.
///
/// Decoding failures never reach the widget tree. Callers log them and drop
/// the message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    /// The handler name is not part of the vocabulary (or has the wrong prefix).
    UnknownMessage(String),
    /// The payload has the wrong JSON shape for its kind.
    UnexpectedPayload {
        /// Kind being decoded.
        kind: MessageKind,
        /// What was expected, e.g. `"array"`.
        expected: &'static str,
    },
    /// The payload has the right shape but a field is missing or mistyped.
    Malformed {
        /// Kind being decoded.
        kind: MessageKind,
        /// Description from the decoder.
        detail: String,
    },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMessage(name) => write!(f, "unknown message `{name}`"),
            Self::UnexpectedPayload { kind, expected } => {
                write!(f, "`{kind}` payload is not an {expected}")
            }
            Self::Malformed { kind, detail } => write!(f, "malformed `{kind}` payload: {detail}"),
        }
    }
}

impl core::error::Error for ProtocolError {}
