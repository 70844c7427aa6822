// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer events reported by the document for one embedded child.
//!
//! The document observes pointer input over a placeholder element and forwards
//! it on that child's channel as `{enter|press, time, state, x, y[, button]}`:
//!
//! - `enter: true/false`: the pointer crossed into or out of the element.
//! - `press: true/false`: a button went down or up; `button` says which.
//! - neither: the pointer moved.
//!
//! Coordinates are already relative to the element's top-left corner, which
//! is also the origin of the child's offscreen surface.

use alloc::string::ToString;

use kurbo::Point;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ProtocolError;
use crate::kind::MessageKind;
use crate::num::to_u32;

bitflags::bitflags! {
    /// Keyboard modifier and pointer button state at the time of an event.
    ///
    /// Bit positions follow the classic X11 state mask that documents forward
    /// verbatim. Unknown bits are preserved.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        /// Shift key.
        const SHIFT = 1 << 0;
        /// Caps lock.
        const LOCK = 1 << 1;
        /// Control key.
        const CONTROL = 1 << 2;
        /// Alt (first modifier).
        const ALT = 1 << 3;
        /// Primary button held.
        const BUTTON1 = 1 << 8;
        /// Middle button held.
        const BUTTON2 = 1 << 9;
        /// Secondary button held.
        const BUTTON3 = 1 << 10;
        /// Scroll up button held.
        const BUTTON4 = 1 << 11;
        /// Scroll down button held.
        const BUTTON5 = 1 << 12;
        /// Super key.
        const SUPER = 1 << 26;
    }
}

/// What happened to the pointer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PointerKind {
    /// Entered the element.
    Enter,
    /// Left the element.
    Leave,
    /// A button went down.
    Press,
    /// A button went up.
    Release,
    /// The pointer moved.
    Motion,
}

/// A decoded pointer event, in the child's surface coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerEvent {
    /// Kind of event.
    pub kind: PointerKind,
    /// Event time in milliseconds, as reported by the document.
    pub time: u32,
    /// Position relative to the child's origin.
    pub position: Point,
    /// Modifier and button state.
    pub modifiers: Modifiers,
    /// Button number for press and release, `None` otherwise.
    pub button: Option<u32>,
}

#[derive(Deserialize)]
struct RawPointer {
    enter: Option<bool>,
    press: Option<bool>,
    #[serde(default)]
    time: f64,
    #[serde(default)]
    state: f64,
    x: f64,
    y: f64,
    button: Option<f64>,
}

impl PointerEvent {
    /// Decode a pointer payload.
    ///
    /// ```
    /// use serde_json::json;
    /// use understory_embed_protocol::{Modifiers, PointerEvent, PointerKind};
    ///
    /// let event = PointerEvent::from_payload(&json!({
    ///     "press": true, "button": 1, "time": 1200, "state": 4, "x": 3.5, "y": 8,
    /// }))
    /// .unwrap();
    /// assert_eq!(event.kind, PointerKind::Press);
    /// assert_eq!(event.button, Some(1));
    /// assert_eq!(event.modifiers, Modifiers::CONTROL);
    /// ```
    pub fn from_payload(payload: &Value) -> Result<Self, ProtocolError> {
        if !payload.is_object() {
            return Err(ProtocolError::UnexpectedPayload {
                kind: MessageKind::Pointer,
                expected: "object",
            });
        }
        let raw = RawPointer::deserialize(payload).map_err(|err| ProtocolError::Malformed {
            kind: MessageKind::Pointer,
            detail: err.to_string(),
        })?;
        let (kind, button) = match (raw.enter, raw.press) {
            (Some(true), _) => (PointerKind::Enter, None),
            (Some(false), _) => (PointerKind::Leave, None),
            (None, Some(press)) => {
                let button = raw.button.map(to_u32).ok_or_else(|| ProtocolError::Malformed {
                    kind: MessageKind::Pointer,
                    detail: "button event without `button`".into(),
                })?;
                let kind = if press {
                    PointerKind::Press
                } else {
                    PointerKind::Release
                };
                (kind, Some(button))
            }
            (None, None) => (PointerKind::Motion, None),
        };
        Ok(Self {
            kind,
            time: to_u32(raw.time),
            position: Point::new(raw.x, raw.y),
            modifiers: Modifiers::from_bits_retain(to_u32(raw.state)),
            button,
        })
    }

    /// Returns `true` for press and release.
    #[must_use]
    pub fn is_button(&self) -> bool {
        matches!(self.kind, PointerKind::Press | PointerKind::Release)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn crossing_and_motion() {
        let enter = PointerEvent::from_payload(&json!({"enter": true, "x": 1, "y": 2})).unwrap();
        assert_eq!(enter.kind, PointerKind::Enter);
        assert_eq!(enter.position, Point::new(1.0, 2.0));
        let leave = PointerEvent::from_payload(&json!({"enter": false, "x": 0, "y": 0})).unwrap();
        assert_eq!(leave.kind, PointerKind::Leave);
        let motion =
            PointerEvent::from_payload(&json!({"time": 5, "state": 256, "x": 4, "y": 4})).unwrap();
        assert_eq!(motion.kind, PointerKind::Motion);
        assert_eq!(motion.time, 5);
        assert!(motion.modifiers.contains(Modifiers::BUTTON1));
        assert!(!motion.is_button());
    }

    #[test]
    fn unknown_state_bits_survive() {
        let ev = PointerEvent::from_payload(&json!({"state": 1 << 20, "x": 0, "y": 0})).unwrap();
        assert_eq!(ev.modifiers.bits(), 1 << 20);
    }

    #[test]
    fn missing_coordinates_or_button_are_malformed() {
        assert!(matches!(
            PointerEvent::from_payload(&json!({"enter": true, "x": 1})),
            Err(ProtocolError::Malformed { .. })
        ));
        assert!(matches!(
            PointerEvent::from_payload(&json!({"press": false, "x": 1, "y": 1})),
            Err(ProtocolError::Malformed { .. })
        ));
        assert!(matches!(
            PointerEvent::from_payload(&json!([1, 2])),
            Err(ProtocolError::UnexpectedPayload { .. })
        ));
    }
}
