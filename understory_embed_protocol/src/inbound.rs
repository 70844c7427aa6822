// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Messages sent by the document, decoded once at the boundary.
//!
//! Batched messages carry an array of entries (`children_init` entries may
//! also be bare element ids). A bad entry is skipped with a warning and the
//! rest of the batch still applies; a payload of the wrong overall shape
//! rejects the whole message.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use understory_embed_surface::{PixelSize, SnapshotToken};

use crate::config::ProtocolConfig;
use crate::error::ProtocolError;
use crate::kind::MessageKind;
use crate::num::{to_i32, to_u32};
use crate::pointer::PointerEvent;

/// One entry of a `children_init` batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildInit {
    /// Element id.
    pub id: String,
    /// The element sizes itself from the document's layout; do not push a size.
    pub use_dom_size: bool,
}

/// An element's origin in the document viewport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildPosition {
    /// Element id.
    pub id: String,
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
}

/// An element's rendered box in the document viewport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildBox {
    /// Element id.
    pub id: String,
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Rendered width.
    pub width: u32,
    /// Rendered height.
    pub height: u32,
}

impl ChildBox {
    /// The reported size, if it is usable.
    ///
    /// A report with a zero width or height carries no size information.
    #[must_use]
    pub fn size(&self) -> Option<PixelSize> {
        let size = PixelSize::new(self.width, self.height);
        (!size.is_empty()).then_some(size)
    }
}

/// Which pending snapshots a draw acknowledgement releases.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrawDone {
    /// Element whose snapshots are released; `None` releases everything.
    pub id: Option<String>,
    /// The one snapshot released; `None` releases all of the element's.
    pub token: Option<SnapshotToken>,
}

/// A decoded message from the document.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundMessage {
    /// The document's script is installed; the channel is ready.
    ScriptLoaded,
    /// Push current size and visibility for these children.
    ChildrenInit(Vec<ChildInit>),
    /// Batched origins.
    UpdatePositions(Vec<ChildPosition>),
    /// A single origin.
    Position(ChildPosition),
    /// Batched origins and sizes.
    ChildrenMoveResize(Vec<ChildBox>),
    /// One child's draw (or all of its draws) was consumed.
    ChildDrawDone(DrawDone),
    /// Every pending draw was consumed.
    UpdateCanvasDone,
    /// A pointer event for one child.
    Pointer {
        /// Element id taken from the channel name.
        id: String,
        /// The event.
        event: PointerEvent,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInit {
    Id(String),
    Entry {
        id: String,
        #[serde(default)]
        use_dom_size: Value,
    },
}

impl RawInit {
    fn finish(self) -> ChildInit {
        match self {
            Self::Id(id) => ChildInit {
                id,
                use_dom_size: false,
            },
            Self::Entry { id, use_dom_size } => ChildInit {
                id,
                use_dom_size: truthy(&use_dom_size),
            },
        }
    }
}

#[derive(Deserialize)]
struct RawPosition {
    id: String,
    x: f64,
    y: f64,
}

#[derive(Deserialize)]
struct RawBox {
    id: String,
    x: f64,
    y: f64,
    #[serde(default)]
    width: f64,
    #[serde(default)]
    height: f64,
}

#[derive(Deserialize)]
struct RawDrawDone {
    id: Option<String>,
    token: Option<Value>,
}

impl InboundMessage {
    /// Decode a message arriving on the handler `name`.
    ///
    /// ```
    /// use serde_json::json;
    /// use understory_embed_protocol::{InboundMessage, ProtocolConfig};
    ///
    /// let config = ProtocolConfig::default();
    /// let msg = InboundMessage::decode(
    ///     &config,
    ///     "embed_children_move_resize",
    ///     &json!([{ "id": "box", "x": 10, "y": 20, "width": 200, "height": 0 }]),
    /// )
    /// .unwrap();
    /// let InboundMessage::ChildrenMoveResize(boxes) = msg else { unreachable!() };
    /// assert_eq!((boxes[0].x, boxes[0].y), (10, 20));
    /// assert_eq!(boxes[0].size(), None);
    /// ```
    pub fn decode(
        config: &ProtocolConfig,
        name: &str,
        payload: &Value,
    ) -> Result<Self, ProtocolError> {
        let (kind, id) = config.parse_name(name)?;
        Self::decode_kind(kind, id, payload)
    }

    /// Decode a payload whose kind is already known.
    ///
    /// `id` is the child id of a child-scoped channel and must be present for
    /// those kinds.
    pub fn decode_kind(
        kind: MessageKind,
        id: Option<&str>,
        payload: &Value,
    ) -> Result<Self, ProtocolError> {
        Ok(match kind {
            MessageKind::ScriptLoaded => Self::ScriptLoaded,
            MessageKind::ChildrenInit => Self::ChildrenInit(batch(kind, payload, RawInit::finish)?),
            MessageKind::UpdatePositions => {
                Self::UpdatePositions(batch(kind, payload, RawPosition::finish)?)
            }
            MessageKind::Position => Self::Position(single::<RawPosition>(kind, payload)?.finish()),
            MessageKind::ChildrenMoveResize => {
                Self::ChildrenMoveResize(batch(kind, payload, |raw: RawBox| ChildBox {
                    id: raw.id,
                    x: to_i32(raw.x),
                    y: to_i32(raw.y),
                    width: to_u32(raw.width),
                    height: to_u32(raw.height),
                })?)
            }
            MessageKind::ChildDrawDone => {
                let raw = single::<RawDrawDone>(kind, payload)?;
                let token = match raw.token {
                    None | Some(Value::Null) => None,
                    Some(token) => Some(parse_token(&token).ok_or_else(|| {
                        ProtocolError::Malformed {
                            kind,
                            detail: "`token` is not a snapshot token".to_string(),
                        }
                    })?),
                };
                Self::ChildDrawDone(DrawDone { id: raw.id, token })
            }
            MessageKind::UpdateCanvasDone => Self::UpdateCanvasDone,
            MessageKind::Pointer => {
                let id = id.ok_or_else(|| ProtocolError::UnknownMessage(kind.name().to_string()))?;
                Self::Pointer {
                    id: id.to_string(),
                    event: PointerEvent::from_payload(payload)?,
                }
            }
            MessageKind::ChildResize | MessageKind::ChildSetVisible | MessageKind::ChildDraw => {
                return Err(ProtocolError::UnknownMessage(kind.name().to_string()));
            }
        })
    }

    /// The kind this message was decoded from.
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::ScriptLoaded => MessageKind::ScriptLoaded,
            Self::ChildrenInit(_) => MessageKind::ChildrenInit,
            Self::UpdatePositions(_) => MessageKind::UpdatePositions,
            Self::Position(_) => MessageKind::Position,
            Self::ChildrenMoveResize(_) => MessageKind::ChildrenMoveResize,
            Self::ChildDrawDone(_) => MessageKind::ChildDrawDone,
            Self::UpdateCanvasDone => MessageKind::UpdateCanvasDone,
            Self::Pointer { .. } => MessageKind::Pointer,
        }
    }
}

impl RawPosition {
    fn finish(self) -> ChildPosition {
        ChildPosition {
            id: self.id,
            x: to_i32(self.x),
            y: to_i32(self.y),
        }
    }
}

fn single<T: DeserializeOwned>(kind: MessageKind, payload: &Value) -> Result<T, ProtocolError> {
    if !payload.is_object() {
        return Err(ProtocolError::UnexpectedPayload {
            kind,
            expected: "object",
        });
    }
    T::deserialize(payload).map_err(|err| ProtocolError::Malformed {
        kind,
        detail: err.to_string(),
    })
}

fn batch<T: DeserializeOwned, U>(
    kind: MessageKind,
    payload: &Value,
    finish: impl Fn(T) -> U,
) -> Result<Vec<U>, ProtocolError> {
    let entries = payload
        .as_array()
        .ok_or(ProtocolError::UnexpectedPayload {
            kind,
            expected: "array",
        })?;
    let mut out = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        // Structs would also accept positional arrays; only objects (and bare
        // ids, where the kind allows them) are entries.
        if !(entry.is_object() || entry.is_string()) {
            log::warn!("`{kind}` entry {index} is not an object; skipped");
            continue;
        }
        match T::deserialize(entry) {
            Ok(raw) => out.push(finish(raw)),
            Err(err) => log::warn!("`{kind}` entry {index} skipped: {err}"),
        }
    }
    Ok(out)
}

/// Script truthiness for the flag fields documents send as numbers or booleans.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn parse_token(value: &Value) -> Option<SnapshotToken> {
    match value {
        Value::Number(n) => n.as_u64().and_then(SnapshotToken::from_raw),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
