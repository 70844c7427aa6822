// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Calls the container makes into the document's script.
//!
//! A [`ScriptCall`] can be handed to the host in two forms: as structured data
//! (it serializes to a JSON object tagged with `"call"`), or rendered as a
//! script statement on the configured namespace:
//!
//! ```
//! use understory_embed_protocol::ScriptCall;
//!
//! let call = ScriptCall::set_visible("box", true);
//! assert_eq!(call.to_script("embed"), "embed.child_set_visible (\"box\", true);");
//! ```

use alloc::format;
use alloc::string::{String, ToString};

use serde::{Serialize, Serializer};
use serde_json::Value;
use smallvec::SmallVec;
use understory_embed_surface::{PixelRect, PixelSize, SnapshotToken};

use crate::kind::MessageKind;

/// One call into the document's script.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum ScriptCall {
    /// Set an element's box, with the widget's minimum as a floor.
    ChildResize {
        /// Element id.
        id: String,
        /// Width to apply.
        width: u32,
        /// Height to apply.
        height: u32,
        /// Minimum width the widget accepts.
        min_width: u32,
        /// Minimum height the widget accepts.
        min_height: u32,
    },
    /// Show or hide an element.
    ChildSetVisible {
        /// Element id.
        id: String,
        /// New visibility.
        visible: bool,
    },
    /// A new bitmap is ready to fetch with `token`.
    ChildDraw {
        /// Element id.
        id: String,
        /// Snapshot to fetch.
        #[serde(serialize_with = "token_as_string")]
        token: SnapshotToken,
        /// Left edge of the region in the element.
        x: i32,
        /// Top edge of the region in the element.
        y: i32,
        /// Width of the region.
        width: u32,
        /// Height of the region.
        height: u32,
    },
}

/// Calls issued together, in order.
pub type ScriptBatch = SmallVec<[ScriptCall; 2]>;

fn token_as_string<S: Serializer>(token: &SnapshotToken, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(token)
}

impl ScriptCall {
    /// `child_resize` for `size` with the given minimum.
    #[must_use]
    pub fn resize(id: impl Into<String>, size: PixelSize, minimum: PixelSize) -> Self {
        Self::ChildResize {
            id: id.into(),
            width: size.width,
            height: size.height,
            min_width: minimum.width,
            min_height: minimum.height,
        }
    }

    /// `child_set_visible`.
    #[must_use]
    pub fn set_visible(id: impl Into<String>, visible: bool) -> Self {
        Self::ChildSetVisible {
            id: id.into(),
            visible,
        }
    }

    /// `child_draw` announcing `token` for `region`.
    #[must_use]
    pub fn draw(id: impl Into<String>, token: SnapshotToken, region: PixelRect) -> Self {
        Self::ChildDraw {
            id: id.into(),
            token,
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
        }
    }

    /// The message kind of this call.
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::ChildResize { .. } => MessageKind::ChildResize,
            Self::ChildSetVisible { .. } => MessageKind::ChildSetVisible,
            Self::ChildDraw { .. } => MessageKind::ChildDraw,
        }
    }

    /// The element the call targets.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::ChildResize { id, .. }
            | Self::ChildSetVisible { id, .. }
            | Self::ChildDraw { id, .. } => id,
        }
    }

    /// Render as `<namespace>.<call> (args...);`.
    ///
    /// String arguments are JSON-quoted, so ids cannot break out of the call.
    #[must_use]
    pub fn to_script(&self, namespace: &str) -> String {
        let kind = self.kind();
        let id = quote(self.id());
        match self {
            Self::ChildResize {
                width,
                height,
                min_width,
                min_height,
                ..
            } => format!("{namespace}.{kind} ({id}, {width}, {height}, {min_width}, {min_height});"),
            Self::ChildSetVisible { visible, .. } => {
                format!("{namespace}.{kind} ({id}, {visible});")
            }
            Self::ChildDraw {
                token,
                x,
                y,
                width,
                height,
                ..
            } => {
                let token = quote(&token.to_string());
                format!("{namespace}.{kind} ({id}, {token}, {x}, {y}, {width}, {height});")
            }
        }
    }
}

/// Render a batch as one script, one statement per line.
#[must_use]
pub fn render_batch<'a>(calls: impl IntoIterator<Item = &'a ScriptCall>, namespace: &str) -> String {
    let mut script = String::new();
    for call in calls {
        script.push_str(&call.to_script(namespace));
        script.push('\n');
    }
    script
}

fn quote(s: &str) -> String {
    Value::from(s).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_each_call() {
        let token = SnapshotToken::from_raw(12).unwrap();
        assert_eq!(
            ScriptCall::resize("box", PixelSize::new(200, 100), PixelSize::new(50, 20))
                .to_script("embed"),
            "embed.child_resize (\"box\", 200, 100, 50, 20);"
        );
        assert_eq!(
            ScriptCall::draw("box", token, PixelRect::new(1, 2, 3, 4)).to_script("ns"),
            "ns.child_draw (\"box\", \"12\", 1, 2, 3, 4);"
        );
    }

    #[test]
    fn ids_are_escaped() {
        let call = ScriptCall::set_visible("a\"); evil(\"", false);
        assert_eq!(
            call.to_script("embed"),
            r#"embed.child_set_visible ("a\"); evil(\"", false);"#
        );
    }

    #[test]
    fn serializes_tagged_by_call_name() {
        let token = SnapshotToken::from_raw(3).unwrap();
        let value = serde_json::to_value(ScriptCall::draw("box", token, PixelRect::new(0, 0, 8, 8)))
            .unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "call": "child_draw", "id": "box", "token": "3",
                "x": 0, "y": 0, "width": 8, "height": 8,
            })
        );
    }

    #[test]
    fn batches_join_statements() {
        let batch: ScriptBatch = [
            ScriptCall::set_visible("a", true),
            ScriptCall::set_visible("b", false),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            render_batch(&batch, "embed"),
            "embed.child_set_visible (\"a\", true);\nembed.child_set_visible (\"b\", false);\n"
        );
    }
}
