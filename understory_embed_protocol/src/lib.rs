// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_embed_protocol --heading-base-level=0

//! Understory Embed Protocol: the messages a container exchanges with the document it embeds widgets into.
//!
//! The document and the container run independent layout engines and share
//! nothing but a narrow, ordered channel. This crate defines what may travel
//! over it:
//!
//! - [`MessageKind`] / [`KindSet`]: the closed vocabulary, with its direction.
//! - [`InboundMessage`]: document-to-container messages, decoded once from a
//!   handler name and a JSON payload (`serde_json::Value`).
//! - [`ScriptCall`]: container-to-document calls, available as structured
//!   data or rendered as script statements.
//! - [`PointerEvent`]: pointer payloads forwarded on a child's channel.
//! - [`ResourceRequest`] / [`ResourceResponse`] / [`ResourceError`]: the
//!   resource scheme the document fetches bitmaps through.
//! - [`ProtocolConfig`]: the namespace, handler prefix, and scheme name.
//!
//! This crate holds no state; `understory_embed` drives it.
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use understory_embed_protocol::{InboundMessage, ProtocolConfig, ScriptCall};
//!
//! let config = ProtocolConfig::default();
//!
//! // The document reports where an element ended up.
//! let msg = InboundMessage::decode(
//!     &config,
//!     "embed_position",
//!     &json!({ "id": "box", "x": 10, "y": 20 }),
//! )
//! .unwrap();
//! assert!(matches!(msg, InboundMessage::Position(ref p) if p.x == 10));
//!
//! // The container answers with a script call.
//! let call = ScriptCall::set_visible("box", true);
//! assert_eq!(
//!     call.to_script(config.namespace()),
//!     "embed.child_set_visible (\"box\", true);"
//! );
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod config;
mod error;
mod inbound;
mod kind;
mod num;
mod outbound;
mod pointer;
mod resource;

pub use config::{ProtocolConfig, ProtocolConfigBuilder};
pub use error::ProtocolError;
pub use inbound::{ChildBox, ChildInit, ChildPosition, DrawDone, InboundMessage};
pub use kind::{Direction, KindSet, MessageKind};
pub use outbound::{ScriptBatch, ScriptCall, render_batch};
pub use pointer::{Modifiers, PointerEvent, PointerKind};
pub use resource::{ResourceError, ResourceRequest, ResourceResponse};
