// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_embed --heading-base-level=0

//! Understory Embed: native widgets shown inside elements of a rendered document.
//!
//! An [`EmbedView`] owns a set of native widgets and binds each one to a
//! placeholder element of a document by element id. The widget and the
//! element live in two independent layout systems; the view keeps their
//! size, position, visibility, and pixels in sync:
//!
//! - **Pixels.** Every identified child renders into its own offscreen
//!   surface. Damage is captured into a pending snapshot, announced with
//!   `child_draw`, fetched by the document through the resource scheme
//!   ([`EmbedView::fetch_resource`]), and released on acknowledgement.
//! - **Size.** A [`SizingPolicy`] decides whether the widget's preferred size
//!   or the element's rendered box wins. Either way negotiation stops as soon
//!   as nothing changes.
//! - **Position.** The document reports element origins; they drive
//!   coordinate translation and hit testing.
//! - **Visibility.** Native visibility is mirrored onto the element.
//! - **Input.** Pointer events observed by the document are re-dispatched to
//!   the widget in surface coordinates; duplicate native clicks are
//!   suppressed.
//!
//! The toolkit and the document are reached through three traits:
//! [`EmbeddedWidget`] for widgets, [`SurfaceBackend`] for render targets, and
//! [`DocumentSink`] for script calls. Messages from the document come in
//! through [`EmbedView::handle_message`].
//!
//! Outbound calls carry a [`CallTicket`]. Navigation, child resizes, and child
//! removal advance generations, and outcomes reported under an older
//! generation are ignored.
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use understory_embed::{ContainerId, EmbedConfig, EmbedView, EmbeddedWidget, ScriptQueue};
//! use understory_embed_protocol::PointerEvent;
//! use understory_embed_surface::{Damage, MemoryBackend, PixelSize};
//!
//! struct Label {
//!     parent: Option<ContainerId>,
//!     visible: bool,
//! }
//!
//! impl EmbeddedWidget for Label {
//!     fn parent(&self) -> Option<ContainerId> { self.parent }
//!     fn set_parent(&mut self, parent: Option<ContainerId>) { self.parent = parent; }
//!     fn is_visible(&self) -> bool { self.visible }
//!     fn set_visible(&mut self, visible: bool) { self.visible = visible; }
//!     fn preferred_size(&self) -> PixelSize { PixelSize::new(120, 24) }
//!     fn size_allocate(&mut self, _size: PixelSize) {}
//!     fn handle_pointer(&mut self, _event: &PointerEvent) -> bool { false }
//! }
//!
//! let mut view = EmbedView::new(EmbedConfig::default(), MemoryBackend::default(), ScriptQueue::default());
//! let label = view
//!     .add_with_id(Label { parent: None, visible: true }, "greeting")
//!     .unwrap();
//!
//! view.handle_message("embed_script_loaded", &json!({})).unwrap();
//! view.realize();
//! let scripts: Vec<_> = view.sink_mut().drain().map(|(_, s)| s).collect();
//! assert_eq!(scripts, ["embed.child_set_visible (\"greeting\", true);\n"]);
//!
//! // The widget repainted; the document is told where to fetch the pixels.
//! let token = view.damage(label, &Damage::full(PixelSize::new(120, 24))).unwrap();
//! let bitmap = view.fetch_resource(&format!("embed:///greeting?{token}")).unwrap();
//! assert_eq!(bitmap.len(), 120 * 24 * 4);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod channel;
mod config;
mod error;
mod layout;
mod redispatch;
mod registry;
mod sink;
mod view;
mod widget;

pub use config::{EmbedConfig, EmbedConfigBuilder};
pub use error::{AddError, EmbedError};
pub use layout::SizingPolicy;
pub use redispatch::NativeSource;
pub use registry::ChildId;
pub use sink::{CallTicket, DocumentSink, Generation, ScriptQueue};
pub use view::EmbedView;
pub use widget::{ContainerId, EmbeddedWidget};

pub use understory_embed_surface::SurfaceBackend;
