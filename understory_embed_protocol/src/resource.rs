// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The resource scheme documents fetch bitmaps through.
//!
//! A request names an element and, optionally, one pending snapshot:
//!
//! - `<scheme>:///<id>?<token>` (or `<scheme>://<id>?<token>`): the snapshot
//!   announced by `child_draw`.
//! - `<scheme>:///<id>`: the element's whole surface as it is right now.
//!
//! Successful responses are raw, tightly packed, straight-alpha RGBA8 bytes.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use understory_embed_surface::{PixelBuffer, PixelSize, SnapshotToken};

/// A parsed resource-scheme request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceRequest {
    /// Element id.
    pub id: String,
    /// Pending snapshot to return; `None` captures the whole surface.
    pub token: Option<SnapshotToken>,
}

impl ResourceRequest {
    /// Parse a request URI for `scheme`.
    ///
    /// A bare path (`/<id>?<token>`) is accepted too, since hosts often
    /// hand over only the path and query.
    ///
    /// ```
    /// use understory_embed_protocol::ResourceRequest;
    ///
    /// let req = ResourceRequest::parse("embed:///box?7", "embed").unwrap();
    /// assert_eq!(req.id, "box");
    /// assert_eq!(req.token.map(|t| t.get()), Some(7));
    ///
    /// let whole = ResourceRequest::parse("/box", "embed").unwrap();
    /// assert!(whole.token.is_none());
    /// ```
    pub fn parse(uri: &str, scheme: &str) -> Result<Self, ResourceError> {
        let malformed = || ResourceError::MalformedUri(uri.to_string());
        let rest = match uri.split_once(':') {
            Some((prefix, rest)) if prefix.eq_ignore_ascii_case(scheme) => rest,
            Some((prefix, _)) if !prefix.contains('/') => return Err(malformed()),
            _ => uri,
        };
        let rest = rest.split_once('#').map_or(rest, |(rest, _)| rest);
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };
        let id = path.trim_start_matches('/');
        if id.is_empty() || id.contains('/') {
            return Err(malformed());
        }
        let token = match query {
            None | Some("") => None,
            Some(query) => Some(query.parse().map_err(|_| malformed())?),
        };
        Ok(Self {
            id: id.to_string(),
            token,
        })
    }
}

/// A successful fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceResponse {
    /// Width and height of the bitmap.
    pub size: PixelSize,
    /// Packed straight-alpha RGBA8 bytes.
    pub body: Vec<u8>,
}

impl ResourceResponse {
    /// Content type every response carries.
    pub const CONTENT_TYPE: &'static str = "application/octet-stream";

    /// Wrap normalized pixels.
    #[must_use]
    pub fn from_pixels(pixels: PixelBuffer) -> Self {
        Self {
            size: pixels.size(),
            body: pixels.into_bytes(),
        }
    }

    /// Content type of the body.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        Self::CONTENT_TYPE
    }

    /// Body length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Returns `true` for an empty body.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Why a fetch failed. The `Display` form is the message handed back to the
/// document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceError {
    /// The URI is not a valid request.
    MalformedUri(String),
    /// No child has this element id.
    UnknownChild(String),
    /// The child exists but has no surface (not realized).
    NoSurface(String),
    /// The snapshot was already fetched or released, or belongs to another child.
    SnapshotNotFound {
        /// Element id.
        id: String,
        /// Requested token.
        token: SnapshotToken,
    },
    /// The surface's pixels cannot be delivered as 8-bit RGBA.
    PixelFormat {
        /// Element id.
        id: String,
        /// What was wrong.
        detail: String,
    },
    /// The surface could not be read.
    CaptureFailed(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedUri(uri) => write!(f, "malformed resource uri `{uri}`"),
            Self::UnknownChild(id) => write!(f, "no embedded child with id `{id}`"),
            Self::NoSurface(id) => write!(f, "embedded child `{id}` has no surface"),
            Self::SnapshotNotFound { id, token } => {
                write!(f, "could not find snapshot {token} for `{id}`")
            }
            Self::PixelFormat { id, detail } => {
                write!(f, "surface of `{id}` has the wrong pixel format: {detail}")
            }
            Self::CaptureFailed(id) => write!(f, "could not read the surface of `{id}`"),
        }
    }
}

impl core::error::Error for ResourceError {}
