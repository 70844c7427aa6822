// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Container configuration.

use understory_embed_protocol::ProtocolConfig;
use understory_embed_surface::PixelSize;

use crate::layout::SizingPolicy;

/// Settings fixed for the lifetime of one container.
///
/// ```
/// use understory_embed::{EmbedConfig, SizingPolicy};
/// use understory_embed_protocol::ProtocolConfig;
/// use understory_embed_surface::PixelSize;
///
/// let config = EmbedConfig::builder()
///     .sizing(SizingPolicy::NativeAuthoritative)
///     .protocol(ProtocolConfig::builder().namespace("shell").build())
///     .max_surface_size(PixelSize::new(4096, 4096))
///     .build();
/// assert_eq!(config.protocol().namespace(), "shell");
/// assert_eq!(config.max_surface_size(), PixelSize::new(4096, 4096));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbedConfig {
    protocol: ProtocolConfig,
    sizing: SizingPolicy,
    max_surface_size: PixelSize,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            protocol: ProtocolConfig::default(),
            sizing: SizingPolicy::default(),
            max_surface_size: Self::DEFAULT_MAX_SURFACE_SIZE,
        }
    }
}

impl EmbedConfig {
    /// Largest element box adopted from the document unless configured otherwise.
    pub const DEFAULT_MAX_SURFACE_SIZE: PixelSize = PixelSize::new(16384, 16384);

    /// Start from the defaults: `embed` namespace and scheme, document-authoritative
    /// sizing, and [`EmbedConfig::DEFAULT_MAX_SURFACE_SIZE`].
    #[must_use]
    pub fn builder() -> EmbedConfigBuilder {
        EmbedConfigBuilder {
            config: Self::default(),
        }
    }

    /// Message and scheme naming.
    #[must_use]
    pub fn protocol(&self) -> &ProtocolConfig {
        &self.protocol
    }

    /// Sizing authority.
    #[must_use]
    pub fn sizing(&self) -> SizingPolicy {
        self.sizing
    }

    /// Largest size a document report may give a child's surface.
    #[must_use]
    pub fn max_surface_size(&self) -> PixelSize {
        self.max_surface_size
    }
}

/// Builder for [`EmbedConfig`].
#[derive(Clone, Debug)]
pub struct EmbedConfigBuilder {
    config: EmbedConfig,
}

impl EmbedConfigBuilder {
    /// Set message and scheme naming.
    #[must_use]
    pub fn protocol(mut self, protocol: ProtocolConfig) -> Self {
        self.config.protocol = protocol;
        self
    }

    /// Set the sizing authority.
    #[must_use]
    pub fn sizing(mut self, sizing: SizingPolicy) -> Self {
        self.config.sizing = sizing;
        self
    }

    /// Set the largest size a document report may give a child's surface.
    ///
    /// Larger reports are ignored with a warning.
    #[must_use]
    pub fn max_surface_size(mut self, size: PixelSize) -> Self {
        self.config.max_surface_size = size;
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> EmbedConfig {
        self.config
    }
}
