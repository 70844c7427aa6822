// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Naming of the script namespace, message handlers, and resource scheme.

use alloc::format;
use alloc::string::{String, ToString};

use crate::error::ProtocolError;
use crate::kind::{KindSet, MessageKind};

/// Names under which one container talks to its document.
///
/// - Outbound calls are rendered as `<namespace>.<call> (...)`.
/// - Inbound handlers are registered as `<namespace>_<message>`, with
///   child-scoped channels suffixed by `:<id>`.
/// - Bitmaps are fetched from `<scheme>://<id>?<token>`.
///
/// ```
/// use understory_embed_protocol::{MessageKind, ProtocolConfig};
///
/// let config = ProtocolConfig::builder().namespace("shell").build();
/// assert_eq!(config.handler_name(MessageKind::ScriptLoaded), "shell_script_loaded");
/// assert_eq!(
///     config.parse_name("shell_pointer:box").unwrap(),
///     (MessageKind::Pointer, Some("box")),
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtocolConfig {
    namespace: String,
    scheme: String,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            namespace: Self::DEFAULT_NAMESPACE.to_string(),
            scheme: Self::DEFAULT_SCHEME.to_string(),
        }
    }
}

impl ProtocolConfig {
    /// Namespace used when none is configured.
    pub const DEFAULT_NAMESPACE: &'static str = "embed";

    /// Resource scheme used when none is configured.
    pub const DEFAULT_SCHEME: &'static str = "embed";

    /// Start building a configuration from the defaults.
    #[must_use]
    pub fn builder() -> ProtocolConfigBuilder {
        ProtocolConfigBuilder {
            config: Self::default(),
        }
    }

    /// The script object outbound calls are made on.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The resource scheme bitmaps are fetched through.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Prefix shared by every inbound handler name.
    #[must_use]
    pub fn message_prefix(&self) -> String {
        format!("{}_", self.namespace)
    }

    /// Full handler name for a container-scoped inbound kind.
    #[must_use]
    pub fn handler_name(&self, kind: MessageKind) -> String {
        format!("{}_{}", self.namespace, kind.name())
    }

    /// Full handler name for a child-scoped inbound kind.
    #[must_use]
    pub fn child_handler_name(&self, kind: MessageKind, id: &str) -> String {
        format!("{}_{}:{id}", self.namespace, kind.name())
    }

    /// Names of the container-scoped handlers a host must register.
    pub fn handler_names(&self) -> impl Iterator<Item = String> + '_ {
        KindSet::INBOUND
            .iter()
            .filter(|kind| !kind.is_child_scoped())
            .map(|kind| self.handler_name(kind))
    }

    /// Split a full inbound handler name into its kind and, for child-scoped
    /// channels, the child id.
    pub fn parse_name<'a>(
        &self,
        name: &'a str,
    ) -> Result<(MessageKind, Option<&'a str>), ProtocolError> {
        let unknown = || ProtocolError::UnknownMessage(name.to_string());
        let rest = name
            .strip_prefix(self.namespace.as_str())
            .and_then(|rest| rest.strip_prefix('_'))
            .ok_or_else(unknown)?;
        let (base, id) = match rest.split_once(':') {
            Some((base, id)) => (base, Some(id)),
            None => (rest, None),
        };
        let kind = MessageKind::from_name(base)
            .filter(|kind| KindSet::INBOUND.contains(*kind))
            .ok_or_else(unknown)?;
        match (kind.is_child_scoped(), id) {
            (true, Some(id)) if !id.is_empty() => Ok((kind, Some(id))),
            (false, None) => Ok((kind, None)),
            _ => Err(unknown()),
        }
    }
}

/// Builder for [`ProtocolConfig`].
#[derive(Clone, Debug)]
pub struct ProtocolConfigBuilder {
    config: ProtocolConfig,
}

impl ProtocolConfigBuilder {
    /// Set the script namespace (and with it the handler prefix).
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    /// Set the resource scheme name.
    #[must_use]
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.config.scheme = scheme.into();
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> ProtocolConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn defaults() {
        let config = ProtocolConfig::default();
        assert_eq!(config.namespace(), "embed");
        assert_eq!(config.scheme(), "embed");
        assert_eq!(config.message_prefix(), "embed_");
    }

    #[test]
    fn handler_names_skip_child_scoped_and_outbound_kinds() {
        let names: Vec<_> = ProtocolConfig::default().handler_names().collect();
        assert!(names.contains(&"embed_children_move_resize".to_string()));
        assert!(!names.iter().any(|n| n.starts_with("embed_pointer")));
        assert!(!names.contains(&"embed_child_draw".to_string()));
        assert_eq!(names.len(), 7);
    }

    #[test]
    fn parse_rejects_foreign_and_outbound_names() {
        let config = ProtocolConfig::default();
        assert_eq!(
            config.parse_name("embed_position").unwrap(),
            (MessageKind::Position, None)
        );
        for bad in [
            "other_position",
            "embedposition",
            "embed_child_draw",
            "embed_position:box",
            "embed_pointer",
            "embed_pointer:",
        ] {
            assert!(
                matches!(config.parse_name(bad), Err(ProtocolError::UnknownMessage(_))),
                "{bad}"
            );
        }
    }
}
