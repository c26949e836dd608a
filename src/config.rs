//! Configuration for chat nodes
//!
//! All network parameters live in [`ChatConfig`]: the multicast group and
//! port, the unicast port and peer list, the overlay interface marker, and
//! the outbound multicast TTL. Instances come from [`ChatConfig::default`],
//! from builder-style `with_*` methods, or from a JSON file on disk.
//! Configuration is validated before any socket is opened.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;

/// Default multicast group address.
///
/// Administratively scoped (RFC 2365). The reference deployment used
/// `224.0.0.1`/`224.0.0.0`, both in the reserved link-local block;
/// `239.255.0.0/16` is the range intended for ad-hoc local use.
pub const DEFAULT_GROUP: Ipv4Addr = Ipv4Addr::new(239, 255, 42, 98);

/// Default port for multicast chat
pub const DEFAULT_MULTICAST_PORT: u16 = 4446;

/// Default port for unicast chat
pub const DEFAULT_UNICAST_PORT: u16 = 5000;

/// Default substring that identifies an overlay network adapter
///
/// ZeroTier names its virtual interfaces `ztxxxxxxxx` on Linux/macOS and
/// exposes "ZeroTier" in the adapter description on Windows.
pub const DEFAULT_OVERLAY_MARKER: &str = "zt";

/// Default outbound multicast TTL
///
/// Maximum scope, so datagrams survive the virtual hops of an overlay
/// network instead of dying at the first router.
pub const DEFAULT_MULTICAST_TTL: u32 = 255;

fn default_group() -> Ipv4Addr {
    DEFAULT_GROUP
}

fn default_multicast_port() -> u16 {
    DEFAULT_MULTICAST_PORT
}

fn default_unicast_port() -> u16 {
    DEFAULT_UNICAST_PORT
}

fn default_overlay_marker() -> String {
    DEFAULT_OVERLAY_MARKER.to_string()
}

fn default_multicast_ttl() -> u32 {
    DEFAULT_MULTICAST_TTL
}

/// Complete chat node configuration
///
/// Stored as human-readable JSON when persisted. Every field has a default,
/// so a config file only needs the fields it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Multicast group address shared by all participants
    #[serde(default = "default_group")]
    pub group: Ipv4Addr,

    /// Fixed port for multicast chat
    #[serde(default = "default_multicast_port")]
    pub multicast_port: u16,

    /// Fixed port for unicast chat
    #[serde(default = "default_unicast_port")]
    pub unicast_port: u16,

    /// Peer addresses for unicast fan-out
    ///
    /// Each outgoing line is sent once to every listed address on
    /// `unicast_port`. Ignored in multicast mode.
    #[serde(default)]
    pub peers: Vec<IpAddr>,

    /// Case-insensitive substring matched against interface names to find
    /// the overlay adapter
    #[serde(default = "default_overlay_marker")]
    pub overlay_marker: String,

    /// Outbound multicast TTL (hop limit)
    #[serde(default = "default_multicast_ttl")]
    pub multicast_ttl: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            group: DEFAULT_GROUP,
            multicast_port: DEFAULT_MULTICAST_PORT,
            unicast_port: DEFAULT_UNICAST_PORT,
            peers: Vec::new(),
            overlay_marker: DEFAULT_OVERLAY_MARKER.to_string(),
            multicast_ttl: DEFAULT_MULTICAST_TTL,
        }
    }
}

impl ChatConfig {
    /// Set the multicast group address
    pub fn with_group(mut self, group: Ipv4Addr) -> Self {
        self.group = group;
        self
    }

    /// Set the multicast port
    pub fn with_multicast_port(mut self, port: u16) -> Self {
        self.multicast_port = port;
        self
    }

    /// Set the unicast port
    pub fn with_unicast_port(mut self, port: u16) -> Self {
        self.unicast_port = port;
        self
    }

    /// Replace the unicast peer list
    pub fn with_peers(mut self, peers: Vec<IpAddr>) -> Self {
        self.peers = peers;
        self
    }

    /// Add one unicast peer
    pub fn add_peer(mut self, peer: IpAddr) -> Self {
        self.peers.push(peer);
        self
    }

    /// Set the overlay interface marker
    pub fn with_overlay_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.overlay_marker = marker.into();
        self
    }

    /// Set the outbound multicast TTL
    pub fn with_multicast_ttl(mut self, ttl: u32) -> Self {
        self.multicast_ttl = ttl;
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any check fails:
    /// - `group` must be a multicast address
    /// - `multicast_port` and `unicast_port` must be non-zero
    /// - `overlay_marker` must not be empty
    /// - `multicast_ttl` must fit in the IPv4 hop-count range
    pub fn validate(&self) -> Result<()> {
        if !self.group.is_multicast() {
            return Err(ConfigError::NotMulticast {
                address: self.group,
            }
            .into());
        }

        if self.multicast_port == 0 {
            return Err(ConfigError::ZeroPort {
                field: "multicast_port",
            }
            .into());
        }

        if self.unicast_port == 0 {
            return Err(ConfigError::ZeroPort {
                field: "unicast_port",
            }
            .into());
        }

        if self.overlay_marker.is_empty() {
            return Err(ConfigError::EmptyMarker.into());
        }

        if self.multicast_ttl > 255 {
            return Err(ConfigError::TtlOutOfRange {
                ttl: self.multicast_ttl,
            }
            .into());
        }

        Ok(())
    }

    /// Validate unicast-specific requirements on top of [`validate`](Self::validate)
    ///
    /// Unicast sending additionally needs at least one configured peer.
    pub fn validate_unicast_sender(&self) -> Result<()> {
        self.validate()?;
        if self.peers.is_empty() {
            return Err(ConfigError::NoPeers.into());
        }
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self =
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(config)
    }

    /// Save configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeFailed { source: e })?;
        std::fs::write(path, contents).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }
}
