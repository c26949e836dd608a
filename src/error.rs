//! Error types for ztalk

use std::net::Ipv4Addr;
use std::path::PathBuf;
use thiserror::Error;

/// Network-related errors
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Binding a UDP socket failed
    #[error("Failed to bind UDP socket on {address}: {source}")]
    BindFailed {
        /// The local address the bind was attempted on
        address: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Joining the multicast group failed on every attempted path
    #[error("Failed to join multicast group {group}: {source}")]
    JoinFailed {
        /// The multicast group address
        group: Ipv4Addr,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The receive loop hit a fatal I/O error
    #[error("Receive loop aborted: {source}")]
    ReceiveFailed {
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Sending one datagram failed
    ///
    /// Logged per attempt; a fan-out continues past failed peers.
    #[error("Send to {target} failed: {source}")]
    SendFailed {
        /// Destination of the failed send
        target: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A component was driven outside its lifecycle
    ///
    /// Sessions are single-use: a receiver that has reached `Closed`
    /// cannot be run again.
    #[error("{component} must be in the {expected} state")]
    InvalidState {
        /// Component name, e.g. "MulticastReceiver"
        component: &'static str,
        /// The state the operation requires
        expected: &'static str,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configured group address is outside the multicast range
    #[error("`{address}` is not a multicast group address")]
    NotMulticast {
        /// The rejected address
        address: Ipv4Addr,
    },

    /// The overlay interface marker is empty
    ///
    /// An empty marker would match every interface name.
    #[error("Overlay interface marker must not be empty")]
    EmptyMarker,

    /// The multicast TTL does not fit the IPv4 hop-count range
    #[error("Multicast TTL {ttl} exceeds 255")]
    TtlOutOfRange {
        /// The rejected TTL value
        ttl: u32,
    },

    /// A fixed port was configured as 0
    #[error("{field} must be a fixed non-zero port")]
    ZeroPort {
        /// Which port field was rejected
        field: &'static str,
    },

    /// Unicast mode requires at least one peer
    #[error("Unicast peer list is empty")]
    NoPeers,

    /// Reading the configuration file failed
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`ChatConfig`](crate::ChatConfig)
    #[error("Invalid config file {path}: {source}")]
    ParseFailed {
        /// Path that was parsed
        path: PathBuf,
        /// Underlying serde error
        #[source]
        source: serde_json::Error,
    },

    /// Serializing the configuration failed
    #[error("Failed to serialize config: {source}")]
    SerializeFailed {
        /// Underlying serde error
        #[source]
        source: serde_json::Error,
    },

    /// Writing the configuration file failed
    #[error("Failed to write config file {path}: {source}")]
    WriteFailed {
        /// Path that was written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Main error type for ztalk operations
#[derive(Error, Debug)]
pub enum Error {
    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors outside the socket paths (console, signals)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_context() {
        let err = NetworkError::BindFailed {
            address: "0.0.0.0:4446".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        assert!(err.to_string().contains("0.0.0.0:4446"));
    }

    #[test]
    fn test_error_conversion_from_network() {
        let err: Error = NetworkError::ReceiveFailed {
            source: std::io::Error::from(std::io::ErrorKind::BrokenPipe),
        }
        .into();
        assert!(matches!(err, Error::Network(_)));
    }

    #[test]
    fn test_error_conversion_from_config() {
        let err: Error = ConfigError::EmptyMarker.into();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("marker"));
    }
}
