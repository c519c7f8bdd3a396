//! Error types for the h2fetch crate.

use std::io;
use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a fetch session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad command line.
    #[error("{0}")]
    Usage(String),

    /// Port argument is not a valid TCP port.
    #[error("Invalid port number given: {0:?}")]
    InvalidPort(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Connection error (DNS, TCP connect, transport write).
    #[error("Connection error: {0}")]
    Connection(String),

    /// TLS/SSL error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Connect timeout (TCP + TLS handshake).
    #[error("Connect timeout after {0:?}")]
    ConnectTimeout(std::time::Duration),

    /// Peer closed the connection.
    #[error("Connection closed by peer")]
    ConnectionClosed,

    /// Malformed frame on the wire.
    #[error("Frame error: {0}")]
    Frame(String),

    /// The peer did something that leaves the connection unusable.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Header block could not be encoded or decoded.
    #[error("HPACK error: {0}")]
    Hpack(String),

    /// A message field failed validation.
    #[error("Bad attribute: {0}")]
    BadAttribute(String),

    /// The output sink for a stream could not be opened.
    #[error("Unable to create output file {}: {source}", path.display())]
    SinkCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A stream identifier was registered twice.
    #[error("Stream {0} is already registered")]
    DuplicateStream(u32),
}

impl Error {
    /// Create a frame error.
    pub fn frame(message: impl Into<String>) -> Self {
        Self::Frame(message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Create an HPACK error.
    pub fn hpack(message: impl Into<String>) -> Self {
        Self::Hpack(message.into())
    }

    /// Create a bad attribute error.
    pub fn bad_attribute(message: impl Into<String>) -> Self {
        Self::BadAttribute(message.into())
    }

    /// Whether this error, raised while decoding one inbound frame, only
    /// concerns the stream that frame belongs to.
    pub fn is_stream_scoped(&self) -> bool {
        matches!(self, Self::Frame(_) | Self::Hpack(_) | Self::BadAttribute(_))
    }
}
