//! Errors raised by the gateway socket and its request reader.

use std::io;
use std::net::SocketAddr;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors surfaced while binding or serving the gateway socket.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The configured gateway host did not resolve.
    #[error("cannot resolve gateway host {host}:{port}: {source}")]
    AddressLookup {
        /// Configured host name.
        host: String,
        /// Configured port.
        port: u16,
        /// Resolver failure.
        #[source]
        source: io::Error,
    },
    /// The gateway host resolved to nothing.
    #[error("gateway host {host}:{port} resolved to no addresses")]
    NoAddress {
        /// Configured host name.
        host: String,
        /// Configured port.
        port: u16,
    },
    /// The gateway TCP port could not be bound.
    #[error("cannot serve gateway requests on {addr}: {source}")]
    TcpBind {
        /// Resolved address.
        addr: SocketAddr,
        /// Bind failure.
        #[source]
        source: io::Error,
    },
    /// The socket refused to switch into polling accept mode.
    #[error("cannot poll the gateway socket for connections: {source}")]
    AcceptSetup {
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// The thread accepting gateway connections could not be spawned.
    #[error("cannot spawn the gateway accept thread: {source}")]
    AcceptThread {
        /// Spawn failure.
        #[source]
        source: io::Error,
    },
    /// Unix sockets were configured on a platform without them.
    #[cfg(not(unix))]
    #[error("gateway socket {endpoint} needs unix socket support")]
    UnixUnsupported {
        /// Rendered endpoint.
        endpoint: String,
    },
    /// The gateway Unix socket could not be bound.
    #[cfg(unix)]
    #[error("cannot serve gateway requests on {path}: {source}")]
    UnixBind {
        /// Socket path.
        path: Utf8PathBuf,
        /// Bind failure.
        #[source]
        source: io::Error,
    },
    /// Another gateway already answers on the socket path.
    #[cfg(unix)]
    #[error("a gateway is already serving requests on {path}")]
    GatewayRunning {
        /// Socket path.
        path: Utf8PathBuf,
    },
    /// The socket path is taken by something that is not a socket.
    #[cfg(unix)]
    #[error("gateway socket path {path} is occupied by a non-socket file")]
    NotASocket {
        /// Socket path.
        path: Utf8PathBuf,
    },
    /// The existing socket path could not be inspected.
    #[cfg(unix)]
    #[error("cannot inspect gateway socket path {path}: {source}")]
    SocketInspect {
        /// Socket path.
        path: Utf8PathBuf,
        /// Metadata failure.
        #[source]
        source: io::Error,
    },
    /// Checking the existing socket for a live gateway failed.
    #[cfg(unix)]
    #[error("cannot tell whether a gateway still serves {path}: {source}")]
    StaleCheck {
        /// Socket path.
        path: Utf8PathBuf,
        /// Connect failure other than refusal.
        #[source]
        source: io::Error,
    },
    /// A socket left by a stopped gateway could not be removed.
    #[cfg(unix)]
    #[error("cannot remove socket left by a stopped gateway at {path}: {source}")]
    StaleRemoval {
        /// Socket path.
        path: Utf8PathBuf,
        /// Removal failure.
        #[source]
        source: io::Error,
    },
    /// The accept loop panicked.
    #[error("gateway accept loop panicked")]
    AcceptLoopPanicked,
}

/// Errors raised while reading one JSONL request line.
#[derive(Debug, Error)]
pub(crate) enum RequestReadError {
    /// The line grew past the request size limit before its newline arrived.
    #[error("request line exceeds the {limit} byte limit")]
    TooLarge {
        /// Limit in bytes, newline excluded.
        limit: usize,
    },
    /// The connection failed mid-read.
    #[error("failed to read request line: {0}")]
    Io(#[from] io::Error),
}
