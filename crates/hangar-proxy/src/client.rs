//! Connection client for the backend listener pool.
//!
//! Every request opens a fresh TCP connection to the next port in the pool,
//! writes the request document, and reads until the backend closes the
//! connection or ends a read with a NUL byte. Nothing is retried here.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::string::FromUtf8Error;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::ports::{PortError, PortPool, PortSpec};

const CLIENT_TARGET: &str = "hangar_proxy::client";

/// Upper bound on establishing a backend connection.
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

const READ_CHUNK: usize = 512;
const SENTINEL: u8 = 0;

/// Errors surfaced while exchanging a request with the backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// [`ProxyClient::configure`] has not been called.
    #[error("proxy client is not configured")]
    NotConfigured,

    /// No connection could be opened to the selected listener.
    #[error("backend at {endpoint} is unreachable: {source}")]
    BackendUnreachable {
        /// `host:port` of the selected listener.
        endpoint: String,
        /// Connection failure.
        #[source]
        source: io::Error,
    },

    /// The request could not be written.
    #[error("failed to send request to {endpoint}: {source}")]
    Send {
        /// `host:port` of the selected listener.
        endpoint: String,
        /// Write failure.
        #[source]
        source: io::Error,
    },

    /// The response could not be read.
    #[error("failed to read response from {endpoint}: {source}")]
    Receive {
        /// `host:port` of the selected listener.
        endpoint: String,
        /// Read failure.
        #[source]
        source: io::Error,
    },

    /// The response bytes were not UTF-8.
    #[error("response from {endpoint} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        /// `host:port` of the selected listener.
        endpoint: String,
        /// Decoding failure.
        #[source]
        source: FromUtf8Error,
    },
}

/// Sends one encoded request and returns the raw response text.
pub trait BackendTransport: Send + Sync {
    /// Performs one request/response exchange.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the exchange fails at any step.
    fn send(&self, request: &str) -> Result<String, ClientError>;
}

impl<T: BackendTransport + ?Sized> BackendTransport for Arc<T> {
    fn send(&self, request: &str) -> Result<String, ClientError> {
        (**self).send(request)
    }
}

#[derive(Debug)]
struct ClientSettings {
    hostname: String,
    listeners: usize,
    pool: PortPool,
}

/// Client multiplexing requests over the backend's listener ports.
///
/// The client starts unconfigured. [`ProxyClient::configure`] may be called
/// again at any time; it replaces the pool and restarts the rotation. Calls
/// already in flight finish against the settings they started with.
#[derive(Debug, Default)]
pub struct ProxyClient {
    settings: RwLock<Option<Arc<ClientSettings>>>,
}

impl ProxyClient {
    /// Creates an unconfigured client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client and configures it in one step.
    ///
    /// # Errors
    ///
    /// Returns [`PortError`] when the port hint does not resolve.
    pub fn connect_to(
        hostname: impl Into<String>,
        spec: &PortSpec,
        listeners: usize,
    ) -> Result<Self, PortError> {
        let client = Self::new();
        client.configure(hostname, spec, listeners)?;
        Ok(client)
    }

    /// Points the client at `hostname` with the pool resolved from `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`PortError`] when the port hint does not resolve; the
    /// previous configuration stays in place.
    pub fn configure(
        &self,
        hostname: impl Into<String>,
        spec: &PortSpec,
        listeners: usize,
    ) -> Result<(), PortError> {
        let pool = PortPool::resolve(spec, listeners)?;
        let settings = ClientSettings {
            hostname: hostname.into(),
            listeners,
            pool,
        };
        debug!(
            target: CLIENT_TARGET,
            hostname = %settings.hostname,
            ports = ?settings.pool.ports(),
            "proxy client configured"
        );
        *self
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(settings));
        Ok(())
    }

    /// Whether [`ProxyClient::configure`] has succeeded.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.current().is_some()
    }

    /// Configured backend host name.
    #[must_use]
    pub fn hostname(&self) -> Option<String> {
        self.current().map(|settings| settings.hostname.clone())
    }

    /// Configured listener count.
    #[must_use]
    pub fn listeners(&self) -> Option<usize> {
        self.current().map(|settings| settings.listeners)
    }

    /// Resolved ports in rotation order.
    #[must_use]
    pub fn ports(&self) -> Option<Vec<u16>> {
        self.current().map(|settings| settings.pool.ports().to_vec())
    }

    fn current(&self) -> Option<Arc<ClientSettings>> {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl BackendTransport for ProxyClient {
    fn send(&self, request: &str) -> Result<String, ClientError> {
        let settings = self.current().ok_or(ClientError::NotConfigured)?;
        let port = settings.pool.next_port();
        let endpoint = format!("{}:{port}", settings.hostname);
        debug!(
            target: CLIENT_TARGET,
            endpoint = %endpoint,
            bytes = request.len(),
            "sending backend request"
        );

        let mut stream = open(&settings.hostname, port).map_err(|source| {
            ClientError::BackendUnreachable {
                endpoint: endpoint.clone(),
                source,
            }
        })?;

        if let Err(source) = stream
            .write_all(request.as_bytes())
            .and_then(|()| stream.flush())
        {
            return Err(ClientError::Send { endpoint, source });
        }

        let reply = match read_reply(&mut stream) {
            Ok(reply) => reply,
            Err(source) => return Err(ClientError::Receive { endpoint, source }),
        };
        debug!(
            target: CLIENT_TARGET,
            endpoint = %endpoint,
            bytes = reply.len(),
            "received backend response"
        );

        String::from_utf8(reply).map_err(|source| ClientError::InvalidUtf8 { endpoint, source })
    }
}

fn open(hostname: &str, port: u16) -> io::Result<TcpStream> {
    let addresses: Vec<SocketAddr> = (hostname, port).to_socket_addrs()?.collect();
    let mut last_error = None;
    for address in addresses {
        match TcpStream::connect_timeout(&address, CONNECTION_TIMEOUT) {
            Ok(stream) => return Ok(stream),
            Err(error) => last_error = Some(error),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses")
    }))
}

/// Reads until EOF or a read ending in the NUL sentinel, then strips it.
fn read_reply(stream: &mut impl Read) -> io::Result<Vec<u8>> {
    let mut reply = Vec::new();
    let mut chunk = [0_u8; READ_CHUNK];
    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => {
                let received = chunk.get(..read).unwrap_or_default();
                reply.extend_from_slice(received);
                if received.last() == Some(&SENTINEL) {
                    break;
                }
            }
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error),
        }
    }
    if reply.last() == Some(&SENTINEL) {
        reply.pop();
    }
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::*;

    /// Yields its chunks one read at a time, like a socket.
    struct Chunked {
        chunks: Vec<Vec<u8>>,
    }

    impl Read for Chunked {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.chunks.is_empty() {
                return Ok(0);
            }
            let chunk = self.chunks.remove(0);
            buf[..chunk.len()].copy_from_slice(&chunk);
            Ok(chunk.len())
        }
    }

    #[rstest]
    #[case(b"{\"error\": \"\"}".to_vec(), "{\"error\": \"\"}")]
    #[case(b"{\"error\": \"\"}\0".to_vec(), "{\"error\": \"\"}")]
    #[case(Vec::new(), "")]
    fn reads_until_eof_and_strips_sentinel(#[case] bytes: Vec<u8>, #[case] expected: &str) {
        let reply = read_reply(&mut Cursor::new(bytes)).expect("reply reads");
        assert_eq!(reply, expected.as_bytes());
    }

    #[test]
    fn stops_at_sentinel_without_waiting_for_eof() {
        let mut stream = Chunked {
            chunks: vec![b"{\"a\":".to_vec(), b"1}\0".to_vec(), b"ignored".to_vec()],
        };
        let reply = read_reply(&mut stream).expect("reply reads");
        assert_eq!(reply, b"{\"a\":1}");
    }

    #[test]
    fn large_replies_span_many_reads() {
        let body = "x".repeat(READ_CHUNK * 3 + 17);
        let reply = read_reply(&mut Cursor::new(body.clone().into_bytes())).expect("reply reads");
        assert_eq!(reply.len(), body.len());
    }

    #[test]
    fn unconfigured_client_refuses_to_send() {
        let client = ProxyClient::new();
        assert!(!client.is_configured());
        assert!(matches!(
            client.send("{}"),
            Err(ClientError::NotConfigured)
        ));
    }

    #[test]
    fn exposes_configuration() {
        let client = ProxyClient::connect_to("backend", &PortSpec::single("9100"), 2)
            .expect("valid configuration");

        assert_eq!(client.hostname().as_deref(), Some("backend"));
        assert_eq!(client.listeners(), Some(2));
        assert_eq!(client.ports(), Some(vec![9100, 9101]));
    }

    #[test]
    fn failed_reconfiguration_keeps_previous_settings() {
        let client = ProxyClient::connect_to("backend", &PortSpec::single(9100_u16), 1)
            .expect("valid configuration");

        let result = client.configure("other", &PortSpec::single("nope"), 1);

        assert!(result.is_err());
        assert_eq!(client.hostname().as_deref(), Some("backend"));
    }
}
