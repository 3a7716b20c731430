//! Connection streams and bounded request reading.

use std::io::{self, Read, Write};
use std::net::TcpStream;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

use super::{MAX_REQUEST_BYTES, RequestReadError};

/// Stream accepted by the gateway listener.
pub(crate) enum ConnectionStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Read for ConnectionStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for ConnectionStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

/// Handles accepted socket connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Handles a single connection. Implementations should avoid panicking.
    fn handle(&self, stream: ConnectionStream);
}

/// Reads one newline-terminated request of at most [`MAX_REQUEST_BYTES`],
/// measured without the newline.
///
/// Returns `Ok(None)` when the peer hangs up before sending anything. A
/// final line without a newline is returned as-is at end of stream.
pub(crate) fn read_request_line<R: Read>(
    stream: &mut R,
) -> Result<Option<Vec<u8>>, RequestReadError> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 1024];
    loop {
        let bytes_read = read_chunk_with_retry(stream, &mut chunk)?;
        if bytes_read == 0 {
            return Ok((!buffer.is_empty()).then_some(buffer));
        }

        let received = chunk.get(..bytes_read).unwrap_or_default();
        if let Some(pos) = received.iter().position(|byte| *byte == b'\n') {
            buffer.extend(received.iter().take(pos));
            enforce_request_limit(buffer.len())?;
            return Ok(Some(buffer));
        }

        buffer.extend_from_slice(received);
        enforce_request_limit(buffer.len())?;
    }
}

fn read_chunk_with_retry<R: Read>(stream: &mut R, chunk: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(chunk) {
            Ok(read) => return Ok(read),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error),
        }
    }
}

fn enforce_request_limit(size: usize) -> Result<(), RequestReadError> {
    if size > MAX_REQUEST_BYTES {
        return Err(RequestReadError::TooLarge {
            limit: MAX_REQUEST_BYTES,
        });
    }
    Ok(())
}
