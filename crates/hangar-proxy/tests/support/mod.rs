//! Fake backend listeners for client integration tests.
//!
//! Each listener accepts connections until shut down, records the request
//! document it received, and answers with one canned reply.

use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

const POLL_INTERVAL: Duration = Duration::from_millis(5);
const IO_TIMEOUT: Duration = Duration::from_secs(2);

/// How the fake backend ends a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Write the reply and close the connection.
    CloseAfterReply,
    /// Write the reply plus a NUL byte and wait for the client to hang up.
    NulTerminated,
    /// Wait for the request and drop the connection without reading it,
    /// which resets it while the client waits for a reply.
    ResetBeforeReply,
}

/// One request observed by the fake backend.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// Listener port that took the connection.
    pub port: u16,
    /// Request document as received.
    pub request: Value,
}

/// A set of fake listeners on ephemeral loopback ports.
pub struct FakeBackend {
    ports: Vec<u16>,
    exchanges: Arc<Mutex<Vec<Exchange>>>,
    shutdown: Arc<AtomicBool>,
    handles: Vec<thread::JoinHandle<Result<()>>>,
}

impl FakeBackend {
    /// Binds `listeners` loopback listeners that all answer with `reply`.
    pub fn spawn(listeners: usize, reply: impl AsRef<[u8]>, framing: Framing) -> Result<Self> {
        let reply = reply.as_ref();
        let exchanges = Arc::new(Mutex::new(Vec::new()));
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut ports = Vec::with_capacity(listeners);
        let mut handles = Vec::with_capacity(listeners);

        for _ in 0..listeners {
            let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind fake backend")?;
            listener
                .set_nonblocking(true)
                .context("fake backend nonblocking")?;
            let port = listener.local_addr().context("local addr")?.port();
            ports.push(port);

            let reply = reply.to_vec();
            let exchanges = Arc::clone(&exchanges);
            let shutdown = Arc::clone(&shutdown);
            handles.push(thread::spawn(move || {
                serve(&listener, port, &reply, framing, &exchanges, &shutdown)
            }));
        }

        Ok(Self {
            ports,
            exchanges,
            shutdown,
            handles,
        })
    }

    /// Bound ports, in spawn order.
    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    /// Requests observed so far, in arrival order.
    pub fn exchanges(&self) -> Result<Vec<Exchange>> {
        Ok(self
            .exchanges
            .lock()
            .map_err(|error| anyhow!("lock exchanges: {error}"))?
            .clone())
    }

    /// Stops every listener and reports the first failure any of them hit.
    pub fn finish(mut self) -> Result<Vec<Exchange>> {
        self.stop()?;
        self.exchanges()
    }

    fn stop(&mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);
        for handle in self.handles.drain(..) {
            handle
                .join()
                .map_err(|_| anyhow!("fake backend thread panicked"))??;
        }
        Ok(())
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn serve(
    listener: &TcpListener,
    port: u16,
    reply: &[u8],
    framing: Framing,
    exchanges: &Mutex<Vec<Exchange>>,
    shutdown: &AtomicBool,
) -> Result<()> {
    loop {
        match listener.accept() {
            Ok((stream, _)) => {
                answer(stream, port, reply, framing, exchanges)?;
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                if shutdown.load(Ordering::SeqCst) {
                    return Ok(());
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(error) => return Err(error).context("accept backend connection"),
        }
    }
}

fn answer(
    mut stream: TcpStream,
    port: u16,
    reply: &[u8],
    framing: Framing,
    exchanges: &Mutex<Vec<Exchange>>,
) -> Result<()> {
    stream.set_nonblocking(false).context("blocking stream")?;
    stream
        .set_read_timeout(Some(IO_TIMEOUT))
        .context("read timeout")?;

    if framing == Framing::ResetBeforeReply {
        // Closing with unread request bytes makes the kernel send a reset.
        stream.peek(&mut [0_u8; 1]).context("await request")?;
        thread::sleep(POLL_INTERVAL);
        return Ok(());
    }

    let request = read_document(&mut stream)?;
    exchanges
        .lock()
        .map_err(|error| anyhow!("lock exchanges: {error}"))?
        .push(Exchange { port, request });

    stream.write_all(reply).context("write reply")?;
    if framing == Framing::NulTerminated {
        stream.write_all(&[0]).context("write sentinel")?;
        stream.flush().context("flush reply")?;
        // Hold the connection until the client hangs up.
        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).context("await client close")?;
    }
    Ok(())
}

/// Reads until the bytes received so far form one JSON document.
fn read_document(stream: &mut TcpStream) -> Result<Value> {
    let mut received = Vec::new();
    let mut chunk = [0_u8; 256];
    loop {
        let read = stream.read(&mut chunk).context("read request")?;
        if read == 0 {
            return Err(anyhow!("client closed before sending a full request"));
        }
        received.extend_from_slice(&chunk[..read]);
        if let Ok(document) = serde_json::from_slice(&received) {
            return Ok(document);
        }
    }
}

/// A loopback port with nothing listening on it.
pub fn closed_port() -> Result<u16> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind scratch listener")?;
    let port = listener.local_addr().context("scratch listener addr")?.port();
    drop(listener);
    Ok(port)
}
