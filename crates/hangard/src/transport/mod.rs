//! Socket listener for the gateway endpoint.
//!
//! The listener binds the configured TCP or Unix socket and hands each
//! accepted connection to a [`ConnectionHandler`] on its own thread.

mod errors;
mod handler;
mod listener;
#[cfg(test)]
mod test_utils;

pub use self::errors::ListenerError;
pub(crate) use self::errors::RequestReadError;
pub(crate) use self::handler::{ConnectionHandler, ConnectionStream, read_request_line};
pub(crate) use self::listener::{ListenerHandle, SocketListener};
#[cfg(test)]
pub(crate) use self::test_utils::CountingHandler;

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

/// Upper bound on a single request line, not counting its terminating newline.
pub(crate) const MAX_REQUEST_BYTES: usize = 1024 * 1024;
