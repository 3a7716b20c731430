//! Signals that end the gateway's serve loop.

use std::io;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;

/// Signals that stop a running gateway.
pub const GATEWAY_STOP_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Why the gateway stopped serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCause {
    /// One of [`GATEWAY_STOP_SIGNALS`] arrived.
    Signal(i32),
    /// The embedding caller asked the gateway to stop.
    Requested,
}

/// Blocks the serve loop until the gateway should stop.
pub trait ShutdownSignal: Send + Sync {
    /// Waits for the stop request and reports its cause.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when no stop request can ever arrive.
    fn wait(&self) -> Result<ShutdownCause, ShutdownError>;
}

/// Errors that leave the gateway unable to wait for a stop request.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// The stop signals could not be registered.
    #[error("cannot register gateway stop signals: {source}")]
    Register {
        /// Registration failure.
        #[source]
        source: io::Error,
    },
    /// Signal delivery ended without a stop signal.
    #[error("gateway stop signal stream closed unexpectedly")]
    Closed,
}

/// Waits for one of [`GATEWAY_STOP_SIGNALS`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl SystemShutdownSignal {
    /// Builds a signal waiter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<ShutdownCause, ShutdownError> {
        let mut signals =
            Signals::new(GATEWAY_STOP_SIGNALS).map_err(|source| ShutdownError::Register { source })?;
        signals
            .forever()
            .next()
            .map(ShutdownCause::Signal)
            .ok_or(ShutdownError::Closed)
    }
}
