//! Gateway process lifecycle: bootstrap, serve until signalled, shut down.

mod shutdown;

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use hangar_config::{ConfigError, SocketEndpoint};
use hangar_proxy::{Dispatcher, ProxyClient};

pub use self::shutdown::{
    GATEWAY_STOP_SIGNALS, ShutdownCause, ShutdownError, ShutdownSignal, SystemShutdownSignal,
};
use crate::bootstrap::{BootstrapError, ConfigLoader, Gateway, StaticConfigLoader, bootstrap_with};
use crate::gateway::GatewayHandler;
use crate::health::HealthReporter;
use crate::transport::{ListenerError, ListenerHandle, SocketListener};
use crate::{StructuredHealthReporter, SystemConfigLoader};

const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Errors surfaced while running the gateway process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Config {
        /// Underlying loader error.
        #[source]
        source: ConfigError,
    },
    /// Bootstrap failed after configuration loaded.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// The gateway socket could not be served.
    #[error("gateway listener failed: {0}")]
    Listener(#[from] ListenerError),
    /// Waiting for shutdown failed.
    #[error("failed to await shutdown signal: {0}")]
    Shutdown(#[from] ShutdownError),
}

impl LaunchError {
    /// Configuration error behind this failure, if any.
    #[must_use]
    pub fn config_error(&self) -> Option<&ConfigError> {
        match self {
            Self::Config { source }
            | Self::Bootstrap(BootstrapError::Configuration { source }) => Some(source),
            _ => None,
        }
    }
}

/// A gateway whose listener is accepting connections.
pub struct RunningGateway {
    endpoint: SocketEndpoint,
    listener: ListenerHandle,
    dispatcher: Arc<Dispatcher<ProxyClient>>,
    reporter: Arc<dyn HealthReporter>,
}

impl RunningGateway {
    /// Endpoint as bound, with any ephemeral port resolved.
    #[must_use]
    pub fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// Stops accepting connections and waits for the accept loop to exit.
    ///
    /// The cache is flushed to its snapshot once the last connection that
    /// still holds the dispatcher has finished.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::AcceptLoopPanicked`] if the accept loop panicked.
    pub fn stop(self) -> Result<(), ListenerError> {
        self.listener.shutdown();
        self.listener.join()?;
        self.reporter.listener_stopped(&self.endpoint);
        drop(self.dispatcher);
        Ok(())
    }
}

impl Gateway {
    /// Binds the configured socket and starts serving requests.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] when the socket cannot be bound.
    pub fn start(self) -> Result<RunningGateway, ListenerError> {
        let (config, dispatcher, reporter) = self.into_parts();
        let listener = SocketListener::bind(config.gateway_socket())?;
        let endpoint = listener.bound_endpoint();
        let handler = Arc::new(GatewayHandler::new(Arc::clone(&dispatcher)));
        let listener = listener.start(handler)?;
        reporter.listener_started(&endpoint);
        Ok(RunningGateway {
            endpoint,
            listener,
            dispatcher,
            reporter,
        })
    }
}

/// Runs the gateway until a termination signal arrives.
///
/// # Errors
///
/// Returns [`LaunchError`] when configuration, bootstrap or the listener
/// fails.
pub fn run() -> Result<ShutdownCause, LaunchError> {
    let reporter: Arc<dyn HealthReporter> = Arc::new(StructuredHealthReporter::new());
    run_with(&SystemConfigLoader, reporter, &SystemShutdownSignal::new())
}

/// Runs the gateway with injected collaborators and returns why it stopped.
///
/// # Errors
///
/// Returns [`LaunchError`] when configuration, bootstrap or the listener
/// fails.
pub fn run_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    shutdown: &dyn ShutdownSignal,
) -> Result<ShutdownCause, LaunchError> {
    let config = loader
        .load()
        .map_err(|source| LaunchError::Config { source })?;
    let gateway = bootstrap_with(&StaticConfigLoader::new(config), reporter)?;
    info!(
        target: PROCESS_TARGET,
        socket = %gateway.config().gateway_socket(),
        "starting gateway runtime"
    );
    let running = gateway.start()?;
    let cause = match shutdown.wait() {
        Ok(cause) => cause,
        Err(error) => {
            running.stop()?;
            return Err(error.into());
        }
    };
    info!(target: PROCESS_TARGET, ?cause, "stopping gateway");
    running.stop()?;
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(cause)
}
