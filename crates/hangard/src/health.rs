//! Structured health reporting for gateway lifecycle events.

use std::sync::Arc;

use camino::Utf8Path;
use hangar_config::{Config, SocketEndpoint};

use crate::bootstrap::BootstrapError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer for lifecycle events, so tests can watch bootstrap and shutdown.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked after the cache snapshot has been read.
    fn snapshot_loaded(&self, path: &Utf8Path, kinds: usize);

    /// Invoked once the gateway socket accepts connections.
    fn listener_started(&self, endpoint: &SocketEndpoint);

    /// Invoked after the accept loop has exited.
    fn listener_stopped(&self, endpoint: &SocketEndpoint);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn snapshot_loaded(&self, path: &Utf8Path, kinds: usize) {
        (**self).snapshot_loaded(path, kinds);
    }

    fn listener_started(&self, endpoint: &SocketEndpoint) {
        (**self).listener_started(endpoint);
    }

    fn listener_stopped(&self, endpoint: &SocketEndpoint) {
        (**self).listener_stopped(endpoint);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting gateway bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            socket = %config.gateway_socket(),
            proxy_host = %config.proxy_hostname(),
            listeners = config.num_listeners(),
            cache_path = %config.cache_path(),
            log_format = %config.log_format(),
            "gateway bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "gateway bootstrap failed"
        );
    }

    fn snapshot_loaded(&self, path: &Utf8Path, kinds: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "snapshot_loaded",
            path = %path,
            kinds,
            "cache snapshot loaded"
        );
    }

    fn listener_started(&self, endpoint: &SocketEndpoint) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "listener_started",
            endpoint = %endpoint,
            "gateway accepting connections"
        );
    }

    fn listener_stopped(&self, endpoint: &SocketEndpoint) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "listener_stopped",
            endpoint = %endpoint,
            "gateway listener stopped"
        );
    }
}
