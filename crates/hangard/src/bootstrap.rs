//! Gateway bootstrap orchestration.

use std::sync::Arc;

use thiserror::Error;

use hangar_config::{Config, ConfigError, PortHints, SocketPreparationError};
use hangar_proxy::{
    CacheError, Dispatcher, EntityCache, EntityRegistry, PortError, PortSpec, ProxyClient,
};

use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the gateway configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration is rejected.
    fn load(&self) -> Result<Config, ConfigError>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::load()
    }
}

/// Loader that hands out a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already built configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The backend port hint did not resolve into a pool.
    #[error("failed to resolve backend ports: {source}")]
    Ports {
        /// Underlying port error.
        #[source]
        source: PortError,
    },
    /// The cache could not be created or its snapshot was unreadable.
    #[error("failed to prepare entity cache: {source}")]
    Cache {
        /// Underlying cache error.
        #[source]
        source: CacheError,
    },
    /// Socket preparation failed.
    #[error("failed to prepare gateway socket: {source}")]
    Socket {
        /// Filesystem error reported while preparing the socket directory.
        #[source]
        source: SocketPreparationError,
    },
}

/// Result of a successful bootstrap: configuration plus the wired dispatcher.
pub struct Gateway {
    config: Config,
    dispatcher: Arc<Dispatcher<ProxyClient>>,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .field("telemetry", &self.telemetry)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Dispatcher shared by every gateway connection.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher<ProxyClient>> {
        &self.dispatcher
    }

    pub(crate) fn into_parts(
        self,
    ) -> (Config, Arc<Dispatcher<ProxyClient>>, Arc<dyn HealthReporter>) {
        (self.config, self.dispatcher, self.reporter)
    }
}

/// Converts configured port hints into the selector's input.
#[must_use]
pub fn port_spec(config: &Config) -> PortSpec {
    match config.port_hints() {
        PortHints::Seed(port) => PortSpec::single(port),
        PortHints::Explicit(ports) => PortSpec::many(ports.iter().map(String::as_str)),
    }
}

/// Bootstraps the gateway using the supplied collaborators.
///
/// Loads configuration, installs telemetry, resolves the backend pool,
/// opens the entity cache and reads its snapshot, then prepares the gateway
/// socket directory. Every failure is reported before it is returned.
///
/// # Errors
///
/// Returns the [`BootstrapError`] of the first step that failed.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Gateway, BootstrapError> {
    reporter.bootstrap_starting();
    match assemble(loader, &reporter) {
        Ok((config, dispatcher, telemetry)) => {
            reporter.bootstrap_succeeded(&config);
            Ok(Gateway {
                config,
                dispatcher,
                telemetry,
                reporter,
            })
        }
        Err(error) => {
            reporter.bootstrap_failed(&error);
            Err(error)
        }
    }
}

fn assemble(
    loader: &dyn ConfigLoader,
    reporter: &Arc<dyn HealthReporter>,
) -> Result<(Config, Arc<Dispatcher<ProxyClient>>, TelemetryHandle), BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;

    let client = ProxyClient::connect_to(
        config.proxy_hostname(),
        &port_spec(&config),
        config.num_listeners(),
    )
    .map_err(|source| BootstrapError::Ports { source })?;

    let cache = EntityCache::with_snapshot(config.cache_path().clone())
        .map_err(|source| BootstrapError::Cache { source })?;
    let kinds = cache
        .load_snapshot()
        .map_err(|source| BootstrapError::Cache { source })?;
    reporter.snapshot_loaded(config.cache_path(), kinds);

    config
        .gateway_socket()
        .prepare_filesystem()
        .map_err(|source| BootstrapError::Socket { source })?;

    let dispatcher = Dispatcher::new(
        Arc::new(EntityRegistry::standard()),
        Arc::new(cache),
        client,
    );
    Ok((config, Arc::new(dispatcher), telemetry))
}
