//! Test doubles shared by the gateway suites.

use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::json;
use tempfile::TempDir;

use hangar_config::{Config, ConfigError, SocketEndpoint};
use hangar_proxy::{BackendTransport, ClientError, Dispatcher, EntityCache, EntityRegistry};

use crate::bootstrap::{BootstrapError, ConfigLoader};
use crate::health::HealthReporter;
use crate::process::{ShutdownCause, ShutdownError, ShutdownSignal};

/// Backend double that answers every request with the same document.
#[derive(Debug)]
pub(crate) struct CannedTransport {
    reply: String,
    calls: AtomicUsize,
}

impl CannedTransport {
    pub(crate) fn replying(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.into(),
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BackendTransport for CannedTransport {
    fn send(&self, _request: &str) -> Result<String, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

/// Two customers, IDs 1 and 4.
pub(crate) fn customer_reply() -> String {
    json!({"error": "", "entities": [
        {"customerId": 1, "name": "Skyways", "description": "regional"},
        {"customerId": 4, "name": "Polar", "description": "cargo"}
    ]})
    .to_string()
}

pub(crate) fn dispatcher_over<T: BackendTransport>(transport: T) -> Arc<Dispatcher<T>> {
    Arc::new(Dispatcher::new(
        Arc::new(EntityRegistry::standard()),
        Arc::new(EntityCache::in_memory()),
        transport,
    ))
}

/// A loopback port with nothing listening on it.
pub(crate) fn closed_port() -> u16 {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind scratch listener");
    listener.local_addr().expect("scratch listener address").port()
}

/// Loader that points the cache at a temporary directory and the gateway at
/// an ephemeral loopback port.
pub(crate) struct TestConfigLoader {
    dir: TempDir,
    adjust: Box<dyn Fn(&mut Config) + Send + Sync>,
}

impl TestConfigLoader {
    pub(crate) fn new() -> Self {
        Self::with(|_| {})
    }

    pub(crate) fn with(adjust: impl Fn(&mut Config) + Send + Sync + 'static) -> Self {
        Self {
            dir: TempDir::new().expect("temporary directory"),
            adjust: Box::new(adjust),
        }
    }

    pub(crate) fn cache_path(&self) -> Utf8PathBuf {
        Utf8Path::from_path(self.dir.path())
            .expect("utf8 temporary directory")
            .join("cache.json")
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        let mut config = Config {
            gateway_socket: SocketEndpoint::tcp("127.0.0.1", 0),
            proxy_hostname: "127.0.0.1".to_owned(),
            proxy_port: closed_port().to_string(),
            cache_path: self.cache_path(),
            ..Config::default()
        };
        (self.adjust)(&mut config);
        Ok(config)
    }
}

/// Loader that rejects its arguments.
pub(crate) struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::load_from_iter(["hangard", "--gateway-socket", "udp://127.0.0.1:5000"])
    }
}

/// Lifecycle events tracked by [`RecordingHealthReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    SnapshotLoaded(usize),
    ListenerStarted(SocketEndpoint),
    ListenerStopped(SocketEndpoint),
}

#[derive(Debug, Default)]
pub(crate) struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    pub(crate) fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn snapshot_loaded(&self, _path: &Utf8Path, kinds: usize) {
        self.record(HealthEvent::SnapshotLoaded(kinds));
    }

    fn listener_started(&self, endpoint: &SocketEndpoint) {
        self.record(HealthEvent::ListenerStarted(endpoint.clone()));
    }

    fn listener_stopped(&self, endpoint: &SocketEndpoint) {
        self.record(HealthEvent::ListenerStopped(endpoint.clone()));
    }
}

/// Shutdown signal that fires immediately.
pub(crate) struct ImmediateShutdown;

impl ShutdownSignal for ImmediateShutdown {
    fn wait(&self) -> Result<ShutdownCause, ShutdownError> {
        Ok(ShutdownCause::Requested)
    }
}

/// Shutdown signal whose stream closes without a stop signal.
pub(crate) struct BrokenShutdown;

impl ShutdownSignal for BrokenShutdown {
    fn wait(&self) -> Result<ShutdownCause, ShutdownError> {
        Err(ShutdownError::Closed)
    }
}
