use crate::logging::LogFormat;
use crate::socket::SocketEndpoint;

/// Hostname of the backend data service when none is configured.
pub const DEFAULT_PROXY_HOST: &str = "localhost";

/// Seed port of the backend data service when none is configured.
pub const DEFAULT_PROXY_PORT: &str = "8000";

/// TCP port the gateway listens on by default.
pub const DEFAULT_GATEWAY_PORT: u16 = 5000;

/// Snapshot file used by the entity cache.
pub const DEFAULT_CACHE_PATH: &str = "artifacts/cache.json";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default logging format for the binaries.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Socket the gateway binds when none is configured.
#[must_use]
pub fn default_gateway_socket() -> SocketEndpoint {
    SocketEndpoint::tcp("0.0.0.0", DEFAULT_GATEWAY_PORT)
}
