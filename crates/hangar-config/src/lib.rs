//! Shared configuration for the hangar gateway and its proxy client.
//!
//! Settings are layered as command-line flags over environment variables over
//! the built-in defaults in [`defaults`]. The backend port hints are kept as
//! strings on purpose: turning them into concrete listener ports is the job of
//! the proxy crate's port selector, which accepts both numeric strings and
//! integers.

mod defaults;
mod logging;
mod socket;

use std::ffi::OsString;

use camino::Utf8PathBuf;
use clap::Parser;
use thiserror::Error;

pub use defaults::{
    DEFAULT_CACHE_PATH, DEFAULT_GATEWAY_PORT, DEFAULT_LOG_FILTER, DEFAULT_PROXY_HOST,
    DEFAULT_PROXY_PORT, default_gateway_socket, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved configuration shared by the daemon binaries.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "hangard",
    version,
    about = "Entity gateway fronting the line-protocol data service"
)]
pub struct Config {
    /// Socket the gateway listens on (`tcp://host:port` or `unix:///path`).
    #[arg(
        long = "gateway-socket",
        env = "HANGAR_GATEWAY_SOCKET",
        default_value_t = default_gateway_socket()
    )]
    pub gateway_socket: SocketEndpoint,

    /// Hostname of the backend data service.
    #[arg(
        short = 'H',
        long = "proxy-hostname",
        env = "PROXYSERVER_HOST",
        default_value = DEFAULT_PROXY_HOST
    )]
    pub proxy_hostname: String,

    /// Seed port of the backend; listeners occupy consecutive ports from here.
    #[arg(
        short = 'p',
        long = "proxy-port",
        env = "PROXYSERVER_PORT",
        default_value = DEFAULT_PROXY_PORT
    )]
    pub proxy_port: String,

    /// Number of backend listeners to spread requests across.
    #[arg(
        short = 'l',
        long = "num-listeners",
        env = "HANGAR_NUM_LISTENERS",
        default_value_t = 1,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub num_listeners: u16,

    /// Explicit backend ports, overriding the seed port when present.
    #[arg(
        short = 'P',
        long = "use-ports",
        env = "HANGAR_USE_PORTS",
        value_delimiter = ','
    )]
    pub use_ports: Vec<String>,

    /// File the entity cache snapshot is written to.
    #[arg(
        long = "cache-path",
        env = "HANGAR_CACHE_PATH",
        default_value = DEFAULT_CACHE_PATH
    )]
    pub cache_path: Utf8PathBuf,

    /// Tracing filter expression.
    #[arg(
        long = "log-filter",
        env = "HANGAR_LOG_FILTER",
        default_value = DEFAULT_LOG_FILTER
    )]
    pub log_filter: String,

    /// Output format for log records.
    #[arg(
        long = "log-format",
        env = "HANGAR_LOG_FORMAT",
        default_value_t = default_log_format()
    )]
    pub log_format: LogFormat,
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Command-line or environment input was rejected.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] clap::Error),
}

impl ConfigError {
    /// Reports whether the error is a help or version request rather than a
    /// rejected input.
    #[must_use]
    pub fn is_informational(&self) -> bool {
        let Self::Invalid(error) = self;
        matches!(
            error.kind(),
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway_socket: default_gateway_socket(),
            proxy_hostname: DEFAULT_PROXY_HOST.to_owned(),
            proxy_port: DEFAULT_PROXY_PORT.to_owned(),
            num_listeners: 1,
            use_ports: Vec::new(),
            cache_path: Utf8PathBuf::from(DEFAULT_CACHE_PATH),
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a flag or variable is rejected.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Loads configuration from an explicit argument list.
    ///
    /// The first item is treated as the binary name, as with `std::env::args`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a flag or variable is rejected.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Ok(Self::try_parse_from(args)?)
    }

    /// Socket the gateway listens on.
    #[must_use]
    pub fn gateway_socket(&self) -> &SocketEndpoint {
        &self.gateway_socket
    }

    /// Hostname of the backend data service.
    #[must_use]
    pub fn proxy_hostname(&self) -> &str {
        &self.proxy_hostname
    }

    /// Number of backend listeners.
    #[must_use]
    pub fn num_listeners(&self) -> usize {
        usize::from(self.num_listeners)
    }

    /// Backend port hints in the order they were supplied.
    ///
    /// Returns the explicit port list when one was configured, otherwise the
    /// single seed port.
    #[must_use]
    pub fn port_hints(&self) -> PortHints<'_> {
        if self.use_ports.is_empty() {
            PortHints::Seed(&self.proxy_port)
        } else {
            PortHints::Explicit(&self.use_ports)
        }
    }

    /// Location of the cache snapshot file.
    #[must_use]
    pub fn cache_path(&self) -> &Utf8PathBuf {
        &self.cache_path
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Output format for log records.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

/// Raw backend port hints, before they are resolved into listener ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortHints<'a> {
    /// A single seed port.
    Seed(&'a str),
    /// An explicit, ordered list of ports.
    Explicit(&'a [String]),
}
