//! Gateway daemon for the hangar entity service.
//!
//! `hangard` loads its configuration, installs telemetry, resolves the
//! backend listener pool, restores the entity cache from its snapshot and
//! then serves gateway requests on a TCP or Unix socket until it receives a
//! termination signal. Requests are single JSON lines naming a method, a
//! path and an optional body; see [`gateway`] for the route table.
//!
//! The lifecycle is split so each stage can be driven on its own:
//! [`bootstrap_with`] wires the collaborators, [`Gateway::start`] binds the
//! socket, and [`RunningGateway::stop`] drains the listener and lets the
//! cache flush its last snapshot.

mod bootstrap;
pub mod gateway;
mod health;
mod process;
pub mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Gateway, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
    port_spec,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{
    GATEWAY_STOP_SIGNALS, LaunchError, RunningGateway, ShutdownCause, ShutdownError,
    ShutdownSignal, SystemShutdownSignal, run, run_with,
};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
