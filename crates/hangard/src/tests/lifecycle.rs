//! Bootstrap and run-loop tests.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rstest::rstest;
use serde_json::{Value, json};

use hangar_config::SocketEndpoint;
use hangar_proxy::{EntityKind, PortError};

use super::support::{
    BrokenShutdown, FailingConfigLoader, HealthEvent, ImmediateShutdown,
    RecordingHealthReporter, TestConfigLoader,
};
use crate::bootstrap::{BootstrapError, bootstrap_with};
use crate::process::{LaunchError, ShutdownCause, ShutdownError, run_with};

fn customer_snapshot() -> String {
    let customers = json!([
        {"type": "Customer", "ID": 2, "name": "Skyways", "description": "regional"}
    ]);
    json!({"customer": customers.to_string()}).to_string()
}

fn exchange(endpoint: &SocketEndpoint, line: &Value) -> Value {
    let SocketEndpoint::Tcp { host, port } = endpoint else {
        panic!("expected a TCP endpoint, got {endpoint}");
    };
    let mut stream = TcpStream::connect((host.as_str(), *port)).expect("connect gateway");
    stream
        .set_read_timeout(Some(Duration::from_secs(2)))
        .expect("read timeout");
    writeln!(stream, "{line}").expect("write request");

    let mut response = String::new();
    BufReader::new(stream)
        .read_line(&mut response)
        .expect("read response");
    serde_json::from_str(&response).expect("response is JSON")
}

fn wait_for_file_containing(path: &camino::Utf8Path, needle: &str) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if std::fs::read_to_string(path).is_ok_and(|text| text.contains(needle)) {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

#[rstest]
fn bootstrap_reports_each_stage() {
    let loader = TestConfigLoader::new();
    let reporter = Arc::new(RecordingHealthReporter::default());

    let gateway = bootstrap_with(&loader, reporter.clone()).expect("bootstrap should succeed");

    assert_eq!(gateway.config().cache_path(), &loader.cache_path());
    assert_eq!(
        reporter.events(),
        vec![
            HealthEvent::BootstrapStarting,
            HealthEvent::SnapshotLoaded(0),
            HealthEvent::BootstrapSucceeded,
        ]
    );
}

#[rstest]
fn bootstrap_restores_the_snapshot() {
    let loader = TestConfigLoader::new();
    std::fs::write(loader.cache_path(), customer_snapshot()).expect("write snapshot");
    let reporter = Arc::new(RecordingHealthReporter::default());

    let gateway = bootstrap_with(&loader, reporter.clone()).expect("bootstrap should succeed");

    assert!(reporter.events().contains(&HealthEvent::SnapshotLoaded(1)));
    // The backend port is closed, so this can only be served from the snapshot.
    let customers = gateway
        .dispatcher()
        .list(EntityKind::Customer)
        .expect("customers from snapshot");
    assert_eq!(customers.len(), 1);
}

#[rstest]
fn corrupt_snapshots_fail_bootstrap() {
    let loader = TestConfigLoader::new();
    std::fs::write(loader.cache_path(), r#"{"customer": [1, 2]}"#).expect("write snapshot");
    let reporter = Arc::new(RecordingHealthReporter::default());

    let error = bootstrap_with(&loader, reporter.clone()).expect_err("corrupt snapshot");

    assert!(matches!(error, BootstrapError::Cache { .. }));
    assert!(matches!(
        reporter.events().last(),
        Some(HealthEvent::BootstrapFailed(_))
    ));
}

#[rstest]
fn unusable_port_hints_fail_bootstrap() {
    let loader = TestConfigLoader::with(|config| config.use_ports = vec!["eighty".to_owned()]);
    let reporter = Arc::new(RecordingHealthReporter::default());

    let error = bootstrap_with(&loader, reporter).expect_err("bad port");

    assert!(matches!(
        error,
        BootstrapError::Ports {
            source: PortError::InvalidPortSpec { .. }
        }
    ));
}

#[rstest]
fn rejected_configuration_is_reported() {
    let reporter = Arc::new(RecordingHealthReporter::default());

    let error = bootstrap_with(&FailingConfigLoader, reporter.clone()).expect_err("bad config");

    assert!(matches!(error, BootstrapError::Configuration { .. }));
    assert_eq!(reporter.events().len(), 2);
}

#[rstest]
fn run_with_starts_and_stops_the_listener() {
    let loader = TestConfigLoader::new();
    let reporter = Arc::new(RecordingHealthReporter::default());

    let cause =
        run_with(&loader, reporter.clone(), &ImmediateShutdown).expect("run should succeed");

    assert_eq!(cause, ShutdownCause::Requested);

    let events = reporter.events();
    let started = events
        .iter()
        .position(|event| matches!(event, HealthEvent::ListenerStarted(_)))
        .expect("listener started");
    let stopped = events
        .iter()
        .position(|event| matches!(event, HealthEvent::ListenerStopped(_)))
        .expect("listener stopped");
    assert!(started < stopped);
}

#[rstest]
fn failed_shutdown_waits_still_stop_the_listener() {
    let loader = TestConfigLoader::new();
    let reporter = Arc::new(RecordingHealthReporter::default());

    let error = run_with(&loader, reporter.clone(), &BrokenShutdown).expect_err("no stop signal");

    assert!(matches!(error, LaunchError::Shutdown(ShutdownError::Closed)));
    assert!(
        reporter
            .events()
            .iter()
            .any(|event| matches!(event, HealthEvent::ListenerStopped(_)))
    );
}

#[rstest]
fn run_with_surfaces_configuration_errors() {
    let reporter = Arc::new(RecordingHealthReporter::default());

    let error = run_with(&FailingConfigLoader, reporter, &ImmediateShutdown)
        .expect_err("bad config");

    assert!(matches!(error, LaunchError::Config { .. }));
    assert!(error.config_error().is_some_and(|config| !config.is_informational()));
}

#[rstest]
fn served_mutations_reach_the_snapshot() {
    let loader = TestConfigLoader::new();
    std::fs::write(loader.cache_path(), customer_snapshot()).expect("write snapshot");
    let reporter = Arc::new(RecordingHealthReporter::default());
    let gateway = bootstrap_with(&loader, reporter).expect("bootstrap");
    let running = gateway.start().expect("start gateway");

    let created = exchange(
        running.endpoint(),
        &json!({"method": "POST", "path": "/customer",
                "body": {"name": "Nimbus", "description": "charter"}}),
    );
    let health = exchange(running.endpoint(), &json!({"method": "GET", "path": "/healthcheck"}));
    running.stop().expect("stop gateway");

    assert_eq!(created, json!({"status": 200, "body": {"success": true, "ID": 3}}));
    assert_eq!(health, json!({"status": 204, "body": null}));
    assert!(
        wait_for_file_containing(&loader.cache_path(), "Nimbus"),
        "snapshot should record the new customer"
    );
}
