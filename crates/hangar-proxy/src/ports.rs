//! Resolution of backend port hints into a round-robin listener pool.
//!
//! A port hint is either one seed port, which stands in for `n` consecutive
//! listeners, or an explicit ordered list. Each value may be an integer or a
//! numeric string; coercion happens here so callers can pass configuration
//! values straight through.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;
use thiserror::Error;

/// Errors raised while resolving listener ports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    /// The hint was not a port, a numeric string, or a list of those.
    #[error("invalid port specification: {reason}")]
    InvalidPortSpec {
        /// Why the hint was rejected.
        reason: String,
    },
    /// A pool needs at least one listener.
    #[error("listener count must be at least 1")]
    NoListeners,
}

impl PortError {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidPortSpec {
            reason: reason.into(),
        }
    }
}

/// One port value as supplied by configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortValue {
    /// A native integer.
    Number(i64),
    /// A numeric string such as `"8000"`.
    Text(String),
}

impl PortValue {
    /// Coerces the value into a usable TCP port.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::InvalidPortSpec`] for non-numeric text and for
    /// values outside `1..=65535`.
    pub fn to_port(&self) -> Result<u16, PortError> {
        let raw = match self {
            Self::Number(number) => *number,
            Self::Text(text) => text
                .trim()
                .parse::<i64>()
                .map_err(|_| PortError::invalid(format!("'{text}' is not a numeric port")))?,
        };
        checked_port(raw)
    }

    fn from_json(value: &Value) -> Result<Self, PortError> {
        match value {
            Value::Number(number) => number
                .as_i64()
                .map(Self::Number)
                .ok_or_else(|| PortError::invalid(format!("{number} is not an integer port"))),
            Value::String(text) => Ok(Self::Text(text.clone())),
            other => Err(PortError::invalid(format!(
                "expected an integer or numeric string, found {}",
                json_shape(other)
            ))),
        }
    }
}

impl From<u16> for PortValue {
    fn from(port: u16) -> Self {
        Self::Number(i64::from(port))
    }
}

impl From<i64> for PortValue {
    fn from(port: i64) -> Self {
        Self::Number(port)
    }
}

impl From<&str> for PortValue {
    fn from(port: &str) -> Self {
        Self::Text(port.to_owned())
    }
}

impl From<String> for PortValue {
    fn from(port: String) -> Self {
        Self::Text(port)
    }
}

impl fmt::Display for PortValue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(formatter, "{number}"),
            Self::Text(text) => write!(formatter, "'{text}'"),
        }
    }
}

/// A port hint: one seed port or an explicit list of ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSpec {
    /// Seed port; the pool is `seed, seed + 1, ...`.
    Single(PortValue),
    /// Explicit ports, used in order.
    Many(Vec<PortValue>),
}

impl PortSpec {
    /// Builds a seed-port hint.
    #[must_use]
    pub fn single(port: impl Into<PortValue>) -> Self {
        Self::Single(port.into())
    }

    /// Builds an explicit port list.
    #[must_use]
    pub fn many<I>(ports: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<PortValue>,
    {
        Self::Many(ports.into_iter().map(Into::into).collect())
    }

    /// Reads a hint from a JSON value.
    ///
    /// Integers and strings become [`PortSpec::Single`]; arrays of integers
    /// and strings become [`PortSpec::Many`].
    ///
    /// # Errors
    ///
    /// Returns [`PortError::InvalidPortSpec`] for any other shape, including
    /// floats and arrays holding non-port values.
    pub fn from_json(value: &Value) -> Result<Self, PortError> {
        match value {
            Value::Number(_) | Value::String(_) => PortValue::from_json(value).map(Self::Single),
            Value::Array(items) => items
                .iter()
                .map(PortValue::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Many),
            other => Err(PortError::invalid(format!(
                "expected a port or a list of ports, found {}",
                json_shape(other)
            ))),
        }
    }
}

/// Resolves a port hint into the concrete ports of `listeners` listeners.
///
/// A seed port `p` yields `p, p + 1, ..., p + listeners - 1`. A list yields
/// its first `listeners` entries, or fewer when the list is shorter.
///
/// # Errors
///
/// Returns [`PortError::NoListeners`] when `listeners` is zero and
/// [`PortError::InvalidPortSpec`] when a value cannot be coerced or the
/// consecutive range runs past the last TCP port.
pub fn find_ports(spec: &PortSpec, listeners: usize) -> Result<Vec<u16>, PortError> {
    if listeners == 0 {
        return Err(PortError::NoListeners);
    }

    match spec {
        PortSpec::Single(seed) => {
            let base = seed.to_port()?;
            (0..listeners)
                .map(|offset| {
                    u16::try_from(offset)
                        .ok()
                        .and_then(|step| base.checked_add(step))
                        .ok_or_else(|| {
                            PortError::invalid(format!(
                                "{listeners} listeners starting at {base} exceed the port range"
                            ))
                        })
                })
                .collect()
        }
        PortSpec::Many(values) => values.iter().take(listeners).map(PortValue::to_port).collect(),
    }
}

/// Fixed set of listener ports consumed through a shared cyclic cursor.
///
/// The cursor is atomic, so concurrent callers each receive the next port in
/// turn and a full cycle visits every port exactly once.
#[derive(Debug)]
pub struct PortPool {
    ports: Vec<u16>,
    cursor: AtomicUsize,
}

impl PortPool {
    /// Builds a pool over the given ports.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::InvalidPortSpec`] when `ports` is empty.
    pub fn new(ports: Vec<u16>) -> Result<Self, PortError> {
        if ports.is_empty() {
            return Err(PortError::invalid("no ports remain for the listener pool"));
        }
        Ok(Self {
            ports,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Resolves a hint and builds the pool in one step.
    ///
    /// # Errors
    ///
    /// Propagates [`find_ports`] failures and rejects empty results.
    pub fn resolve(spec: &PortSpec, listeners: usize) -> Result<Self, PortError> {
        Self::new(find_ports(spec, listeners)?)
    }

    /// Ports in pool order.
    #[must_use]
    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    /// Returns the next port, wrapping around at the end of the pool.
    #[expect(
        clippy::indexing_slicing,
        clippy::integer_division_remainder_used,
        reason = "the pool is never empty, so the reduced slot is always in range"
    )]
    pub fn next_port(&self) -> u16 {
        let slot = self.cursor.fetch_add(1, Ordering::Relaxed) % self.ports.len();
        self.ports[slot]
    }
}

fn checked_port(raw: i64) -> Result<u16, PortError> {
    u16::try_from(raw)
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| PortError::invalid(format!("{raw} is outside the TCP port range")))
}

fn json_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::thread;

    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(PortSpec::single(8000_u16), 3, vec![8000, 8001, 8002])]
    #[case(PortSpec::single("8000"), 1, vec![8000])]
    #[case(PortSpec::single("8000"), 4, vec![8000, 8001, 8002, 8003])]
    #[case(PortSpec::many(["1003", "2221", "3124"]), 1, vec![1003])]
    #[case(PortSpec::many([1003_u16, 2221, 3124]), 3, vec![1003, 2221, 3124])]
    #[case(PortSpec::many(["8000", "9000", "10000"]), 2, vec![8000, 9000])]
    #[case(PortSpec::many(["1003", "2221"]), 5, vec![1003, 2221])]
    fn resolves_ports(#[case] spec: PortSpec, #[case] listeners: usize, #[case] expected: Vec<u16>) {
        assert_eq!(find_ports(&spec, listeners).expect("ports resolve"), expected);
    }

    #[test]
    fn mixed_values_are_coerced_in_order() {
        let spec = PortSpec::from_json(&json!(["1003", 2221, "3124", "9873", 1231]))
            .expect("mixed list is a valid spec");
        assert_eq!(
            find_ports(&spec, 4).expect("ports resolve"),
            vec![1003, 2221, 3124, 9873]
        );
    }

    #[test]
    fn only_the_taken_prefix_is_coerced() {
        let spec = PortSpec::many(["1003", "not-a-port"]);
        assert_eq!(find_ports(&spec, 1).expect("prefix resolves"), vec![1003]);
    }

    #[rstest]
    #[case(json!(25.5))]
    #[case(json!(null))]
    #[case(json!(true))]
    #[case(json!({"port": 8000}))]
    #[case(json!([8000, [9000]]))]
    fn rejects_other_shapes(#[case] value: Value) {
        let error = PortSpec::from_json(&value).expect_err("shape should be rejected");
        assert!(matches!(error, PortError::InvalidPortSpec { .. }));
    }

    #[rstest]
    #[case(PortSpec::single("eighty"), 1)]
    #[case(PortSpec::single(0_i64), 1)]
    #[case(PortSpec::single(70_000_i64), 1)]
    #[case(PortSpec::single(65_535_u16), 2)]
    #[case(PortSpec::many(["-1"]), 1)]
    fn rejects_unusable_ports(#[case] spec: PortSpec, #[case] listeners: usize) {
        let error = find_ports(&spec, listeners).expect_err("ports should be rejected");
        assert!(matches!(error, PortError::InvalidPortSpec { .. }));
    }

    #[test]
    fn zero_listeners_is_an_error() {
        assert_eq!(
            find_ports(&PortSpec::single(8000_u16), 0),
            Err(PortError::NoListeners)
        );
    }

    #[test]
    fn empty_list_cannot_form_a_pool() {
        let error = PortPool::resolve(&PortSpec::many(Vec::<u16>::new()), 3)
            .expect_err("empty pool should be rejected");
        assert!(matches!(error, PortError::InvalidPortSpec { .. }));
    }

    #[test]
    fn pool_cycles_through_ports() {
        let pool = PortPool::resolve(&PortSpec::single(18_000_u16), 3).expect("pool");
        let drawn: Vec<u16> = (0..7).map(|_| pool.next_port()).collect();
        assert_eq!(drawn, vec![18_000, 18_001, 18_002, 18_000, 18_001, 18_002, 18_000]);
    }

    #[test]
    fn concurrent_draws_visit_every_port_evenly() {
        let pool = Arc::new(PortPool::new(vec![1, 2, 3, 4]).expect("pool"));
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || (0..100).map(|_| pool.next_port()).collect::<Vec<_>>())
            })
            .collect();

        let mut counts: HashMap<u16, usize> = HashMap::new();
        for worker in workers {
            for port in worker.join().expect("worker thread") {
                *counts.entry(port).or_default() += 1;
            }
        }

        assert_eq!(counts.len(), 4);
        assert!(counts.values().all(|count| *count == 100), "{counts:?}");
    }
}
