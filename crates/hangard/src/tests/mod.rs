//! Test suites for the hangar gateway daemon.

mod lifecycle;
pub(crate) mod support;
