//! Shared test infrastructure: an in-process UDP agent and fixtures.

// Not every test binary uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod agent;
pub mod fixtures;

pub use agent::{TestAgent, TestAgentBuilder};
pub use fixtures::{interface_table, system_mib};

/// Route library tracing into the test harness output.
///
/// Filtered by `RUST_LOG`; silent when unset. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

