//! Test fixtures for depot-allocator.
//!
//! Provides:
//! - Deterministic coordinate scatters around two Pune service regions
//! - Tracing setup driven by `RUST_LOG`

pub mod pune_locations;

pub use pune_locations::*;

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Install a test-friendly subscriber once per test binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
