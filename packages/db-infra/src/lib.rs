//! Database connection settings and readiness probing.
//! Used by the startup orchestrator and the entrypoint binary.

pub mod config;
pub mod error;
pub mod infra;

pub use config::db;
pub use error::DbInfraError;
pub use infra::db::{
    readiness_counters, wait_for_database, DatabaseProbe, ProbeError, SeaOrmProbe, WaitOutcome,
    WaitPolicy,
};

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_support::logging::init();
}
