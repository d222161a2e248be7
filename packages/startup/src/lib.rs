//! Container startup sequence for the Prism web application.
//!
//! Waits for the database, applies migrations, prepares static assets and
//! finally hands the process over to the server command.

pub mod config;
pub mod error;
pub mod handoff;
pub mod orchestrator;
pub mod tools;

pub use config::{parse_flag, StartupConfig};
pub use error::{Step, StartupError};
pub use handoff::Handoff;
pub use orchestrator::{startup, Startup, StartupBuilder};
pub use tools::{AssetPipeline, ManagePy, ManagePyAssets, ManagePyMigrator, SchemaMigrator};

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_support::logging::init();
}
