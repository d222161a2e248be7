pub mod diagnostics;
pub mod probe;
pub mod readiness;

pub use diagnostics::readiness_counters;
pub use probe::{DatabaseProbe, ProbeError, SeaOrmProbe};
pub use readiness::{wait_for_database, WaitOutcome, WaitPolicy};
