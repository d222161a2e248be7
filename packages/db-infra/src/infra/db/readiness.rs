use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::error::DbInfraError;
use crate::infra::db::diagnostics::readiness_counters;
use crate::infra::db::probe::{DatabaseProbe, ProbeError};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Bounded, fixed-interval polling policy for the readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The probe succeeded on attempt number `attempts`.
    Ready { attempts: u32 },
    /// Every attempt reported the database as unreachable.
    Exhausted { attempts: u32, last_error: String },
}

/// Poll `probe` until it succeeds or the policy runs out of attempts.
///
/// Sleeps `policy.interval` after each unreachable attempt except the last.
/// Exhaustion is reported as [`WaitOutcome::Exhausted`]; whether that is fatal
/// is the caller's decision. A [`ProbeError::Fatal`] stops the loop at once.
pub async fn wait_for_database<P>(
    probe: &mut P,
    policy: WaitPolicy,
) -> Result<WaitOutcome, DbInfraError>
where
    P: DatabaseProbe + ?Sized,
{
    if policy.max_attempts == 0 {
        return Err(DbInfraError::Config {
            message: "database wait needs at least one attempt".to_string(),
        });
    }

    let interval_ms = policy.interval.as_millis();
    let start = Instant::now();
    let mut last_error = String::new();

    for attempt in 1..=policy.max_attempts {
        readiness_counters::probe_attempt();

        match probe.probe().await {
            Ok(()) => {
                readiness_counters::wait_ready();
                if attempt > 1 {
                    info!(
                        "db_wait=success attempts={} interval_ms={} elapsed_ms={}",
                        attempt,
                        interval_ms,
                        start.elapsed().as_millis()
                    );
                } else {
                    debug!("db_wait=success attempts=1");
                }
                return Ok(WaitOutcome::Ready { attempts: attempt });
            }
            Err(ProbeError::Fatal(message)) => {
                readiness_counters::probe_fatal();
                error!(attempt = attempt, error = %message, "db_wait=fatal");
                return Err(DbInfraError::Probe { message });
            }
            Err(ProbeError::Unreachable(message)) => {
                readiness_counters::probe_failed();
                debug!(attempt = attempt, error = %message, "database probe failed");
                last_error = message;

                if attempt < policy.max_attempts {
                    warn!(
                        "db_wait=retry attempt={} max_attempts={} interval_ms={}",
                        attempt, policy.max_attempts, interval_ms
                    );
                    tokio::time::sleep(policy.interval).await;
                }
            }
        }
    }

    readiness_counters::wait_exhausted();
    warn!(
        attempts = policy.max_attempts,
        elapsed_ms = start.elapsed().as_millis(),
        last_error = %last_error,
        "db_wait=exhausted"
    );

    Ok(WaitOutcome::Exhausted {
        attempts: policy.max_attempts,
        last_error,
    })
}
