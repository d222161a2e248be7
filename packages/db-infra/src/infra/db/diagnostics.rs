/// Process-wide counters for the database readiness wait
pub mod readiness_counters {
    use std::sync::atomic::{AtomicUsize, Ordering};

    static PROBE_ATTEMPTS_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static PROBE_FAILURES_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static PROBE_FATAL_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static WAIT_READY_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static WAIT_EXHAUSTED_TOTAL: AtomicUsize = AtomicUsize::new(0);

    pub fn probe_attempt() {
        PROBE_ATTEMPTS_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    pub fn probe_failed() {
        PROBE_FAILURES_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    pub fn probe_fatal() {
        PROBE_FATAL_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    pub fn wait_ready() {
        WAIT_READY_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    pub fn wait_exhausted() {
        WAIT_EXHAUSTED_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    #[derive(Debug, Clone, Copy)]
    pub struct Snapshot {
        pub probe_attempts_total: usize,
        pub probe_failures_total: usize,
        pub probe_fatal_total: usize,
        pub wait_ready_total: usize,
        pub wait_exhausted_total: usize,
    }

    pub fn snapshot() -> Snapshot {
        Snapshot {
            probe_attempts_total: PROBE_ATTEMPTS_TOTAL.load(Ordering::Relaxed),
            probe_failures_total: PROBE_FAILURES_TOTAL.load(Ordering::Relaxed),
            probe_fatal_total: PROBE_FATAL_TOTAL.load(Ordering::Relaxed),
            wait_ready_total: WAIT_READY_TOTAL.load(Ordering::Relaxed),
            wait_exhausted_total: WAIT_EXHAUSTED_TOTAL.load(Ordering::Relaxed),
        }
    }

    pub fn log_snapshot(context: &str) {
        let s = snapshot();
        tracing::info!(
            context = context,
            probe_attempts_total = s.probe_attempts_total,
            probe_failures_total = s.probe_failures_total,
            probe_fatal_total = s.probe_fatal_total,
            wait_ready_total = s.wait_ready_total,
            wait_exhausted_total = s.wait_exhausted_total,
            "db_readiness_counters_snapshot"
        );
    }
}
