//! Interest profile metrics for observability

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, Opts};
use tracing::warn;

static VISITS_RECORDED: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "interest_profile_visits_recorded_total",
        "Topic visits recorded into interest profiles",
    )
    .expect("valid metric definition");
    register(Box::new(counter.clone()));
    counter
});

static STORAGE_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "interest_profile_storage_failures_total",
            "Interest profile storage operations that failed",
        ),
        &["operation"],
    )
    .expect("valid metric definition");
    register(Box::new(counter.clone()));
    counter
});

static CORRUPT_PAYLOADS: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "interest_profile_corrupt_payloads_total",
        "Stored interest profiles that could not be decoded",
    )
    .expect("valid metric definition");
    register(Box::new(counter.clone()));
    counter
});

static EVICTIONS: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "interest_profile_evictions_total",
        "Topics evicted to keep the stored profile under its size limit",
    )
    .expect("valid metric definition");
    register(Box::new(counter.clone()));
    counter
});

fn register(collector: Box<dyn prometheus::core::Collector>) {
    if let Err(e) = prometheus::default_registry().register(collector) {
        warn!(error = %e, "Failed to register interest profile metric");
    }
}

pub(crate) fn record_visit() {
    VISITS_RECORDED.inc();
}

pub(crate) fn record_storage_failure(operation: &str) {
    STORAGE_FAILURES.with_label_values(&[operation]).inc();
}

pub(crate) fn record_corrupt_payload() {
    CORRUPT_PAYLOADS.inc();
}

pub(crate) fn record_evictions(count: usize) {
    EVICTIONS.inc_by(count as u64);
}
