use std::time::Duration;
extern crate dipstick;
use dipstick::*;

/// Routes the cut counters and subproblem timers to stderr, flushed every `interval`.
/// Stdout stays reserved for the solution report.
pub fn setup_metrics_printer(interval: Duration) {
    let bucket = AtomicBucket::new();

    bucket.drain(Stream::write_to_stderr());
    bucket.stats(dipstick::stats_summary);
    bucket.flush_every(interval);

    dipstick::Proxy::default_target(bucket);
}
