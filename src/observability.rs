//! Metrics instrumentation via `metrics-rs`.
//!
//! The crate records, an exporter (prometheus, statsd, ...) installed by
//! the embedder collects. Exposed metrics:
//!
//! | Metric | Type | Description |
//! |--------|------|-------------|
//! | `vidflow_frames_produced` | Counter | Raw frames yielded by sources |
//! | `vidflow_frames_processed` | Counter | Frames through the transform |
//! | `vidflow_batches_flushed` | Counter | Batches accepted by sinks |
//! | `vidflow_frames_sunk` | Counter | Frames accepted by sinks |
//! | `vidflow_processing_time_ns` | Histogram | Per-frame transform time |
//! | `vidflow_slots_available` | Gauge | Free executor slots |

use metrics::{Unit, counter, gauge, histogram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

const FRAMES_PRODUCED: &str = "vidflow_frames_produced";
const FRAMES_PROCESSED: &str = "vidflow_frames_processed";
const BATCHES_FLUSHED: &str = "vidflow_batches_flushed";
const FRAMES_SUNK: &str = "vidflow_frames_sunk";
const PROCESSING_TIME_NS: &str = "vidflow_processing_time_ns";
const SLOTS_AVAILABLE: &str = "vidflow_slots_available";

/// Register metric descriptions.
///
/// Call once at application startup. Safe to call again; subsequent calls
/// are no-ops.
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    metrics::describe_counter!(
        FRAMES_PRODUCED,
        Unit::Count,
        "Total raw frames yielded by sources"
    );
    metrics::describe_counter!(
        FRAMES_PROCESSED,
        Unit::Count,
        "Total frames through the CPU-bound transform"
    );
    metrics::describe_counter!(
        BATCHES_FLUSHED,
        Unit::Count,
        "Total batches accepted by sinks"
    );
    metrics::describe_counter!(FRAMES_SUNK, Unit::Count, "Total frames accepted by sinks");
    metrics::describe_histogram!(
        PROCESSING_TIME_NS,
        Unit::Nanoseconds,
        "Wall-clock time of the per-frame transform"
    );
    metrics::describe_gauge!(SLOTS_AVAILABLE, Unit::Count, "Free executor slots");
}

/// Record a raw frame yielded by a source.
#[inline]
pub fn record_frame_produced(source: &str) {
    counter!(FRAMES_PRODUCED, "source" => source.to_string()).increment(1);
}

/// Record one frame through the transform, with its duration.
#[inline]
pub fn record_frame_processed(duration: Duration) {
    counter!(FRAMES_PROCESSED).increment(1);
    histogram!(PROCESSING_TIME_NS).record(duration.as_nanos() as f64);
}

/// Record a batch accepted by a sink.
#[inline]
pub fn record_batch_flushed(source: &str, frames: usize) {
    counter!(BATCHES_FLUSHED, "source" => source.to_string()).increment(1);
    counter!(FRAMES_SUNK, "source" => source.to_string()).increment(frames as u64);
}

/// Record the executor's free slot count.
#[inline]
pub fn record_slots_available(available: usize) {
    gauge!(SLOTS_AVAILABLE).set(available as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics_is_idempotent() {
        init_metrics();
        init_metrics();
        assert!(METRICS_INITIALIZED.load(Ordering::SeqCst));
    }

    #[test]
    fn test_record_without_recorder_is_noop() {
        // With no recorder installed these must not panic.
        record_frame_produced("cam-0");
        record_frame_processed(Duration::from_millis(5));
        record_batch_flushed("cam-0", 5);
        record_slots_available(3);
    }
}
