//! Batch sinks: the downstream consumers of processed frames.

use crate::error::{Error, Result};
use crate::frame::Batch;
use crate::observability;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A consumer of finished batches.
///
/// The supervisor calls `accept` once per emitted batch. The call may
/// suspend (persistence, display, network I/O); any error it returns is
/// treated as that source's failure and ends the source's run.
pub trait FrameSink: Send {
    /// Accept one batch from `source_id`.
    fn accept(
        &mut self,
        batch: Batch,
        source_id: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// A sink that discards batches, optionally after a simulated write delay.
///
/// Stands in for persistence in load experiments: the delay models async
/// I/O without storing anything.
#[derive(Debug, Default)]
pub struct NullSink {
    write_delay: Duration,
    batches_accepted: u64,
}

impl NullSink {
    /// Create a sink that discards everything immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a simulated write delay per batch.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    /// Number of batches accepted so far.
    pub fn batches_accepted(&self) -> u64 {
        self.batches_accepted
    }
}

impl FrameSink for NullSink {
    async fn accept(&mut self, batch: Batch, source_id: &str) -> Result<()> {
        if !self.write_delay.is_zero() {
            tokio::time::sleep(self.write_delay).await;
        }
        self.batches_accepted += 1;
        observability::record_batch_flushed(source_id, batch.len());
        Ok(())
    }
}

/// A sink that logs a line per batch, for debugging pipelines.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    batches_accepted: u64,
}

impl ConsoleSink {
    /// Create a new console sink.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for ConsoleSink {
    async fn accept(&mut self, batch: Batch, source_id: &str) -> Result<()> {
        self.batches_accepted += 1;
        tracing::info!(
            source = %source_id,
            batch = self.batches_accepted,
            frames = batch.len(),
            ids = ?batch.ids(),
            "batch flushed"
        );
        observability::record_batch_flushed(source_id, batch.len());
        Ok(())
    }
}

/// A sink that retains every accepted batch for later inspection.
///
/// The handle returned by [`CollectSink::handle`] stays valid after the
/// pipeline consumed the sink, which is how tests read back what was sunk.
/// Clones share the underlying store, so several sources can feed one
/// collector.
#[derive(Debug, Default, Clone)]
pub struct CollectSink {
    batches: Arc<Mutex<Vec<(String, Batch)>>>,
}

impl CollectSink {
    /// Create an empty collecting sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// A shared handle to the collected batches.
    pub fn handle(&self) -> CollectHandle {
        CollectHandle {
            batches: Arc::clone(&self.batches),
        }
    }
}

impl FrameSink for CollectSink {
    async fn accept(&mut self, batch: Batch, source_id: &str) -> Result<()> {
        observability::record_batch_flushed(source_id, batch.len());
        let mut batches = self
            .batches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        batches.push((source_id.to_string(), batch));
        Ok(())
    }
}

/// Read-side handle to a [`CollectSink`]'s batches.
#[derive(Debug, Clone)]
pub struct CollectHandle {
    batches: Arc<Mutex<Vec<(String, Batch)>>>,
}

impl CollectHandle {
    /// Snapshot of all collected `(source_id, batch)` pairs, in acceptance order.
    pub fn batches(&self) -> Vec<(String, Batch)> {
        self.batches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Batches accepted from one source, in acceptance order.
    pub fn batches_for(&self, source_id: &str) -> Vec<Batch> {
        self.batches()
            .into_iter()
            .filter(|(id, _)| id == source_id)
            .map(|(_, batch)| batch)
            .collect()
    }

    /// Total number of frames accepted across all batches.
    pub fn total_frames(&self) -> usize {
        self.batches().iter().map(|(_, b)| b.len()).sum()
    }
}

/// A sink that fails on the Nth accepted batch, for fault injection.
#[derive(Debug)]
pub struct FailingSink {
    fail_on_batch: u64,
    batches_accepted: u64,
}

impl FailingSink {
    /// Create a sink that rejects the `fail_on_batch`-th batch (1-based).
    ///
    /// Earlier batches are accepted and discarded.
    pub fn new(fail_on_batch: u64) -> Self {
        Self {
            fail_on_batch,
            batches_accepted: 0,
        }
    }
}

impl FrameSink for FailingSink {
    async fn accept(&mut self, batch: Batch, source_id: &str) -> Result<()> {
        self.batches_accepted += 1;
        if self.batches_accepted == self.fail_on_batch {
            return Err(Error::Sink(format!(
                "injected failure on batch {} from {source_id}",
                self.batches_accepted
            )));
        }
        observability::record_batch_flushed(source_id, batch.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ProcessedFrame;
    use bytes::Bytes;
    use std::time::SystemTime;

    fn batch(ids: &[u64]) -> Batch {
        Batch::new(
            ids.iter()
                .map(|&id| ProcessedFrame {
                    id,
                    result: Bytes::from_static(b"out"),
                    processing_duration: Duration::from_millis(1),
                    captured_at: SystemTime::now(),
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_null_sink_counts_batches() {
        let mut sink = NullSink::new();
        sink.accept(batch(&[0, 1]), "cam-0").await.unwrap();
        sink.accept(batch(&[2]), "cam-0").await.unwrap();
        assert_eq!(sink.batches_accepted(), 2);
    }

    #[tokio::test]
    async fn test_collect_sink_preserves_order() {
        let mut sink = CollectSink::new();
        let handle = sink.handle();

        sink.accept(batch(&[0, 2, 4]), "cam-0").await.unwrap();
        sink.accept(batch(&[6, 8]), "cam-0").await.unwrap();
        sink.accept(batch(&[0]), "cam-1").await.unwrap();

        let for_cam0 = handle.batches_for("cam-0");
        assert_eq!(for_cam0.len(), 2);
        assert_eq!(for_cam0[0].ids(), vec![0, 2, 4]);
        assert_eq!(for_cam0[1].ids(), vec![6, 8]);
        assert_eq!(handle.total_frames(), 6);
    }

    #[tokio::test]
    async fn test_failing_sink_fails_on_nth_batch() {
        let mut sink = FailingSink::new(2);
        assert!(sink.accept(batch(&[0]), "cam-0").await.is_ok());
        let err = sink.accept(batch(&[1]), "cam-0").await;
        assert!(matches!(err, Err(Error::Sink(_))));
    }
}
