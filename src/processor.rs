//! Per-frame CPU-bound processing.

use crate::error::{Error, Result};
use crate::executor::BoundedExecutor;
use crate::frame::{ProcessedFrame, RawFrame};
use crate::observability;
use bytes::Bytes;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The CPU-bound byte transform applied to each frame payload.
///
/// Must be a pure function of the input bytes: deterministic, no side
/// effects. This keeps the transform replaceable (filter kernels, encoders)
/// without changing the processing contract.
pub type FrameTransform = Arc<dyn Fn(&[u8]) -> Result<Vec<u8>> + Send + Sync>;

/// Applies the CPU-bound transform to one frame at a time, under the
/// shared executor's concurrency ceiling.
///
/// `process()` acquires one executor slot, runs the transform on the
/// blocking thread pool so the async scheduler is never stalled, measures
/// the transform's wall-clock duration, and releases the slot on every
/// exit path (the permit is held by RAII across the work).
///
/// Cloning is cheap and shares the executor and transform.
#[derive(Clone)]
pub struct FrameProcessor {
    executor: Arc<BoundedExecutor>,
    transform: FrameTransform,
    work: Duration,
}

impl FrameProcessor {
    /// Create a processor with the default placeholder transform.
    ///
    /// The default transform prefixes the payload with `processed_`,
    /// standing in for real filter/encode work.
    pub fn new(executor: Arc<BoundedExecutor>) -> Self {
        Self {
            executor,
            transform: Arc::new(default_transform),
            work: Duration::ZERO,
        }
    }

    /// Replace the byte transform.
    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&[u8]) -> Result<Vec<u8>> + Send + Sync + 'static,
    {
        self.transform = Arc::new(transform);
        self
    }

    /// Add a simulated CPU cost to every transform.
    ///
    /// The sleep runs on the blocking pool while the slot is held, so it
    /// loads the executor exactly like real CPU work would.
    pub fn with_work_duration(mut self, work: Duration) -> Self {
        self.work = work;
        self
    }

    /// The executor whose slots this processor consumes.
    pub fn executor(&self) -> &Arc<BoundedExecutor> {
        &self.executor
    }

    /// Transform one frame.
    ///
    /// Suspends on slot acquisition, then on the transform itself. The
    /// returned [`ProcessedFrame`] inherits the frame's id and capture
    /// timestamp. A panicking transform surfaces as a
    /// [`Processing`](Error::Processing) error; the slot is released
    /// regardless.
    pub async fn process(&self, frame: RawFrame) -> Result<ProcessedFrame> {
        let _slot = self.executor.acquire().await?;

        let transform = Arc::clone(&self.transform);
        let work = self.work;
        let payload = frame.payload.clone();

        let start = Instant::now();
        let result = tokio::task::spawn_blocking(move || {
            if !work.is_zero() {
                std::thread::sleep(work);
            }
            transform(&payload)
        })
        .await
        .map_err(|e| Error::Processing(format!("frame transform panicked: {e}")))??;
        let processing_duration = start.elapsed();

        observability::record_frame_processed(processing_duration);

        Ok(ProcessedFrame {
            id: frame.id,
            result: Bytes::from(result),
            processing_duration,
            captured_at: frame.captured_at,
        })
    }
}

impl std::fmt::Debug for FrameProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameProcessor")
            .field("max_concurrency", &self.executor.max_concurrency())
            .field("work", &self.work)
            .finish()
    }
}

fn default_transform(payload: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(payload.len() + 10);
    out.extend_from_slice(b"processed_");
    out.extend_from_slice(payload);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_processor(max: usize) -> FrameProcessor {
        FrameProcessor::new(Arc::new(BoundedExecutor::new(max).unwrap()))
    }

    #[tokio::test]
    async fn test_process_inherits_id_and_timestamp() {
        let processor = make_processor(2);
        let frame = RawFrame::new(42, "frame_data_42");
        let captured_at = frame.captured_at;

        let processed = processor.process(frame).await.unwrap();
        assert_eq!(processed.id, 42);
        assert_eq!(processed.captured_at, captured_at);
        assert_eq!(&processed.result[..], b"processed_frame_data_42");
    }

    #[tokio::test]
    async fn test_default_transform_is_deterministic() {
        let processor = make_processor(2);
        let a = processor.process(RawFrame::new(0, "payload")).await.unwrap();
        let b = processor.process(RawFrame::new(0, "payload")).await.unwrap();
        assert_eq!(a.result, b.result);
    }

    #[tokio::test]
    async fn test_transform_error_releases_slot() {
        let executor = Arc::new(BoundedExecutor::new(1).unwrap());
        let processor = FrameProcessor::new(Arc::clone(&executor))
            .with_transform(|_| Err(Error::Processing("decode failed".into())));

        let result = processor.process(RawFrame::new(0, "x")).await;
        assert!(matches!(result, Err(Error::Processing(_))));
        assert_eq!(executor.available(), 1);
    }

    #[tokio::test]
    async fn test_transform_panic_releases_slot() {
        let executor = Arc::new(BoundedExecutor::new(1).unwrap());
        let processor = FrameProcessor::new(Arc::clone(&executor))
            .with_transform(|_| panic!("kernel bug"));

        let result = processor.process(RawFrame::new(0, "x")).await;
        assert!(matches!(result, Err(Error::Processing(_))));
        assert_eq!(executor.available(), 1);
    }

    #[tokio::test]
    async fn test_processing_duration_is_measured() {
        let processor = make_processor(1).with_work_duration(Duration::from_millis(20));
        let processed = processor.process(RawFrame::new(0, "x")).await.unwrap();
        assert!(processed.processing_duration >= Duration::from_millis(20));
    }
}
