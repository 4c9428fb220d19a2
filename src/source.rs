//! Simulated video frame sources.

use crate::error::Result;
use crate::frame::{AttributeValue, RawFrame};
use crate::observability;
use crate::stream::FrameStream;
use bytes::Bytes;
use std::time::{Duration, SystemTime};

/// A simulated capture feed for one logical video source.
///
/// Produces a finite, non-restartable sequence of [`RawFrame`]s. Each pull
/// suspends for the configured arrival delay first, modeling capture or
/// network I/O latency, then yields the next frame. Ids start at 0 and
/// increment by 1; the sequence always completes after the configured
/// count with no error paths.
///
/// The source models a live feed: once exhausted it stays exhausted, and
/// there is deliberately no `reset()`.
///
/// # Example
///
/// ```rust,ignore
/// use vidflow::source::VideoSource;
/// use std::time::Duration;
///
/// let mut source = VideoSource::new("cam-0", 100)
///     .with_arrival_delay(Duration::from_millis(10));
///
/// while let Some(frame) = source.next().await? {
///     // frame.id: 0, 1, 2, ...
/// }
/// ```
pub struct VideoSource {
    source_id: String,
    frame_count: u64,
    next_id: u64,
    arrival_delay: Duration,
    payload_size: Option<usize>,
}

impl VideoSource {
    /// Create a source that yields `frame_count` frames with no arrival delay.
    pub fn new(source_id: impl Into<String>, frame_count: u64) -> Self {
        Self {
            source_id: source_id.into(),
            frame_count,
            next_id: 0,
            arrival_delay: Duration::ZERO,
            payload_size: None,
        }
    }

    /// Set the simulated per-frame arrival delay.
    pub fn with_arrival_delay(mut self, delay: Duration) -> Self {
        self.arrival_delay = delay;
        self
    }

    /// Pad or truncate payloads to a fixed size.
    ///
    /// By default the payload is a short text marker; a fixed size is
    /// useful when benchmarking transform throughput.
    pub fn with_payload_size(mut self, size: usize) -> Self {
        self.payload_size = Some(size);
        self
    }

    /// The source identifier.
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Number of frames produced so far.
    pub fn frames_produced(&self) -> u64 {
        self.next_id
    }

    /// Payload is a pure function of (source id, frame id) so runs are
    /// reproducible.
    fn make_payload(&self, id: u64) -> Bytes {
        let text = format!("frame_data_{}_{}", self.source_id, id);
        match self.payload_size {
            None => Bytes::from(text),
            Some(size) => {
                let mut data = text.into_bytes();
                data.resize(size, 0);
                Bytes::from(data)
            }
        }
    }
}

impl FrameStream for VideoSource {
    type Item = RawFrame;

    async fn next(&mut self) -> Result<Option<RawFrame>> {
        if self.next_id >= self.frame_count {
            return Ok(None);
        }

        // Simulated capture latency.
        if !self.arrival_delay.is_zero() {
            tokio::time::sleep(self.arrival_delay).await;
        }

        let id = self.next_id;
        self.next_id += 1;

        let frame = RawFrame {
            id,
            payload: self.make_payload(id),
            captured_at: SystemTime::now(),
            attributes: vec![
                crate::frame::Attribute::new(
                    "source",
                    AttributeValue::String(self.source_id.clone()),
                ),
                crate::frame::Attribute::new("format", AttributeValue::String("h264".to_string())),
            ],
        };

        observability::record_frame_produced(&self.source_id);
        Ok(Some(frame))
    }
}
