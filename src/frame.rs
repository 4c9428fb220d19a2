//! Frame data types flowing through the pipeline.
//!
//! - [`RawFrame`]: a frame as captured from a source
//! - [`ProcessedFrame`]: the result of the per-frame transformation
//! - [`Batch`]: an ordered group of processed frames emitted to a sink

use bytes::Bytes;
use std::time::{Duration, SystemTime};

/// A key-value pair of frame metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Attribute name.
    pub key: String,
    /// Attribute value.
    pub value: AttributeValue,
}

impl Attribute {
    /// Create a new attribute.
    pub fn new(key: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Possible values for frame attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// String value.
    String(String),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Boolean value.
    Bool(bool),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

/// A raw frame produced by a source.
///
/// Immutable once produced. Frame ids are monotonic within one source's
/// sequence (starting at 0) but not globally unique across sources.
///
/// Cloning is cheap: the payload is a [`Bytes`] handle, so only reference
/// counts and the attribute vector are copied.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Monotonic frame id within the originating source.
    pub id: u64,
    /// Raw frame payload.
    pub payload: Bytes,
    /// Capture timestamp.
    pub captured_at: SystemTime,
    /// Extensible key-value metadata.
    pub attributes: Vec<Attribute>,
}

impl RawFrame {
    /// Create a new raw frame captured now.
    pub fn new(id: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            id,
            payload: payload.into(),
            captured_at: SystemTime::now(),
            attributes: Vec::new(),
        }
    }

    /// Attach an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.push(Attribute::new(key, value));
        self
    }

    /// Look up an attribute value by key.
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| &a.value)
    }
}

/// A frame after the CPU-bound transformation.
///
/// One-to-one with the [`RawFrame`] it was derived from: `id` and
/// `captured_at` are inherited unchanged.
#[derive(Debug, Clone)]
pub struct ProcessedFrame {
    /// Frame id, inherited from the originating raw frame.
    pub id: u64,
    /// Transformed payload.
    pub result: Bytes,
    /// Wall-clock duration of the transformation itself.
    pub processing_duration: Duration,
    /// Capture timestamp, copied from the originating raw frame.
    pub captured_at: SystemTime,
}

/// An ordered group of processed frames emitted to a sink as one unit.
///
/// A batch holds at most the configured batch size; the final batch of a
/// source may be smaller (partial flush). Element order matches the order
/// in which frames were admitted to the batch upstream, even though the
/// frames were processed concurrently.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    frames: Vec<ProcessedFrame>,
}

impl Batch {
    /// Create a batch from frames, preserving their order.
    pub fn new(frames: Vec<ProcessedFrame>) -> Self {
        Self { frames }
    }

    /// Number of frames in the batch.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The frames in this batch, in admission order.
    pub fn frames(&self) -> &[ProcessedFrame] {
        &self.frames
    }

    /// Consume the batch, yielding its frames.
    pub fn into_frames(self) -> Vec<ProcessedFrame> {
        self.frames
    }

    /// Frame ids in batch order.
    pub fn ids(&self) -> Vec<u64> {
        self.frames.iter().map(|f| f.id).collect()
    }

    /// Check that frame ids are strictly increasing within the batch.
    pub fn is_id_ordered(&self) -> bool {
        self.frames.windows(2).all(|w| w[0].id < w[1].id)
    }
}

impl IntoIterator for Batch {
    type Item = ProcessedFrame;
    type IntoIter = std::vec::IntoIter<ProcessedFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processed(id: u64) -> ProcessedFrame {
        ProcessedFrame {
            id,
            result: Bytes::from_static(b"out"),
            processing_duration: Duration::from_millis(1),
            captured_at: SystemTime::now(),
        }
    }

    #[test]
    fn test_raw_frame_attributes() {
        let frame = RawFrame::new(7, "data")
            .with_attribute("source", AttributeValue::String("cam-0".into()))
            .with_attribute("keyframe", AttributeValue::Bool(true));

        assert_eq!(frame.id, 7);
        assert_eq!(
            frame.attribute("source"),
            Some(&AttributeValue::String("cam-0".into()))
        );
        assert_eq!(frame.attribute("missing"), None);
    }

    #[test]
    fn test_batch_ids_and_order() {
        let batch = Batch::new(vec![processed(0), processed(2), processed(4)]);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.ids(), vec![0, 2, 4]);
        assert!(batch.is_id_ordered());

        let unordered = Batch::new(vec![processed(2), processed(0)]);
        assert!(!unordered.is_id_ordered());
    }

    #[test]
    fn test_empty_batch() {
        let batch = Batch::default();
        assert!(batch.is_empty());
        assert!(batch.is_id_ordered());
    }
}
