//! Live stream registry.
//!
//! A thin bookkeeping component for front ends (HTTP/SSE and the like)
//! that start, stop, and list named streams. Operations are simple point
//! mutations of one mapping, so a single mutex is all the coordination
//! this layer needs. Deliberately decoupled from the core pipeline types.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::SystemTime;

/// Status of one registered stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamStatus {
    /// The stream identifier.
    pub stream_id: String,
    /// Description of the stream's source (URL, device, label).
    pub source: String,
    /// When the stream was started.
    pub started_at: SystemTime,
}

/// In-memory mapping of live streams.
#[derive(Debug, Default)]
pub struct StreamRegistry {
    streams: Mutex<HashMap<String, StreamStatus>>,
}

impl StreamRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stream. Returns `false` if the id is already live.
    pub fn start(&self, stream_id: impl Into<String>, source: impl Into<String>) -> bool {
        let stream_id = stream_id.into();
        let mut streams = self.lock();
        if streams.contains_key(&stream_id) {
            return false;
        }
        let status = StreamStatus {
            stream_id: stream_id.clone(),
            source: source.into(),
            started_at: SystemTime::now(),
        };
        streams.insert(stream_id, status);
        true
    }

    /// Remove a stream. Returns `false` if the id was not live.
    pub fn stop(&self, stream_id: &str) -> bool {
        self.lock().remove(stream_id).is_some()
    }

    /// Snapshot of all live streams.
    pub fn list(&self) -> Vec<StreamStatus> {
        let mut streams: Vec<_> = self.lock().values().cloned().collect();
        streams.sort_by(|a, b| a.stream_id.cmp(&b.stream_id));
        streams
    }

    /// Status of one stream, if live.
    pub fn info(&self, stream_id: &str) -> Option<StreamStatus> {
        self.lock().get(stream_id).cloned()
    }

    /// Number of live streams.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no streams are live.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StreamStatus>> {
        self.streams
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_is_exclusive_per_id() {
        let registry = StreamRegistry::new();
        assert!(registry.start("cam-0", "rtsp://example/0"));
        assert!(!registry.start("cam-0", "rtsp://example/other"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_stop_unknown_stream() {
        let registry = StreamRegistry::new();
        assert!(!registry.stop("nope"));

        registry.start("cam-0", "src");
        assert!(registry.stop("cam-0"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_info_and_list() {
        let registry = StreamRegistry::new();
        registry.start("cam-1", "src-1");
        registry.start("cam-0", "src-0");

        let info = registry.info("cam-1").unwrap();
        assert_eq!(info.source, "src-1");
        assert!(registry.info("cam-9").is_none());

        let ids: Vec<_> = registry.list().into_iter().map(|s| s.stream_id).collect();
        assert_eq!(ids, vec!["cam-0", "cam-1"]);
    }

    #[test]
    fn test_registry_is_shareable_across_threads() {
        use std::sync::Arc;

        let registry = Arc::new(StreamRegistry::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(std::thread::spawn(move || {
                registry.start(format!("cam-{i}"), "src")
            }));
        }
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(registry.len(), 8);
    }
}
