//! Pipeline configuration.

use crate::error::{Error, Result};
use std::time::Duration;

/// Configuration for a pipeline run.
///
/// Defaults model a live feed: 100 frames per source arriving every 10ms,
/// a 50ms CPU-bound transform, batches of 5, and at most 10 transforms
/// in flight across all sources.
///
/// # Example
///
/// ```rust
/// use vidflow::config::PipelineConfig;
/// use std::time::Duration;
///
/// let config = PipelineConfig::default()
///     .with_max_concurrency(4)
///     .with_batch_size(3)
///     .with_frames_per_source(12)
///     .with_arrival_delay(Duration::from_millis(1));
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Hard ceiling on concurrently executing per-frame transforms,
    /// shared across all sources.
    pub max_concurrency: usize,
    /// Number of frames accumulated before a batch is emitted.
    pub batch_size: usize,
    /// Number of frames each simulated source produces.
    pub frames_per_source: u64,
    /// Simulated capture/network latency before each frame is yielded.
    pub arrival_delay: Duration,
    /// Simulated CPU cost of the per-frame transform.
    pub processing_work: Duration,
    /// Simulated sink write latency per batch.
    pub sink_write_delay: Duration,
    /// Capacity of the pipeline event broadcast channel.
    pub event_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 10,
            batch_size: 5,
            frames_per_source: 100,
            arrival_delay: Duration::from_millis(10),
            processing_work: Duration::from_millis(50),
            sink_write_delay: Duration::from_millis(10),
            event_capacity: 256,
        }
    }
}

impl PipelineConfig {
    /// Set the shared transform concurrency ceiling.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set how many frames each simulated source produces.
    pub fn with_frames_per_source(mut self, count: u64) -> Self {
        self.frames_per_source = count;
        self
    }

    /// Set the simulated frame arrival delay.
    pub fn with_arrival_delay(mut self, delay: Duration) -> Self {
        self.arrival_delay = delay;
        self
    }

    /// Set the simulated CPU cost per transform.
    pub fn with_processing_work(mut self, work: Duration) -> Self {
        self.processing_work = work;
        self
    }

    /// Set the simulated sink write latency.
    pub fn with_sink_write_delay(mut self, delay: Duration) -> Self {
        self.sink_write_delay = delay;
        self
    }

    /// Set the event channel capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Validate the configuration.
    ///
    /// Fails fast before any source starts: a zero batch size or a zero
    /// concurrency limit cannot produce a meaningful pipeline.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(Error::Configuration(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(Error::Configuration(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(Error::Configuration(
                "event_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = PipelineConfig::default().with_batch_size(0);
        assert!(matches!(
            config.validate(),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = PipelineConfig::default().with_max_concurrency(0);
        assert!(matches!(
            config.validate(),
            Err(Error::Configuration(_))
        ));
    }
}
