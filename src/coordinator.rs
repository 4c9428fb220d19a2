//! Pipeline coordination across sources.

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::events::{EventReceiver, EventSender, PipelineEvent};
use crate::executor::BoundedExecutor;
use crate::frame::RawFrame;
use crate::processor::FrameProcessor;
use crate::sink::{FrameSink, NullSink};
use crate::source::VideoSource;
use crate::stream::{FrameStream, FrameStreamExt};
use crate::supervisor::{SourceOutcome, SourceSupervisor};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Aggregate report over one pipeline run.
///
/// Per-source failures are data here, not coordinator faults: the report
/// always covers every source, and all-sources-failed simply shows up as
/// `failure_count == outcomes.len()`.
#[derive(Debug)]
pub struct PipelineReport {
    /// Wall-clock time for the whole run.
    pub total_elapsed: Duration,
    /// Number of sources that completed.
    pub success_count: usize,
    /// Number of sources that failed.
    pub failure_count: usize,
    /// Total frames that completed the transform across all sources.
    pub total_frames_processed: u64,
    /// The per-source outcomes, in launch order.
    pub outcomes: Vec<SourceOutcome>,
}

impl PipelineReport {
    fn from_outcomes(total_elapsed: Duration, outcomes: Vec<SourceOutcome>) -> Self {
        let success_count = outcomes.iter().filter(|o| o.is_success()).count();
        Self {
            total_elapsed,
            success_count,
            failure_count: outcomes.len() - success_count,
            total_frames_processed: outcomes.iter().map(|o| o.frames_processed).sum(),
            outcomes,
        }
    }
}

/// Runs one supervisor per source concurrently and aggregates outcomes.
///
/// The coordinator owns the only resources shared across sources: the
/// bounded executor (the global concurrency ceiling) and the event feed.
/// Counters are aggregated from returned [`SourceOutcome`]s only, never
/// mutated concurrently by supervisors.
///
/// # Example
///
/// ```rust,ignore
/// use vidflow::prelude::*;
///
/// let config = PipelineConfig::default().with_max_concurrency(8);
/// let coordinator = PipelineCoordinator::new(config)?;
///
/// let report = coordinator
///     .run_simulated(vec!["cam-0".into(), "cam-1".into()])
///     .await;
/// println!("{} frames in {:?}", report.total_frames_processed, report.total_elapsed);
/// ```
pub struct PipelineCoordinator {
    config: PipelineConfig,
    processor: FrameProcessor,
    events: EventSender,
}

impl PipelineCoordinator {
    /// Build a coordinator, validating the configuration up front.
    ///
    /// The only fatal error class: invalid configuration fails here,
    /// before any source starts.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let executor = Arc::new(BoundedExecutor::new(config.max_concurrency)?);
        let processor =
            FrameProcessor::new(executor).with_work_duration(config.processing_work);
        let events = EventSender::new(config.event_capacity);
        Ok(Self {
            config,
            processor,
            events,
        })
    }

    /// Replace the per-frame processor (custom transform, different
    /// simulated cost). The supplied processor's executor becomes the
    /// shared concurrency ceiling for the whole run.
    pub fn with_processor(mut self, processor: FrameProcessor) -> Self {
        self.processor = processor;
        self
    }

    /// The shared bounded executor.
    pub fn executor(&self) -> &Arc<BoundedExecutor> {
        self.processor.executor()
    }

    /// The configuration this coordinator runs with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Subscribe to the pipeline event feed.
    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Run one supervisor per source, wiring each from `build`.
    ///
    /// `build` returns the (pre-composed) frame stream and the sink for a
    /// given source id. All supervisors run concurrently; a failure in one
    /// neither cancels nor blocks the others, and the coordinator waits
    /// for every supervisor to reach a terminal state before reporting.
    pub async fn run<S, K, B>(&self, source_ids: Vec<String>, mut build: B) -> PipelineReport
    where
        S: FrameStream<Item = RawFrame> + 'static,
        K: FrameSink + 'static,
        B: FnMut(&str) -> (S, K),
    {
        let started = Instant::now();
        tracing::info!(sources = source_ids.len(), "pipeline starting");
        self.events.send(PipelineEvent::Started {
            sources: source_ids.len(),
        });

        let mut handles = Vec::with_capacity(source_ids.len());
        for source_id in source_ids {
            let (stream, sink) = build(&source_id);
            let supervisor = SourceSupervisor::new(
                source_id.clone(),
                stream,
                sink,
                self.processor.clone(),
                self.config.batch_size,
                self.events.clone(),
            );
            handles.push((source_id, tokio::spawn(supervisor.run())));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (source_id, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                // A panicking supervisor is still just that source's failure.
                Err(e) => SourceOutcome::failure(
                    source_id,
                    0,
                    Error::Processing(format!("supervisor task panicked: {e}")),
                ),
            };
            outcomes.push(outcome);
        }

        let report = PipelineReport::from_outcomes(started.elapsed(), outcomes);
        tracing::info!(
            elapsed = ?report.total_elapsed,
            success = report.success_count,
            failed = report.failure_count,
            frames = report.total_frames_processed,
            "pipeline finished"
        );
        self.events.send(PipelineEvent::Finished {
            success: report.success_count,
            failed: report.failure_count,
        });
        report
    }

    /// Run the canonical simulated topology for the given sources.
    ///
    /// Each source is a [`VideoSource`] paced by the configured arrival
    /// delay, an even-id filter halves the frame rate, and batches land in
    /// a [`NullSink`] with the configured write delay.
    pub async fn run_simulated(&self, source_ids: Vec<String>) -> PipelineReport {
        let frames = self.config.frames_per_source;
        let arrival_delay = self.config.arrival_delay;
        let write_delay = self.config.sink_write_delay;

        self.run(source_ids, move |source_id| {
            let stream = VideoSource::new(source_id, frames)
                .with_arrival_delay(arrival_delay)
                .filter(even_ids as fn(&RawFrame) -> Result<bool>);
            let sink = NullSink::new().with_write_delay(write_delay);
            (stream, sink)
        })
        .await
    }
}

fn even_ids(frame: &RawFrame) -> Result<bool> {
    Ok(frame.id % 2 == 0)
}
