//! Per-source supervision: wiring, failure isolation, outcome reporting.

use crate::error::{Error, Result};
use crate::events::{EventSender, PipelineEvent};
use crate::frame::{Batch, RawFrame};
use crate::processor::FrameProcessor;
use crate::sink::FrameSink;
use crate::stream::{FrameStream, FrameStreamExt};
use futures::future::try_join_all;

/// Lifecycle of a source supervisor.
///
/// `Created → Running` on the first pull; `Running → Completed` when the
/// upstream is exhausted and every batch is sunk; `Running → Failed` on
/// any unhandled failure from the stream, processing, or the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// Wired but not yet pulling.
    Created,
    /// Pulling frames and flushing batches.
    Running,
    /// Upstream exhausted, all batches flushed and sunk.
    Completed,
    /// A failure ended this source's run.
    Failed,
}

/// Terminal report of one source's run.
///
/// Produced exactly once per supervisor, on every exit path.
#[derive(Debug)]
pub struct SourceOutcome {
    /// The source identifier.
    pub source_id: String,
    /// Frames that completed the transform before termination. A batch the
    /// sink rejects still counts; frames still in flight when processing
    /// fails do not.
    pub frames_processed: u64,
    /// The failure that ended the run, if any.
    pub error: Option<Error>,
}

impl SourceOutcome {
    /// Outcome of a source that ran to completion.
    pub fn success(source_id: impl Into<String>, frames_processed: u64) -> Self {
        Self {
            source_id: source_id.into(),
            frames_processed,
            error: None,
        }
    }

    /// Outcome of a source that failed partway.
    pub fn failure(source_id: impl Into<String>, frames_processed: u64, error: Error) -> Self {
        Self {
            source_id: source_id.into(),
            frames_processed,
            error: Some(error),
        }
    }

    /// Whether the source completed without a failure.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Runs one source's subtree: source → operators → batch → concurrent
/// per-frame processing → sink.
///
/// The supervisor owns everything downstream of the (pre-composed) input
/// stream. Failures from any stage are caught at this boundary and turned
/// into the source's [`SourceOutcome`]; they never reach sibling
/// supervisors.
///
/// # Batch fan-out and ordering
///
/// For each group the batch operator emits, the supervisor processes every
/// frame concurrently (one task per frame, all bounded by the shared
/// executor) and then awaits the results in admission order. The emitted
/// [`Batch`] therefore preserves the upstream order even though completion
/// order is unordered. Downstream consumers rely on id-monotonic batches;
/// this is a contract, not an accident of the scheduler.
pub struct SourceSupervisor<S, K> {
    source_id: String,
    stream: Option<S>,
    sink: K,
    processor: FrameProcessor,
    batch_size: usize,
    events: EventSender,
    state: SupervisorState,
    frames_processed: u64,
}

impl<S, K> SourceSupervisor<S, K>
where
    S: FrameStream<Item = RawFrame>,
    K: FrameSink,
{
    /// Wire a supervisor for `source_id`.
    ///
    /// `stream` is the already-composed upstream (source plus any filter
    /// and map operators); the supervisor adds batching, bounded
    /// concurrent processing, and the sink hand-off.
    pub fn new(
        source_id: impl Into<String>,
        stream: S,
        sink: K,
        processor: FrameProcessor,
        batch_size: usize,
        events: EventSender,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            stream: Some(stream),
            sink,
            processor,
            batch_size,
            events,
            state: SupervisorState::Created,
            frames_processed: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// The source identifier.
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Run this source to a terminal state.
    ///
    /// Always returns exactly one [`SourceOutcome`], regardless of path.
    pub async fn run(mut self) -> SourceOutcome {
        self.state = SupervisorState::Running;
        self.events.send(PipelineEvent::SourceStarted {
            source: self.source_id.clone(),
        });
        tracing::debug!(source = %self.source_id, "supervisor running");

        match self.drive().await {
            Ok(()) => {
                self.state = SupervisorState::Completed;
                tracing::info!(
                    source = %self.source_id,
                    frames = self.frames_processed,
                    "source completed"
                );
                self.events.send(PipelineEvent::SourceCompleted {
                    source: self.source_id.clone(),
                    frames_processed: self.frames_processed,
                });
                SourceOutcome::success(self.source_id, self.frames_processed)
            }
            Err(error) => {
                self.state = SupervisorState::Failed;
                tracing::warn!(
                    source = %self.source_id,
                    frames = self.frames_processed,
                    error = %error,
                    "source failed"
                );
                self.events.send(PipelineEvent::SourceFailed {
                    source: self.source_id.clone(),
                    message: error.to_string(),
                });
                SourceOutcome::failure(self.source_id, self.frames_processed, error)
            }
        }
    }

    async fn drive(&mut self) -> Result<()> {
        let stream = self
            .stream
            .take()
            .ok_or_else(|| Error::Configuration("supervisor stream already consumed".into()))?;
        let mut batches = stream.batch(self.batch_size);

        while let Some(group) = batches.next().await? {
            let batch = Self::process_group(self.processor.clone(), group).await?;
            let frames = batch.len() as u64;
            // Frames count as processed once the transform finishes, even
            // if the sink then rejects the batch.
            self.frames_processed += frames;

            self.sink
                .accept(batch, &self.source_id)
                .await
                .map_err(|e| match e {
                    // Sink implementations may bubble up foreign errors;
                    // anything the sink returns is a sink failure here.
                    e @ Error::Sink(_) => e,
                    other => Error::Sink(other.to_string()),
                })?;

            self.events.send(PipelineEvent::BatchFlushed {
                source: self.source_id.clone(),
                frames: frames as usize,
            });
        }

        Ok(())
    }

    /// Fan out processing for one group and reassemble in admission order.
    ///
    /// Takes the processor by value so the fan-out borrows nothing from the
    /// supervisor; the `run` future stays spawnable without a `Sync` bound.
    async fn process_group(processor: FrameProcessor, group: Vec<RawFrame>) -> Result<Batch> {
        let mut handles = Vec::with_capacity(group.len());
        for frame in group {
            let processor = processor.clone();
            handles.push(tokio::spawn(async move { processor.process(frame).await }));
        }

        // try_join_all yields results in spawn order, so each frame lands
        // back at its original position; completion order does not matter.
        let results = try_join_all(handles)
            .await
            .map_err(|e| Error::Processing(format!("processing task panicked: {e}")))?;

        let mut frames = Vec::with_capacity(results.len());
        for processed in results {
            frames.push(processed?);
        }
        Ok(Batch::new(frames))
    }
}
