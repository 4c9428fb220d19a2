//! Pipeline event feed.
//!
//! Supervisors and the coordinator emit events as sources progress; any
//! number of receivers (status endpoints, SSE adapters, tests) can
//! subscribe without coupling to the core types. Events are broadcast
//! best-effort: a slow receiver may lag and skip ahead, senders never
//! block.

use std::fmt;
use tokio::sync::broadcast;

/// Events emitted during a pipeline run.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// The coordinator launched its supervisors.
    Started {
        /// Number of sources being run.
        sources: usize,
    },

    /// A source supervisor began pulling frames.
    SourceStarted {
        /// The source identifier.
        source: String,
    },

    /// A batch was accepted by the sink.
    BatchFlushed {
        /// The source identifier.
        source: String,
        /// Number of frames in the batch.
        frames: usize,
    },

    /// A source completed successfully.
    SourceCompleted {
        /// The source identifier.
        source: String,
        /// Total frames this source put through the transform.
        frames_processed: u64,
    },

    /// A source failed; siblings are unaffected.
    SourceFailed {
        /// The source identifier.
        source: String,
        /// The failure, rendered.
        message: String,
    },

    /// All supervisors reached a terminal state.
    Finished {
        /// Number of sources that completed.
        success: usize,
        /// Number of sources that failed.
        failed: usize,
    },
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineEvent::Started { sources } => {
                write!(f, "pipeline started ({sources} sources)")
            }
            PipelineEvent::SourceStarted { source } => write!(f, "source {source} started"),
            PipelineEvent::BatchFlushed { source, frames } => {
                write!(f, "source {source} flushed batch of {frames}")
            }
            PipelineEvent::SourceCompleted {
                source,
                frames_processed,
            } => write!(f, "source {source} completed ({frames_processed} frames)"),
            PipelineEvent::SourceFailed { source, message } => {
                write!(f, "source {source} failed: {message}")
            }
            PipelineEvent::Finished { success, failed } => {
                write!(f, "pipeline finished ({success} succeeded, {failed} failed)")
            }
        }
    }
}

/// Sender side of the event feed.
///
/// Held by the coordinator and cloned into each supervisor.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: broadcast::Sender<PipelineEvent>,
}

impl EventSender {
    /// Create a sender with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Send an event.
    ///
    /// Returns the number of receivers that got it; 0 when nobody is
    /// subscribed, which is fine.
    pub fn send(&self, event: PipelineEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe a new receiver.
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for EventSender {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Receiver side of the event feed.
#[derive(Debug)]
pub struct EventReceiver {
    receiver: broadcast::Receiver<PipelineEvent>,
}

impl EventReceiver {
    /// Receive the next event.
    ///
    /// Skips over lagged gaps; returns `None` once all senders are gone.
    pub async fn recv(&mut self) -> Option<PipelineEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Receive an event without suspending, if one is ready.
    pub fn try_recv(&mut self) -> Option<PipelineEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
