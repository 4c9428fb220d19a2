//! # vidflow
//!
//! A reactive video stream processing engine with bounded concurrency.
//!
//! vidflow ingests multiple independent frame streams, transforms each
//! frame through a pipeline of composable operators, and bounds the total
//! concurrent CPU-bound work so heavy processing cannot exhaust system
//! resources.
//!
//! ## Architecture
//!
//! - **Frame sources**: lazy async sequences of raw frames, paced by a
//!   simulated arrival rate
//! - **Operators**: `filter`, `map`, and `batch`, composable in any order
//! - **Bounded executor**: a shared slot pool capping in-flight transforms
//!   across *all* sources
//! - **Source supervisors**: one per source, isolating failures and
//!   reporting exactly one outcome each
//! - **Pipeline coordinator**: runs all supervisors concurrently and
//!   aggregates a report
//!
//! Data flows strictly downstream (source → operators → bounded processing
//! → sink); control flows upward only as completion and failure signals.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vidflow::prelude::*;
//!
//! let config = PipelineConfig::default()
//!     .with_max_concurrency(8)
//!     .with_batch_size(5);
//!
//! let coordinator = PipelineCoordinator::new(config)?;
//! let report = coordinator
//!     .run_simulated(vec!["cam-0".into(), "cam-1".into()])
//!     .await;
//!
//! println!(
//!     "{} frames across {} sources in {:?}",
//!     report.total_frames_processed,
//!     report.success_count,
//!     report.total_elapsed,
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod executor;
pub mod frame;
pub mod observability;
pub mod processor;
pub mod registry;
pub mod sink;
pub mod source;
pub mod stream;
pub mod supervisor;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::coordinator::{PipelineCoordinator, PipelineReport};
    pub use crate::error::{Error, Result};
    pub use crate::events::{EventReceiver, EventSender, PipelineEvent};
    pub use crate::executor::{BoundedExecutor, SlotPermit};
    pub use crate::frame::{Batch, ProcessedFrame, RawFrame};
    pub use crate::processor::FrameProcessor;
    pub use crate::sink::{CollectSink, ConsoleSink, FrameSink, NullSink};
    pub use crate::source::VideoSource;
    pub use crate::stream::{FrameStream, FrameStreamExt};
    pub use crate::supervisor::{SourceOutcome, SourceSupervisor, SupervisorState};
}

pub use error::{Error, Result};
