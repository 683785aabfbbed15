//! flurry: intake for usage-event files dropped into object storage.
//!
//! Each uploaded CSV, JSON or JSONL file is decoded, its records normalized
//! and validated, and the valid events split into batches of at most
//! [`MAX_EVENTS_PER_INGEST_BATCH`] that are dispatched downstream for
//! billing ingestion. Anything that goes wrong along the way is written to
//! a diagnostics log.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use flurry::{BatchForwarder, ChannelSink, Config, IngestPipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), flurry::error::PipelineError> {
//!     flurry::init_tracing();
//!     let config = Config::from_env()?;
//!     let (sink, rx) = ChannelSink::new(&config.dispatch.target, config.dispatch.channel_capacity);
//!     let pipeline = IngestPipeline::from_config(&config, Arc::new(sink)).await?;
//!
//!     let forwarder = BatchForwarder::new(Arc::new(my_api()), pipeline.diagnostics());
//!     tokio::spawn(forwarder.run(rx));
//!
//!     let reports = pipeline.handle_event(&notification_body()).await?;
//!     println!("{} files processed", reports.len());
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod diagnostics;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod forward;
pub mod metrics;
pub mod pipeline;
pub mod source;
pub mod storage;
mod tracing;

// Re-export main types
pub use batch::{Batch, MAX_EVENTS_PER_INGEST_BATCH, partition};
pub use config::Config;
pub use diagnostics::{DiagnosticsEmitter, EmitOutcome, LogEntry, LogSink, StorageLogSink};
pub use dispatch::{Ack, ChannelSink, DispatchCoordinator, DispatchReport, DispatchSink};
pub use event::{Candidate, Event};
pub use forward::{BatchForwarder, UsageIngestApi};
pub use pipeline::{FileOutcome, FileReport, IngestPipeline};
pub use source::{FileFormat, Notification, ObjectFetcher, StorageFetcher};
pub use storage::{StorageProvider, StorageProviderRef};
pub use crate::tracing::init_tracing;
