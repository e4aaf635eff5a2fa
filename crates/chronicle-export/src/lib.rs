//! Export engine: reads a channel's history through the rate-limited client
//! and materialises it as local archive files.
//!
//! The library surface is [`export_channel`]: one call per channel, driven by
//! an [`ExportRequest`]. Failures carry an [`is_fatal`](ExportError::is_fatal)
//! flag so multi-channel callers know whether to abort or skip.

pub mod assets;
pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod partition;
pub mod path_template;
pub mod pipeline;
pub mod sink;
pub mod writers;

pub use config::{ExportFormat, ExportOptions, ExportRequest};
pub use context::ExportContext;
pub use error::{ExportError, Result};
pub use filter::{ContentKind, MessageFilter};
pub use partition::{FileSize, PartitionLimit};
pub use pipeline::{
    export_channel, export_channel_with_cancellation, CancelFlag, ExportSummary,
};

pub use chronicle_client::{ProgressFn, RateLimitPreference};
pub use chronicle_model as model;
