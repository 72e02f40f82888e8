//! Pipeline orchestration.
//!
//! Resolves a query, then fetches and extracts each result in rank order.
//! Per-URL failures are recorded in the report, never raised.

mod cancellation;
mod observer;
mod orchestrator;
mod retry;

pub use cancellation::CancellationToken;
pub use observer::{
    ChannelProgressObserver, LoggingProgressObserver, NoOpProgressObserver, ProgressEvent,
    ProgressObserver, ProgressUpdate,
};
pub use orchestrator::{run, Pipeline};
pub use retry::{is_retryable, retry_delay};
