//! Incremental discovery for hookwatch.
//!
//! Tracks a per-source watermark, decides which fetched items are new, and
//! drives the per-tick pipeline: fetch → discover → format → deliver.

pub mod discovery;
pub mod error;
pub mod locks;
pub mod pipeline;
pub mod report;
pub mod watermark;

pub use discovery::{Discovery, DiscoveryEngine};
pub use error::PollError;
pub use pipeline::{Poller, PollerConfig};
pub use report::{SourceReport, TickReport};
pub use watermark::{Clock, InMemoryWatermarks, WatermarkStore};
