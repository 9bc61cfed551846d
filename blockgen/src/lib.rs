//! Plans synthetic time-series storage blocks for benchmarking.
//!
//! A profile in the [`ProfileCatalog`] maps to a [`PlanStrategy`] that, given an upper time
//! bound and a set of external labels, emits an ordered stream of [`BlockSpec`]s (newest first)
//! into a [`BlockSink`]. Each block carries the [`SeriesSpec`]s an external encoder needs to
//! generate samples and write the block to disk. Block boundaries follow the alignment and level
//! stepping of a storage compactor so the generated data looks like what a real deployment
//! would have on disk.
//!
//! Planning is synchronous and streaming: only one block is held in memory at a time, and every
//! run can be cancelled through a [`CancellationToken`].
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(
    missing_debug_implementations,
    clippy::explicit_iter_loop,
    clippy::use_self,
    clippy::clone_on_ref_ptr
)]

pub mod align;
pub mod catalog;
pub mod labels;
pub mod profile;
pub mod sink;
pub mod spec;
pub mod strategy;

pub use align::align_forward;
pub use blockgen_time::Time;
pub use catalog::ProfileCatalog;
pub use labels::{Label, Labels};
pub use profile::{ProfileConfig, ProfileKind};
pub use sink::{BlockSink, BoxedError, JsonLinesSink};
pub use spec::{BlockMeta, BlockSpec, SeriesCharacteristics, SeriesSpec, SeriesType, TimeWindow};
pub use strategy::{
    ContinuousStrategy, CustomMetricConfig, CustomMetricStrategy, PlanStrategy, RolloutStrategy,
};
pub use tokio_util::sync::CancellationToken;

/// Errors that may happen while building or running a plan.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("planning was cancelled")]
    Cancelled,

    #[error("block sink failed: {0}")]
    SinkFailed(#[source] BoxedError),

    #[error("unknown profile '{name}'")]
    UnknownProfile { name: String },

    #[error("profile '{name}' is already registered")]
    DuplicateProfile { name: String },

    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("timestamp out of range: {millis}ms")]
    TimestampOutOfRange { millis: i64 },
}

impl Error {
    pub(crate) fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
