//! Planning strategies: how a profile turns into a stream of blocks.

use crate::{
    Error, Result,
    align::{RAW_BLOCK_WIDTH_MS, align_forward},
    labels::Labels,
    sink::BlockSink,
    spec::{BlockSpec, TimeWindow},
};
use blockgen_time::Time;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

mod continuous;
mod custom;
mod rollout;

pub use continuous::ContinuousStrategy;
pub use custom::{CustomMetricConfig, CustomMetricStrategy, MAX_GAUGE_ENV, MIN_GAUGE_ENV};
pub use rollout::{NEXT_ROLLOUT_LABEL, RolloutStrategy};

/// A way of planning blocks for a profile.
///
/// Implementations walk their configured block widths from the newest block to the oldest one,
/// handing each finished block to the sink before building the next. `max_time` is the upper
/// bound of the newest block before alignment; `external_labels` are copied into the metadata
/// of every block.
///
/// Planning stops with [`Error::Cancelled`] as soon as `cancel` is observed, and with
/// [`Error::SinkFailed`] as soon as the sink returns an error. Blocks already accepted by the
/// sink stay accepted.
pub trait PlanStrategy: std::fmt::Debug + Send + Sync {
    fn plan(
        &self,
        cancel: &CancellationToken,
        max_time: Time,
        external_labels: &Labels,
        sink: &mut dyn BlockSink,
    ) -> Result<()>;

    /// Short name of the strategy, used when listing profiles.
    fn kind(&self) -> &'static str;

    /// Block widths, newest first.
    fn ranges(&self) -> &[Duration];
}

/// Validated, newest-first sequence of block widths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Ranges {
    durations: Vec<Duration>,
    millis: Vec<i64>,
}

impl Ranges {
    pub(crate) fn new(durations: Vec<Duration>) -> Result<Self> {
        let millis = durations
            .iter()
            .map(|d| duration_millis("block range", *d))
            .collect::<Result<_>>()?;
        Ok(Self { durations, millis })
    }

    pub(crate) fn durations(&self) -> &[Duration] {
        &self.durations
    }
}

/// Converts `d` to whole milliseconds, rejecting zero widths and widths that overflow `i64`.
pub(crate) fn duration_millis(what: &str, d: Duration) -> Result<i64> {
    let millis = i64::try_from(d.as_millis()).map_err(|_| {
        Error::invalid_configuration(format!("{what} {d:?} does not fit in milliseconds"))
    })?;
    if millis <= 0 {
        return Err(Error::invalid_configuration(format!(
            "{what} must be at least 1ms, got {d:?}"
        )));
    }
    Ok(millis)
}

/// Drives the block loop shared by every strategy.
///
/// Aligns `max_time` to the raw block grid, then for each width builds an empty block, lets
/// `fill` add series to it and hands it to the sink. Consecutive blocks are contiguous: the next
/// block ends one millisecond before the previous one starts.
pub(crate) fn plan_blocks<F>(
    kind: &'static str,
    ranges: &Ranges,
    cancel: &CancellationToken,
    max_time: Time,
    external_labels: &Labels,
    sink: &mut dyn BlockSink,
    mut fill: F,
) -> Result<()>
where
    F: FnMut(&mut BlockSpec) -> Result<()>,
{
    let mut maxt = align_forward(max_time.timestamp_millis(), RAW_BLOCK_WIDTH_MS)?;
    let external = external_labels.to_map();

    info!(
        kind,
        blocks = ranges.millis.len(),
        max_time = %max_time,
        aligned_max_time = maxt,
        "planning blocks"
    );

    let mut series_total = 0;
    for (i, &width) in ranges.millis.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mint = maxt
            .checked_sub(width - 1)
            .ok_or(Error::TimestampOutOfRange { millis: maxt })?;
        let window = TimeWindow {
            min_time: mint,
            max_time: maxt,
        };

        let mut block = BlockSpec::new(window, external.clone());
        fill(&mut block)?;

        debug!(
            block = i,
            min_time = mint,
            max_time = maxt,
            series = block.series.len(),
            "block planned"
        );
        series_total += block.series.len();
        sink.accept(block).map_err(Error::SinkFailed)?;

        maxt = mint
            .checked_sub(1)
            .ok_or(Error::TimestampOutOfRange { millis: mint })?;
    }

    info!(
        kind,
        blocks = ranges.millis.len(),
        series = series_total,
        "plan complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::BoxedError;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    #[test]
    fn ranges_validation() {
        let r = Ranges::new(vec![2 * HOUR, 8 * HOUR]).unwrap();
        assert_eq!(r.millis, [7_200_000, 28_800_000]);
        assert_eq!(r.durations(), [2 * HOUR, 8 * HOUR]);

        assert!(Ranges::new(vec![]).unwrap().millis.is_empty());

        for bad in [Duration::ZERO, Duration::from_micros(999), Duration::MAX] {
            let err = Ranges::new(vec![2 * HOUR, bad]).unwrap_err();
            assert!(
                matches!(err, Error::InvalidConfiguration { .. }),
                "{bad:?}: {err}"
            );
        }
    }

    #[test]
    fn blocks_are_contiguous_and_aligned() {
        let ranges = Ranges::new(vec![2 * HOUR, 2 * HOUR, 8 * HOUR]).unwrap();
        let mut windows = vec![];
        let mut sink = |b: BlockSpec| -> Result<(), BoxedError> {
            windows.push(b.window());
            Ok(())
        };

        plan_blocks(
            "test",
            &ranges,
            &CancellationToken::new(),
            Time::from_timestamp_millis(7_200_001),
            &Labels::default(),
            &mut sink,
            |_| Ok(()),
        )
        .unwrap();

        assert_eq!(
            windows,
            [
                TimeWindow::new(7_200_001, 14_400_000).unwrap(),
                TimeWindow::new(1, 7_200_000).unwrap(),
                TimeWindow::new(-28_799_999, 0).unwrap(),
            ]
        );
    }

    #[test]
    fn fill_errors_stop_before_the_sink() {
        let ranges = Ranges::new(vec![2 * HOUR]).unwrap();
        let mut calls = 0;
        let mut sink = |_: BlockSpec| -> Result<(), BoxedError> {
            calls += 1;
            Ok(())
        };

        let err = plan_blocks(
            "test",
            &ranges,
            &CancellationToken::new(),
            Time::from_timestamp_millis(0),
            &Labels::default(),
            &mut sink,
            |_| Err(Error::Cancelled),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(calls, 0);
    }
}
