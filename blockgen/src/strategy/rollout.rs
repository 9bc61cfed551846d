use super::{PlanStrategy, Ranges, duration_millis, plan_blocks};
use crate::{
    Error, Result,
    labels::{Labels, METRIC_NAME},
    sink::BlockSink,
    spec::{SeriesCharacteristics, SeriesSpec, SeriesType, TimeWindow},
};
use blockgen_time::Time;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Label carrying the time of the rollout that created a series.
pub const NEXT_ROLLOUT_LABEL: &str = "next_rollout_time";

/// Simulates a continuously deployed fleet.
///
/// Every `rollout_interval` each application is redeployed and all of its series get a new
/// identity (a new `next_rollout_time` label value). Within a block this produces one set of
/// `metrics_per_app` series per rollout that overlaps the block, each bounded to the part of the
/// block during which that rollout was live. The first rollout is offset by half an interval
/// from the newest block boundary so rollouts never line up with block edges.
#[derive(Debug, Clone)]
pub struct RolloutStrategy {
    ranges: Ranges,
    rollout_interval: i64,
    apps: usize,
    metrics_per_app: usize,
}

impl RolloutStrategy {
    pub fn new(
        ranges: Vec<Duration>,
        rollout_interval: Duration,
        apps: usize,
        metrics_per_app: usize,
    ) -> Result<Self> {
        let ranges = Ranges::new(ranges)?;
        let rollout_interval = duration_millis("rollout interval", rollout_interval)?;
        if rollout_interval < 2 {
            return Err(Error::invalid_configuration(format!(
                "rollout interval must be at least 2ms, got {rollout_interval}ms"
            )));
        }

        Ok(Self {
            ranges,
            rollout_interval,
            apps,
            metrics_per_app,
        })
    }

    pub fn rollout_interval(&self) -> Duration {
        Duration::from_millis(self.rollout_interval as u64)
    }
}

impl PlanStrategy for RolloutStrategy {
    fn plan(
        &self,
        cancel: &CancellationToken,
        max_time: Time,
        external_labels: &Labels,
        sink: &mut dyn BlockSink,
    ) -> Result<()> {
        let interval = self.rollout_interval;
        // Seeded from the first (newest) block's end.
        let mut last_rollout: Option<i64> = None;

        plan_blocks(
            self.kind(),
            &self.ranges,
            cancel,
            max_time,
            external_labels,
            sink,
            |block| {
                let TimeWindow {
                    min_time: mint,
                    max_time: maxt,
                } = block.window();
                let cursor = last_rollout.get_or_insert(maxt - interval / 2);

                loop {
                    if cancel.is_cancelled() {
                        return Err(Error::Cancelled);
                    }

                    let smaxt = cursor.saturating_add(interval).min(maxt);
                    let smint = (*cursor).max(mint);

                    // The cursor can sit one past this block's end when the previous block
                    // started exactly on a rollout; that rollout has nothing to contribute here.
                    if let Some(window) = TimeWindow::new(smint, smaxt) {
                        trace!(rollout = *cursor, smint, smaxt, "rollout window");

                        let rolled_out_at = Time::from_timestamp_millis_opt(*cursor)
                            .ok_or(Error::TimestampOutOfRange { millis: *cursor })?
                            .to_human_string();
                        block.series.extend((0..self.metrics_per_app).map(|i| SeriesSpec {
                            window,
                            targets: self.apps,
                            series_type: SeriesType::Gauge,
                            labels: Labels::new([
                                (METRIC_NAME, format!("k8s_app_metric{i}")),
                                (NEXT_ROLLOUT_LABEL, rolled_out_at.clone()),
                            ]),
                            characteristics: SeriesCharacteristics::APP_GAUGE,
                        }));
                    }

                    if *cursor <= mint {
                        break;
                    }
                    *cursor = cursor
                        .checked_sub(interval)
                        .ok_or(Error::TimestampOutOfRange { millis: *cursor })?;
                }
                Ok(())
            },
        )
    }

    fn kind(&self) -> &'static str {
        "realistic"
    }

    fn ranges(&self) -> &[Duration] {
        self.ranges.durations()
    }
}
