use super::{PlanStrategy, Ranges, plan_blocks};
use crate::{
    Result,
    labels::Labels,
    sink::BlockSink,
    spec::{SeriesCharacteristics, SeriesSpec, SeriesType},
};
use blockgen_time::Time;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Stable series with no churn: every block gets the same `metrics_per_app` series, each
/// spanning the whole block.
#[derive(Debug, Clone)]
pub struct ContinuousStrategy {
    ranges: Ranges,
    apps: usize,
    metrics_per_app: usize,
}

impl ContinuousStrategy {
    pub fn new(ranges: Vec<Duration>, apps: usize, metrics_per_app: usize) -> Result<Self> {
        Ok(Self {
            ranges: Ranges::new(ranges)?,
            apps,
            metrics_per_app,
        })
    }
}

impl PlanStrategy for ContinuousStrategy {
    fn plan(
        &self,
        cancel: &CancellationToken,
        max_time: Time,
        external_labels: &Labels,
        sink: &mut dyn BlockSink,
    ) -> Result<()> {
        plan_blocks(
            self.kind(),
            &self.ranges,
            cancel,
            max_time,
            external_labels,
            sink,
            |block| {
                let window = block.window();
                block
                    .series
                    .extend((0..self.metrics_per_app).map(|i| SeriesSpec {
                        window,
                        targets: self.apps,
                        series_type: SeriesType::Gauge,
                        labels: Labels::metric(format!("continuous_app_metric{i}")),
                        characteristics: SeriesCharacteristics::APP_GAUGE,
                    }));
                Ok(())
            },
        )
    }

    fn kind(&self) -> &'static str {
        "continuous"
    }

    fn ranges(&self) -> &[Duration] {
        self.ranges.durations()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, sink::BoxedError, spec::BlockSpec, spec::TimeWindow};

    const HOUR: Duration = Duration::from_secs(60 * 60);

    #[test_log::test]
    fn single_raw_block() {
        let strategy = ContinuousStrategy::new(vec![2 * HOUR], 3, 2).unwrap();
        let mut blocks = vec![];
        let mut sink = |b: BlockSpec| -> Result<(), BoxedError> {
            blocks.push(b);
            Ok(())
        };

        strategy
            .plan(
                &CancellationToken::new(),
                Time::from_timestamp_millis(0),
                &Labels::default(),
                &mut sink,
            )
            .unwrap();

        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        let window = TimeWindow::new(1, 7_200_000).unwrap();
        assert_eq!(block.window(), window);
        assert!(block.meta.external_labels.is_empty());

        let names: Vec<_> = block
            .series
            .iter()
            .map(|s| s.labels.metric_name().unwrap())
            .collect();
        assert_eq!(names, ["continuous_app_metric0", "continuous_app_metric1"]);
        for s in &block.series {
            assert_eq!(s.targets, 3);
            assert_eq!(s.window, window);
            assert_eq!(s.labels.len(), 1);
        }
        assert_eq!(block.total_series(), 6);
    }

    #[test]
    fn invalid_ranges() {
        let err = ContinuousStrategy::new(vec![2 * HOUR, Duration::ZERO], 1, 1).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration { .. }), "{err}");
    }

    #[test]
    fn describes_itself() {
        let strategy = ContinuousStrategy::new(vec![2 * HOUR, 8 * HOUR], 1, 1).unwrap();
        assert_eq!(strategy.kind(), "continuous");
        assert_eq!(strategy.ranges(), [2 * HOUR, 8 * HOUR]);
    }
}
