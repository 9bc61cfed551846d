//! Block and series specifications handed from the planner to a block encoder.

use crate::labels::Labels;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Provenance recorded in the metadata of every planned block.
pub const BLOCK_SOURCE: &str = "blockgen";

/// Millisecond time range, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub min_time: i64,
    pub max_time: i64,
}

impl TimeWindow {
    /// Returns `None` if `min_time > max_time`.
    pub fn new(min_time: i64, max_time: i64) -> Option<Self> {
        (min_time <= max_time).then_some(Self { min_time, max_time })
    }

    pub fn contains(&self, other: &Self) -> bool {
        self.min_time <= other.min_time && other.max_time <= self.max_time
    }

    /// Number of milliseconds covered by the window.
    pub fn width(&self) -> i64 {
        self.max_time - self.min_time + 1
    }
}

/// Parameters for the external sample generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesCharacteristics {
    pub max: f64,
    pub min: f64,
    pub jitter: f64,
    #[serde(with = "humantime_serde")]
    pub scrape_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub change_interval: Duration,
}

impl SeriesCharacteristics {
    /// Large gauges that drift every hour, used by the synthetic app profiles.
    pub const APP_GAUGE: Self = Self {
        max: 200_000_000.,
        min: 10_000_000.,
        jitter: 30_000_000.,
        scrape_interval: Duration::from_secs(15),
        change_interval: Duration::from_secs(60 * 60),
    };
}

/// Kind of series the encoder should generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesType {
    Gauge,
}

/// One logical series family within a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    pub window: TimeWindow,
    /// How many independent instances emit this series.
    pub targets: usize,
    #[serde(rename = "type")]
    pub series_type: SeriesType,
    pub labels: Labels,
    pub characteristics: SeriesCharacteristics,
}

/// Block level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMeta {
    pub window: TimeWindow,
    pub compaction_level: u32,
    pub version: u32,
    pub external_labels: BTreeMap<String, String>,
    pub downsample_resolution: i64,
    pub source: String,
}

/// One planned block: metadata plus the series it contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSpec {
    pub meta: BlockMeta,
    pub series: Vec<SeriesSpec>,
}

impl BlockSpec {
    /// A freshly compacted (level 1), raw resolution block with no series yet.
    pub fn new(window: TimeWindow, external_labels: BTreeMap<String, String>) -> Self {
        Self {
            meta: BlockMeta {
                window,
                compaction_level: 1,
                version: 1,
                external_labels,
                downsample_resolution: 0,
                source: BLOCK_SOURCE.to_string(),
            },
            series: vec![],
        }
    }

    pub fn window(&self) -> TimeWindow {
        self.meta.window
    }

    /// Total number of series the block will contain once every target is generated.
    pub fn total_series(&self) -> usize {
        self.series.iter().map(|s| s.targets).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_bounds() {
        assert!(TimeWindow::new(2, 1).is_none());

        let w = TimeWindow::new(1, 7_200_000).unwrap();
        assert_eq!(w.width(), 7_200_000);
        assert!(w.contains(&TimeWindow::new(1, 1).unwrap()));
        assert!(w.contains(&w));
        assert!(!w.contains(&TimeWindow::new(0, 5).unwrap()));
        assert!(!w.contains(&TimeWindow::new(5, 7_200_001).unwrap()));
    }

    #[test]
    fn new_block_meta() {
        let w = TimeWindow::new(1, 10).unwrap();
        let external = BTreeMap::from([("cluster".to_string(), "eu-1".to_string())]);
        let block = BlockSpec::new(w, external.clone());

        assert_eq!(block.window(), w);
        assert_eq!(block.meta.compaction_level, 1);
        assert_eq!(block.meta.version, 1);
        assert_eq!(block.meta.downsample_resolution, 0);
        assert_eq!(block.meta.source, "blockgen");
        assert_eq!(block.meta.external_labels, external);
        assert!(block.series.is_empty());
        assert_eq!(block.total_series(), 0);
    }

    #[test]
    fn serializes_durations_readably() {
        let block = BlockSpec {
            series: vec![SeriesSpec {
                window: TimeWindow::new(1, 10).unwrap(),
                targets: 3,
                series_type: SeriesType::Gauge,
                labels: Labels::metric("up"),
                characteristics: SeriesCharacteristics::APP_GAUGE,
            }],
            ..BlockSpec::new(TimeWindow::new(1, 10).unwrap(), BTreeMap::new())
        };

        let json = serde_json::to_value(&block).unwrap();
        let series = &json["series"][0];
        assert_eq!(series["type"], "gauge");
        assert_eq!(series["targets"], 3);
        assert_eq!(series["characteristics"]["scrape_interval"], "15s");
        assert_eq!(series["characteristics"]["change_interval"], "1h");
        assert_eq!(series["labels"][0]["name"], "__name__");
        assert_eq!(block.total_series(), 3);

        let back: BlockSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back, block);
    }
}
