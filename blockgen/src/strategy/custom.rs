use super::{PlanStrategy, Ranges, plan_blocks};
use crate::{
    Error, Result,
    labels::Labels,
    sink::BlockSink,
    spec::{SeriesCharacteristics, SeriesSpec, SeriesType},
};
use blockgen_time::Time;
use parking_lot::Mutex;
use rand::{Rng, rngs::StdRng};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Environment variable overriding [`CustomMetricConfig::min`].
pub const MIN_GAUGE_ENV: &str = "MIN_GAUGE";
/// Environment variable overriding [`CustomMetricConfig::max`].
pub const MAX_GAUGE_ENV: &str = "MAX_GAUGE";

const DEFAULT_MIN: f64 = 2.0;
const DEFAULT_MAX: f64 = 8.0;
const DEFAULT_CHANGE_INTERVAL: Duration = Duration::from_secs(5 * 60);
const SCRAPE_INTERVAL: Duration = Duration::from_secs(15);

/// Value generation settings for [`CustomMetricStrategy`].
///
/// The defaults model small, noisy utilization-style gauges:
///
/// | field             | default                                    |
/// |-------------------|--------------------------------------------|
/// | `min`             | `2.0`                                      |
/// | `max`             | `8.0`                                      |
/// | `jitter`          | `None`: a random integer in `[1, 10]`, drawn once per plan |
/// | `change_interval` | 5 minutes                                  |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CustomMetricConfig {
    pub min: f64,
    pub max: f64,
    pub jitter: Option<f64>,
    pub change_interval: Duration,
}

impl Default for CustomMetricConfig {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN,
            max: DEFAULT_MAX,
            jitter: None,
            change_interval: DEFAULT_CHANGE_INTERVAL,
        }
    }
}

impl CustomMetricConfig {
    /// Builds a config from raw textual bounds, as found in [`MIN_GAUGE_ENV`] and
    /// [`MAX_GAUGE_ENV`]. Missing or unparsable values fall back to the defaults.
    pub fn from_raw(min: Option<&str>, max: Option<&str>) -> Self {
        Self {
            min: parse_or_default(MIN_GAUGE_ENV, min, DEFAULT_MIN),
            max: parse_or_default(MAX_GAUGE_ENV, max, DEFAULT_MAX),
            ..Default::default()
        }
    }

    /// Reads the bounds from the process environment once.
    pub fn from_env() -> Self {
        let min = std::env::var(MIN_GAUGE_ENV).ok();
        let max = std::env::var(MAX_GAUGE_ENV).ok();
        Self::from_raw(min.as_deref(), max.as_deref())
    }

    fn validate(&self) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(Error::invalid_configuration(format!(
                "gauge bounds must be finite, got min={} max={}",
                self.min, self.max
            )));
        }
        if self.min > self.max {
            return Err(Error::invalid_configuration(format!(
                "gauge min {} is greater than max {}",
                self.min, self.max
            )));
        }
        if let Some(jitter) = self.jitter {
            if !jitter.is_finite() || jitter < 0. {
                return Err(Error::invalid_configuration(format!(
                    "jitter must be a non-negative number, got {jitter}"
                )));
            }
        }
        if self.change_interval.is_zero() {
            return Err(Error::invalid_configuration(
                "change interval must be positive",
            ));
        }
        Ok(())
    }
}

fn parse_or_default(name: &str, raw: Option<&str>, default: f64) -> f64 {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return default;
    };
    match raw.parse::<f64>() {
        Ok(v) => v,
        Err(e) => {
            warn!(%name, value = %raw, error = %e, default, "ignoring unparsable gauge bound");
            default
        }
    }
}

/// Uniform blocks over an explicit list of metric names.
///
/// Every block gets one series per name spanning the whole block. Unless the config pins it, the
/// jitter is drawn once per plan from the strategy's random source, so all series of a run share
/// the same jitter while separate runs differ.
#[derive(Debug)]
pub struct CustomMetricStrategy {
    ranges: Ranges,
    apps: usize,
    metrics: Vec<String>,
    config: CustomMetricConfig,
    rng: Mutex<StdRng>,
}

impl CustomMetricStrategy {
    pub fn new(
        ranges: Vec<Duration>,
        apps: usize,
        metrics: Vec<String>,
        config: CustomMetricConfig,
        rng: StdRng,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ranges: Ranges::new(ranges)?,
            apps,
            metrics,
            config,
            rng: Mutex::new(rng),
        })
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    fn characteristics(&self) -> SeriesCharacteristics {
        let jitter = self
            .config
            .jitter
            .unwrap_or_else(|| f64::from(self.rng.lock().gen_range(1..=10u32)));
        debug!(jitter, "jitter for this plan");

        SeriesCharacteristics {
            max: self.config.max,
            min: self.config.min,
            jitter,
            scrape_interval: SCRAPE_INTERVAL,
            change_interval: self.config.change_interval,
        }
    }
}

impl PlanStrategy for CustomMetricStrategy {
    fn plan(
        &self,
        cancel: &CancellationToken,
        max_time: Time,
        external_labels: &Labels,
        sink: &mut dyn BlockSink,
    ) -> Result<()> {
        let characteristics = self.characteristics();

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
                    .extend(self.metrics.iter().map(|name| SeriesSpec {
                        window,
                        targets: self.apps,
                        series_type: SeriesType::Gauge,
                        labels: Labels::metric(name.as_str()),
                        characteristics,
                    }));
                Ok(())
            },
        )
    }

    fn kind(&self) -> &'static str {
        "custom"
    }

    fn ranges(&self) -> &[Duration] {
        self.ranges.durations()
    }
}
