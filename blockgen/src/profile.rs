//! Profile configurations: the data from which planning strategies are built.

use crate::{
    Result,
    strategy::{
        ContinuousStrategy, CustomMetricConfig, CustomMetricStrategy, PlanStrategy,
        RolloutStrategy,
    },
};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Block widths in hours, newest first, the way a compactor would leave two days of data.
pub const TWO_DAYS: &[u32] = &[2, 2, 2, 8, 8, 8, 8, 8, 2];
/// One week of blocks, newest first.
pub const ONE_WEEK: &[u32] = &[2, 2, 2, 8, 8, 48, 48, 48, 2];
/// Thirty days of blocks, newest first.
pub const THIRTY_DAYS: &[u32] = &[2, 2, 2, 8, 176, 176, 176, 176, 2];
/// One year of blocks, newest first.
pub const ONE_YEAR: &[u32] = &[
    2, 2, 2, 8, 176, 176, 176, 176, 1608, 1608, 1608, 1608, 1608,
];

/// Recording rule outputs used by the resource-sizing dashboards.
const RESOURCE_SIZING_METRICS: &[&str] = &[
    "acm_rs:namespace:cpu_request",
    "acm_rs:namespace:cpu_usage",
    "acm_rs:namespace:memory_request",
    "acm_rs:namespace:memory_usage",
    "acm_rs:namespace:cpu_recommendation",
    "acm_rs:namespace:memory_recommendation",
    "acm_rs:cluster:cpu_request",
    "acm_rs:cluster:cpu_usage",
    "acm_rs:cluster:memory_request",
    "acm_rs:cluster:memory_usage",
    "acm_rs:cluster:cpu_recommendation",
    "acm_rs:cluster:memory_recommendation",
];

const HOUR: Duration = Duration::from_secs(60 * 60);

/// Converts a list of hour counts into durations.
pub fn hours(hours: &[u32]) -> Vec<Duration> {
    hours.iter().map(|h| HOUR * *h).collect()
}

/// The strategy behind a profile together with its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProfileKind {
    /// See [`RolloutStrategy`].
    Realistic {
        #[serde(with = "humantime_serde")]
        rollout_interval: Duration,
        apps: usize,
        metrics_per_app: usize,
    },
    /// See [`ContinuousStrategy`].
    Continuous { apps: usize, metrics_per_app: usize },
    /// See [`CustomMetricStrategy`].
    CustomMetrics { apps: usize, metrics: Vec<String> },
}

/// A named profile.
///
/// Serialized as a flat object, for example:
///
/// ```json
/// {"name": "k8s-3d", "kind": "realistic", "rollout_interval": "30m",
///  "apps": 10, "metrics_per_app": 5, "ranges": ["2h", "2h", "8h", "48h"]}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub name: String,
    #[serde(flatten)]
    pub kind: ProfileKind,
    /// Block widths, newest first.
    #[serde(with = "duration_list")]
    pub ranges: Vec<Duration>,
}

impl ProfileConfig {
    pub fn realistic(
        name: impl Into<String>,
        ranges: Vec<Duration>,
        rollout_interval: Duration,
        apps: usize,
        metrics_per_app: usize,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ProfileKind::Realistic {
                rollout_interval,
                apps,
                metrics_per_app,
            },
            ranges,
        }
    }

    pub fn continuous(
        name: impl Into<String>,
        ranges: Vec<Duration>,
        apps: usize,
        metrics_per_app: usize,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ProfileKind::Continuous {
                apps,
                metrics_per_app,
            },
            ranges,
        }
    }

    pub fn custom_metrics<I, S>(
        name: impl Into<String>,
        ranges: Vec<Duration>,
        apps: usize,
        metrics: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind: ProfileKind::CustomMetrics {
                apps,
                metrics: metrics.into_iter().map(Into::into).collect(),
            },
            ranges,
        }
    }

    /// Parses a JSON array of profiles.
    pub fn list_from_json(json: &str) -> serde_json::Result<Vec<Self>> {
        serde_json::from_str(json)
    }

    /// Builds the strategy described by this profile.
    ///
    /// `custom` and `rng` are only used by custom metric profiles.
    pub fn build(
        &self,
        custom: CustomMetricConfig,
        rng: StdRng,
    ) -> Result<Arc<dyn PlanStrategy>> {
        let ranges = self.ranges.clone();
        let strategy: Arc<dyn PlanStrategy> = match &self.kind {
            ProfileKind::Realistic {
                rollout_interval,
                apps,
                metrics_per_app,
            } => Arc::new(RolloutStrategy::new(
                ranges,
                *rollout_interval,
                *apps,
                *metrics_per_app,
            )?),
            ProfileKind::Continuous {
                apps,
                metrics_per_app,
            } => Arc::new(ContinuousStrategy::new(ranges, *apps, *metrics_per_app)?),
            ProfileKind::CustomMetrics { apps, metrics } => Arc::new(CustomMetricStrategy::new(
                ranges,
                *apps,
                metrics.clone(),
                custom,
                rng,
            )?),
        };
        Ok(strategy)
    }
}

/// The profiles shipped with the planner.
pub fn builtin_profiles() -> Vec<ProfileConfig> {
    vec![
        // 100 applications with 50 metrics each, all rolled out every hour. A 2h block holds
        // 15k series, an 8h block 45k.
        ProfileConfig::realistic("realistic-k8s-2d-small", hours(TWO_DAYS), HOUR, 100, 50),
        ProfileConfig::realistic("realistic-k8s-1w-small", hours(ONE_WEEK), HOUR, 100, 50),
        ProfileConfig::realistic("realistic-k8s-30d-tiny", hours(THIRTY_DAYS), HOUR, 1, 5),
        ProfileConfig::realistic("realistic-k8s-365d-tiny", hours(ONE_YEAR), HOUR, 1, 5),
        // 10k series per block.
        ProfileConfig::continuous("continuous-1w-small", hours(ONE_WEEK), 100, 100),
        ProfileConfig::continuous("continuous-30d-tiny", hours(THIRTY_DAYS), 1, 5),
        ProfileConfig::continuous("continuous-365d-tiny", hours(ONE_YEAR), 1, 5),
        ProfileConfig::continuous("continuous-1w-1series-10000apps", hours(ONE_WEEK), 10_000, 1),
        ProfileConfig::custom_metrics(
            "cc-1w-small-rs",
            hours(ONE_WEEK),
            1,
            RESOURCE_SIZING_METRICS.iter().copied(),
        ),
    ]
}

mod duration_list {
    use humantime_serde::Serde;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(v: &[Duration], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(v.iter().map(|d| Serde::from(*d)))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Duration>, D::Error> {
        let v = Vec::<Serde<Duration>>::deserialize(d)?;
        Ok(v.into_iter().map(Serde::into_inner).collect())
    }
}
