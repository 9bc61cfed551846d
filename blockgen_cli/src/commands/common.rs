use std::path::PathBuf;

use anyhow::Context;
use blockgen::{
    CustomMetricConfig, ProfileCatalog, ProfileConfig,
    profile::builtin_profiles,
    strategy::{MAX_GAUGE_ENV, MIN_GAUGE_ENV},
};
use clap::Parser;
use tracing::info;

/// Where profiles come from.
#[derive(Debug, Parser)]
pub(crate) struct CatalogConfig {
    /// A JSON file with additional profiles, registered next to the built-in ones.
    ///
    /// The file holds an array of profiles, for example:
    ///
    /// [{"name": "k8s-3d", "kind": "realistic", "rollout_interval": "30m",
    ///   "apps": 10, "metrics_per_app": 5, "ranges": ["2h", "2h", "8h", "48h"]}]
    #[clap(long = "profiles-file", env = "BLOCKGEN_PROFILES_FILE", verbatim_doc_comment)]
    pub(crate) profiles_file: Option<PathBuf>,
}

impl CatalogConfig {
    pub(crate) fn load(
        &self,
        custom: CustomMetricConfig,
        seed: Option<u64>,
    ) -> anyhow::Result<ProfileCatalog> {
        let mut profiles = builtin_profiles();
        if let Some(path) = &self.profiles_file {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading profiles file {}", path.display()))?;
            let extra = ProfileConfig::list_from_json(&json)
                .with_context(|| format!("parsing profiles file {}", path.display()))?;
            info!(path = %path.display(), profiles = extra.len(), "loaded profiles file");
            profiles.extend(extra);
        }
        Ok(ProfileCatalog::from_configs(profiles, custom, seed)?)
    }
}

/// Value generation settings for custom metric profiles.
#[derive(Debug, Parser)]
pub(crate) struct GaugeConfig {
    /// Lower bound of generated gauge values. Unparsable values fall back to 2.
    #[clap(long = "min-gauge", env = MIN_GAUGE_ENV)]
    pub(crate) min_gauge: Option<String>,

    /// Upper bound of generated gauge values. Unparsable values fall back to 8.
    #[clap(long = "max-gauge", env = MAX_GAUGE_ENV)]
    pub(crate) max_gauge: Option<String>,

    /// Fixed jitter for every series. By default a random integer in [1, 10] is drawn once per
    /// run.
    #[clap(long = "jitter")]
    pub(crate) jitter: Option<f64>,

    /// Seed for the random choices of a run, for reproducible output.
    #[clap(long = "seed", env = "BLOCKGEN_SEED")]
    pub(crate) seed: Option<u64>,
}

impl GaugeConfig {
    pub(crate) fn custom_metric_config(&self) -> CustomMetricConfig {
        CustomMetricConfig {
            jitter: self.jitter,
            ..CustomMetricConfig::from_raw(self.min_gauge.as_deref(), self.max_gauge.as_deref())
        }
    }
}
