//! Name-to-strategy registry of planning profiles.

use crate::{
    Error, Result,
    labels::Labels,
    profile::{ProfileConfig, builtin_profiles},
    sink::BlockSink,
    strategy::{CustomMetricConfig, PlanStrategy},
};
use blockgen_time::Time;
use rand::{SeedableRng, rngs::StdRng};
use std::{collections::BTreeMap, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Planning profiles by name.
///
/// A catalog is built once and then only read, so it can be shared between threads and used to
/// run any number of plans concurrently.
#[derive(Debug, Default)]
pub struct ProfileCatalog {
    profiles: BTreeMap<String, Arc<dyn PlanStrategy>>,
}

impl ProfileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in profiles.
    ///
    /// `seed` makes the random choices of custom metric profiles reproducible; without one they
    /// are seeded from the operating system.
    pub fn builtin(custom: CustomMetricConfig, seed: Option<u64>) -> Result<Self> {
        Self::from_configs(builtin_profiles(), custom, seed)
    }

    /// Builds a catalog from profile configurations, failing on the first invalid or duplicate
    /// profile.
    pub fn from_configs(
        configs: impl IntoIterator<Item = ProfileConfig>,
        custom: CustomMetricConfig,
        seed: Option<u64>,
    ) -> Result<Self> {
        let mut catalog = Self::new();
        for config in configs {
            let rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let strategy = config.build(custom, rng)?;
            catalog.register(config.name, strategy)?;
        }
        Ok(catalog)
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        strategy: Arc<dyn PlanStrategy>,
    ) -> Result<()> {
        let name = name.into();
        if self.profiles.contains_key(&name) {
            return Err(Error::DuplicateProfile { name });
        }
        debug!(%name, kind = strategy.kind(), "registered profile");
        self.profiles.insert(name, strategy);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<dyn PlanStrategy>> {
        self.profiles
            .get(name)
            .map(Arc::clone)
            .ok_or_else(|| Error::UnknownProfile {
                name: name.to_string(),
            })
    }

    /// Profile names in ascending order.
    pub fn names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn PlanStrategy>)> {
        self.profiles.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Looks up `name` and runs its plan.
    pub fn plan(
        &self,
        name: &str,
        cancel: &CancellationToken,
        max_time: Time,
        external_labels: &Labels,
        sink: &mut dyn BlockSink,
    ) -> Result<()> {
        self.lookup(name)?
            .plan(cancel, max_time, external_labels, sink)
    }
}
