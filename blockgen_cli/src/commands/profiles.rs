use std::{io::Write, time::Duration};

use anyhow::Context;
use blockgen::CustomMetricConfig;
use clap::Parser;

use super::common::CatalogConfig;

#[derive(Debug, Parser)]
#[clap(visible_alias = "ls")]
pub(crate) struct Config {
    #[clap(flatten)]
    catalog: CatalogConfig,
}

pub(crate) fn command(config: Config) -> anyhow::Result<()> {
    // Gauge settings do not change what a profile looks like.
    let catalog = config.catalog.load(CustomMetricConfig::default(), Some(0))?;

    let mut out = std::io::stdout().lock();
    for (name, strategy) in catalog.iter() {
        let ranges = strategy.ranges();
        let span: Duration = ranges.iter().sum();
        writeln!(
            out,
            "{name:<34} {kind:<10} {blocks:>3} blocks  {span}",
            kind = strategy.kind(),
            blocks = ranges.len(),
            span = humantime::format_duration(span),
        )
        .context("writing profile list")?;
    }
    Ok(())
}
