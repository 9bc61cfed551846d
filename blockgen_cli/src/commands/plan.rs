use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use anyhow::Context;
use blockgen::{JsonLinesSink, Labels};
use blockgen_time::{SystemProvider, TimeOrDuration};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::common::{CatalogConfig, GaugeConfig};
use crate::shutdown::wait_for_signal;

#[derive(Debug, Parser)]
pub(crate) struct Config {
    /// Name of the profile to plan, see `blockgen profiles`
    #[clap(short = 'p', long = "profile", env = "BLOCKGEN_PROFILE")]
    profile: String,

    /// Upper bound of the newest block before alignment to the 2h block grid.
    ///
    /// Accepts `now`, an RFC 3339 instant such as `2024-05-01T12:00:00Z`, or an offset from now
    /// such as `-2h` or `30m`.
    #[clap(
        long = "max-time",
        default_value = "now",
        allow_hyphen_values = true
    )]
    max_time: TimeOrDuration,

    /// External label stamped into the metadata of every block, as `name=value`. May be
    /// repeated; a later value for the same name wins.
    #[clap(short = 'l', long = "label", value_name = "NAME=VALUE")]
    labels: Vec<Labels>,

    /// Write JSON lines to this file instead of stdout
    #[clap(short = 'o', long = "output")]
    output: Option<PathBuf>,

    #[clap(flatten)]
    catalog: CatalogConfig,

    #[clap(flatten)]
    gauges: GaugeConfig,
}

impl Config {
    fn external_labels(&self) -> Labels {
        Labels::new(
            self.labels
                .iter()
                .flat_map(Labels::iter)
                .map(|l| (l.name.clone(), l.value.clone())),
        )
    }
}

pub(crate) async fn command(config: Config) -> anyhow::Result<()> {
    let catalog = config
        .catalog
        .load(config.gauges.custom_metric_config(), config.gauges.seed)?;
    let strategy = catalog.lookup(&config.profile)?;

    let max_time = config
        .max_time
        .resolve(&SystemProvider::new())
        .context("--max-time is out of range")?;
    let labels = config.external_labels();

    let writer: Box<dyn Write + Send> = match &config.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout())),
    };

    info!(
        profile = %config.profile,
        kind = strategy.kind(),
        %max_time,
        labels = %labels,
        "starting plan"
    );

    let cancel = CancellationToken::new();
    let signal = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            wait_for_signal().await;
            cancel.cancel();
        }
    });

    let planner = tokio::task::spawn_blocking(move || {
        let mut sink = JsonLinesSink::new(writer);
        let result = strategy.plan(&cancel, max_time, &labels, &mut sink);
        let (blocks, series) = (sink.blocks(), sink.series());
        // Whatever was accepted is flushed, even when the plan stopped early.
        sink.into_inner().context("flushing output")?;
        result.with_context(|| format!("planning stopped after {blocks} blocks"))?;
        anyhow::Ok((blocks, series))
    });

    let outcome = planner.await.context("planner task failed");
    signal.abort();

    let (blocks, series) = outcome??;
    info!(blocks, series, "plan written");
    Ok(())
}
