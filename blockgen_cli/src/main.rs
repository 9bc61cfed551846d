//! Entrypoint of the blockgen binary
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(
    missing_debug_implementations,
    clippy::explicit_iter_loop,
    clippy::use_self,
    clippy::clone_on_ref_ptr
)]

use dotenvy::dotenv;

mod logging;
mod shutdown;

mod commands {
    pub(crate) mod common;
    pub(crate) mod plan;
    pub(crate) mod profiles;
}

enum ReturnCode {
    Failure = 1,
}

#[derive(Debug, clap::Parser)]
#[clap(
    name = "blockgen",
    version,
    about = "Plans synthetic time-series storage blocks for benchmarking",
    long_about = r#"Plans synthetic time-series storage blocks for benchmarking

Each profile turns into a stream of block specifications, newest first, printed as one JSON
object per line for a block encoder to consume.

Examples:
    # List the available profiles
    blockgen profiles

    # Plan a week of churning Kubernetes application metrics ending now
    blockgen plan --profile realistic-k8s-1w-small --label cluster=eu-1 > blocks.jsonl

    # Plan a reproducible run of custom metrics ending a day ago, with debug logging
    blockgen -vv plan --profile cc-1w-small-rs --max-time -1d --seed 42 --output blocks.jsonl
"#
)]
struct Config {
    #[clap(flatten)]
    logging_config: logging::LoggingConfig,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// List the available profiles
    Profiles(commands::profiles::Config),

    /// Plan the blocks of a profile and write them as JSON lines
    Plan(commands::plan::Config),
}

fn main() -> Result<(), std::io::Error> {
    // load all environment variables from .env before doing anything
    load_dotenv();

    let config: Config = clap::Parser::parse();

    if let Err(e) = config.logging_config.install_global_subscriber() {
        eprintln!("Initializing logs failed: {e}");
        std::process::exit(ReturnCode::Failure as _);
    }

    let tokio_runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    tokio_runtime.block_on(async move {
        match config.command {
            None => println!("command required, -h/--help for help"),
            Some(Command::Profiles(config)) => {
                if let Err(e) = commands::profiles::command(config) {
                    eprintln!("Profiles command failed: {e:#}");
                    std::process::exit(ReturnCode::Failure as _)
                }
            }
            Some(Command::Plan(config)) => {
                if let Err(e) = commands::plan::command(config).await {
                    eprintln!("Plan command failed: {e:#}");
                    std::process::exit(ReturnCode::Failure as _)
                }
            }
        }
    });

    Ok(())
}

/// Source the .env file before initialising the Config struct - this sets
/// any envs in the file, which the Config struct then uses.
///
/// Precedence is given to existing env variables.
fn load_dotenv() {
    match dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            // a missing .env file is fine, defaults apply
        }
        Err(e) => {
            eprintln!("FATAL Error loading config from: {e}");
            eprintln!("Aborting");
            std::process::exit(ReturnCode::Failure as _);
        }
    };
}
