//! arfetch - fetch one attribution trigger registration and print the result.

use std::path::PathBuf;

use anyhow::Context;
use arfetch::{AppConfig, build_fetcher, init_tracing, read_job};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "arfetch", version, about = "Attribution trigger registration fetcher")]
struct Cli {
    /// Config file. Defaults to `arfetch.{toml,yaml,json}` when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the registration described by a job file and print the report.
    Fetch {
        /// JSON-encoded registration job.
        #[arg(long)]
        job: PathBuf,

        /// Pretty-print the report.
        #[arg(long)]
        pretty: bool,
    },
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Command::Fetch { job, pretty } => {
            init_tracing(&config)
                .map_err(|err| anyhow::anyhow!("installing tracing subscriber: {err}"))?;

            let job = read_job(&job)?;
            let fetcher = build_fetcher(&config)?;
            tracing::info!(
                enrollments = config.enrollments.len(),
                max_redirect_hops = fetcher.config().max_redirect_hops,
                "fetcher ready"
            );

            let report = fetcher.fetch(&job).await;
            let rendered = if pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{rendered}");
        }
    }

    Ok(())
}
