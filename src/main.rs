//! Generate one editor snippet per library on cdnjs.
//!
//! Runs with no arguments: fetches the live catalog, empties `./snippets`,
//! writes `./snippets/<name>.sublime-snippet` for every library and lists the
//! written libraries in `./.log`.

mod error;
mod run;

use crate::run::{Options, run};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const CRATES: [&str; 5] = ["lcdnjs", "lcdnjs_catalog", "lcdnjs_config", "lcdnjs_snippets", "lcdnjs_storage"];

#[derive(Parser)]
#[command(name = "lcdnjs", version)]
#[command(about = "Generate editor snippets for every library on cdnjs", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output logs as JSON
    #[arg(long)]
    json: bool,

    /// Extra configuration file (toml, yaml or json)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Project directory to write into [default: output.root, or the working directory]
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Read the catalog from a saved API response instead of the network
    #[arg(long, value_name = "FILE")]
    from_file: Option<PathBuf>,
}

fn directives(verbose: u8) -> String {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let base = if verbose >= 3 { "debug" } else { "warn" };
    std::iter::once(base.to_string()).chain(CRATES.iter().map(|c| format!("{c}={level}"))).collect::<Vec<_>>().join(",")
}

fn init_tracing(verbose: u8, json: bool) {
    let base_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| directives(verbose));
    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new(directives(verbose)));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(verbose >= 2)
                    .with_file(verbose >= 3)
                    .with_line_number(verbose >= 3)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json);

    let options = Options {
        config: cli.config,
        root: cli.root,
        from_file: cli.from_file,
    };
    match run(options).await {
        Ok(summary) if summary.failed > 0 => {
            tracing::warn!(failed = summary.failed, "Some snippets could not be written");
            ExitCode::SUCCESS
        },
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(retryable = e.is_retryable(), "{e:?}");
            ExitCode::FAILURE
        },
    }
}
