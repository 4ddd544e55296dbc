mod commands;
mod infra;
mod obs;

use clap::{Parser, Subcommand};
use commands::{Command, SmokeArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aegis-sim")]
#[command(about = "Aegis trading environment runner", version, arg_required_else_help = true)]
#[command(
    after_help = "Examples:\n  aegis-sim smoke\n  aegis-sim run --config configs/sample.toml --out runs/\n  aegis-sim batch --config configs/sample.toml --json\n  aegis-sim validate --config configs/sample.toml\n"
)]
struct Cli {
    /// Log output format: text or json. Filter with AEGIS_LOG (default: info).
    #[arg(long, global = true, default_value = "text", env = "AEGIS_LOG_FORMAT")]
    log_format: String,

    /// Prometheus metrics listen addr (e.g. 127.0.0.1:9898). Optional.
    #[arg(long, global = true)]
    metrics_addr: Option<String>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Run one configured episode and write its artifacts.
    Run {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run `[batch] episodes` independent episodes over the configured data.
    Batch {
        #[arg(long)]
        config: PathBuf,
        /// Print a single JSON line instead of human output.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Check the config, load the data and report its quality.
    Validate {
        #[arg(long)]
        config: PathBuf,
    },
    /// Component smoke run on synthetic data.
    Smoke {
        #[arg(long, default_value_t = commands::DEFAULT_SMOKE_BARS)]
        bars: usize,
        #[arg(long, default_value_t = 5)]
        steps: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = obs::init_tracing("info", &cli.log_format) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    if let Err(err) = obs::init_metrics(cli.metrics_addr.as_deref()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }

    let command = match cli.command {
        CliCommand::Run { config, out } => Command::Run { config, out },
        CliCommand::Batch { config, json } => Command::Batch { config, json },
        CliCommand::Validate { config } => Command::Validate { config },
        CliCommand::Smoke { bars, steps, seed } => Command::Smoke(SmokeArgs { bars, steps, seed }),
    };

    if let Err(err) = commands::run(command) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
