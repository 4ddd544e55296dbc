mod batch;
mod run;
mod smoke;
mod validate;

pub use smoke::{SmokeArgs, DEFAULT_SMOKE_BARS};

use std::path::PathBuf;

pub enum Command {
    Run { config: PathBuf, out: Option<PathBuf> },
    Batch { config: PathBuf, json: bool },
    Validate { config: PathBuf },
    Smoke(SmokeArgs),
}

pub fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Run { config, out } => run::run_simulation(config, out),
        Command::Batch { config, json } => batch::run_batch(config, json),
        Command::Validate { config } => validate::run_validate(config),
        Command::Smoke(args) => smoke::run_smoke(args),
    }
}
