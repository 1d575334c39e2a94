mod demo;

use clap::Parser;
use gantry::cli::{run_cli, Cli};
use gantry::logging::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&LogConfig::from_env())?;
    run_cli(cli, &demo::services)
}
