//! `deploy` binary entry point.
use anyhow::Result;
use clap::Parser;

use dotdeploy::cli::Cli;
use dotdeploy::commands;
use dotdeploy::config::Settings;
use dotdeploy::logging::{self, Logger};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let cli = Cli::parse();
    let settings = Settings::resolve(&cli)?;

    logging::init_subscriber(settings.verbose, "deploy");
    let log = Logger::new("deploy");

    let result = commands::deploy::run(
        &settings,
        &log,
        &mut std::io::stdin().lock(),
        &mut std::io::stdout(),
    );
    log.print_summary();
    result.map(|_| ())
}
