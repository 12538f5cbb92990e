//! uiprobe: inspect and query mobile UI tree snapshots

use clap::Parser;
use std::process::ExitCode;
use uiprobe_cli::{execute, init_logging, Cli, CliConfig, CliResult, ColorChoice, Verbosity};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_logging(config.verbosity, config.color.should_color());

    let output = execute(&cli.command, &config)?;
    print!("{output}");
    Ok(())
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    let color: ColorChoice = cli.color.clone().into();

    let config = CliConfig::new().with_verbosity(verbosity).with_color(color);
    match &cli.config {
        Some(path) => config.with_probe_config_path(path),
        None => config,
    }
}
