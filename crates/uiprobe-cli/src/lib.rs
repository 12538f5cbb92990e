//! uiprobe CLI library
//!
//! Offline inspection of UI tree snapshots: validation, outlines and
//! element queries using the same parser and matchers as live sessions.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod outline;

pub use commands::{Cli, ColorArg, Commands, FindArgs, OutlineArgs, SnapshotArgs};
pub use config::{init_logging, CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};

/// Run one parsed command and return the text it prints on stdout
pub fn execute(command: &Commands, config: &CliConfig) -> CliResult<String> {
    match command {
        Commands::Validate(args) => {
            let tree = handlers::load_snapshot(args)?;
            Ok(handlers::validate(&tree))
        }
        Commands::Outline(args) => {
            let tree = handlers::load_snapshot(&args.snapshot)?;
            Ok(handlers::outline(
                &tree,
                args.max_depth,
                config.color.should_color(),
            ))
        }
        Commands::Find(args) => {
            let tree = handlers::load_snapshot(&args.snapshot)?;
            handlers::find(&tree, args)
        }
        Commands::Config => handlers::show_config(&config.probe_config()?),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::Parser;

    const IOS_LOGIN: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../uiprobe/fixtures/ios_login.xml");

    fn run(args: &[&str]) -> CliResult<String> {
        let cli = Cli::parse_from(args);
        let config = CliConfig::new().with_color(ColorChoice::Never);
        execute(&cli.command, &config)
    }

    #[test]
    fn test_execute_validate() {
        let out = run(&["uiprobe", "validate", IOS_LOGIN]).unwrap();
        assert!(out.starts_with("OK: ios snapshot"));
    }

    #[test]
    fn test_execute_outline_without_color() {
        let out = run(&["uiprobe", "outline", IOS_LOGIN]).unwrap();
        assert!(!out.contains('\u{1b}'));
        assert!(out.contains("└── window.keyboard"));
    }

    #[test]
    fn test_execute_find() {
        let out = run(&["uiprobe", "find", IOS_LOGIN, "--id", "email"]).unwrap();
        assert!(out.starts_with("#0 window.main textField"));
    }

    #[test]
    fn test_execute_config_defaults() {
        let out = run(&["uiprobe", "config"]).unwrap();
        assert!(out.contains("poll_interval_ms"));
    }
}
