//! CLI configuration and logging setup

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uiprobe::ProbeConfig;

use crate::error::{CliError, CliResult};

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Errors only
    Quiet,
    /// Warnings and errors
    #[default]
    Normal,
    /// Progress information (`-v`)
    Verbose,
    /// Resolution internals (`-vv`)
    Debug,
    /// Every poll (`-vvv`)
    Trace,
}

impl Verbosity {
    /// Map the `-q` flag and `-v` count to a level; `-q` wins
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug | Self::Trace)
    }

    /// Default log filter directive for this level
    #[must_use]
    pub const fn filter_directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stdout()),
        }
    }
}

/// CLI configuration
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// Library configuration file given with `--config`
    pub probe_config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set the library configuration file
    #[must_use]
    pub fn with_probe_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.probe_config_path = Some(path.into());
        self
    }

    /// Load and validate the library configuration, or fall back to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn probe_config(&self) -> CliResult<ProbeConfig> {
        let Some(path) = &self.probe_config_path else {
            return Ok(ProbeConfig::default());
        };
        ProbeConfig::load(path).map_err(|e| CliError::config(format!("{}: {e}", path.display())))
    }
}

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over the verbosity flags. Calling this twice
/// is harmless; the second subscriber is ignored.
pub fn init_logging(verbosity: Verbosity, color: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(color)
                .with_target(verbosity.is_verbose()),
        )
        .try_init();
}
