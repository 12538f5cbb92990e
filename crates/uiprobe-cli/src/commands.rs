//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// uiprobe: inspect and query mobile UI tree snapshots
#[derive(Parser, Debug)]
#[command(name = "uiprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// YAML file with wait, retry and gesture settings
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that a snapshot parses and print its size
    Validate(SnapshotArgs),

    /// Print the window and element hierarchy of a snapshot
    Outline(OutlineArgs),

    /// List the elements of a snapshot that match every given criterion
    Find(FindArgs),

    /// Show the effective configuration
    Config,
}

/// Snapshot input shared by every inspecting subcommand
#[derive(Args, Debug, Clone)]
pub struct SnapshotArgs {
    /// Snapshot file, or `-` for stdin
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

impl SnapshotArgs {
    /// Whether the snapshot comes from stdin
    #[must_use]
    pub fn is_stdin(&self) -> bool {
        self.file.as_os_str() == "-"
    }
}

/// Arguments for the outline command
#[derive(Args, Debug, Clone)]
pub struct OutlineArgs {
    /// Snapshot input
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Stop descending below this element depth (window roots are depth 0)
    #[arg(long, value_name = "DEPTH")]
    pub max_depth: Option<usize>,
}

/// Arguments for the find command
#[derive(Args, Debug, Clone)]
pub struct FindArgs {
    /// Snapshot input
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Exact text
    #[arg(long)]
    pub text: Option<String>,

    /// Regular expression matched against the text
    #[arg(long, value_name = "REGEX", conflicts_with = "text")]
    pub text_matches: Option<String>,

    /// Exact resource id
    #[arg(long)]
    pub id: Option<String>,

    /// Exact element type
    #[arg(long = "type", value_name = "TYPE")]
    pub element_type: Option<String>,

    /// Exact accessibility id
    #[arg(long)]
    pub accessibility_id: Option<String>,

    /// Clickable flag
    #[arg(long, value_name = "BOOL")]
    pub clickable: Option<bool>,

    /// Emit matches as JSON
    #[arg(long)]
    pub json: bool,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
