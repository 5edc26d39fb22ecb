//! Command-line interface definition.
use std::path::PathBuf;

use clap::Parser;

/// Create symlinks from a dotfiles source tree into a destination directory.
///
/// Files ending in `<host>`, `<user>` or `<user@host>` are only linked when
/// the qualifier matches; the most specific match wins
/// (user@host > user = host > no qualifier).
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "deploy", version)]
pub struct Cli {
    /// Root where symlink sources live [default: current directory]
    pub source: Option<PathBuf>,

    /// Root where symlinks are created [default: home directory]
    pub destination: Option<PathBuf>,

    /// Override the username to match
    #[arg(long)]
    pub username: Option<String>,

    /// Override the hostname to match
    #[arg(long)]
    pub hostname: Option<String>,

    /// File containing ignore rules, relative to the source root [default: .deployignore]
    #[arg(long)]
    pub ignorefile: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Just print the plan, do not make changes
    #[arg(short = 'n', long)]
    pub dry: bool,

    /// If a destination exists, remove it before linking
    #[arg(long)]
    pub force: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Settings file [default: $XDG_CONFIG_HOME/dotdeploy/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,
}
