//! CLI subcommand definitions and handlers.
//!
//! Implements a git-like subcommand architecture:
//! - `trawl scan <target>` - Scan a host or CIDR block
//! - `trawl history` - View and prune stored scans
//! - `trawl export <scan-id>` - Export a stored scan
//! - `trawl profiles list|show|create|delete` - Manage scan profiles

mod export;
mod history;
mod profiles;
mod scan;

pub use export::ExportCommand;
pub use history::HistoryCommand;
pub use profiles::ProfilesCommand;
pub use scan::ScanCommand;

use crate::config::{AppSettings, Paths, ProfileManager};
use crate::error::CliResult;
use crate::storage::ScanStore;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Trawl - a concurrent TCP network scanner.
///
/// Trawl sweeps a single host or a whole CIDR block for open TCP ports,
/// optionally reading service banners, and keeps a history of past scans.
#[derive(Parser, Debug)]
#[command(name = "trawl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A concurrent TCP network scanner", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to a settings file
    #[arg(long, global = true, value_name = "PATH", env = "TRAWL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Keep settings, profiles and stored scans under this directory
    #[arg(long, global = true, value_name = "DIR", env = "TRAWL_HOME")]
    pub data_dir: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a host or CIDR block for open TCP ports
    #[command(alias = "s")]
    Scan(ScanCommand),

    /// View scan history
    #[command(alias = "h")]
    History(HistoryCommand),

    /// Export a stored scan
    #[command(alias = "e")]
    Export(ExportCommand),

    /// Manage scan profiles
    #[command(alias = "p")]
    Profiles(ProfilesCommand),
}

impl Cli {
    /// Resolve directories and settings, then run the selected command.
    pub async fn run(&self) -> CliResult<()> {
        let ctx = self.context()?;
        match &self.command {
            Commands::Scan(cmd) => cmd.execute(&ctx).await,
            Commands::History(cmd) => cmd.execute(&ctx),
            Commands::Export(cmd) => cmd.execute(&ctx),
            Commands::Profiles(cmd) => cmd.execute(&ctx),
        }
    }

    fn context(&self) -> CliResult<Context> {
        let paths = match &self.data_dir {
            Some(dir) => Paths::under(dir)?,
            None => Paths::get()?.clone(),
        };

        let settings_file = self
            .config
            .clone()
            .unwrap_or_else(|| paths.settings_file());
        let settings = if settings_file.exists() {
            AppSettings::load_from(&settings_file)?
        } else {
            if self.config.is_some() {
                tracing::warn!(path = %settings_file.display(), "settings file not found, using defaults");
            }
            AppSettings::default()
        };

        Ok(Context {
            paths,
            settings,
            verbose: self.verbose,
            quiet: self.quiet,
        })
    }
}

/// Resolved environment shared by all command handlers.
#[derive(Debug, Clone)]
pub struct Context {
    pub paths: Paths,
    pub settings: AppSettings,
    pub verbose: bool,
    pub quiet: bool,
}

impl Context {
    pub fn store(&self) -> CliResult<ScanStore> {
        Ok(ScanStore::with_dir(self.paths.scans_dir())?)
    }

    pub fn profiles(&self) -> CliResult<ProfileManager> {
        Ok(ProfileManager::with_dir(self.paths.profiles_dir())?)
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// CSV, one row per open port
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" | "text" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}
