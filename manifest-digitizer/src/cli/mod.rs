//! Command-line surface: arguments, interactive menu and run summaries

pub mod commands;
pub mod prompt;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

pub use commands::run;

#[derive(Parser, Debug)]
#[command(name = "manifest-digitizer")]
#[command(about = "Digitize physical waste-disposal manifests into the compliance backend")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Backend root URL (without /api)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Manifest CSV file
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Processing mode; prompts interactively when omitted
    #[arg(short, long, value_enum)]
    pub mode: Option<Mode>,

    /// Manifest records to skip before importing
    #[arg(long)]
    pub start: Option<usize>,

    /// Maximum records to process (0 = all)
    #[arg(long)]
    pub max: Option<usize>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Create base entities (vessels, persons) only
    Bootstrap,
    /// Create compliance manifests only
    Import,
    /// Base entities, then compliance manifests
    Full,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Bootstrap, Mode::Import, Mode::Full];

    pub fn menu_label(&self) -> &'static str {
        match self {
            Mode::Bootstrap => "Setup base entities only (vessels, persons)",
            Mode::Import => "Process compliance manifests only",
            Mode::Full => "Full process (entities + manifests)",
        }
    }
}
