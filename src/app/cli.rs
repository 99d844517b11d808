//! Command-Line Interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// staktrak - Turn recorded browser interactions into Playwright tests
#[derive(Parser, Debug)]
#[command(name = "staktrak")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a Playwright test from a trace file
    Generate {
        /// Trace JSON, as posted in `staktrak-results`
        #[arg(short, long)]
        input: PathBuf,

        /// URL the test navigates to
        #[arg(short, long)]
        url: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Test title
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Replay a session script through recorder and controller
    Replay {
        /// Session JSON file
        #[arg(short, long)]
        session: PathBuf,

        /// Output file for the generated test (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the merged trace here
        #[arg(long)]
        trace_output: Option<PathBuf>,
    },

    /// Print the Playwright locator for a recorded selector
    Selector {
        /// Raw selector as recorded
        raw: String,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "recorder.input_debounce_ms")
        key: String,

        /// Value to set
        value: String,
    },

    /// Get a specific configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
