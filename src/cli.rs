//! Command-line interface for Bridgewire
//!
//! Uses clap with derive for type-safe CLI parsing

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Bridgewire - Linux bridge control
#[derive(Parser)]
#[command(name = "bridgewire")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "bridgewire.toml")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Create a bridge
    Addbr {
        /// Bridge name
        bridge: String,
    },

    /// Delete a bridge
    Delbr {
        /// Bridge name
        bridge: String,

        /// Bring the bridge down and delete it even if members are attached
        #[arg(short, long)]
        force: bool,
    },

    /// Attach an interface to a bridge
    Addif {
        /// Bridge name
        bridge: String,

        /// Interface to attach
        iface: String,
    },

    /// Detach an interface from a bridge
    Delif {
        /// Bridge name
        bridge: String,

        /// Interface to detach
        iface: String,
    },

    /// Show bridges and their members
    Show {
        /// Specific bridge to show (shows all if not specified)
        bridge: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Set an interface administratively up or down
    Link {
        /// Interface name
        iface: String,

        /// Requested state
        #[arg(value_enum)]
        state: LinkState,
    },

    /// Create the bridges declared in the config file
    Up {
        /// Show what would be done without making changes
        #[arg(long)]
        dry_run: bool,
    },

    /// Tear down the bridges declared in the config file
    Down {
        /// Show what would be done without making changes
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate configuration
    Check,

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Administrative link state
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LinkState {
    Up,
    Down,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Generate shell completion scripts
    pub fn generate_completion(shell: Shell) {
        let mut cmd = Self::command();
        clap_complete::generate(shell, &mut cmd, "bridgewire", &mut std::io::stdout());
    }
}
