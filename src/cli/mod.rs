//! CLI module for GENESIS
//!
//! Provides command-line interface parsing for the `genesis` binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// GENESIS - agent-to-agent orchestration for the GENESIS coaching team
///
/// Routes questions to NEXUS and ten domain specialists, runs multi-agent
/// consultations and merges their answers.
#[derive(Parser, Debug)]
#[command(
    name = "genesis",
    version,
    about = "GENESIS - A2A orchestration server",
    long_about = "Agent-to-agent orchestration for the GENESIS coaching team.\n\n\
                  Run without arguments to start the server.",
    after_help = "EXAMPLES:\n    \
                  genesis                                  # Start the server (reads genesis.toml)\n    \
                  genesis --config prod.toml serve         # Use a custom config file\n    \
                  genesis config --validate                # Check configuration\n    \
                  genesis agent list                       # Show the agent team\n    \
                  genesis ask \"Plan my week\" --dry-run     # Show how a query would be routed"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "genesis.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP/WebSocket server (default)
    Serve,

    /// Show configuration information
    Config {
        /// Show the full configuration
        #[arg(short = 'f', long)]
        full: bool,

        /// Validate the configuration file
        #[arg(long)]
        validate: bool,
    },

    /// Inspect the agent team
    #[command(subcommand)]
    Agent(AgentCommands),

    /// Route a single query through the agent team and print the reply
    Ask {
        /// The question to ask
        text: String,

        /// Only show the routing decision; no agent is called
        #[arg(long)]
        dry_run: bool,

        /// Session to continue
        #[arg(long)]
        session: Option<String>,
    },
}

/// Agent subcommands
#[derive(Subcommand, Debug)]
pub enum AgentCommands {
    /// List all agents and the topics they cover
    List,

    /// Show details for a specific agent
    Show {
        /// Agent id (nexus, sage, blaze, ...)
        id: String,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
