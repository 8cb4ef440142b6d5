//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - tools: list the merged tool catalog
//! - call: route a single tool call
//! - check: evaluate a tool name against allow/deny globs
//! - run: poll channels and dispatch messages until interrupted

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Orchestrator - routes agent tool calls across backends and polls chat channels
#[derive(Parser, Debug)]
#[command(name = "orchestrator")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every exposed tool
    Tools {
        /// Only tools matching one of these globs
        #[arg(short, long)]
        allow: Vec<String>,

        /// Hide tools matching these globs
        #[arg(short, long)]
        deny: Vec<String>,

        /// Print definitions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Call a tool by its exposed name
    Call {
        /// Exposed tool name
        name: String,

        /// Arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },

    /// Check whether a tool name passes an allow/deny policy
    Check {
        /// Tool name to check
        name: String,

        #[arg(short, long)]
        allow: Vec<String>,

        #[arg(short, long)]
        deny: Vec<String>,
    },

    /// Poll channels and dispatch messages until Ctrl-C
    Run,
}
