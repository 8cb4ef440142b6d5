//! CLI module for orchestrator - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for inspecting the tool
//! catalog, calling tools, checking policies, and running the channel loop.

pub mod commands;

pub use commands::Cli;
