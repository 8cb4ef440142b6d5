use async_trait::async_trait;
use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;

use cli::Cli;
use cli::commands::Commands;
use orchestrator::channels::{IncomingMessage, MessageHandler};
use orchestrator::config::Config;
use orchestrator::tools::is_tool_allowed;
use orchestrator::Orchestrator;

fn setup_logging(config: &Config) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("orchestrator")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("orchestrator.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let default_level = config.log_level.as_deref().unwrap_or("info");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Prints each dispatched message; stands in for the agent runtime
struct ConsoleDispatcher;

#[async_trait]
impl MessageHandler for ConsoleDispatcher {
    async fn handle(&self, message: IncomingMessage) -> orchestrator::Result<()> {
        info!(
            "Dispatching message {} from {} on {} to {:?}",
            message.id, message.sender_id, message.channel, message.agent_id
        );
        println!(
            "{} {} {} {}",
            format!("[{}]", message.channel).cyan(),
            format!("{}:{}", message.chat_id, message.sender_id).dimmed(),
            message.agent_id.as_deref().unwrap_or("-").yellow(),
            message.text
        );
        Ok(())
    }
}

async fn run_application(cli: &Cli, config: Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let orchestrator = Orchestrator::from_config(config).context("Failed to build orchestrator")?;

    match &cli.command {
        Commands::Tools { allow, deny, json } => handle_tools_command(&orchestrator, allow, deny, *json).await,
        Commands::Call { name, args } => handle_call_command(&orchestrator, name, args).await,
        Commands::Check { name, allow, deny } => handle_check_command(name, allow, deny),
        Commands::Run => handle_run_command(&orchestrator).await,
    }
}

async fn handle_tools_command(orchestrator: &Orchestrator, allow: &[String], deny: &[String], json: bool) -> Result<()> {
    let total = orchestrator.refresh().await;
    let tools = orchestrator.router().get_filtered_tool_definitions(allow, deny);
    info!("Listing {} of {} tools", tools.len(), total);

    if json {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    for tool in &tools {
        let backend = orchestrator
            .router()
            .get_routed_tool(&tool.name)
            .map(|r| r.backend_name)
            .unwrap_or_default();
        println!("{} {} {}", tool.name.green(), format!("({})", backend).dimmed(), tool.description);
    }
    println!("{} {} of {} tools", "Listed".cyan(), tools.len(), total);
    Ok(())
}

async fn handle_call_command(orchestrator: &Orchestrator, name: &str, args: &str) -> Result<()> {
    let arguments: serde_json::Value = serde_json::from_str(args).context("--args must be valid JSON")?;
    orchestrator.refresh().await;

    info!("Calling tool: {}", name);
    let result = orchestrator.call_tool(name, arguments).await?;

    if result.success {
        println!("{}", "Success".green());
    } else {
        println!("{} {}", "Failed:".red(), result.error.as_deref().unwrap_or("unknown error"));
    }
    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(hint) = orchestrator.router().get_response_hints(name) {
        if result.success && !hint.suggest.is_empty() {
            println!("{} {} ({})", "Next:".cyan(), hint.suggest.join(", "), hint.tip);
        }
    }
    Ok(())
}

fn handle_check_command(name: &str, allow: &[String], deny: &[String]) -> Result<()> {
    if is_tool_allowed(name, allow, deny) {
        println!("{} {}", "Allowed:".green(), name);
    } else {
        println!("{} {}", "Denied:".red(), name);
    }
    Ok(())
}

async fn handle_run_command(orchestrator: &Orchestrator) -> Result<()> {
    let tools = orchestrator.start(Arc::new(ConsoleDispatcher)).await;
    println!(
        "{} {} tools, channels: {}",
        "Running:".green(),
        tools,
        orchestrator.channels().get_channels().join(", ")
    );

    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
    println!("{}", "Shutting down...".cyan());
    orchestrator.stop().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging
    setup_logging(&config).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, config).await.context("Application failed")?;

    Ok(())
}
