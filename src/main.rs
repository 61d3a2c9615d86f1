mod catalog;
mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod services;
#[cfg(test)]
mod testing;
mod workflow;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::catalog::{
    CreateTicketArgs, LogWorkArgs, Operation, SprintTicketsArgs, TimeSummaryArgs,
    UpdateTicketArgs, UserSprintTicketsArgs,
};
use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::invoke::{self, InvokeArgs};
use crate::config::{AppConfig, DEFAULT_LOG_FILTER};
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::clock::SystemClock;
use crate::infra::jira::JiraSession;

#[derive(Parser)]
#[command(name = "ticketeer", author, version, about = "Agent-facing Jira ticket operations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a ticket and schedule it into the active sprint.
    Create(CreateTicketArgs),
    /// Update fields and/or the status of a ticket.
    Update(UpdateTicketArgs),
    /// Log time spent on a ticket.
    LogWork(LogWorkArgs),
    /// List the tickets in a project's active sprint.
    Sprint(SprintTicketsArgs),
    /// List your tickets (or an assignee's) in a project's active sprint.
    MyTickets(UserSprintTicketsArgs),
    /// Summarize time logged on a day.
    TimeSummary(TimeSummaryArgs),
    /// Run a tool call emitted by the conversational agent.
    Invoke(InvokeArgs),
    /// Inspect CLI configuration.
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => {
            eprintln!("Error: {error}");
            std::process::exit(1);
        }
    }
}

/// Returns whether the requested operation succeeded.
async fn run() -> AppResult<bool> {
    let cli = Cli::parse();
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            eprintln!("Warning: ignoring unreadable .env file: {err}");
        }
    }

    let config = AppConfig::from_env()?;
    init_logging(&config.log_filter);

    let operation = match cli.command {
        Commands::Config(args) => {
            config_cmd::run(&config, args.command);
            return Ok(true);
        }
        Commands::Create(args) => Operation::CreateTicket(args),
        Commands::Update(args) => Operation::UpdateTicket(args),
        Commands::LogWork(args) => Operation::LogWork(args),
        Commands::Sprint(args) => Operation::ListSprintTickets(args),
        Commands::MyTickets(args) => Operation::ListUserSprintTickets(args),
        Commands::TimeSummary(args) => Operation::DailyTimeSummary(args),
        Commands::Invoke(args) => invoke::read_operation(args)?,
    };

    let session = JiraSession::new(&config)?;
    let context = AppContext::new(config, Arc::new(session), Arc::new(SystemClock));

    let result = catalog::invoke(&context, operation).await;
    println!("{result}");
    Ok(result.is_success())
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
