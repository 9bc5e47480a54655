//! `productstore` command line entry point.
//!
//! # Responsibility
//! - Treat each invocation as one request: one unit of work, one action.
//! - Print the action status code and JSON body to stdout.
//!
//! # Invariants
//! - The unit of work is disposed before the process exits.
//! - Exit code is non-zero for any non-2xx action result.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use productstore_core::{
    core_version, default_log_level, init_logging, ActionResult, CommitMode, DatabaseTarget,
    LogTarget, Product, ProductController, ProductId, StoreConfig, UnitOfWorkFactory,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "productstore", version, about = "Product CRUD over a transactional SQLite store")]
struct Cli {
    /// Database file path, or `:memory:`
    #[arg(long, env = "PRODUCTSTORE_DATABASE", default_value = "productstore.db")]
    database: String,

    /// Report refused commits as errors instead of rolled-back outcomes
    #[arg(long)]
    strict_commit: bool,

    /// trace|debug|info|warn|error
    #[arg(long)]
    log_level: Option<String>,

    /// Absolute directory for rotating log files (stderr when omitted)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every product
    List,
    /// Show one product
    Get { id: ProductId },
    /// Insert a product from a JSON body, e.g. '{"name":"Widget","price":9.99}'
    Add { body: String },
    /// Replace product ID with a JSON body whose id must match
    Update { id: ProductId, body: String },
    /// Delete one product
    Delete { id: ProductId },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    let target = cli
        .log_dir
        .clone()
        .map_or(LogTarget::Stderr, LogTarget::Directory);
    init_logging(&level, target).map_err(anyhow::Error::msg)?;
    log::debug!(
        "event=cli_start module=cli status=ok version={}",
        core_version()
    );

    let database = DatabaseTarget::parse(&cli.database).map_err(anyhow::Error::msg)?;
    let commit_mode = if cli.strict_commit {
        CommitMode::Strict
    } else {
        CommitMode::Lenient
    };
    let factory = UnitOfWorkFactory::new(StoreConfig::new(database).with_commit_mode(commit_mode));
    let uow = factory
        .create()
        .with_context(|| format!("failed to open database `{}`", cli.database))?;
    let mut controller = ProductController::new(uow);

    let status = match cli.command {
        Commands::List => respond(controller.get_all())?,
        Commands::Get { id } => respond(controller.get_by_id(id))?,
        Commands::Add { body } => {
            let product = parse_body(&body)?;
            respond(controller.add(&product))?
        }
        Commands::Update { id, body } => {
            let product = parse_body(&body)?;
            respond(controller.update(id, &product))?
        }
        Commands::Delete { id } => respond(controller.delete(id))?,
    };

    Ok(if (200..300).contains(&status) {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(u8::try_from(status / 100).unwrap_or(1))
    })
}

fn parse_body(body: &str) -> Result<Product> {
    serde_json::from_str(body).context("request body is not a valid product JSON object")
}

fn respond<T: Serialize>(result: ActionResult<T>) -> Result<u16> {
    let status = result.status_code();
    println!("status={status}");
    match &result {
        ActionResult::Ok(body) => println!("{}", serde_json::to_string_pretty(body)?),
        ActionResult::BadRequest(message) | ActionResult::Failure(message) => {
            println!("{}", serde_json::json!({ "error": message }))
        }
        ActionResult::NoContent | ActionResult::NotFound => {}
    }
    Ok(status)
}
