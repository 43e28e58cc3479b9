//! CLI command definitions for judgeforge.
//!
//! One subcommand per logical operation; every outcome is printed as the
//! uniform response envelope in JSON. The HTTP front end is an external
//! collaborator; this CLI is the in-repo transport for operating the
//! pipeline directly.

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use crate::config::ServiceConfig;
use crate::dispatch::RedisPublisher;
use crate::ingest::{FileStore, IngestError};
use crate::problem::ProblemDraft;
use crate::response::Envelope;
use crate::service::{ProblemService, ServiceError};
use crate::store::PgProblemStore;

/// Problem intake and grading-dispatch pipeline.
#[derive(Parser)]
#[command(name = "judgeforge")]
#[command(about = "Manage programming-exercise problems and dispatch test data for grading")]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new problem.
    Create(CreateArgs),

    /// Attach a test-data file to a problem and dispatch it for grading.
    Attach(AttachArgs),

    /// Fetch one problem with decoded payloads.
    Get(GetArgs),

    /// List problem summaries.
    List(ListArgs),

    /// Count all problems.
    Count,
}

/// Arguments for `judgeforge create`.
#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Problem title.
    #[arg(long)]
    pub title: String,

    /// Full problem statement.
    #[arg(long)]
    pub description: String,

    /// Structured example input, as inline JSON.
    #[arg(long)]
    pub example: String,

    /// Structured expected output, as inline JSON.
    #[arg(long)]
    pub output: String,

    /// Reference solution source.
    #[arg(long)]
    pub solution: String,

    /// Identity of the posting user (stands in for the session identity).
    #[arg(long)]
    pub poster: String,
}

/// Arguments for `judgeforge attach`.
#[derive(Parser, Debug)]
pub struct AttachArgs {
    /// Problem identifier.
    #[arg(long)]
    pub id: i64,

    /// Path to the test-data file to upload.
    #[arg(long)]
    pub file: String,
}

/// Arguments for `judgeforge get`.
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Problem identifier.
    #[arg(long)]
    pub id: i64,
}

/// Arguments for `judgeforge list`.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Number of records to skip.
    #[arg(long, default_value = "0")]
    pub offset: i64,

    /// Maximum number of records to return.
    #[arg(long, default_value = "20")]
    pub limit: i64,
}

/// Parses CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Runs the CLI with parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let config = ServiceConfig::from_env()?;
    let service = build_service(&config).await?;

    let envelope = execute(&service, cli.command).await;
    println!("{}", serde_json::to_string_pretty(&envelope)?);

    Ok(())
}

/// Wires the shared capabilities once for the process lifetime.
async fn build_service(config: &ServiceConfig) -> anyhow::Result<ProblemService> {
    let store = PgProblemStore::connect(&config.database_url).await?;
    store.run_migrations().await?;

    let publisher = RedisPublisher::connect(&config.redis_url).await?;

    info!(
        data_dir = %config.data_dir.display(),
        topic = %config.dispatch_topic,
        "service initialized"
    );

    Ok(ProblemService::new(
        Arc::new(store),
        FileStore::new(&config.data_dir),
        Arc::new(publisher),
        &config.dispatch_topic,
    ))
}

/// Executes one command and renders its envelope.
async fn execute(service: &ProblemService, command: Commands) -> Envelope {
    match command {
        Commands::Create(args) => {
            let example = match serde_json::from_str(&args.example) {
                Ok(value) => value,
                Err(e) => return Envelope::bind_error(format!("example is not valid JSON: {}", e)),
            };
            let output = match serde_json::from_str(&args.output) {
                Ok(value) => value,
                Err(e) => return Envelope::bind_error(format!("output is not valid JSON: {}", e)),
            };

            let draft = ProblemDraft::new(
                args.title,
                args.description,
                example,
                output,
                args.solution,
            );
            match service.create_problem(&draft, &args.poster).await {
                Ok(id) => Envelope::ok(serde_json::json!({"problem_id": id})),
                Err(e) => Envelope::from_error(&e),
            }
        }

        Commands::Attach(args) => {
            let upload = match tokio::fs::read(&args.file).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    return Envelope::from_error(&ServiceError::Ingest(IngestError::Io(e)));
                }
            };
            match service.attach_data(args.id, &upload).await {
                Ok(()) => Envelope::ok_empty(),
                Err(e) => Envelope::from_error(&e),
            }
        }

        Commands::Get(args) => match service.get_problem(args.id).await {
            Ok(detail) => match serde_json::to_value(&detail) {
                Ok(value) => Envelope::ok(value),
                Err(e) => Envelope::from_error(&ServiceError::Codec(
                    crate::codec::CodecError::Encode(e),
                )),
            },
            Err(e) => Envelope::from_error(&e),
        },

        Commands::List(args) => match service.list_problems(args.offset, args.limit).await {
            Ok(summaries) => match serde_json::to_value(&summaries) {
                Ok(value) => Envelope::ok(value),
                Err(e) => Envelope::from_error(&ServiceError::Codec(
                    crate::codec::CodecError::Encode(e),
                )),
            },
            Err(e) => Envelope::from_error(&e),
        },

        Commands::Count => match service.count_problems().await {
            Ok(count) => Envelope::ok(serde_json::json!({"count": count})),
            Err(e) => Envelope::from_error(&e),
        },
    }
}
