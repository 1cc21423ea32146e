use clap::{Parser, Subcommand};
use atelier::catalog::NodeCatalog;
use atelier::ops::generation::GenerationClient;
use atelier::runtime::Engine;
use atelier::store::WorkflowStore;
use atelier::store::redis_store::RedisWorkflowStore;
use atelier::transfer;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use anyhow::{Result, bail};
use tracing::{info, warn};
use uuid::Uuid;

const DEFAULT_REDIS: &str = "redis://127.0.0.1:6379/0";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and execute a workflow document
    Run {
        /// Path to the workflow JSON document
        #[arg(long, short)]
        file: PathBuf,

        /// Base URL of the generation API
        #[arg(long, default_value = "http://127.0.0.1:7860")]
        base_url: String,

        /// Bearer token for the generation API
        #[arg(long)]
        api_key: Option<String>,

        /// Request timeout for generation calls, in seconds
        #[arg(long, default_value_t = 120)]
        timeout_secs: u64,
    },

    /// Validate a workflow document without executing it
    Check {
        #[arg(long, short)]
        file: PathBuf,
    },

    /// Save a workflow document into the store
    Save {
        #[arg(long, short)]
        file: PathBuf,

        #[arg(long, default_value = "local")]
        owner: String,

        /// Redis connection URL
        #[arg(long, default_value = DEFAULT_REDIS)]
        redis: String,
    },

    /// List stored workflows of one owner
    List {
        #[arg(long, default_value = "local")]
        owner: String,

        #[arg(long, default_value = DEFAULT_REDIS)]
        redis: String,
    },

    /// Write a stored workflow back out as a document file
    Fetch {
        #[arg(long)]
        id: Uuid,

        #[arg(long, short)]
        out: PathBuf,

        #[arg(long, default_value = DEFAULT_REDIS)]
        redis: String,
    },

    /// Delete a stored workflow
    Delete {
        #[arg(long)]
        id: Uuid,

        #[arg(long, default_value = DEFAULT_REDIS)]
        redis: String,
    },
}

fn builtin_catalog(base_url: &str, api_key: Option<String>, timeout_secs: u64) -> Result<NodeCatalog> {
    let client = GenerationClient::new(base_url, api_key, Duration::from_secs(timeout_secs))?;
    Ok(NodeCatalog::builtin(client))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            base_url,
            api_key,
            timeout_secs,
        } => {
            let catalog = Arc::new(builtin_catalog(&base_url, api_key, timeout_secs)?);
            let definition = transfer::import_from_file(&file, &catalog)?;
            info!(workflow = %definition.name, "document loaded");

            let engine = Engine::new(catalog);
            let report = engine.run(&definition).await?;

            for (node_id, state) in &report.nodes {
                match &state.error {
                    Some(error) => warn!(node = %node_id, status = ?state.status, %error),
                    None => info!(node = %node_id, status = ?state.status),
                }
            }
            info!(
                completed = report.completed,
                errored = report.errored,
                skipped = report.skipped,
                "run complete"
            );

            if report.errored > 0 {
                bail!("run finished with {} failed node(s)", report.errored);
            }
        }

        Commands::Check { file } => {
            let catalog = Arc::new(builtin_catalog("http://127.0.0.1:7860", None, 120)?);
            let definition = transfer::import_from_file(&file, &catalog)?;
            info!(
                workflow = %definition.name,
                nodes = definition.nodes.len(),
                edges = definition.edges.len(),
                "document is valid"
            );
        }

        Commands::Save { file, owner, redis } => {
            let catalog = Arc::new(builtin_catalog("http://127.0.0.1:7860", None, 120)?);
            let definition = transfer::import_from_file(&file, &catalog)?;

            let store = RedisWorkflowStore::open(&redis)?;
            let record = store.create(&owner, definition).await?;
            info!(id = %record.id, name = %record.name, "workflow saved");
        }

        Commands::List { owner, redis } => {
            let store = RedisWorkflowStore::open(&redis)?;
            let records = store.list(&owner).await?;
            for record in &records {
                info!(
                    id = %record.id,
                    name = %record.name,
                    favorite = record.favorite,
                    updated = %record.updated_at,
                );
            }
            info!(count = records.len(), "workflows listed");
        }

        Commands::Fetch { id, out, redis } => {
            let store = RedisWorkflowStore::open(&redis)?;
            let Some(record) = store.get(id).await? else {
                bail!("workflow {} not found", id);
            };
            transfer::export_to_file(&record.definition, &out)?;
            info!(id = %record.id, path = %out.display(), "workflow exported");
        }

        Commands::Delete { id, redis } => {
            let store = RedisWorkflowStore::open(&redis)?;
            if store.delete(id).await? {
                info!(%id, "workflow deleted");
            } else {
                bail!("workflow {} not found", id);
            }
        }
    }

    Ok(())
}
