//! # Marketing Portal Ops
//!
//! Command-line maintenance for the portal database.
//!
//! ## Usage
//!
//! ```bash
//! export COSMOS_DB_ENDPOINT=https://account.documents.azure.com:443/
//! export COSMOS_DB_KEY=...
//!
//! cargo run -p portal-ops -- init-db
//! cargo run -p portal-ops -- apply-indexes --dry-run
//! cargo run -p portal-ops -- seed --print-token
//! ```

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use portal_ops::{
    indexes::apply_composite_indexes,
    init::init_db,
    seed::{seed, SeedData, DEMO_ORG_ID, DEMO_OWNER_ID},
};
use portal_shared::auth::jwt::{create_token, Claims, MIN_SECRET_LENGTH};
use portal_shared::db::{cosmos::CosmosConfig, ContainerStatus, CosmosStore, SharedStore};
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "portal-ops", version, about = "Marketing portal database maintenance")]
struct Cli {
    #[command(flatten)]
    cosmos: CosmosArgs,

    /// Report what would change without writing anything
    #[arg(long, global = true)]
    dry_run: bool,

    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct CosmosArgs {
    /// Cosmos DB account endpoint
    #[arg(long, env = "COSMOS_DB_ENDPOINT")]
    endpoint: String,

    /// Cosmos DB master key (base64)
    #[arg(long, env = "COSMOS_DB_KEY", hide_env_values = true)]
    key: String,

    #[arg(long, env = "COSMOS_DB_DATABASE_ID", default_value = "marketing-portal")]
    database: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "COSMOS_DB_TIMEOUT_SECONDS", default_value_t = 30)]
    timeout_seconds: u64,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the database and any missing containers
    InitDb,

    /// Apply the catalogued composite indexes to every container
    ApplyIndexes,

    /// Upsert the demo organization, users and projects
    Seed {
        /// Print a session token for the demo owner
        #[arg(long)]
        print_token: bool,

        /// Session signing secret, required with --print-token
        #[arg(long, env = "NEXTAUTH_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },
}

fn status_label(status: ContainerStatus, dry_run: bool) -> &'static str {
    match (status, dry_run) {
        (ContainerStatus::Created, false) => "created",
        (ContainerStatus::Created, true) => "would create",
        (ContainerStatus::Existing, _) => "exists",
    }
}

fn demo_token(secret: Option<&str>, email: &str) -> anyhow::Result<String> {
    let secret = secret.context("--print-token needs NEXTAUTH_SECRET")?;
    if secret.len() < MIN_SECRET_LENGTH {
        bail!("NEXTAUTH_SECRET must be at least {} characters", MIN_SECRET_LENGTH);
    }

    let claims = Claims::new(DEMO_OWNER_ID, DEMO_ORG_ID, email);
    Ok(create_token(&claims, secret)?)
}

async fn run(cli: Cli, store: SharedStore) -> anyhow::Result<()> {
    let dry_run = cli.dry_run;

    match cli.command {
        Command::InitDb => {
            let report = init_db(&store, dry_run).await.context("Database initialization failed")?;

            if cli.json {
                let rows: Vec<_> = report
                    .iter()
                    .map(|(name, status)| json!({ "container": name, "status": status_label(*status, dry_run) }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for (name, status) in &report {
                    println!("{:<16} {}", name, status_label(*status, dry_run));
                }
            }
        }

        Command::ApplyIndexes => {
            let changes = apply_composite_indexes(&store, dry_run)
                .await
                .context("Applying composite indexes failed")?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&changes)?);
            } else {
                for change in &changes {
                    println!(
                        "{:<16} {:<10} ({} composite indexes)",
                        change.container, change.outcome, change.composite_indexes
                    );
                }
            }
        }

        Command::Seed { print_token, secret } => {
            let data = SeedData::demo().context("Demo data failed validation")?;

            // Fail before writing anything
            let token = if print_token {
                let email = data
                    .users
                    .iter()
                    .find(|u| u.id == DEMO_OWNER_ID)
                    .map(|u| u.email.clone())
                    .unwrap_or_default();
                Some(demo_token(secret.as_deref(), &email)?)
            } else {
                None
            };

            let counts = if dry_run {
                data.counts()
            } else {
                seed(&store, &data).await.context("Seeding failed")?
            };

            if cli.json {
                let counts: serde_json::Map<_, _> = counts
                    .iter()
                    .map(|(name, n)| (name.to_string(), json!(n)))
                    .collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({ "dryRun": dry_run, "documents": counts, "token": token }))?
                );
            } else {
                let verb = if dry_run { "would upsert" } else { "upserted" };
                for (name, n) in &counts {
                    println!("{:<16} {} {}", name, verb, n);
                }
                if let Some(token) = token {
                    println!("\nSession token for {}:\n{}", DEMO_OWNER_ID, token);
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal_ops=info,portal_shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!(
        database = %cli.cosmos.database,
        dry_run = cli.dry_run,
        "Marketing Portal Ops v{}",
        env!("CARGO_PKG_VERSION")
    );

    let store: SharedStore = Arc::new(
        CosmosStore::new(CosmosConfig {
            endpoint: cli.cosmos.endpoint.clone(),
            key: cli.cosmos.key.clone(),
            database_id: cli.cosmos.database.clone(),
            timeout_seconds: cli.cosmos.timeout_seconds,
        })
        .context("Failed to configure Cosmos DB client")?,
    );

    run(cli, store).await
}
