use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ouramind_core::emotion::parse_emotion_list;
use ouramind_core::trend::DEFAULT_TREND_DAYS;
use ouramind_db::DbPool;
use ouramind_db::models::reflection_tool::CreateReflectionTool;
use ouramind_nlu::NluClient;
use ouramind_pipeline::{JournalService, PipelineConfig, ToolCatalogService};

#[derive(Parser)]
#[command(name = "ouramind")]
#[command(about = "Maintenance commands for the ouramind journal store")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply bundled database migrations
    Migrate,

    /// Create reflection tools from a JSON array, skipping existing paths
    SeedTools {
        file: PathBuf,
    },

    /// Print a user's daily emotion averages as JSON
    Trends {
        #[arg(long)]
        user: i64,

        /// Rolling window ending today
        #[arg(long, conflicts_with_all = ["start", "end"])]
        days: Option<i64>,

        #[arg(long, requires = "end")]
        start: Option<NaiveDate>,

        #[arg(long, requires = "start")]
        end: Option<NaiveDate>,

        /// Comma-separated emotion names (default: all)
        #[arg(long)]
        emotions: Option<String>,
    },

    /// Print the public entry behind a share token as JSON
    Resolve {
        token: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ouramind=info,ouramind_pipeline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate => {
            let pool = connect_from_env().await?;
            ouramind_db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");
        }
        Commands::SeedTools { file } => {
            let pool = connect_from_env().await?;
            seed_tools(pool, &file).await?;
        }
        Commands::Trends {
            user,
            days,
            start,
            end,
            emotions,
        } => {
            let journal = journal_from_env().await?;
            let emotions = parse_emotion_list(emotions.as_deref())?;
            let points = match (start, end) {
                (Some(start), Some(end)) => {
                    journal.trends_between(user, start, end, &emotions).await?
                }
                _ => {
                    let days = days.unwrap_or(DEFAULT_TREND_DAYS);
                    journal.trends_last_days(user, days, &emotions).await?
                }
            };
            println!("{}", serde_json::to_string_pretty(&points)?);
        }
        Commands::Resolve { token } => {
            let journal = journal_from_env().await?;
            let entry = journal.resolve(&token).await?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
    }

    Ok(())
}

/// Connect using only `DATABASE_URL` and `DB_MAX_CONNECTIONS`.
async fn connect_from_env() -> anyhow::Result<DbPool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let max_connections = match std::env::var("DB_MAX_CONNECTIONS") {
        Ok(raw) => raw
            .trim()
            .parse()
            .context("DB_MAX_CONNECTIONS must be a positive integer")?,
        Err(_) => ouramind_db::DEFAULT_MAX_CONNECTIONS,
    };
    connect(&database_url, max_connections).await
}

async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<DbPool> {
    let pool = ouramind_db::create_pool(database_url, max_connections)
        .await
        .context("Failed to connect to database")?;
    ouramind_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::debug!(max_connections, "Database connection pool created");
    Ok(pool)
}

/// Build a [`JournalService`] from the full pipeline configuration.
async fn journal_from_env() -> anyhow::Result<JournalService> {
    let config = PipelineConfig::from_env().context("Invalid pipeline configuration")?;
    tracing::info!(
        db_max_connections = config.db_max_connections,
        nlu_api_version = %config.nlu.api_version,
        "Loaded pipeline configuration",
    );

    let pool = connect(&config.database_url, config.db_max_connections).await?;
    let classifier = NluClient::new(config.nlu.clone()).context("Failed to build NLU client")?;

    Ok(JournalService::new(
        pool,
        Arc::new(config.cipher),
        Arc::new(classifier),
        config.journal,
    ))
}

async fn seed_tools(pool: DbPool, file: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let tools: Vec<CreateReflectionTool> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of tools", file.display()))?;

    let catalog = ToolCatalogService::new(pool);
    let (mut created, mut skipped) = (0usize, 0usize);
    for tool in tools {
        match catalog.get_by_path(tool.path.trim()).await {
            Ok(existing) => {
                tracing::info!(path = %existing.path, "Tool already exists, skipping");
                skipped += 1;
            }
            Err(err) if err.is_not_found() => {
                catalog
                    .create(tool)
                    .await
                    .context("Failed to create reflection tool")?;
                created += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }

    tracing::info!(created, skipped, "Tool seeding finished");
    Ok(())
}
