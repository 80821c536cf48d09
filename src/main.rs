//! Service entry point.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::SqlitePool;
use tracing::info;

use pursue_reminders::adapters::push::{NullDispatcher, PushGatewayDispatcher};
use pursue_reminders::adapters::sqlite::{
    initialize_database, verify_connection, Migrator, PoolConfig, SqliteGroupRepository,
    SqlitePatternRepository, SqlitePreferenceRepository, SqliteProgressRepository,
    SqliteReminderRepository,
};
use pursue_reminders::domain::models::Config;
use pursue_reminders::domain::ports::{
    GroupRepository, NotificationDispatcher, PatternRepository, PreferenceRepository,
    ProgressRepository, ReminderRepository,
};
use pursue_reminders::infrastructure::config::ConfigLoader;
use pursue_reminders::infrastructure::http::{build_router, AppState};
use pursue_reminders::infrastructure::logging;
use pursue_reminders::services::{EffectivenessService, PatternService, ReminderBatchService};

#[derive(Parser)]
#[command(name = "pursue-reminders")]
#[command(about = "Adaptive reminder scheduling backend for the Pursue habit tracker")]
struct Cli {
    /// Path to a config file (defaults to pursue.yaml plus PURSUE_* env vars)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Run a single job inline and print its summary as JSON
    Job {
        #[command(subcommand)]
        job: JobCommand,
    },
}

#[derive(Subcommand)]
enum JobCommand {
    /// One reminder batch run
    Reminders,
    /// Pattern recalculation sweep
    Patterns,
    /// Effectiveness back-fill
    Effectiveness,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    logging::init(&config.logging)?;

    let database_url = format!("sqlite:{}", config.database.path);
    let pool = initialize_database(
        &database_url,
        Some(PoolConfig {
            max_connections: config.database.max_connections,
            ..Default::default()
        }),
    )
    .await
    .context("database initialization failed")?;
    verify_connection(&pool)
        .await
        .context("database connection check failed")?;

    match cli.command {
        Commands::Migrate => {
            let version = Migrator::new(pool).get_current_version().await?;
            info!(version, "database schema is up to date");
            Ok(())
        }
        Commands::Serve => serve(config, pool).await,
        Commands::Job { job } => run_job(job, &config, pool).await,
    }
}

fn build_state(config: &Config, pool: SqlitePool) -> Result<AppState> {
    let groups: Arc<dyn GroupRepository> = Arc::new(SqliteGroupRepository::new(pool.clone()));
    let progress: Arc<dyn ProgressRepository> = Arc::new(SqliteProgressRepository::new(pool.clone()));
    let patterns: Arc<dyn PatternRepository> = Arc::new(SqlitePatternRepository::new(pool.clone()));
    let preferences: Arc<dyn PreferenceRepository> =
        Arc::new(SqlitePreferenceRepository::new(pool.clone()));
    let reminders: Arc<dyn ReminderRepository> = Arc::new(SqliteReminderRepository::new(pool));

    let dispatcher: Arc<dyn NotificationDispatcher> = if config.push.gateway_url.is_empty() {
        Arc::new(NullDispatcher)
    } else {
        Arc::new(PushGatewayDispatcher::new(&config.push)?)
    };

    let batch = Arc::new(ReminderBatchService::new(
        groups.clone(),
        progress.clone(),
        patterns.clone(),
        preferences.clone(),
        reminders.clone(),
        dispatcher,
        config.scheduler.clone(),
    ));
    let pattern_service = Arc::new(PatternService::new(
        patterns.clone(),
        progress.clone(),
        groups.clone(),
        &config.scheduler,
    ));
    let effectiveness = Arc::new(EffectivenessService::new(
        reminders,
        progress,
        config.scheduler.clone(),
    ));

    Ok(AppState {
        batch,
        pattern_service,
        effectiveness,
        preferences,
        patterns,
        groups,
        auth_token: Arc::from(config.http.auth_token.as_str()),
    })
}

async fn serve(config: Config, pool: SqlitePool) -> Result<()> {
    if config.http.auth_token.is_empty() {
        bail!("http.auth_token must be set; refusing to serve unauthenticated");
    }

    let state = build_state(&config, pool)?;
    let router = build_router(state);

    let addr = format!("{}:{}", config.http.bind_address, config.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "pursue-reminders listening");

    axum::serve(listener, router).await.context("server error")
}

async fn run_job(job: JobCommand, config: &Config, pool: SqlitePool) -> Result<()> {
    let state = build_state(config, pool)?;
    let now = Utc::now();

    let summary = match job {
        JobCommand::Reminders => serde_json::to_string_pretty(&state.batch.run(now).await?)?,
        JobCommand::Patterns => {
            serde_json::to_string_pretty(&state.pattern_service.run_sweep(now).await?)?
        }
        JobCommand::Effectiveness => {
            serde_json::to_string_pretty(&state.effectiveness.run(now).await?)?
        }
    };

    println!("{summary}");
    Ok(())
}
