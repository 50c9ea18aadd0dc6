//! Standings sync
//!
//! Fetches the current league table, normalizes it to an ordered list of
//! canonical team names and overwrites a single Firestore document with
//! `{standings, lastUpdated}`.
//!
//! One invocation is one run. Scheduling and re-running belong to the
//! caller (cron, Cloud Scheduler, CI). Exit code is 0 on success and
//! non-zero on any failure; details go to the log.

use tracing::{error, info};

use standings_sync::auth::Credentials;
use standings_sync::config::Settings;
use standings_sync::errors::StandingsError;
use standings_sync::pipeline::{PipelineConfig, RunReport, StandingsPipeline};
use standings_sync::source::client::{ReqwestTransport, StandingsFetcher};
use standings_sync::store::firestore::FirestoreStore;
use standings_sync::store::memory::MemoryStore;
use standings_sync::store::StandingsStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration.
    let settings = Settings::from_env();

    // Initialize logging.
    init_logging(&settings);

    info!("=== Standings sync ===");
    info!(
        source_kind = ?settings.source_kind,
        source_url = %settings.source_url,
        collection = %settings.destination_collection,
        document = %settings.destination_document,
        expected_teams = settings.expected_team_count,
        fetch_budget_secs = settings.fetch_policy().worst_case().as_secs(),
        dry_run = settings.dry_run,
        "Configuration loaded"
    );

    // Validate settings.
    if let Err(errors) = settings.validate() {
        for e in &errors {
            error!(error = %e, "Configuration error");
        }
        anyhow::bail!("Configuration validation failed");
    }

    let config = match settings.pipeline_config() {
        Ok(config) => config,
        Err(e) => {
            error!(stage = "setup", error = %e, "Destination path invalid");
            return Err(e.into());
        }
    };

    let result = if settings.dry_run {
        // Never written to; the pipeline stops before the persist stage.
        execute(&settings, config, MemoryStore::new()).await
    } else {
        let store = match build_firestore(&settings) {
            Ok(store) => store,
            Err(e) => {
                error!(stage = "setup", error = %e, "Destination client initialization failed");
                return Err(e);
            }
        };
        execute(&settings, config, store).await
    };

    match result {
        Ok(report) => {
            info!(
                locator = report.locator,
                teams = report.document.standings.len(),
                dropped = report.dropped.len(),
                persisted = report.persisted,
                "Standings sync finished"
            );
            Ok(())
        }
        Err(e) => {
            error!(
                stage = e.stage(),
                transient = e.is_transient(),
                error = %e,
                "Standings sync failed"
            );
            Err(e.into())
        }
    }
}

async fn execute<S: StandingsStore>(
    settings: &Settings,
    config: PipelineConfig,
    store: S,
) -> Result<RunReport, StandingsError> {
    let transport = ReqwestTransport::new().map_err(StandingsError::SourceRejected)?;
    let fetcher = StandingsFetcher::new(
        transport,
        settings.source_request(),
        settings.fetch_policy(),
    );

    StandingsPipeline::new(fetcher, store, config).run().await
}

/// Build the destination client once for the whole process.
fn build_firestore(settings: &Settings) -> anyhow::Result<FirestoreStore> {
    let credentials = Credentials::resolve(
        &settings.firestore_emulator_host,
        &settings.firestore_access_token,
        &settings.credentials_file,
    )?;

    let project_id = if settings.firestore_project_id.is_empty() {
        credentials.project_id().unwrap_or_default().to_string()
    } else {
        settings.firestore_project_id.clone()
    };

    info!(
        project_id = %project_id,
        database = %settings.firestore_database,
        emulator = credentials.is_emulator(),
        credentials = ?credentials,
        "Destination client initialized"
    );

    let store = FirestoreStore::new(credentials, &project_id, &settings.firestore_database, 30)?;
    Ok(store)
}

fn init_logging(settings: &Settings) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));

    if settings.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}
