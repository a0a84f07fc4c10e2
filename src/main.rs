use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use cityflow::broker::BrokerClient;
use cityflow::config::{load_config, CityflowConfig};
use cityflow::files;
use cityflow::seed;
use cityflow::store::EntityStore;

#[derive(Parser)]
#[command(author, version, about = "Smart-city entity conversion and broker sync")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate randomized seed entities into the store
    Seed,
    /// Export store entities to per-type CSV files
    ExportCsv,
    /// Import CSV files into the store, replacing each type
    ImportCsv,
    /// Export store entities to per-type GeoJSON files
    ExportGeojson,
    /// Convert GeoJSON exports back to CSV
    GeojsonToCsv,
    /// Import a plain-JSON traffic feed file into the store
    IngestFeed {
        /// Path to the feed file
        file: PathBuf,
    },
    /// Push all store entities to the context broker
    Sync,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cityflow=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path, e))?,
        None => CityflowConfig::default(),
    };
    config.apply_env();

    match cli.command {
        Command::Seed => run_seed(&config),
        Command::ExportCsv => run_export_csv(&config),
        Command::ImportCsv => run_import_csv(&config),
        Command::ExportGeojson => run_export_geojson(&config),
        Command::GeojsonToCsv => run_geojson_to_csv(&config),
        Command::IngestFeed { file } => run_ingest_feed(&config, &file),
        Command::Sync => run_sync(&config).await,
    }
}

fn run_seed(config: &CityflowConfig) -> Result<()> {
    let store = EntityStore::open(&config.data.db_path)?;
    store.clear()?;

    let entities = seed::generate_city(&config.seed);
    let inserted = store.upsert_all(&entities)?;

    for (entity_type, count) in store.counts_by_type()? {
        info!(entity_type = %entity_type, count, "Seeded");
    }
    info!(
        total = inserted,
        db = %config.data.db_path.display(),
        "Seed data generation complete"
    );
    Ok(())
}

fn run_export_csv(config: &CityflowConfig) -> Result<()> {
    let store = EntityStore::open(&config.data.db_path)?;
    let report = files::export_store_to_csv(&store, &config.data.csv_dir)?;
    info!(
        files = report.files,
        entities = report.entities,
        skipped = report.skipped_rows,
        "CSV export complete"
    );
    Ok(())
}

fn run_import_csv(config: &CityflowConfig) -> Result<()> {
    let store = EntityStore::open(&config.data.db_path)?;
    let report = files::import_csv_to_store(
        &store,
        &config.data.csv_dir,
        &config.broker.context_url,
    )?;
    info!(
        files = report.files,
        entities = report.entities,
        skipped_files = report.skipped_files,
        skipped_rows = report.skipped_rows,
        "CSV import complete"
    );
    Ok(())
}

fn run_export_geojson(config: &CityflowConfig) -> Result<()> {
    let store = EntityStore::open(&config.data.db_path)?;
    let report = files::export_store_to_geojson(&store, &config.data.geojson_dir)?;
    info!(
        files = report.files,
        features = report.entities,
        dropped = report.skipped_rows,
        "GeoJSON export complete"
    );
    Ok(())
}

fn run_geojson_to_csv(config: &CityflowConfig) -> Result<()> {
    let report = files::geojson_dir_to_csv(&config.data.geojson_dir, &config.data.csv_dir)?;
    info!(
        files = report.files,
        rows = report.entities,
        skipped_files = report.skipped_files,
        "GeoJSON to CSV conversion complete"
    );
    Ok(())
}

fn run_ingest_feed(config: &CityflowConfig, file: &Path) -> Result<()> {
    let store = EntityStore::open(&config.data.db_path)?;
    let report = files::import_feed_to_store(&store, file)?;
    info!(
        entities = report.entities,
        skipped_rows = report.skipped_rows,
        skipped_files = report.skipped_files,
        "Traffic feed ingestion complete"
    );
    Ok(())
}

async fn run_sync(config: &CityflowConfig) -> Result<()> {
    let store = EntityStore::open(&config.data.db_path)?;

    let mut entities = Vec::new();
    for entity_type in store.types()? {
        let (mut parsed, _) = files::load_type(&store, &entity_type)?;
        entities.append(&mut parsed);
    }
    if entities.is_empty() {
        info!("Nothing to sync, store is empty");
        return Ok(());
    }

    let client = BrokerClient::new(config.broker.clone());
    client.wait_until_ready().await?;

    let report = client.push_all(&entities).await;
    info!(
        succeeded = report.succeeded,
        failed = report.failed(),
        "Broker sync complete"
    );
    Ok(())
}
