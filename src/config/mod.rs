use serde::Deserialize;
use std::path::PathBuf;

/// Complete Cityflow configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CityflowConfig {
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

/// Context broker connection and readiness settings
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Base URL of the NGSI-LD context broker
    #[serde(default = "default_broker_url")]
    pub url: String,
    /// JSON-LD context document accompanying every entity
    #[serde(default = "default_context_url")]
    pub context_url: String,
    /// Readiness probe attempts before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Fixed delay between readiness probes (seconds)
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: u64,
}

fn default_broker_url() -> String {
    "http://localhost:1026".to_string()
}

fn default_context_url() -> String {
    "https://uri.etsi.org/ngsi-ld/v1/ngsi-ld-core-context.jsonld".to_string()
}

fn default_max_retries() -> u32 {
    30
}

fn default_retry_delay() -> u64 {
    2
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: default_broker_url(),
            context_url: default_context_url(),
            max_retries: default_max_retries(),
            retry_delay_seconds: default_retry_delay(),
        }
    }
}

/// Datastore and export directory locations
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Directory for per-type CSV files
    #[serde(default = "default_csv_dir")]
    pub csv_dir: PathBuf,
    /// Directory for per-type GeoJSON files
    #[serde(default = "default_geojson_dir")]
    pub geojson_dir: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("cityflow.db")
}

fn default_csv_dir() -> PathBuf {
    PathBuf::from("csv_exports")
}

fn default_geojson_dir() -> PathBuf {
    PathBuf::from("geojson_exports")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            csv_dir: default_csv_dir(),
            geojson_dir: default_geojson_dir(),
        }
    }
}

/// Seed generation tunables. Counts are `[min, max]` ranges, inclusive.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    /// Namespace segment of generated entity URNs
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Observation timestamps fall within the last N days
    #[serde(default = "default_days_back")]
    pub days_back: i64,
    #[serde(default = "default_traffic_flow")]
    pub traffic_flow: [usize; 2],
    #[serde(default = "default_incidents")]
    pub incidents: [usize; 2],
    #[serde(default = "default_vehicles")]
    pub vehicles: [usize; 2],
    #[serde(default = "default_facilities")]
    pub facilities: [usize; 2],
    #[serde(default = "default_flood_sensors")]
    pub flood_sensors: [usize; 2],
    #[serde(default = "default_flood_zones")]
    pub flood_zones: [usize; 2],
}

fn default_namespace() -> String {
    "HCMC".to_string()
}

fn default_days_back() -> i64 {
    7
}

fn default_traffic_flow() -> [usize; 2] {
    [28, 32]
}

fn default_incidents() -> [usize; 2] {
    [38, 45]
}

fn default_vehicles() -> [usize; 2] {
    [23, 28]
}

fn default_facilities() -> [usize; 2] {
    [9, 12]
}

fn default_flood_sensors() -> [usize; 2] {
    [42, 48]
}

fn default_flood_zones() -> [usize; 2] {
    [18, 22]
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            days_back: default_days_back(),
            traffic_flow: default_traffic_flow(),
            incidents: default_incidents(),
            vehicles: default_vehicles(),
            facilities: default_facilities(),
            flood_sensors: default_flood_sensors(),
            flood_zones: default_flood_zones(),
        }
    }
}

impl Default for CityflowConfig {
    fn default() -> Self {
        Self {
            broker: BrokerConfig::default(),
            data: DataConfig::default(),
            seed: SeedConfig::default(),
        }
    }
}

impl CityflowConfig {
    /// Apply environment overrides: `BROKER_URL` and `DATA_DIR` (the CSV
    /// exchange directory) take precedence over file values.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("BROKER_URL") {
            self.broker.url = url;
        }
        if let Ok(dir) = std::env::var("DATA_DIR") {
            self.data.csv_dir = PathBuf::from(dir);
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<CityflowConfig, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let config: CityflowConfig = toml::from_str(&contents)?;
    Ok(config)
}
