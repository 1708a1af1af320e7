use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub storage: StorageConfig,
    pub report: ReportConfig,
}

/// HTTP fetch configuration, shared by every job
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Output location configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Base directory for rendered pages and legacy root-level JSON files.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Name of the data subdirectory under `base_dir`.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

/// Reporting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    /// IANA timezone the "local day" is anchored to.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl StorageConfig {
    /// Path of a file inside the data subdirectory.
    pub fn data_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(&self.data_dir).join(name)
    }

    /// Path of a file directly under the base directory.
    pub fn root_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }
}

impl ReportConfig {
    pub fn tz(&self) -> Result<chrono_tz::Tz> {
        self.timezone
            .parse()
            .map_err(|e| anyhow::anyhow!("Bad timezone {:?}: {}", self.timezone, e))
    }
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_timeout_secs() -> u64 {
    20
}
fn default_max_retries() -> u32 {
    4
}
fn default_backoff_base_ms() -> u64 {
    1000
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (market-pulse daily metrics bot)".to_string()
}
fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_data_dir() -> String {
    "data".to_string()
}
fn default_timezone() -> String {
    "Asia/Shanghai".to_string()
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("PULSE").separator("__"))
            .build()?;

        let app_cfg: AppConfig = cfg.try_deserialize().unwrap_or_else(|_| AppConfig::default());
        Ok(app_cfg)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig {
                timeout_secs: default_timeout_secs(),
                max_retries: default_max_retries(),
                backoff_base_ms: default_backoff_base_ms(),
                user_agent: default_user_agent(),
            },
            storage: StorageConfig {
                base_dir: default_base_dir(),
                data_dir: default_data_dir(),
            },
            report: ReportConfig {
                timezone: default_timezone(),
            },
        }
    }
}
