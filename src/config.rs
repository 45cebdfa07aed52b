use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result, ensure};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub generator: GeneratorConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub output: PathBuf,
    pub min_rows: usize,
    pub max_rows: usize, // exclusive
    pub coordinate_jitter: f64, // degrees
    pub lookback_days: i64, // exclusive
    pub preview_rows: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            output: PathBuf::from("health_data_sample.csv"),
            min_rows: 80,
            max_rows: 120,
            coordinate_jitter: 0.15,
            lookback_days: 365,
            preview_rows: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClientConfig {
    pub service_origin: String,
    pub max_file_bytes: u64,
    pub progress_interval_ms: u64,
    pub progress_step: u8,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service_origin: "https://healthmap-m780.onrender.com".to_string(),
            max_file_bytes: 10 * 1024 * 1024,
            progress_interval_ms: 500,
            progress_step: 10,
            request_timeout_secs: 120,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise falls back to the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        let g = &self.generator;
        ensure!(g.min_rows < g.max_rows, "generator.min_rows must be below generator.max_rows");
        ensure!(g.lookback_days > 0, "generator.lookback_days must be positive");
        ensure!(g.coordinate_jitter >= 0.0, "generator.coordinate_jitter must not be negative");
        ensure!(self.client.progress_step > 0, "client.progress_step must be positive");
        ensure!(self.client.progress_interval_ms > 0, "client.progress_interval_ms must be positive");
        Ok(())
    }
}
