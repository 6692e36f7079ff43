//! Configuration file model and environment overrides.

use std::path::PathBuf;
use std::time::Duration;

use action_flow::ExecutorOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use stealth::TempoPlan;
use tracing::info;

pub const ENV_STORE_PATH: &str = "RETRACE_STORE_PATH";
pub const ENV_OUTPUT_DIR: &str = "RETRACE_OUTPUT_DIR";
pub const ENV_SPEED: &str = "RETRACE_SPEED";
pub const ENV_SEED: &str = "RETRACE_SEED";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub tempo: TempoPlan,
    #[serde(default)]
    pub replay: ReplayConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Workflow catalog file
    #[serde(default = "StorageConfig::default_path")]
    pub path: PathBuf,
}

impl StorageConfig {
    fn default_path() -> PathBuf {
        data_root().join("workflows.json")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Screenshots and staged uploads
    #[serde(default = "OutputConfig::default_dir")]
    pub dir: PathBuf,
}

impl OutputConfig {
    fn default_dir() -> PathBuf {
        data_root().join("output")
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    #[serde(default)]
    pub step_timeout_ms: Option<u64>,
    #[serde(default)]
    pub run_timeout_ms: Option<u64>,
    #[serde(default = "ReplayConfig::default_file_chooser_timeout_ms")]
    pub file_chooser_timeout_ms: u64,
}

impl ReplayConfig {
    fn default_file_chooser_timeout_ms() -> u64 {
        5_000
    }

    pub fn executor_options(&self) -> ExecutorOptions {
        ExecutorOptions {
            step_timeout: self.step_timeout_ms.map(Duration::from_millis),
            run_timeout: self.run_timeout_ms.map(Duration::from_millis),
            file_chooser_timeout: Duration::from_millis(self.file_chooser_timeout_ms),
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            step_timeout_ms: None,
            run_timeout_ms: None,
            file_chooser_timeout_ms: Self::default_file_chooser_timeout_ms(),
        }
    }
}

fn data_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("retrace")
}

impl Config {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content).context("Failed to parse config file")?;
        config
            .tempo
            .validate()
            .context("Invalid tempo section in config file")?;
        Ok(config)
    }

    /// Apply `RETRACE_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_STORE_PATH).filter(|v| !v.trim().is_empty()) {
            info!("Using workflow store from {}: {}", ENV_STORE_PATH, path);
            self.storage.path = PathBuf::from(path);
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR).filter(|v| !v.trim().is_empty()) {
            info!("Using output directory from {}: {}", ENV_OUTPUT_DIR, dir);
            self.output.dir = PathBuf::from(dir);
        }
        if let Some(speed) = lookup(ENV_SPEED) {
            self.tempo.speed = speed
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number, got {:?}", ENV_SPEED, speed))?;
        }
        if let Some(seed) = lookup(ENV_SEED) {
            self.tempo.seed = Some(
                seed.trim()
                    .parse()
                    .with_context(|| format!("{} must be an integer, got {:?}", ENV_SEED, seed))?,
            );
        }
        self.tempo
            .validate()
            .context("Invalid tempo after environment overrides")?;
        Ok(())
    }
}
