use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::telemetry::DEFAULT_FRAME_RATE;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub demuxer: DemuxerConfig,
    pub streams: StreamsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemuxerConfig {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_timeout")]
    pub timeout: String,
    #[serde(default = "default_min_size_bytes")]
    pub min_size_bytes: u64,
    /// Where candidate streams are copied while probing.
    #[serde(default = "std::env::temp_dir")]
    pub scratch_dir: PathBuf,
}

impl Default for DemuxerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            timeout: default_timeout(),
            min_size_bytes: default_min_size_bytes(),
            scratch_dir: std::env::temp_dir(),
        }
    }
}

fn default_program() -> String {
    "ffmpeg".to_string()
}

fn default_timeout() -> String {
    "60s".to_string()
}

fn default_min_size_bytes() -> u64 {
    1024
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamsConfig {
    #[serde(default = "default_primary")]
    pub primary: String,
    #[serde(default = "default_alternates")]
    pub alternates: Vec<String>,
}

impl Default for StreamsConfig {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            alternates: default_alternates(),
        }
    }
}

fn default_primary() -> String {
    "0:3".to_string()
}

fn default_alternates() -> Vec<String> {
    vec!["0:2".to_string(), "0:4".to_string(), "0:5".to_string()]
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,
    #[serde(default)]
    pub gpx: bool,
    #[serde(default = "default_report")]
    pub report: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            frame_rate: default_frame_rate(),
            gpx: false,
            report: default_report(),
        }
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("output")
}

fn default_frame_rate() -> f64 {
    DEFAULT_FRAME_RATE
}

fn default_report() -> bool {
    true
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.demuxer.timeout()?;
        if !(self.output.frame_rate > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "output.frame_rate must be positive, got {}",
                self.output.frame_rate
            )));
        }
        if self.streams.primary.trim().is_empty() {
            return Err(ConfigError::Invalid("streams.primary is empty".into()));
        }
        Ok(())
    }

    /// Primary selector followed by the alternates, without duplicates.
    pub fn candidates(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(1 + self.streams.alternates.len());
        for s in std::iter::once(&self.streams.primary).chain(&self.streams.alternates) {
            if !out.contains(s) {
                out.push(s.clone());
            }
        }
        out
    }

    pub fn frame_interval(&self) -> f64 {
        1.0 / self.output.frame_rate
    }
}

impl DemuxerConfig {
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        humantime::parse_duration(self.timeout.trim())
            .map_err(|e| ConfigError::Invalid(format!("demuxer.timeout: {}", e)))
    }
}
