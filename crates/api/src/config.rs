//! Server configuration

use anyhow::{bail, Context, Result};
use fermix_lib::dataset::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use fermix_lib::{ArtifactPaths, ModelVariant};
use serde::Deserialize;
use std::path::PathBuf;

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Server configuration, read from `FERMIX_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Prefix for the versioned API routes
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Directory holding model manifests, features.json and metadata.json
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    /// Directory holding sample/ and clean/ dataset tables
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,

    /// Variant used when a request omits `model_type`
    #[serde(default = "default_model")]
    pub default_model: String,

    /// CORS origins; "*" allows any
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_api_port() -> u16 {
    8000
}

fn default_api_prefix() -> String {
    "/api/v1".to_string()
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> usize {
    MAX_PAGE_SIZE
}

fn default_model() -> String {
    "lgbm".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
        "http://localhost:8080".to_string(),
        "*".to_string(),
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            api_prefix: default_api_prefix(),
            models_dir: default_models_dir(),
            data_dir: default_data_dir(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            default_model: default_model(),
            allowed_origins: default_allowed_origins(),
            log_format: LogFormat::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::from_environment(config::Environment::with_prefix("FERMIX"))
    }

    /// Load configuration from an environment source
    pub fn from_environment(env: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(
                env.try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("allowed_origins"),
            )
            .build()
            .context("Failed to read configuration")?;

        let config: ServerConfig = config
            .try_deserialize()
            .context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.default_variant()?;
        if !self.api_prefix.starts_with('/') || self.api_prefix.trim_end_matches('/').is_empty() {
            bail!("api_prefix must start with '/' and name a path, got '{}'", self.api_prefix);
        }
        if self.max_page_size == 0 {
            bail!("max_page_size must be at least 1");
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            bail!(
                "default_page_size must be between 1 and max_page_size ({})",
                self.max_page_size
            );
        }
        Ok(())
    }

    pub fn default_variant(&self) -> Result<ModelVariant> {
        self.default_model
            .parse()
            .with_context(|| format!("Invalid default_model '{}'", self.default_model))
    }

    /// API prefix without a trailing slash
    pub fn route_prefix(&self) -> &str {
        self.api_prefix.trim_end_matches('/')
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::in_dir(&self.models_dir)
    }

    pub fn sample_dataset_path(&self) -> PathBuf {
        self.data_dir.join("sample").join("kepler_sample.csv")
    }

    pub fn clean_dataset_path(&self) -> PathBuf {
        self.data_dir.join("clean").join("kepler_clean.csv")
    }
}
