use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::pipeline::Stage;

/// Pipeline configuration: input/output directories and the stages the
/// `run` command executes. Stages left out of the list stay individually
/// invocable through the `stage` command.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_bronze_dir")]
    pub bronze_dir: PathBuf,
    #[serde(default = "default_silver_dir")]
    pub silver_dir: PathBuf,
    #[serde(default = "default_stages")]
    pub stages: Vec<Stage>,
}

fn default_bronze_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_silver_dir() -> PathBuf {
    PathBuf::from("data/silver")
}

fn default_stages() -> Vec<Stage> {
    vec![Stage::Circulation]
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bronze_dir: default_bronze_dir(),
            silver_dir: default_silver_dir(),
            stages: default_stages(),
        }
    }
}

impl PipelineConfig {
    /// Loads configuration from a TOML file. With no explicit path,
    /// `config.toml` is read when present and defaults apply otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from("config.toml");
                if !fallback.exists() {
                    return Ok(Self::default());
                }
                fallback
            }
        };
        let content = fs::read_to_string(&path).map_err(|e| {
            PipelineError::InvalidArgument(format!(
                "failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }
}
