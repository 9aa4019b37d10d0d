use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::control::RenderStyle;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "flatgen.yaml";

#[derive(Debug, Deserialize)]
pub struct GeneratorConfig {
    pub jobs: Vec<JobConfig>,

    #[serde(default)]
    pub render: RenderStyle,
}

/// One template to expand into one generated file.
#[derive(Debug, Deserialize, Clone)]
pub struct JobConfig {
    pub name: Option<String>,
    pub template: PathBuf,
    pub output: PathBuf,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Config declares no jobs")]
    NoJobs,
}

impl GeneratorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: GeneratorConfig = serde_yaml::from_str(content)?;
        if config.jobs.is_empty() {
            return Err(ConfigError::NoJobs);
        }
        Ok(config)
    }
}

impl JobConfig {
    /// Template path, relative paths resolved against `base`.
    pub fn template_path(&self, base: &Path) -> PathBuf {
        base.join(&self.template)
    }

    /// Output path, relative paths resolved against `base`.
    pub fn output_path(&self, base: &Path) -> PathBuf {
        base.join(&self.output)
    }

    /// Name used in logs and filters.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.template.display().to_string(),
        }
    }
}
