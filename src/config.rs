//! YAML configuration for the homologation pipeline.
//!
//! One file declares the insurer catalogs, the brand alias groups, the embedding provider,
//! and the matcher settings.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "mx-insurers"
//!
//! sources:
//!   - name: chubb
//!     path: data/chubb-data.json
//!   - name: hdi
//!     path: data/hdi-data.json
//!   - name: mapfre
//!     path: data/mapfre-data.json
//!     skip_submake_filter: true
//!
//! aliases:
//!   - name: VOLKSWAGEN
//!     members: [VW]
//!   - name: GENERAL MOTORS
//!     members: [GM, CHEVROLET]
//!
//! semantic:
//!   mode: "fast"
//!   model_name: "all-MiniLM-L6-v2"
//!   normalize: true
//!
//! matcher:
//!   max_results_per_source: 10
//! ```
//!
//! Relative source and model paths are resolved against the directory holding the YAML file.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use catalog::SourceProfile;
use matcher::{AliasGroupConfig, MatchConfig};
use semantic::SemanticConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),

    #[error("missing required field: {0}")]
    MissingField(String),
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HomologConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    /// Insurer catalogs, in load order.
    #[serde(default)]
    pub sources: Vec<SourceProfile>,

    /// Brand and sub-brand alias groups, in precedence order (later groups win).
    #[serde(default)]
    pub aliases: Vec<AliasGroupConfig>,

    #[serde(default)]
    pub semantic: SemanticConfig,

    #[serde(default)]
    pub matcher: MatchConfig,

    /// Embed every catalog description at startup instead of on first use.
    #[serde(default = "true_value")]
    pub warm_embeddings: bool,
}

fn true_value() -> bool {
    true
}

impl HomologConfig {
    /// Load a YAML configuration file; relative source and model paths become relative to its
    /// directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;
        if let Some(base) = path.parent() {
            for source in &mut config.sources {
                if source.path.is_relative() {
                    source.path = base.join(&source.path);
                }
            }
            let semantic = &mut config.semantic;
            for model_file in [&mut semantic.model_path, &mut semantic.tokenizer_path]
                .into_iter()
                .flatten()
            {
                if model_file.is_relative() {
                    *model_file = base.join(&*model_file);
                }
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config = Self::parse(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn parse(yaml: &str) -> Result<Self, ConfigLoadError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        if self.sources.is_empty() {
            return Err(ConfigLoadError::MissingField("sources".into()));
        }
        let mut names = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(ConfigLoadError::Validation(
                    "sources[].name must not be empty".into(),
                ));
            }
            if !names.insert(source.name.as_str()) {
                return Err(ConfigLoadError::Validation(format!(
                    "duplicate source '{}'",
                    source.name
                )));
            }
            if source.path.as_os_str().is_empty() {
                return Err(ConfigLoadError::MissingField(format!(
                    "sources[{}].path",
                    source.name
                )));
            }
        }

        if let Some(group) = self.aliases.iter().find(|g| g.name.trim().is_empty()) {
            return Err(ConfigLoadError::Validation(format!(
                "alias group with members {:?} has an empty name",
                group.members
            )));
        }

        self.semantic
            .validate()
            .map_err(|e| ConfigLoadError::Validation(e.to_string()))?;
        self.matcher
            .validate()
            .map_err(|e| ConfigLoadError::Validation(e.to_string()))?;

        for exempt in &self.matcher.submake_exempt_sources {
            if !names.contains(exempt.as_str()) {
                return Err(ConfigLoadError::Validation(format!(
                    "matcher.submake_exempt_sources names unknown source '{exempt}'"
                )));
            }
        }
        Ok(())
    }
}
