//! Compiler configuration
//!
//! Loaded from YAML; every field is optional and falls back to its default.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Environment variable naming a YAML config file.
pub const CONFIG_ENV: &str = "SCENARIO_CONFIG";

/// Configuration for the script generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Name of the generated entry procedure.
    pub entry_procedure: String,
    /// Prefix for generated check procedures.
    pub check_prefix: String,
    /// Indentation unit inside procedure bodies.
    pub indent: String,
    /// Whether to emit traceability comments.
    pub emit_comments: bool,
    /// Allocate storage for classes that no Given step binds.
    pub allocate_unbound_classes: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            entry_procedure: "main".to_string(),
            check_prefix: "check_".to_string(),
            indent: "  ".to_string(),
            emit_comments: true,
            allocate_unbound_classes: false,
        }
    }
}

impl CompilerConfig {
    pub fn check_procedure(&self, check: &str) -> String {
        format!("{}{}", self.check_prefix, check)
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<CompilerConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: CompilerConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!("Loaded compiler config from {}", path.display());
        Ok(config)
    }

    /// Load from SCENARIO_CONFIG if set, otherwise defaults.
    pub fn from_env() -> Result<CompilerConfig> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => Self::from_path(path),
            _ => Ok(CompilerConfig::default()),
        }
    }

    /// Explicit path wins over the environment.
    pub fn load(path: Option<&Path>) -> Result<CompilerConfig> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::from_env(),
        }
    }
}
