//! Configuration system for Riskwise.
//!
//! Uses `figment` for layered configuration: defaults -> config files ->
//! environment -> explicit overrides. Configuration is loaded from
//! `~/.config/riskwise/config.toml` and/or `.riskwise/config.toml` in the
//! workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, RiskwiseError};
use crate::export::ExportFormat;

/// Directory (relative to the workspace) holding workspace-local state.
pub const WORKSPACE_DIR: &str = ".riskwise";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskwiseConfig {
    pub server: ServerConfig,
    pub register: RegisterConfig,
    pub calculation: CalculationConfig,
    pub export: ExportConfig,
}

/// HTTP gateway settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Storage backend for the risk register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterBackend {
    /// Process-lifetime storage.
    Memory,
    /// A JSON file rewritten on every change.
    #[default]
    Json,
}

/// Risk register settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterConfig {
    pub backend: RegisterBackend,
    /// JSON file location. Defaults to `.riskwise/register.json` in the workspace.
    pub path: Option<PathBuf>,
}

impl RegisterConfig {
    /// Resolve the JSON register file for a workspace.
    pub fn resolve_path(&self, workspace: &Path) -> PathBuf {
        match &self.path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => workspace.join(path),
            None => workspace.join(WORKSPACE_DIR).join("register.json"),
        }
    }
}

/// Calculation service settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationConfig {
    /// Reject factors outside their documented scales instead of computing
    /// with them.
    pub enforce_input_ranges: bool,
}

/// Export settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Format used when a request does not name one.
    pub default_format: ExportFormat,
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `RISKWISE_`)
/// 3. Explicit config file (`--config`)
/// 4. Workspace-local config (`.riskwise/config.toml`)
/// 5. User config (`~/.config/riskwise/config.toml`)
/// 6. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    config_file: Option<&Path>,
    overrides: Option<&RiskwiseConfig>,
) -> Result<RiskwiseConfig> {
    let mut figment = Figment::from(Serialized::defaults(RiskwiseConfig::default()));

    if let Some(user_config) = user_config_path()
        && user_config.exists()
    {
        figment = figment.merge(Toml::file(&user_config));
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(WORKSPACE_DIR).join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(file) = config_file {
        figment = figment.merge(Toml::file(file));
    }

    // Environment variables (RISKWISE_SERVER__PORT, RISKWISE_REGISTER__BACKEND, etc.)
    figment = figment.merge(Env::prefixed("RISKWISE_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment
        .extract()
        .map_err(|e| RiskwiseError::Config(Box::new(e)))
}

/// Location of the user-level config file, if the platform has one.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "riskwise", "riskwise")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
