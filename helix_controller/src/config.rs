//! TOML configuration loader with validation.
//!
//! Loads a [`ControlConfig`] from a TOML file and runs the parameter
//! bounds check before handing it to the controller. Missing fields fall
//! back to the firmware defaults.

use std::path::Path;

use thiserror::Error;
use tracing::info;

use helix_common::config::ControlConfig;

/// Configuration loading/validation error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("config I/O error: {0}")]
    Io(String),
    /// TOML parse error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Parameter validation error.
    #[error("config validation: {0}")]
    Validation(String),
}

/// Load and validate a controller configuration from a TOML file.
///
/// 1. Read `path`
/// 2. Parse into [`ControlConfig`] (partial tables allowed)
/// 3. Run [`ControlConfig::validate`]
pub fn load_config(path: &Path) -> Result<ControlConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("failed to read {}: {e}", path.display())))?;
    let config: ControlConfig =
        toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate().map_err(ConfigError::Validation)?;

    info!(
        path = %path.display(),
        mode = ?config.control_mode,
        "controller config loaded"
    );
    Ok(config)
}

// ─── Tests ──────────────────────────────────────────────────────────
