//! Configuration
//!
//! Settings are layered with figment: built-in defaults, then an optional
//! TOML file, then `MACRO_TOOLS_` environment variables (`__` separates
//! nested keys, e.g. `MACRO_TOOLS_TABLE__SUCCESS_COLOR=blue`).

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "macro-tools.toml";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "MACRO_TOOLS_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    Invalid(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Invalid(Box::new(err))
    }
}

/// Attack table presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    /// CSS classes on the `<table>` element
    pub class: String,
    /// Color for natural 20s
    pub success_color: String,
    /// Color for natural 1s
    pub failure_color: String,
    /// Whether damage cells carry an apply-damage button
    pub apply_buttons: bool,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            // chat-card and card-buttons make the host's apply-damage listeners fire
            class: "pf1 chat-card card-buttons".to_string(),
            success_color: "green".to_string(),
            failure_color: "red".to_string(),
            apply_buttons: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// User id stamped on published messages
    pub user: Option<String>,
    /// Default speaker alias
    pub speaker: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiceSettings {
    /// Fixed seed for reproducible rolls
    pub seed: Option<u64>,
}

/// All settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub table: TableSettings,
    pub chat: ChatSettings,
    pub dice: DiceSettings,
}

impl Settings {
    /// The layered provider chain
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load settings. An explicitly given file must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
        }
        Ok(Self::figment(path).extract()?)
    }
}
