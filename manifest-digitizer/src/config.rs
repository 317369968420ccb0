//! Digitizer configuration
//!
//! Layered as: built-in defaults, then a TOML file (explicit path or the
//! per-user config dir), then `MANIFEST_*` environment variables. CLI flags
//! are applied on top by the caller.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::EntityId;

const APP_DIR: &str = "manifest-digitizer";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend root, without the `/api` suffix
    pub base_url: String,
    /// Manifest spreadsheet exported as CSV
    pub input: PathBuf,
    pub request_timeout_secs: u64,
    pub page_sizes: PageSizes,
    pub fallbacks: FallbackPolicy,
    pub bootstrap: BootstrapConfig,
    pub import: ImportConfig,
}

/// Page sizes for the one-shot reference loads
///
/// Each must cover the whole collection; the cache never pages.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PageSizes {
    pub vessels: usize,
    pub persons: usize,
    pub waste_types: usize,
    pub system_users: usize,
}

/// What to do when a row lacks data the backend requires
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FallbackPolicy {
    pub signer: SignerFallback,
    /// Signer used when `signer = "fixed"` and neither captain nor chef resolves
    pub default_signer_id: EntityId,
    pub date: DateFallback,
    /// Inspector used when the backend has no system users
    pub inspector_id: EntityId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignerFallback {
    /// Substitute `default_signer_id`
    Fixed,
    /// Fail the row
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFallback {
    /// Substitute the current instant
    Now,
    /// Fail the row
    Fail,
}

/// Fixed values for the entity bootstrap pass
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub owner_name: String,
    pub owner_contact: String,
    pub vessel_type: String,
    pub captain_contact: String,
    pub chef_contact: String,
    pub person_types: PersonTypes,
}

/// Backend person type codes
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PersonTypes {
    /// Cocinero
    pub chef: i64,
    /// Motorista
    pub captain: i64,
    /// Propietario
    pub owner: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Record limit offered when the user does not give one
    pub default_max_records: usize,
    /// Log a progress line every N processed rows
    pub progress_every: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234".to_string(),
            input: PathBuf::from("rawdata.csv"),
            request_timeout_secs: 30,
            page_sizes: PageSizes::default(),
            fallbacks: FallbackPolicy::default(),
            bootstrap: BootstrapConfig::default(),
            import: ImportConfig::default(),
        }
    }
}

impl Default for PageSizes {
    fn default() -> Self {
        Self {
            vessels: 1000,
            persons: 5000,
            waste_types: 100,
            system_users: 100,
        }
    }
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            signer: SignerFallback::Fixed,
            default_signer_id: EntityId::Int(1),
            date: DateFallback::Now,
            inspector_id: EntityId::Int(1),
        }
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            owner_name: "Unknown Owner".to_string(),
            owner_contact: "Default vessel owner".to_string(),
            vessel_type: "Boat".to_string(),
            captain_contact: "Captain".to_string(),
            chef_contact: "Chef".to_string(),
            person_types: PersonTypes::default(),
        }
    }
}

impl Default for PersonTypes {
    fn default() -> Self {
        Self {
            chef: 1,
            captain: 2,
            owner: 3,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_max_records: 50,
            progress_every: 50,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the per-user config file if
    /// one exists, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid configuration")
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("MANIFEST_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(input) = var("MANIFEST_INPUT").filter(|v| !v.trim().is_empty()) {
            self.input = PathBuf::from(input);
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}
