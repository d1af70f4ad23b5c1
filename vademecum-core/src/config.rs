//! Vademecum configuration
//!
//! Loaded from YAML. Resolution order:
//! 1. An explicit path (`--config`), which must exist
//! 2. `<platform config dir>/config.yaml`, if present
//! 3. Built-in defaults

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cart::PriceBasis;

/// PAMI medication price list published on datos.gob.ar
pub const DEFAULT_DATASET_URL: &str = "https://datos.gob.ar/dataset/pami-listado-precios-medicamentos-para-entidades/archivo/pami_e72a9026-a971-46c1-b828-2638b2b2be37";

const CONFIG_FILE_NAME: &str = "config.yaml";
const DATASET_DIR_NAME: &str = "medicamentos";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATASET_URL.to_string(),
            timeout_seconds: 60,
            user_agent: concat!("vademecum/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding the synced dataset; platform data dir when unset
    pub dir: Option<PathBuf>,
    pub file_name: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            file_name: "medicamentos.xlsx".to_string(),
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VademecumConfig {
    pub source: SourceConfig,
    pub cache: CacheConfig,
    /// Bundled JSON or spreadsheet snapshot used before the first sync
    pub fallback_snapshot: Option<PathBuf>,
    /// Price charged for quote lines
    pub price_basis: PriceBasis,
}

impl VademecumConfig {
    /// Resolve and load the configuration
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("Config file does not exist: {}", path.display());
            }
            return Self::load_from_path(path);
        }

        match Self::default_config_path() {
            Some(path) => Self::load_from_path(&path),
            None => {
                tracing::debug!("No platform config directory, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config: Self = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// `<platform config dir>/config.yaml`
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Where the synced dataset is stored
    pub fn dataset_path(&self) -> Result<PathBuf> {
        let dir = match &self.cache.dir {
            Some(dir) => dir.clone(),
            None => project_dirs()
                .map(|dirs| dirs.data_dir().join(DATASET_DIR_NAME))
                .context("Could not determine data directory")?,
        };

        Ok(dir.join(&self.cache.file_name))
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("ar", "vademecum", "vademecum")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = VademecumConfig::load_from_path(&dir.path().join("none.yaml")).unwrap();
        assert_eq!(config, VademecumConfig::default());
        assert_eq!(config.source.url, DEFAULT_DATASET_URL);
        assert_eq!(config.price_basis, PriceBasis::ListPrice);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(VademecumConfig::load(Some(&dir.path().join("none.yaml"))).is_err());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "source:\n  timeout_seconds: 5\ncache:\n  dir: /tmp/vade\nprice_basis: affiliate-copay\n",
        )
        .unwrap();

        let config = VademecumConfig::load(Some(&path)).unwrap();
        assert_eq!(config.source.timeout_seconds, 5);
        assert_eq!(config.source.url, DEFAULT_DATASET_URL);
        assert_eq!(config.price_basis, PriceBasis::AffiliateCopay);
        assert_eq!(
            config.dataset_path().unwrap(),
            PathBuf::from("/tmp/vade/medicamentos.xlsx")
        );
    }

    #[test]
    fn test_unparseable_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "source: [not, a, map]\n").unwrap();

        let err = VademecumConfig::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }
}
