//! `dino.toml` configuration.
//!
//! ```toml
//! data = "shop.json"
//! conventions = true
//!
//! [[entities]]
//! name = "User"
//! table = "users"
//! columns = [{ name = "Id", kind = "int" }]
//! ```

use crate::error::{DinoError, DinoResult};
use crate::schema::Schema;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "dino.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DinoConfig {
    /// JSON data file loaded into the catalog. Relative to the config file.
    #[serde(default)]
    pub data: Option<PathBuf>,
    #[serde(flatten)]
    pub schema: Schema,
}

impl DinoConfig {
    pub fn from_toml(content: &str) -> DinoResult<Self> {
        let config: DinoConfig = toml::from_str(content)?;
        config
            .schema
            .validate()
            .map_err(|e| DinoError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Load from a file. A relative `data` path is resolved against the
    /// file's directory.
    pub fn load_from_file(path: &Path) -> DinoResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DinoError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml(&content)?;

        if let Some(data) = &config.data {
            if data.is_relative() {
                if let Some(dir) = path.parent() {
                    config.data = Some(dir.join(data));
                }
            }
        }

        tracing::debug!(
            path = %path.display(),
            entities = config.schema.entities.len(),
            "loaded config"
        );
        Ok(config)
    }

    /// Load `explicit` if given, else `./dino.toml`, else
    /// `<config dir>/dino/dino.toml`. `None` when no file exists.
    pub fn discover(explicit: Option<&Path>) -> DinoResult<Option<Self>> {
        if let Some(path) = explicit {
            return Self::load_from_file(path).map(Some);
        }
        for candidate in Self::search_paths() {
            if candidate.exists() {
                return Self::load_from_file(&candidate).map(Some);
            }
        }
        Ok(None)
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("dino").join(CONFIG_FILE));
        }
        paths
    }
}
