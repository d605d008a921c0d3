use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// CLI configuration: defaults, then an optional TOML file named by
/// `FACEPRINT_CONFIG`, then `FACEPRINT_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON snapshot of the profile store.
    pub store_path: PathBuf,
    /// Suffix appended to an image path to find its landmark sidecar.
    pub landmarks_suffix: String,
    /// Suffix appended to an image path to find its embeddings sidecar.
    pub embeddings_suffix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            landmarks_suffix: ".landmarks.json".to_string(),
            embeddings_suffix: ".embeddings.json".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var("FACEPRINT_CONFIG") {
            Ok(path) => {
                let src = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading config file {path}"))?;
                Self::from_toml(&src).with_context(|| format!("parsing config file {path}"))?
            }
            Err(_) => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_toml(src: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(src)
    }

    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("FACEPRINT_STORE_PATH") {
            self.store_path = PathBuf::from(path);
        }
        if let Ok(suffix) = std::env::var("FACEPRINT_LANDMARKS_SUFFIX") {
            self.landmarks_suffix = suffix;
        }
        if let Ok(suffix) = std::env::var("FACEPRINT_EMBEDDINGS_SUFFIX") {
            self.embeddings_suffix = suffix;
        }
    }
}

fn default_store_path() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("faceprint")
        .join("profiles.json")
}
