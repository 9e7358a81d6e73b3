//! Engine configuration.
//!
//! Resolution order: defaults ← optional `~/.packrun/config.yaml` ← env
//! vars (`PACKRUN_API_BASE_URL`, `PACKRUN_API_KEY`, `PACKRUN_WORKSPACE_ID`,
//! `PACKRUN_PROJECT_ID`, `PACKRUN_PACKS_DIR`). Env always wins.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::skills::PackStore;

pub const DEFAULT_API_BASE_URL: &str = "https://api.packrun.dev";

/// Remote API and pack-store settings for one invocation context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Workflow API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key for the workflow API.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub workspace_id: Option<String>,

    #[serde(default)]
    pub project_id: Option<String>,

    /// Installed-packs root; defaults to `~/.packrun/packs`.
    #[serde(default)]
    pub packs_dir: Option<PathBuf>,
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            workspace_id: None,
            project_id: None,
            packs_dir: None,
        }
    }
}

impl EngineConfig {
    /// Load from the default config file (if present), then apply env
    /// overrides.
    pub fn load() -> Self {
        let mut config = Self::from_file_or_default();
        config.apply_env();
        config
    }

    fn from_file_or_default() -> Self {
        let Some(home) = dirs::home_dir() else {
            return Self::default();
        };
        let path = home.join(".packrun").join("config.yaml");
        let Ok(raw) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        match serde_yaml::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("[Config] ignoring invalid '{}': {}", path.display(), e);
                Self::default()
            }
        }
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("PACKRUN_API_BASE_URL") {
            self.base_url = url;
        }
        if let Ok(key) = std::env::var("PACKRUN_API_KEY") {
            self.api_key = Some(key);
        }
        if let Ok(id) = std::env::var("PACKRUN_WORKSPACE_ID") {
            self.workspace_id = Some(id);
        }
        if let Ok(id) = std::env::var("PACKRUN_PROJECT_ID") {
            self.project_id = Some(id);
        }
        if let Ok(dir) = std::env::var("PACKRUN_PACKS_DIR") {
            self.packs_dir = Some(PathBuf::from(dir));
        }
    }

    /// Effective packs root.
    pub fn packs_root(&self) -> PathBuf {
        self.packs_dir
            .clone()
            .unwrap_or_else(PackStore::default_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.base_url, DEFAULT_API_BASE_URL);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_yaml_round_trip() {
        let yaml = r#"
base_url: "https://workflows.example.com"
api_key: "sk-test"
workspace_id: "ws_1"
"#;
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.base_url, "https://workflows.example.com");
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.workspace_id.as_deref(), Some("ws_1"));
        assert!(config.project_id.is_none());
    }
}
