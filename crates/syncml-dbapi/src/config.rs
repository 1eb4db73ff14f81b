//! Module configuration: which plugins to load, from where, and with
//! what per-plugin settings.
//!
//! Grounded on `plugin/host/config.rs::PluginConfig::from_path`:
//! dispatches on file extension across JSON/YAML/TOML, all via
//! `serde`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Deserialize, Default)]
pub struct ModuleConfig {
    pub modules: Vec<PluginEntry>,
    /// Whether legacy (`_OLD*`) method-group capability keys are
    /// honored by the negotiator. Default `true`.
    #[serde(default = "default_true")]
    pub legacy_bridging: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct PluginEntry {
    pub name: String,
    pub path: String,
    pub options: Option<HashMap<String, toml::Value>>,
}

impl ModuleConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p: &Path = path.as_ref();
        if !p.exists() {
            return Err(Error::Config(format!("config file not found at {}", p.display())));
        }
        let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
        let content = fs::read_to_string(p)?;

        let config = match ext {
            "json" => serde_json::from_str(&content)?,
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "toml" => toml::from_str(&content)?,
            other => return Err(Error::Config(format!("unsupported config format: {other}"))),
        };
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_tmp_path(suffix: &str) -> PathBuf {
        let pid = std::process::id();
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        std::env::temp_dir().join(format!("syncml-dbapi-test-{pid}-{now_ms}-{suffix}"))
    }

    #[test]
    fn parses_toml_config_with_default_legacy_bridging() {
        let path = unique_tmp_path("config").with_extension("toml");
        fs::write(&path, "modules = []\n").unwrap();

        let cfg = ModuleConfig::from_path(&path).unwrap();
        assert!(cfg.legacy_bridging);
        assert!(cfg.modules.is_empty());

        fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let result = ModuleConfig::from_path("/nonexistent/path/config.toml");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
