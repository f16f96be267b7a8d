// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Configuration persistence for kmatch
//!
//! Stores tool overrides in a config file. All kmatch data is stored under
//! ~/.kmatch/:
//! - ~/.kmatch/config.json - user configuration
//! - ~/.kmatch/log/ - rotating log files

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Get the base kmatch directory (~/.kmatch/)
pub fn base_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|p| p.join(".kmatch"))
        .context("Could not determine home directory")
}

fn default_kubectl() -> String {
    "kubectl".to_string()
}

fn default_flux() -> String {
    "flux".to_string()
}

fn default_shell() -> String {
    "/bin/sh".to_string()
}

/// kmatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Cluster CLI binary to invoke (absolute path or name on $PATH)
    #[serde(default = "default_kubectl")]
    pub kubectl: String,

    /// Reconciliation tool binary (for reconcile/build)
    #[serde(default = "default_flux")]
    pub flux: String,

    /// Shell started inside a container by the shell action
    #[serde(default = "default_shell")]
    pub exec_shell: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kubectl: default_kubectl(),
            flux: default_flux(),
            exec_shell: default_shell(),
        }
    }
}

impl Config {
    /// Load config from disk, or return default if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to disk
    #[allow(dead_code)]
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Get the config file path (~/.kmatch/config.json)
    pub fn config_path() -> Result<PathBuf> {
        Ok(base_dir()?.join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.kubectl, "kubectl");
        assert_eq!(config.flux, "flux");
        assert_eq!(config.exec_shell, "/bin/sh");
    }

    #[test]
    fn test_config_deserialize_empty_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.kubectl, "kubectl");
        assert_eq!(config.exec_shell, "/bin/sh");
    }

    #[test]
    fn test_config_deserialize_override() {
        let json = r#"{"kubectl": "/opt/bin/kubectl", "exec_shell": "/bin/bash"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.kubectl, "/opt/bin/kubectl");
        assert_eq!(config.flux, "flux");
        assert_eq!(config.exec_shell, "/bin/bash");
    }

    #[test]
    fn test_config_roundtrip() {
        let original = Config {
            kubectl: "microk8s.kubectl".to_string(),
            flux: "/usr/local/bin/flux".to_string(),
            exec_shell: "/bin/ash".to_string(),
        };
        let json = serde_json::to_string_pretty(&original).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.kubectl, original.kubectl);
        assert_eq!(parsed.flux, original.flux);
        assert_eq!(parsed.exec_shell, original.exec_shell);
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let config = Config {
            kubectl: "k3s kubectl".to_string(),
            ..Config::default()
        };
        let content = serde_json::to_string_pretty(&config).unwrap();
        fs::write(&config_path, content).unwrap();

        let loaded_content = fs::read_to_string(&config_path).unwrap();
        let loaded: Config = serde_json::from_str(&loaded_content).unwrap();
        assert_eq!(loaded.kubectl, "k3s kubectl");
    }
}
