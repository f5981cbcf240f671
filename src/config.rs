//! Engine Configuration
//!
//! Tuning for the resolution engine, stored as pretty JSON. A missing file is
//! created with defaults on first load.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;

use crate::error::TagResult;

/// How loads of the same requisite are serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockScope {
    /// One lock per requisite id, shared by every app
    #[default]
    Requisite,
    /// One lock per (app, requisite id)
    AppRequisite,
}

/// Host the inventory was taken on; gates platform-specific tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Platform {
    /// Android API level
    pub sdk_level: u32,
    pub supports_64bit: bool,
}

impl Default for Platform {
    fn default() -> Self {
        Self { sdk_level: 34, supports_64bit: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub lock_scope: LockScope,
    /// Upper bound on loaders running at the same time
    pub max_concurrent_loads: usize,
    /// Abandon a loader after this long; `None` waits forever
    pub load_timeout_ms: Option<u64>,
    pub event_capacity: usize,
    pub platform: Platform,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_scope: LockScope::Requisite,
            max_concurrent_loads: 8,
            load_timeout_ms: Some(10_000),
            event_capacity: 1024,
            platform: Platform::default(),
        }
    }
}

impl EngineConfig {
    pub fn load_timeout(&self) -> Option<Duration> {
        self.load_timeout_ms.map(Duration::from_millis)
    }

    pub async fn load_or_default(path: impl AsRef<Path>) -> TagResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            let default = Self::default();
            default.save(path).await?;
            return Ok(default);
        }
        let content = fs::read_to_string(path).await?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> TagResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("engine.json");
        let config = EngineConfig {
            lock_scope: LockScope::AppRequisite,
            max_concurrent_loads: 2,
            load_timeout_ms: None,
            event_capacity: 16,
            platform: Platform { sdk_level: 29, supports_64bit: false },
        };

        config.save(&path).await.unwrap();
        let loaded = EngineConfig::load_or_default(&path).await.unwrap();
        assert_eq!(config, loaded);
    }

    #[tokio::test]
    async fn test_config_load_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("missing.json");

        let loaded = EngineConfig::load_or_default(&path).await.unwrap();
        assert_eq!(loaded, EngineConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"lock_scope": "app_requisite"}"#).unwrap();
        assert_eq!(config.lock_scope, LockScope::AppRequisite);
        assert_eq!(config.max_concurrent_loads, 8);
        assert_eq!(config.platform, Platform::default());
    }
}
