//! Package Inspection
//!
//! The I/O seam behind requisite loaders: anything that can answer questions
//! about a package's contents and provenance. `InventoryInspector` answers
//! them from a JSON inventory snapshot.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;

use super::{App, AppCategory, AppType};
use crate::error::{TagError, TagResult};

/// Launcher icon facts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconInfo {
    pub adaptive: bool,
}

/// Trait for probing package contents. Implementations may block on I/O.
#[async_trait]
pub trait PackageInspector: Send + Sync {
    /// Package name of the installing store, `None` when unknown
    async fn installer(&self, app: &App) -> anyhow::Result<Option<String>>;

    /// Entry names of the base APK and its splits
    async fn archive_entries(&self, app: &App) -> anyhow::Result<Vec<String>>;

    /// Java/Kotlin package names declared in DEX files
    async fn dex_packages(&self, app: &App) -> anyhow::Result<Vec<String>>;

    /// Service classes declared in the manifest, including their superclasses
    async fn service_classes(&self, app: &App) -> anyhow::Result<Vec<String>>;

    async fn icon_info(&self, app: &App) -> anyhow::Result<IconInfo>;

    /// Encoded launcher icon for an arbitrary package
    async fn package_icon(&self, package_name: &str) -> anyhow::Result<Option<Vec<u8>>>;

    /// Run the MiPush SDK's own manifest checker against the package.
    /// `None` when the checker is not available.
    async fn mipush_enabled(&self, _app: &App) -> anyhow::Result<Option<bool>> {
        Ok(None)
    }
}

/// One package as described in an inventory file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageRecord {
    pub package_name: String,
    pub name: Option<String>,
    pub version_name: Option<String>,
    pub archive_path: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub launchable: bool,
    pub system: bool,
    pub core_app: bool,
    pub module: bool,
    pub splits: bool,
    pub category: Option<AppCategory>,
    pub app_type: AppType,
    pub back_callback: Option<bool>,
    pub installer: Option<String>,
    pub archive_entries: Vec<String>,
    pub dex_packages: Vec<String>,
    pub services: Vec<String>,
    pub adaptive_icon: bool,
    pub mipush_enabled: Option<bool>,
    /// Icon bytes, as a plain byte array
    pub icon: Option<Vec<u8>>,
}

fn default_true() -> bool {
    true
}

impl PackageRecord {
    pub fn to_app(&self) -> App {
        let mut app = App::new(&self.package_name)
            .with_name(self.name.clone().unwrap_or_else(|| self.package_name.clone()))
            .with_launchable(self.launchable)
            .with_system(self.system)
            .with_splits(self.splits);
        app.version_name = self.version_name.clone();
        app.archive_path = self.archive_path.clone();
        app.is_core_app = self.core_app;
        app.is_module = self.module;
        app.category = self.category;
        app.app_type = self.app_type;
        app.back_callback = self.back_callback;
        app
    }
}

/// Inspector backed by an in-memory inventory.
pub struct InventoryInspector {
    records: HashMap<String, PackageRecord>,
    latency: Duration,
}

impl InventoryInspector {
    pub fn new(records: impl IntoIterator<Item = PackageRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|r| (r.package_name.clone(), r))
                .collect(),
            latency: Duration::ZERO,
        }
    }

    pub async fn from_file(path: impl AsRef<Path>) -> TagResult<Self> {
        let content = fs::read_to_string(path.as_ref()).await?;
        let records: Vec<PackageRecord> = serde_json::from_str(&content)?;
        if let Some(blank) = records.iter().position(|r| r.package_name.is_empty()) {
            return Err(TagError::Inventory(format!("record #{} has no package name", blank)));
        }
        tracing::info!("Loaded {} package records from {}", records.len(), path.as_ref().display());
        Ok(Self::new(records))
    }

    /// Delay every load, to imitate parsing cost.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Build app records in package-name order.
    pub fn apps(&self) -> Vec<Arc<App>> {
        let mut records: Vec<&PackageRecord> = self.records.values().collect();
        records.sort_by(|a, b| a.package_name.cmp(&b.package_name));
        records.into_iter().map(|r| Arc::new(r.to_app())).collect()
    }

    pub fn app(&self, package_name: &str) -> TagResult<Arc<App>> {
        self.records
            .get(package_name)
            .map(|r| Arc::new(r.to_app()))
            .ok_or_else(|| TagError::UnknownPackage(package_name.to_string()))
    }

    async fn record(&self, package_name: &str) -> anyhow::Result<&PackageRecord> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let record = self
            .records
            .get(package_name)
            .ok_or_else(|| TagError::UnknownPackage(package_name.to_string()))?;
        Ok(record)
    }
}

#[async_trait]
impl PackageInspector for InventoryInspector {
    async fn installer(&self, app: &App) -> anyhow::Result<Option<String>> {
        Ok(self.record(&app.package_name).await?.installer.clone())
    }

    async fn archive_entries(&self, app: &App) -> anyhow::Result<Vec<String>> {
        Ok(self.record(&app.package_name).await?.archive_entries.clone())
    }

    async fn dex_packages(&self, app: &App) -> anyhow::Result<Vec<String>> {
        Ok(self.record(&app.package_name).await?.dex_packages.clone())
    }

    async fn service_classes(&self, app: &App) -> anyhow::Result<Vec<String>> {
        Ok(self.record(&app.package_name).await?.services.clone())
    }

    async fn icon_info(&self, app: &App) -> anyhow::Result<IconInfo> {
        let record = self.record(&app.package_name).await?;
        Ok(IconInfo { adaptive: record.adaptive_icon })
    }

    async fn package_icon(&self, package_name: &str) -> anyhow::Result<Option<Vec<u8>>> {
        // Stores are often absent from the inventory; that is not an error
        Ok(self.records.get(package_name).and_then(|r| r.icon.clone()))
    }

    async fn mipush_enabled(&self, app: &App) -> anyhow::Result<Option<bool>> {
        Ok(self.record(&app.package_name).await?.mipush_enabled)
    }
}
