//! App Model
//!
//! An app record carries its identity plus the inspection state that requisite
//! loaders fill in. Inspection state lives as long as the record, so a requisite
//! satisfied once stays satisfied for later resolutions of the same app.

mod flags;
pub mod inspector;

pub use flags::{ArchiveEntryFlags, DexPackageFlags};
pub use inspector::{IconInfo, InventoryInspector, PackageInspector, PackageRecord};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

/// Results of per-app inspection. `None` means "not loaded yet".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    pub archive_entries: Option<ArchiveEntryFlags>,
    pub dex_packages: Option<DexPackageFlags>,
    /// Outer `None`: not queried. `Some(None)`: queried, no installer recorded.
    pub installer: Option<Option<String>>,
    pub service_classes: Option<BTreeSet<String>>,
    pub adaptive_icon: Option<bool>,
    /// Outer `None`: not checked. `Some(None)`: the MiPush checker could not run.
    pub mipush_enabled: Option<Option<bool>>,
    /// Free-form facts recorded by requisites outside the built-in set.
    pub facts: HashMap<String, Value>,
}

/// Store category declared by the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppCategory {
    Game,
    Audio,
    Video,
    Image,
    Social,
    News,
    Maps,
    Productivity,
    Accessibility,
}

impl AppCategory {
    pub fn title(&self) -> &'static str {
        match self {
            AppCategory::Game => "Games",
            AppCategory::Audio => "Music & Audio",
            AppCategory::Video => "Movies & Video",
            AppCategory::Image => "Photos & Images",
            AppCategory::Social => "Social & Communication",
            AppCategory::News => "News & Magazines",
            AppCategory::Maps => "Maps & Navigation",
            AppCategory::Productivity => "Productivity",
            AppCategory::Accessibility => "Accessibility",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppType {
    #[default]
    Regular,
    /// Runtime resource overlay
    Overlay,
    InstantApp,
    WebApk,
}

/// An installed package or an APK archive.
#[derive(Debug)]
pub struct App {
    pub package_name: String,
    pub name: String,
    pub version_name: Option<String>,
    pub archive_path: Option<PathBuf>,
    pub is_launchable: bool,
    pub is_system: bool,
    pub is_core_app: bool,
    /// Delivered as an updatable system module
    pub is_module: bool,
    pub has_splits: bool,
    pub category: Option<AppCategory>,
    pub app_type: AppType,
    /// `None` when the manifest does not say
    pub back_callback: Option<bool>,
    inspection: RwLock<Inspection>,
}

impl App {
    pub fn new(package_name: impl Into<String>) -> Self {
        let package_name = package_name.into();
        Self {
            name: package_name.clone(),
            package_name,
            version_name: None,
            archive_path: None,
            is_launchable: true,
            is_system: false,
            is_core_app: false,
            is_module: false,
            has_splits: false,
            category: None,
            app_type: AppType::Regular,
            back_callback: None,
            inspection: RwLock::new(Inspection::default()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_archive(mut self, path: impl Into<PathBuf>) -> Self {
        self.archive_path = Some(path.into());
        self
    }

    pub fn with_system(mut self, is_system: bool) -> Self {
        self.is_system = is_system;
        self
    }

    pub fn with_launchable(mut self, is_launchable: bool) -> Self {
        self.is_launchable = is_launchable;
        self
    }

    pub fn with_splits(mut self, has_splits: bool) -> Self {
        self.has_splits = has_splits;
        self
    }

    pub fn is_archive(&self) -> bool {
        self.archive_path.is_some()
    }

    /// Stable identity used to scope per-app locking.
    pub fn identity(&self) -> String {
        match &self.archive_path {
            Some(path) => format!("archive:{}", path.display()),
            None => format!("package:{}", self.package_name),
        }
    }

    pub fn inspection(&self) -> RwLockReadGuard<'_, Inspection> {
        self.inspection.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn update_inspection<R>(&self, update: impl FnOnce(&mut Inspection) -> R) -> R {
        let mut inspection = self.inspection.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut inspection)
    }

    /// Installer package name, if it was queried and one is recorded.
    pub fn installer(&self) -> Option<String> {
        self.inspection().installer.clone().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_distinguishes_archives() {
        let installed = App::new("com.example");
        let archive = App::new("com.example").with_archive("/sdcard/example.apk");
        assert_ne!(installed.identity(), archive.identity());
        assert!(archive.is_archive());
    }

    #[test]
    fn test_inspection_updates_persist() {
        let app = App::new("com.example");
        assert!(app.inspection().installer.is_none());
        app.update_inspection(|p| p.installer = Some(Some("com.android.vending".into())));
        assert_eq!(app.installer().as_deref(), Some("com.android.vending"));
    }
}
