//! Tag Icon Cache
//!
//! Keeps encoded package icons (store icons, installer icons) so that tag
//! rendering never has to touch the package inspector.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::app::PackageInspector;

/// Encoded icon image for a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    pub package_name: String,
    pub bytes: Vec<u8>,
}

/// A cache for package icons
#[derive(Default)]
pub struct IconCache {
    icons: RwLock<HashMap<String, Arc<IconImage>>>,
}

impl IconCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, package_name: &str) -> Option<Arc<IconImage>> {
        let icons = self.icons.read().unwrap_or_else(PoisonError::into_inner);
        icons.get(package_name).cloned()
    }

    pub fn insert(&self, package_name: &str, bytes: Vec<u8>) -> Arc<IconImage> {
        let icon = Arc::new(IconImage { package_name: package_name.to_string(), bytes });
        let mut icons = self.icons.write().unwrap_or_else(PoisonError::into_inner);
        icons.insert(package_name.to_string(), icon.clone());
        icon
    }

    /// Return the cached icon, loading it through the inspector on a miss.
    pub async fn ensure(
        &self,
        package_name: &str,
        inspector: &dyn PackageInspector,
    ) -> anyhow::Result<Option<Arc<IconImage>>> {
        if let Some(icon) = self.get(package_name) {
            return Ok(Some(icon));
        }
        let Some(bytes) = inspector.package_icon(package_name).await? else {
            tracing::debug!("No icon available for {}", package_name);
            return Ok(None);
        };
        Ok(Some(self.insert(package_name, bytes)))
    }

    pub fn clear(&self) {
        let mut icons = self.icons.write().unwrap_or_else(PoisonError::into_inner);
        icons.clear();
    }

    pub fn len(&self) -> usize {
        self.icons.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
