use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use crate::app::{App, Inspection, PackageInspector};
use crate::icons::IconCache;

/// Collaborators available to every loader.
pub struct LoadContext {
    inspector: Arc<dyn PackageInspector>,
    icons: Arc<IconCache>,
}

impl LoadContext {
    pub fn new(inspector: Arc<dyn PackageInspector>, icons: Arc<IconCache>) -> Self {
        Self { inspector, icons }
    }

    pub fn inspector(&self) -> &dyn PackageInspector {
        self.inspector.as_ref()
    }

    pub fn icons(&self) -> &Arc<IconCache> {
        &self.icons
    }
}

struct ResourcesInner {
    app: Arc<App>,
    context: Arc<LoadContext>,
    // keyed by requisite id, not tag id
    dynamic_labels: RwLock<HashMap<String, String>>,
    dynamic_icon_keys: RwLock<HashMap<String, String>>,
}

/// Per-resolution resource bag for one app.
///
/// Cloning yields another handle to the same bag. Loaders running for the
/// same resolution write through their own handles concurrently.
#[derive(Clone)]
pub struct Resources {
    inner: Arc<ResourcesInner>,
}

impl Resources {
    pub fn new(app: Arc<App>, context: Arc<LoadContext>) -> Self {
        Self {
            inner: Arc::new(ResourcesInner {
                app,
                context,
                dynamic_labels: RwLock::new(HashMap::new()),
                dynamic_icon_keys: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn app(&self) -> &Arc<App> {
        &self.inner.app
    }

    pub fn context(&self) -> &LoadContext {
        &self.inner.context
    }

    pub fn inspector(&self) -> &dyn PackageInspector {
        self.inner.context.inspector()
    }

    pub fn icons(&self) -> &Arc<IconCache> {
        self.inner.context.icons()
    }

    pub fn inspection(&self) -> RwLockReadGuard<'_, Inspection> {
        self.inner.app.inspection()
    }

    /// Free-form fact previously recorded for this app.
    pub fn fact(&self, key: &str) -> Option<Value> {
        self.inspection().facts.get(key).cloned()
    }

    pub fn record(&self, key: impl Into<String>, value: impl Into<Value>) {
        let (key, value) = (key.into(), value.into());
        self.inner.app.update_inspection(|p| {
            p.facts.insert(key, value);
        });
    }

    pub fn dynamic_label(&self, requisite_id: &str) -> Option<String> {
        let labels = self.inner.dynamic_labels.read().unwrap_or_else(PoisonError::into_inner);
        labels.get(requisite_id).cloned()
    }

    pub fn set_dynamic_label(&self, requisite_id: &str, label: impl Into<String>) {
        let mut labels = self.inner.dynamic_labels.write().unwrap_or_else(PoisonError::into_inner);
        labels.insert(requisite_id.to_string(), label.into());
    }

    pub fn dynamic_icon_key(&self, requisite_id: &str) -> Option<String> {
        let keys = self.inner.dynamic_icon_keys.read().unwrap_or_else(PoisonError::into_inner);
        keys.get(requisite_id).cloned()
    }

    pub fn set_dynamic_icon_key(&self, requisite_id: &str, key: impl Into<String>) {
        let mut keys = self.inner.dynamic_icon_keys.write().unwrap_or_else(PoisonError::into_inner);
        keys.insert(requisite_id.to_string(), key.into());
    }

    /// Whether two handles point at the same bag.
    pub fn same_bag(&self, other: &Resources) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resources")
            .field("app", &self.inner.app.package_name)
            .finish_non_exhaustive()
    }
}
