use std::collections::BTreeSet;
use std::path::PathBuf;
use tokio::fs;

use super::SelectionStore;
use crate::error::TagResult;

/// Persists the set of selected tag ids as a JSON array.
pub struct TagSettingsManager {
    path: PathBuf,
}

impl TagSettingsManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> TagResult<BTreeSet<String>> {
        if !self.path.exists() {
            let default = BTreeSet::new();
            self.save(&default).await?;
            return Ok(default);
        }
        let content = fs::read_to_string(&self.path).await?;
        let ids = serde_json::from_str(&content)?;
        Ok(ids)
    }

    pub async fn save(&self, ids: &BTreeSet<String>) -> TagResult<()> {
        let content = serde_json::to_string_pretty(ids)?;
        fs::write(&self.path, content).await?;
        Ok(())
    }

    /// Load persisted settings into the store. Returns whether anything changed.
    pub async fn apply_to(&self, store: &SelectionStore) -> TagResult<bool> {
        let ids = self.load().await?;
        let delta = store.replace_all(&SelectionStore::from_selected_ids(ids), false);
        Ok(delta.is_changed())
    }

    pub async fn persist(&self, store: &SelectionStore) -> TagResult<()> {
        let ids: BTreeSet<String> = store.selected_ids().into_iter().collect();
        self.save(&ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::TriState;

    #[tokio::test]
    async fn test_settings_save_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = TagSettingsManager::new(temp_dir.path().join("tags.json"));

        let ids: BTreeSet<String> = ["tech.flutter", "installer.play"].iter().map(|s| s.to_string()).collect();
        manager.save(&ids).await.unwrap();
        assert_eq!(manager.load().await.unwrap(), ids);
    }

    #[tokio::test]
    async fn test_settings_load_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nonexistent_tags.json");
        let manager = TagSettingsManager::new(&path);

        assert!(manager.load().await.unwrap().is_empty());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_apply_and_persist() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = TagSettingsManager::new(temp_dir.path().join("tags.json"));
        let store = SelectionStore::new(["a", "b"]);

        let ids: BTreeSet<String> = ["b".to_string()].into_iter().collect();
        manager.save(&ids).await.unwrap();
        assert!(manager.apply_to(&store).await.unwrap());
        assert_eq!(store.state("b"), TriState::Selected);
        assert!(!manager.apply_to(&store).await.unwrap());

        // anti-selection is not part of the persisted format
        let mut next = store.snapshot();
        next.insert("a".into(), crate::selection::TriStateSelectable::anti_selected("a"));
        store.replace_all(&next, false);
        manager.persist(&store).await.unwrap();
        assert_eq!(manager.load().await.unwrap(), ids);
    }
}
