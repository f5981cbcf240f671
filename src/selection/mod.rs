//! Tag Selection State
//!
//! Which tags the user cares about, and in which polarity. The store is
//! read continuously during resolution and replaced wholesale when settings
//! change; writers are expected to be serialized by the caller.

mod settings;

pub use settings::TagSettingsManager;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    Selected,
    AntiSelected,
    #[default]
    Deselected,
}

impl TriState {
    pub fn is_active(self) -> bool {
        self != TriState::Deselected
    }
}

/// Selection of a single tag. Compares by state only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriStateSelectable {
    pub tag_id: String,
    pub state: TriState,
}

impl TriStateSelectable {
    pub fn new(tag_id: impl Into<String>, state: TriState) -> Self {
        Self { tag_id: tag_id.into(), state }
    }

    pub fn selected(tag_id: impl Into<String>) -> Self {
        Self::new(tag_id, TriState::Selected)
    }

    pub fn anti_selected(tag_id: impl Into<String>) -> Self {
        Self::new(tag_id, TriState::AntiSelected)
    }

    pub fn deselected(tag_id: impl Into<String>) -> Self {
        Self::new(tag_id, TriState::Deselected)
    }

    pub fn is_selected(&self) -> bool {
        self.state == TriState::Selected
    }

    pub fn is_anti_selected(&self) -> bool {
        self.state == TriState::AntiSelected
    }

    pub fn is_deselected(&self) -> bool {
        self.state == TriState::Deselected
    }
}

impl PartialEq for TriStateSelectable {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
    }
}

impl Eq for TriStateSelectable {}

impl Hash for TriStateSelectable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.state.hash(state);
    }
}

/// Outcome of replacing the selection map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsDelta {
    Unchanged,
    Changed,
    /// Lazy comparison stopped at the first difference
    AssumedChanged,
}

impl SettingsDelta {
    pub fn is_changed(self) -> bool {
        self != SettingsDelta::Unchanged
    }
}

pub struct SelectionStore {
    built_in: Vec<String>,
    states: RwLock<HashMap<String, TriStateSelectable>>,
}

impl SelectionStore {
    /// Store tracking the given built-in tag ids, all deselected.
    pub fn new<I, S>(built_in: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            built_in: built_in.into_iter().map(Into::into).collect(),
            states: RwLock::new(HashMap::new()),
        }
    }

    pub fn built_in(&self) -> &[String] {
        &self.built_in
    }

    pub fn get(&self, tag_id: &str) -> TriStateSelectable {
        let states = self.states.read().unwrap_or_else(PoisonError::into_inner);
        states
            .get(tag_id)
            .cloned()
            .unwrap_or_else(|| TriStateSelectable::deselected(tag_id))
    }

    pub fn state(&self, tag_id: &str) -> TriState {
        let states = self.states.read().unwrap_or_else(PoisonError::into_inner);
        states.get(tag_id).map_or(TriState::Deselected, |s| s.state)
    }

    /// Replace the selection of every built-in tag.
    ///
    /// Ids outside the built-in list are ignored, built-in ids missing from
    /// `new_state` become deselected. With `lazy`, the diff stops at the
    /// first changed tag and reports [`SettingsDelta::AssumedChanged`]; the
    /// replacement itself is always complete.
    pub fn replace_all(&self, new_state: &HashMap<String, TriStateSelectable>, lazy: bool) -> SettingsDelta {
        let mut states = self.states.write().unwrap_or_else(PoisonError::into_inner);
        let mut delta = SettingsDelta::Unchanged;
        let mut next = HashMap::with_capacity(new_state.len());
        for id in &self.built_in {
            let new = new_state.get(id);
            if delta != SettingsDelta::AssumedChanged {
                let old_state = states.get(id).map_or(TriState::Deselected, |s| s.state);
                let next_state = new.map_or(TriState::Deselected, |s| s.state);
                if old_state != next_state {
                    delta = if lazy { SettingsDelta::AssumedChanged } else { SettingsDelta::Changed };
                }
            }
            if let Some(new) = new {
                next.insert(id.clone(), TriStateSelectable::new(id.clone(), new.state));
            }
        }
        *states = next;
        tracing::debug!("Tag selection replaced ({:?})", delta);
        delta
    }

    pub fn snapshot(&self) -> HashMap<String, TriStateSelectable> {
        self.states.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Ids currently `Selected`, sorted, in the persisted format.
    pub fn selected_ids(&self) -> Vec<String> {
        let states = self.states.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = states
            .values()
            .filter(|s| s.is_selected())
            .map(|s| s.tag_id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Replacement map where every given id is selected.
    pub fn from_selected_ids<I, S>(ids: I) -> HashMap<String, TriStateSelectable>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ids.into_iter()
            .map(|id| {
                let id = id.into();
                (id.clone(), TriStateSelectable::selected(id))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SelectionStore {
        SelectionStore::new(["a", "b", "c"])
    }

    fn states(entries: &[(&str, TriState)]) -> HashMap<String, TriStateSelectable> {
        entries
            .iter()
            .map(|(id, state)| (id.to_string(), TriStateSelectable::new(*id, *state)))
            .collect()
    }

    #[test]
    fn test_missing_is_deselected() {
        let store = store();
        assert!(store.get("a").is_deselected());
        assert_eq!(store.get("a").tag_id, "a");
        assert_eq!(store.state("zzz"), TriState::Deselected);
    }

    #[test]
    fn test_equality_ignores_tag_id() {
        assert_eq!(TriStateSelectable::selected("a"), TriStateSelectable::selected("b"));
        assert_ne!(TriStateSelectable::selected("a"), TriStateSelectable::anti_selected("a"));
    }

    #[test]
    fn test_replace_all_reports_changes() {
        let store = store();
        let next = states(&[("a", TriState::Selected), ("b", TriState::AntiSelected)]);
        assert_eq!(store.replace_all(&next, false), SettingsDelta::Changed);
        assert_eq!(store.state("a"), TriState::Selected);
        assert_eq!(store.state("b"), TriState::AntiSelected);

        assert_eq!(store.replace_all(&next, false), SettingsDelta::Unchanged);
    }

    #[test]
    fn test_replace_all_removes_missing_and_ignores_unknown() {
        let store = store();
        store.replace_all(&states(&[("a", TriState::Selected), ("c", TriState::Selected)]), false);

        let delta = store.replace_all(&states(&[("c", TriState::Selected), ("x", TriState::Selected)]), false);
        assert_eq!(delta, SettingsDelta::Changed);
        assert_eq!(store.state("a"), TriState::Deselected);
        assert_eq!(store.state("x"), TriState::Deselected);
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn test_lazy_replace_still_applies_everything() {
        let store = store();
        let next = states(&[("a", TriState::Selected), ("c", TriState::AntiSelected)]);
        assert_eq!(store.replace_all(&next, true), SettingsDelta::AssumedChanged);
        assert_eq!(store.state("c"), TriState::AntiSelected);
        assert_eq!(store.replace_all(&next, true), SettingsDelta::Unchanged);
    }

    #[test]
    fn test_explicit_deselected_equals_absent() {
        let store = store();
        let delta = store.replace_all(&states(&[("a", TriState::Deselected)]), false);
        assert_eq!(delta, SettingsDelta::Unchanged);
    }

    #[test]
    fn test_selected_ids_round_trip() {
        let store = store();
        store.replace_all(&SelectionStore::from_selected_ids(["c", "a"]), false);
        assert_eq!(store.selected_ids(), vec!["a".to_string(), "c".to_string()]);
    }
}
