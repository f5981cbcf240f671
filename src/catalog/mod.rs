//! Tag Catalog
//!
//! Immutable registry of tag definitions. Built once at startup (usually
//! from [`builtin_catalog`]) and shared read-only with the engine and the
//! evaluator.

pub mod builtin;
mod requisite;

pub use builtin::builtin_catalog;
pub use requisite::{FnRequisite, Requisite};

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

use crate::config::Platform;
use crate::error::{TagError, TagResult};
use crate::resolver::Resources;

pub const RANK_UNSPECIFIED: u32 = u32::MAX;

/// Applicability predicate of a tag.
pub type Expressing = Arc<dyn Fn(&Resources) -> bool + Send + Sync>;

/// Text derived from resolved data: a check result, or a tag value.
pub type Describing = Arc<dyn Fn(&Resources) -> Option<String> + Send + Sync>;

/// Whether a tag applies on the host platform at all.
pub type Availability = Arc<dyn Fn(&Platform) -> bool + Send + Sync>;

/// Display labels. A dynamic tag takes its short label from the data its
/// requisites recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels {
    pub normal: Option<String>,
    pub full: Option<String>,
    pub dynamic: bool,
}

impl Labels {
    pub fn new(normal: impl Into<String>) -> Self {
        Self { normal: Some(normal.into()), ..Default::default() }
    }

    pub fn pair(normal: impl Into<String>, full: impl Into<String>) -> Self {
        Self {
            normal: Some(normal.into()),
            full: Some(full.into()),
            dynamic: false,
        }
    }

    /// Static full label, short label from requisite data.
    pub fn dynamic(full: impl Into<String>) -> Self {
        Self {
            normal: None,
            full: Some(full.into()),
            dynamic: true,
        }
    }

    pub fn normal_label(&self) -> Option<&str> {
        self.normal.as_deref().or(self.full.as_deref())
    }

    pub fn full_label(&self) -> Option<&str> {
        self.full.as_deref().or(self.normal.as_deref())
    }
}

/// Where a tag's icon comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TagIcon {
    /// Bundled drawable, by name
    Resource(String),
    /// Short text drawn in place of an image
    Text(String),
    /// Launcher icon of a fixed package
    Package(String),
    /// Package icon chosen by a requisite at load time
    Dynamic,
    #[default]
    None,
}

pub struct TagDefinition {
    pub id: String,
    pub labels: Labels,
    pub icon: TagIcon,
    pub rank: u32,
    pub requisites: Vec<Arc<dyn Requisite>>,
    expressing: Expressing,
    description: Option<Describing>,
    value: Option<Describing>,
    availability: Option<Availability>,
}

impl TagDefinition {
    pub fn new<E>(id: impl Into<String>, expressing: E) -> Self
    where
        E: Fn(&Resources) -> bool + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            labels: Labels::default(),
            icon: TagIcon::None,
            rank: RANK_UNSPECIFIED,
            requisites: Vec::new(),
            expressing: Arc::new(expressing),
            description: None,
            value: None,
            availability: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels = Labels::new(label);
        self
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_icon(mut self, icon: TagIcon) -> Self {
        self.icon = icon;
        self
    }

    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank = rank;
        self
    }

    pub fn with_requisite(mut self, requisite: Arc<dyn Requisite>) -> Self {
        self.requisites.push(requisite);
        self
    }

    /// Explain what the check found, e.g. which service was declared.
    pub fn with_description<D>(mut self, describing: D) -> Self
    where
        D: Fn(&Resources) -> Option<String> + Send + Sync + 'static,
    {
        self.description = Some(Arc::new(describing));
        self
    }

    /// Value shown in place of the label when present, e.g. an app category.
    pub fn with_value<V>(mut self, valuing: V) -> Self
    where
        V: Fn(&Resources) -> Option<String> + Send + Sync + 'static,
    {
        self.value = Some(Arc::new(valuing));
        self
    }

    pub fn with_availability<A>(mut self, availability: A) -> Self
    where
        A: Fn(&Platform) -> bool + Send + Sync + 'static,
    {
        self.availability = Some(Arc::new(availability));
        self
    }

    /// Evaluate the raw predicate, without regard to selection state.
    pub fn express(&self, res: &Resources) -> bool {
        (self.expressing)(res)
    }

    pub fn describe(&self, res: &Resources) -> Option<String> {
        self.description.as_ref().and_then(|describing| describing(res))
    }

    pub fn value(&self, res: &Resources) -> Option<String> {
        self.value.as_ref().and_then(|valuing| valuing(res))
    }

    /// Tags without an availability gate are available everywhere.
    pub fn is_available(&self, platform: &Platform) -> bool {
        self.availability.as_ref().map_or(true, |available| available(platform))
    }

    pub fn has_requisites(&self) -> bool {
        !self.requisites.is_empty()
    }
}

impl fmt::Debug for TagDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let requisites: Vec<&str> = self.requisites.iter().map(|r| r.id()).collect();
        f.debug_struct("TagDefinition")
            .field("id", &self.id)
            .field("labels", &self.labels)
            .field("icon", &self.icon)
            .field("rank", &self.rank)
            .field("requisites", &requisites)
            .field("described", &self.description.is_some())
            .field("valued", &self.value.is_some())
            .finish()
    }
}

/// Registry of tags in declaration order
#[derive(Debug, Default)]
pub struct TagCatalog {
    tags: IndexMap<String, Arc<TagDefinition>>,
}

impl TagCatalog {
    pub fn new(definitions: impl IntoIterator<Item = TagDefinition>) -> TagResult<Self> {
        let mut tags = IndexMap::new();
        for definition in definitions {
            if tags.contains_key(&definition.id) {
                return Err(TagError::DuplicateTag(definition.id));
            }
            tags.insert(definition.id.clone(), Arc::new(definition));
        }
        Ok(Self { tags })
    }

    pub fn get(&self, tag_id: &str) -> Option<&Arc<TagDefinition>> {
        self.tags.get(tag_id)
    }

    pub fn tags(&self) -> impl Iterator<Item = &Arc<TagDefinition>> {
        self.tags.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    /// Drop the tags that do not apply on `platform`.
    pub fn available_on(mut self, platform: &Platform) -> Self {
        let before = self.tags.len();
        self.tags.retain(|_, tag| tag.is_available(platform));
        if self.tags.len() < before {
            tracing::debug!(
                "{} tag(s) unavailable on SDK {}",
                before - self.tags.len(),
                platform.sdk_level
            );
        }
        self
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_tags_rejected() {
        let result = TagCatalog::new(vec![
            TagDefinition::new("a", |_| true),
            TagDefinition::new("a", |_| false),
        ]);
        assert!(matches!(result, Err(TagError::DuplicateTag(id)) if id == "a"));
    }

    #[test]
    fn test_catalog_keeps_declaration_order() {
        let catalog = TagCatalog::new(vec![
            TagDefinition::new("z", |_| true),
            TagDefinition::new("a", |_| true),
        ])
        .unwrap();
        assert_eq!(catalog.ids().collect::<Vec<_>>(), vec!["z", "a"]);
    }

    #[test]
    fn test_unavailable_tags_are_dropped() {
        let catalog = TagCatalog::new(vec![
            TagDefinition::new("module", |_| true).with_availability(|p| p.sdk_level >= 29),
            TagDefinition::new("system", |_| true),
        ])
        .unwrap();
        let old = Platform { sdk_level: 28, ..Default::default() };
        assert_eq!(catalog.available_on(&old).ids().collect::<Vec<_>>(), vec!["system"]);
    }

    #[test]
    fn test_description_and_value_hooks() {
        let tag = TagDefinition::new("category", |_| true)
            .with_description(|res| Some(format!("{} has a category", res.app().package_name)))
            .with_value(|_| None);
        let context = crate::resolver::LoadContext::new(
            Arc::new(crate::app::InventoryInspector::new(Vec::new())),
            Arc::new(crate::icons::IconCache::new()),
        );
        let res = Resources::new(Arc::new(crate::app::App::new("com.example")), Arc::new(context));
        assert_eq!(tag.describe(&res).as_deref(), Some("com.example has a category"));
        assert_eq!(tag.value(&res), None);
        assert_eq!(TagDefinition::new("bare", |_| true).describe(&res), None);
    }

    #[test]
    fn test_label_fallbacks() {
        let labels = Labels::dynamic("Package Installer");
        assert_eq!(labels.normal_label(), Some("Package Installer"));
        assert_eq!(labels.full_label(), Some("Package Installer"));
        assert_eq!(Labels::default().normal_label(), None);
    }
}
