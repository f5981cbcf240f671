use serde::Serialize;
use std::sync::Arc;

use crate::catalog::{TagDefinition, TagIcon};
use crate::icons::IconImage;
use crate::resolver::Resources;

/// Icon of a tag as it should be drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpIcon {
    Resource { name: String },
    Package {
        package_name: String,
        #[serde(skip)]
        image: Arc<IconImage>,
    },
    Text { text: String },
}

/// A tag ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpressedTag {
    pub tag_id: String,
    pub label: String,
    pub full_label: String,
    pub icon: ExpIcon,
    pub rank: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ExpressedTag {
    /// Render `tag` against `res`. `None` when the tag has no label, or
    /// declares an icon that cannot be resolved. A tag value replaces the
    /// label.
    pub fn render(tag: &TagDefinition, res: &Resources) -> Option<Self> {
        let label = label_of(tag, res)?;
        let icon = icon_of(tag, res, &label)?;
        let label = tag.value(res).unwrap_or(label);
        let full_label = tag.labels.full.clone().unwrap_or_else(|| label.clone());
        Some(Self {
            tag_id: tag.id.clone(),
            label,
            full_label,
            icon,
            rank: tag.rank,
            description: tag.describe(res),
        })
    }
}

/// Normal label, else for dynamic tags the first recorded requisite label.
/// A dynamic tag with nothing recorded has no label.
fn label_of(tag: &TagDefinition, res: &Resources) -> Option<String> {
    if let Some(normal) = &tag.labels.normal {
        return Some(normal.clone());
    }
    if tag.labels.dynamic {
        return tag.requisites.iter().find_map(|r| res.dynamic_label(r.id()));
    }
    tag.labels.full.clone()
}

fn icon_of(tag: &TagDefinition, res: &Resources, label: &str) -> Option<ExpIcon> {
    let package = match &tag.icon {
        TagIcon::Resource(name) => return Some(ExpIcon::Resource { name: name.clone() }),
        TagIcon::Text(text) => return Some(ExpIcon::Text { text: text.clone() }),
        TagIcon::None => return Some(ExpIcon::Text { text: label.to_string() }),
        TagIcon::Package(package) => package.clone(),
        TagIcon::Dynamic => tag.requisites.iter().find_map(|r| res.dynamic_icon_key(r.id()))?,
    };
    let image = res.icons().get(&package)?;
    Some(ExpIcon::Package { package_name: package, image })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{App, InventoryInspector};
    use crate::catalog::{FnRequisite, Labels};
    use crate::icons::IconCache;
    use crate::resolver::LoadContext;

    fn resources() -> Resources {
        let context = LoadContext::new(Arc::new(InventoryInspector::new(Vec::new())), Arc::new(IconCache::new()));
        Resources::new(Arc::new(App::new("com.example")), Arc::new(context))
    }

    fn dynamic_tag() -> TagDefinition {
        TagDefinition::new("installer", |_| true)
            .with_labels(Labels::dynamic("Package Installer"))
            .with_icon(TagIcon::Dynamic)
            .with_requisite(FnRequisite::new("pkg-installer", |_| true, |_| async { anyhow::Ok(()) }).into_arc())
    }

    #[test]
    fn test_static_label_and_text_fallback() {
        let tag = TagDefinition::new("system", |_| true).with_label("System").with_rank(190);
        let expressed = ExpressedTag::render(&tag, &resources()).unwrap();
        assert_eq!(expressed.label, "System");
        assert_eq!(expressed.full_label, "System");
        assert_eq!(expressed.icon, ExpIcon::Text { text: "System".into() });
    }

    #[test]
    fn test_unlabelled_tag_is_omitted() {
        let tag = TagDefinition::new("bare", |_| true).with_icon(TagIcon::Text("B".into()));
        assert!(ExpressedTag::render(&tag, &resources()).is_none());
    }

    #[test]
    fn test_dynamic_tag_without_recorded_label_is_omitted() {
        let res = resources();
        res.set_dynamic_icon_key("pkg-installer", "org.fdroid.fdroid");
        res.icons().insert("org.fdroid.fdroid", vec![7]);
        assert!(ExpressedTag::render(&dynamic_tag(), &res).is_none());
    }

    #[test]
    fn test_value_replaces_label() {
        let tag = TagDefinition::new("category", |_| true)
            .with_label("Category")
            .with_icon(TagIcon::Text("CAT".into()))
            .with_value(|_| Some("Maps & Navigation".to_string()))
            .with_description(|_| Some("Declares an app category".to_string()));
        let expressed = ExpressedTag::render(&tag, &resources()).unwrap();
        assert_eq!(expressed.label, "Maps & Navigation");
        assert_eq!(expressed.full_label, "Maps & Navigation");
        assert_eq!(expressed.icon, ExpIcon::Text { text: "CAT".into() });
        assert_eq!(expressed.description.as_deref(), Some("Declares an app category"));
    }

    #[test]
    fn test_dynamic_values_from_requisites() {
        let res = resources();
        let tag = dynamic_tag();
        // no icon key recorded yet
        assert!(ExpressedTag::render(&tag, &res).is_none());

        res.set_dynamic_label("pkg-installer", "org.fdroid.fdroid");
        res.set_dynamic_icon_key("pkg-installer", "org.fdroid.fdroid");
        // key known, image not cached
        assert!(ExpressedTag::render(&tag, &res).is_none());

        res.icons().insert("org.fdroid.fdroid", vec![7]);
        let expressed = ExpressedTag::render(&tag, &res).unwrap();
        assert_eq!(expressed.label, "org.fdroid.fdroid");
        assert_eq!(expressed.full_label, "Package Installer");
        assert!(matches!(expressed.icon, ExpIcon::Package { ref package_name, .. } if package_name == "org.fdroid.fdroid"));
    }
}
