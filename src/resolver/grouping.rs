use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

use crate::catalog::{Requisite, TagCatalog};

/// A requisite together with every tag that declares it.
#[derive(Clone)]
pub struct RequisiteGroup {
    pub requisite: Arc<dyn Requisite>,
    pub tag_ids: Vec<String>,
}

impl RequisiteGroup {
    pub fn id(&self) -> &str {
        self.requisite.id()
    }
}

impl fmt::Debug for RequisiteGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequisiteGroup")
            .field("requisite", &self.requisite.id())
            .field("tag_ids", &self.tag_ids)
            .finish()
    }
}

/// Group catalog requisites by requisite id, in catalog order.
///
/// The first declaration of an id represents the whole group. Tags without
/// requisites do not appear. Cheap enough to run on every resolution.
pub fn group_requisites(catalog: &TagCatalog) -> Vec<RequisiteGroup> {
    let mut groups: IndexMap<&str, RequisiteGroup> = IndexMap::new();
    for tag in catalog.tags() {
        for requisite in &tag.requisites {
            let group = groups.entry(requisite.id()).or_insert_with(|| RequisiteGroup {
                requisite: requisite.clone(),
                tag_ids: Vec::new(),
            });
            if !group.tag_ids.contains(&tag.id) {
                group.tag_ids.push(tag.id.clone());
            }
        }
    }
    groups.into_values().collect()
}
