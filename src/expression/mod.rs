//! Tag Expression
//!
//! Combines tag predicates with the user's selection. A tag is *expressed*
//! for an app when it is selected and its predicate holds, or anti-selected
//! and its predicate fails; deselected tags never express.

mod rendering;

pub use rendering::{ExpIcon, ExpressedTag};

use std::collections::HashSet;
use std::sync::Arc;

use crate::app::App;
use crate::catalog::{TagCatalog, TagDefinition, TagIcon};
use crate::resolver::{Relevance, ResolutionEngine, Resources};
use crate::selection::TriState;

/// Activation of one tag, streamed by [`TagEvaluator::tag_details`].
#[derive(Debug, Clone)]
pub struct TagDetail {
    pub tag: Arc<TagDefinition>,
    /// Raw predicate result, regardless of selection
    pub activated: bool,
    /// What the check found
    pub description: Option<String>,
    pub value: Option<String>,
}

pub struct TagEvaluator {
    engine: Arc<ResolutionEngine>,
}

impl TagEvaluator {
    pub fn new(engine: Arc<ResolutionEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<ResolutionEngine> {
        &self.engine
    }

    /// Selection-aware evaluation. Unknown tags are never expressed.
    pub fn is_expressed(&self, tag_id: &str, res: &Resources) -> bool {
        let Some(tag) = self.engine.catalog().get(tag_id) else {
            return false;
        };
        match self.engine.selection().state(tag_id) {
            TriState::Deselected => false,
            TriState::Selected => tag.express(res),
            TriState::AntiSelected => !tag.express(res),
        }
    }

    /// Load the fixed package icons catalog tags declare.
    pub async fn ensure_tag_icons(&self) {
        let context = self.engine.context();
        for tag in self.engine.catalog().tags() {
            let TagIcon::Package(package) = &tag.icon else { continue };
            if let Err(e) = context.icons().ensure(package, context.inspector()).await {
                tracing::warn!("Failed to load icon {} for tag {}: {:#}", package, tag.id, e);
            }
        }
    }

    /// Whether any catalog tag is expressed for `app`.
    pub async fn filter_tags(&self, app: &Arc<App>) -> bool {
        self.ensure_tag_icons().await;
        let res = self.engine.resolve(app, &Relevance::AnyActive).await;
        self.engine.catalog().ids().any(|id| self.is_expressed(id, &res))
    }

    /// Chips for the tags expressed for `app` under the current selection,
    /// ordered by rank.
    pub async fn express_tags(&self, app: &Arc<App>) -> Vec<ExpressedTag> {
        self.ensure_tag_icons().await;
        let res = self.engine.resolve(app, &Relevance::AnyActive).await;
        self.render_where(&res, |tag| self.is_expressed(&tag.id, &res))
    }

    /// Chips for every tag whose predicate holds for `app`, whatever the
    /// selection, ordered by rank.
    pub async fn activated_tags(&self, app: &Arc<App>) -> Vec<ExpressedTag> {
        self.ensure_tag_icons().await;
        let res = self.engine.resolve(app, &Relevance::All).await;
        self.render_where(&res, |tag| tag.express(&res))
    }

    fn render_where(&self, res: &Resources, keep: impl Fn(&TagDefinition) -> bool) -> Vec<ExpressedTag> {
        let mut tags: Vec<ExpressedTag> = self
            .engine
            .catalog()
            .tags()
            .filter(|tag| keep(tag))
            .filter_map(|tag| ExpressedTag::render(tag, res))
            .collect();
        tags.sort_by_key(|tag| tag.rank);
        tags
    }

    /// Stream the activation of every tag as soon as all of its requisites
    /// are satisfied. Tags whose requisites fail to load are never reported.
    pub async fn tag_details<F>(&self, app: &Arc<App>, on_update: F) -> Resources
    where
        F: FnMut(TagDetail) + Send,
    {
        let catalog = self.engine.catalog().clone();
        let bare: Vec<String> = catalog
            .tags()
            .filter(|tag| !tag.has_requisites())
            .map(|tag| tag.id.clone())
            .collect();
        let mut stream = DetailStream { catalog: &catalog, reported: HashSet::new(), on_update };

        let res = self
            .engine
            .resolve_with(app, &Relevance::All, |group, res| {
                stream.report(bare.iter().map(String::as_str), res);
                stream.report(group.tag_ids.iter().map(String::as_str), res);
            })
            .await;
        // catalogs without requisites never trigger a report
        stream.report(catalog.ids(), &res);
        res
    }
}

struct DetailStream<'a, F> {
    catalog: &'a TagCatalog,
    reported: HashSet<String>,
    on_update: F,
}

impl<F: FnMut(TagDetail)> DetailStream<'_, F> {
    fn report<'i>(&mut self, tag_ids: impl IntoIterator<Item = &'i str>, res: &Resources) {
        for id in tag_ids {
            let Some(tag) = self.catalog.get(id) else { continue };
            if self.reported.contains(id) || !tag.requisites.iter().all(|r| r.check(res)) {
                continue;
            }
            self.reported.insert(id.to_string());
            (self.on_update)(TagDetail {
                tag: tag.clone(),
                activated: tag.express(res),
                description: tag.describe(res),
                value: tag.value(res),
            });
        }
    }
}
