use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::resolver::Resources;

/// A per-app load that one or more tags depend on.
///
/// Tags sharing a load declare requisites with the same id; the engine
/// loads each id at most once per resolution.
#[async_trait]
pub trait Requisite: Send + Sync {
    /// Identifies the kind of load, independent of the declaring tag
    fn id(&self) -> &str;

    /// Whether the data is already present (or not needed) for this app
    fn check(&self, res: &Resources) -> bool;

    /// Populate the missing data. May perform I/O.
    async fn load(&self, res: &Resources) -> anyhow::Result<()>;
}

type Checker = Arc<dyn Fn(&Resources) -> bool + Send + Sync>;
type Loader = Arc<dyn Fn(Resources) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Requisite assembled from a checker and a loader closure.
#[derive(Clone)]
pub struct FnRequisite {
    id: String,
    checker: Checker,
    loader: Loader,
}

impl FnRequisite {
    pub fn new<C, L, Fut>(id: impl Into<String>, checker: C, loader: L) -> Self
    where
        C: Fn(&Resources) -> bool + Send + Sync + 'static,
        L: Fn(Resources) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let loader: Loader = Arc::new(move |res: Resources| -> BoxFuture<'static, anyhow::Result<()>> {
            Box::pin(loader(res))
        });
        Self {
            id: id.into(),
            checker: Arc::new(checker),
            loader,
        }
    }

    pub fn into_arc(self) -> Arc<dyn Requisite> {
        Arc::new(self)
    }
}

impl fmt::Debug for FnRequisite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRequisite").field("id", &self.id).finish_non_exhaustive()
    }
}

#[async_trait]
impl Requisite for FnRequisite {
    fn id(&self) -> &str {
        &self.id
    }

    fn check(&self, res: &Resources) -> bool {
        (self.checker)(res)
    }

    async fn load(&self, res: &Resources) -> anyhow::Result<()> {
        (self.loader)(res.clone()).await
    }
}
