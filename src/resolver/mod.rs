//! Requisite Resolution Engine
//!
//! Materializes the [`Resources`] of one app. Every requisite group that is
//! relevant and not yet satisfied gets its own task; loads of the same
//! requisite are serialized through a single-flight table and re-checked
//! after the lock is taken, so each load runs at most once however many
//! tags or concurrent resolutions ask for it.
//!
//! Completions are reported in the order loads finish. `resolve_with`
//! returns only when every group has reported.

mod grouping;
mod resources;
mod single_flight;

pub use grouping::{group_requisites, RequisiteGroup};
pub use resources::{LoadContext, Resources};
pub use single_flight::{FlightGuard, FlightKey, SingleFlight};

use chrono::Utc;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::AbortHandle;

use crate::app::App;
use crate::catalog::{Requisite, TagCatalog};
use crate::config::{EngineConfig, LockScope};
use crate::error::TagError;
use crate::events::{EventBus, TagEvent};
use crate::selection::{SelectionStore, TriState};

/// Decides whether a requisite group is worth loading, given its tag ids.
#[derive(Clone, Default)]
pub enum Relevance {
    /// Load everything (tag details, icon preparation)
    All,
    /// Load when any declaring tag is selected or anti-selected
    #[default]
    AnyActive,
    /// Load when any declaring tag is selected
    SelectedOnly,
    Custom(Arc<dyn Fn(&[String]) -> bool + Send + Sync>),
}

impl Relevance {
    pub fn custom(filter: impl Fn(&[String]) -> bool + Send + Sync + 'static) -> Self {
        Relevance::Custom(Arc::new(filter))
    }

    pub fn is_relevant(&self, selection: &SelectionStore, tag_ids: &[String]) -> bool {
        match self {
            Relevance::All => true,
            Relevance::AnyActive => tag_ids.iter().any(|id| selection.state(id).is_active()),
            Relevance::SelectedOnly => tag_ids.iter().any(|id| selection.state(id) == TriState::Selected),
            Relevance::Custom(filter) => filter(tag_ids),
        }
    }
}

impl std::fmt::Debug for Relevance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Relevance::All => write!(f, "All"),
            Relevance::AnyActive => write!(f, "AnyActive"),
            Relevance::SelectedOnly => write!(f, "SelectedOnly"),
            Relevance::Custom(_) => write!(f, "Custom"),
        }
    }
}

pub struct ResolutionEngine {
    catalog: Arc<TagCatalog>,
    selection: Arc<SelectionStore>,
    context: Arc<LoadContext>,
    flights: SingleFlight,
    load_permits: Arc<Semaphore>,
    events: Arc<EventBus>,
    config: EngineConfig,
}

impl ResolutionEngine {
    pub fn new(
        catalog: Arc<TagCatalog>,
        selection: Arc<SelectionStore>,
        context: Arc<LoadContext>,
        config: EngineConfig,
    ) -> Self {
        Self {
            catalog,
            selection,
            context,
            flights: SingleFlight::new(),
            load_permits: Arc::new(Semaphore::new(config.max_concurrent_loads.max(1))),
            events: Arc::new(EventBus::with_capacity(config.event_capacity)),
            config,
        }
    }

    pub fn catalog(&self) -> &Arc<TagCatalog> {
        &self.catalog
    }

    pub fn selection(&self) -> &Arc<SelectionStore> {
        &self.selection
    }

    pub fn context(&self) -> &Arc<LoadContext> {
        &self.context
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Loads currently holding or waiting for a single-flight lock.
    pub fn in_flight(&self) -> usize {
        self.flights.in_flight()
    }

    pub fn groups(&self) -> Vec<RequisiteGroup> {
        group_requisites(&self.catalog)
    }

    pub async fn resolve(&self, app: &Arc<App>, relevance: &Relevance) -> Resources {
        self.resolve_with(app, relevance, |_, _| {}).await
    }

    /// Resolve `app`, reporting every requisite group to `on_each`.
    ///
    /// Groups needing no load are reported first, in catalog order, before
    /// anything is awaited. Loaded groups follow in completion order.
    pub async fn resolve_with<F>(&self, app: &Arc<App>, relevance: &Relevance, mut on_each: F) -> Resources
    where
        F: FnMut(&RequisiteGroup, &Resources) + Send,
    {
        let res = Resources::new(app.clone(), self.context.clone());
        let (checked, unchecked): (Vec<RequisiteGroup>, Vec<RequisiteGroup>) =
            self.groups().into_iter().partition(|group| {
                !relevance.is_relevant(&self.selection, &group.tag_ids) || group.requisite.check(&res)
            });

        for group in &checked {
            on_each(group, &res);
        }

        let (mut loaded, mut failed) = (0, 0);
        if !unchecked.is_empty() {
            tracing::debug!(
                "Loading {} requisite group(s) for {}: {:?}",
                unchecked.len(),
                app.package_name,
                unchecked.iter().map(RequisiteGroup::id).collect::<Vec<_>>()
            );
            let (tx, mut rx) = mpsc::unbounded_channel::<(usize, LoadOutcome)>();
            let mut tasks = AbortOnDrop::default();
            for (index, group) in unchecked.iter().enumerate() {
                let job = LoadJob {
                    flights: self.flights.clone(),
                    permits: self.load_permits.clone(),
                    events: self.events.clone(),
                    key: self.flight_key(app, group.id()),
                    requisite: group.requisite.clone(),
                    res: res.clone(),
                    timeout: self.config.load_timeout(),
                };
                let tx = tx.clone();
                let handle = tokio::spawn(async move {
                    let outcome = job.run().await;
                    let _ = tx.send((index, outcome));
                });
                tasks.push(handle.abort_handle());
            }
            drop(tx);

            let mut reported = 0;
            while reported < unchecked.len() {
                let Some((index, outcome)) = rx.recv().await else {
                    tracing::warn!(
                        "{} requisite group(s) for {} never reported",
                        unchecked.len() - reported,
                        app.package_name
                    );
                    break;
                };
                match outcome {
                    LoadOutcome::Loaded => loaded += 1,
                    LoadOutcome::Failed => failed += 1,
                    LoadOutcome::Satisfied => {}
                }
                on_each(&unchecked[index], &res);
                reported += 1;
            }
        }

        self.events.publish(TagEvent::ResolutionFinished {
            app: app.identity(),
            checked: checked.len(),
            scheduled: unchecked.len(),
            loaded,
            failed,
            at: Utc::now(),
        });
        res
    }

    fn flight_key(&self, app: &App, requisite_id: &str) -> FlightKey {
        match self.config.lock_scope {
            LockScope::Requisite => FlightKey::requisite(requisite_id),
            LockScope::AppRequisite => FlightKey::app_requisite(app.identity(), requisite_id),
        }
    }
}

/// Aborts group tasks still waiting when a resolution is abandoned.
#[derive(Default)]
struct AbortOnDrop(Vec<AbortHandle>);

impl AbortOnDrop {
    fn push(&mut self, handle: AbortHandle) {
        self.0.push(handle);
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadOutcome {
    Loaded,
    /// Satisfied by the time the lock was taken
    Satisfied,
    Failed,
}

struct LoadJob {
    flights: SingleFlight,
    permits: Arc<Semaphore>,
    events: Arc<EventBus>,
    key: FlightKey,
    requisite: Arc<dyn Requisite>,
    res: Resources,
    timeout: Option<Duration>,
}

impl LoadJob {
    async fn run(self) -> LoadOutcome {
        let LoadJob { flights, permits, events, key, requisite, res, timeout } = self;
        let flight = flights.acquire(key).await;
        let app = res.app().identity();
        let requisite_id = requisite.id().to_string();

        // another resolution may have loaded it while we waited
        match catch_unwind(AssertUnwindSafe(|| requisite.check(&res))) {
            Ok(true) => {
                tracing::debug!("Requisite {} already satisfied for {}", flight.key(), app);
                return LoadOutcome::Satisfied;
            }
            Ok(false) => {}
            Err(_) => {
                tracing::warn!("Requisite {} checker panicked for {}", requisite_id, app);
                events.publish(TagEvent::RequisiteFailed {
                    app,
                    requisite: requisite_id,
                    error: "checker panicked".to_string(),
                });
                return LoadOutcome::Failed;
            }
        }

        let panics = events.clone();
        // The loader owns the flight guard and runs to completion even when
        // the resolution that started it is abandoned.
        let loader = tokio::spawn(async move {
            let _flight = flight;
            let _permit = permits.acquire_owned().await.ok();
            let started = Instant::now();
            let outcome = match timeout {
                Some(limit) => match tokio::time::timeout(limit, requisite.load(&res)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(TagError::LoadTimeout {
                        requisite: requisite.id().to_string(),
                        timeout_ms: limit.as_millis() as u64,
                    }
                    .into()),
                },
                None => requisite.load(&res).await,
            };
            let app = res.app().identity();
            match outcome {
                Ok(()) => {
                    let elapsed_ms = started.elapsed().as_millis();
                    tracing::debug!("Loaded requisite {} for {} in {} ms", requisite.id(), app, elapsed_ms);
                    events.publish(TagEvent::RequisiteLoaded {
                        app,
                        requisite: requisite.id().to_string(),
                        elapsed_ms,
                    });
                    LoadOutcome::Loaded
                }
                Err(e) => {
                    tracing::warn!("Requisite {} failed for {}: {:#}", requisite.id(), app, e);
                    events.publish(TagEvent::RequisiteFailed {
                        app,
                        requisite: requisite.id().to_string(),
                        error: format!("{:#}", e),
                    });
                    LoadOutcome::Failed
                }
            }
        });

        match loader.await {
            Ok(outcome) => outcome,
            Err(e) => {
                if e.is_panic() {
                    tracing::warn!("Requisite {} panicked for {}", requisite_id, app);
                    panics.publish(TagEvent::RequisiteFailed {
                        app,
                        requisite: requisite_id,
                        error: "loader panicked".to_string(),
                    });
                }
                LoadOutcome::Failed
            }
        }
    }
}
