//! Debounced, cancelable, at-most-one-in-flight search orchestration.
//!
//! Every query change bumps a generation counter while holding the state
//! channel's write lock. A search attempt may only publish while its
//! generation is still the latest, so a superseded attempt can never
//! overwrite newer results even if its response arrives last.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use arc_swap::{ArcSwap, ArcSwapOption};
use poidir_core::{resolve_category, CategoryCode, PlaceRecord, Preferences, ProviderKind};
use poidir_providers::{PlacesProvider, ProviderRegistry, SearchError, SearchRequest};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::LocationError;
use crate::location::LocationResolver;
use crate::state::{SearchFailure, SearchPhase, SearchState};

/// Default pause in typing before a search is sent.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

struct PendingSearch {
    generation: u64,
    cancel: CancellationToken,
}

struct Inner {
    registry: Arc<ProviderRegistry>,
    resolver: LocationResolver,
    provider: ArcSwap<ProviderKind>,
    scope: ArcSwapOption<CategoryCode>,
    state: watch::Sender<SearchState>,
    generation: AtomicU64,
    pending: Mutex<Option<PendingSearch>>,
    debounce: Duration,
}

/// Turns query keystrokes and category taps into remote searches and
/// publishes the outcome as [`SearchState`].
///
/// Must be created inside a Tokio runtime: construction spawns the
/// preference watcher and a location prefetch.
pub struct SearchCoordinator {
    inner: Arc<Inner>,
    watcher: JoinHandle<()>,
}

impl SearchCoordinator {
    #[must_use]
    pub fn new(
        registry: Arc<ProviderRegistry>,
        resolver: LocationResolver,
        preferences: watch::Receiver<Preferences>,
        debounce: Duration,
    ) -> Self {
        let initial = preferences.borrow().provider;
        let (state, _) = watch::channel(SearchState::default());
        let inner = Arc::new(Inner {
            registry,
            resolver,
            provider: ArcSwap::from_pointee(initial),
            scope: ArcSwapOption::empty(),
            state,
            generation: AtomicU64::new(0),
            pending: Mutex::new(None),
            debounce,
        });

        inner.resolver.prefetch();
        let watcher = tokio::spawn(watch_preferences(Arc::clone(&inner), preferences));
        tracing::debug!(
            provider = %initial,
            debounce_ms = debounce.as_millis(),
            "search coordinator started"
        );

        Self { inner, watcher }
    }

    /// Records `text` as the current query and (re)starts the debounce.
    ///
    /// Blank text clears results without searching. Any pending or
    /// in-flight search is cancelled either way.
    pub fn on_query_changed(&self, text: &str) {
        if text.trim().is_empty() {
            self.inner.cancel_pending(|state| {
                state.query = text.to_string();
                state.clear_results();
            });
        } else {
            self.inner.schedule(|state| {
                state.query = text.to_string();
                state.start_debounce();
            });
        }
    }

    /// Scopes future searches to `code` and browses it for the current
    /// query, even when the query is blank. A blank code clears the scope
    /// without searching.
    pub fn on_category_selected(&self, code: &str) {
        let Some(category) = CategoryCode::new(code) else {
            self.inner.scope.store(None);
            tracing::debug!("category scope cleared");
            return;
        };
        tracing::debug!(category = category.as_str(), "category scope selected");
        self.inner.scope.store(Some(Arc::new(category)));
        self.inner.schedule(SearchState::start_debounce);
    }

    /// Clears query, results, loading flag, and failure; cancels any
    /// pending or in-flight search.
    pub fn reset_search(&self) {
        self.inner.cancel_pending(|state| {
            state.query.clear();
            state.clear_results();
        });
        tracing::debug!("search reset");
    }

    /// Selects the backend for the next search. A search already in flight
    /// keeps its provider and nothing is re-run.
    pub fn set_provider(&self, kind: ProviderKind) {
        self.inner.set_provider(kind);
    }

    #[must_use]
    pub fn provider(&self) -> ProviderKind {
        **self.inner.provider.load()
    }

    #[must_use]
    pub fn scope(&self) -> Option<CategoryCode> {
        self.inner.scope.load_full().map(|code| (*code).clone())
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> SearchState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn resolver(&self) -> &LocationResolver {
        &self.inner.resolver
    }

    /// Suggestions from the active provider.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Cancelled`] if `cancel` fires first.
    pub async fn autocomplete(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, SearchError> {
        match self.inner.active_provider() {
            Some(provider) => provider.autocomplete(query, cancel).await,
            None => Ok(Vec::new()),
        }
    }

    /// Richer record for `place` from the active provider, when the place
    /// carries a provider ID.
    pub async fn place_details(&self, place: &PlaceRecord) -> Option<PlaceRecord> {
        let place_id = place.provider_place_id.as_deref()?;
        self.inner.active_provider()?.details(place_id).await
    }
}

impl Drop for SearchCoordinator {
    fn drop(&mut self) {
        self.watcher.abort();
        self.inner.cancel_pending(|_| {});
    }
}

impl Inner {
    fn pending(&self) -> MutexGuard<'_, Option<PendingSearch>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn active_provider(&self) -> Option<Arc<dyn PlacesProvider>> {
        let kind = **self.provider.load();
        let provider = self.registry.places(kind);
        if provider.is_none() {
            tracing::error!(provider = %kind, "no places provider registered");
        }
        provider
    }

    fn set_provider(&self, kind: ProviderKind) {
        let previous = self.provider.swap(Arc::new(kind));
        if *previous != kind {
            tracing::info!(from = %previous, to = %kind, "search provider switched");
        }
    }

    /// Applies `edit` and bumps the generation under the state write lock.
    fn begin(&self, edit: impl FnOnce(&mut SearchState)) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            edit(state);
        });
        generation
    }

    /// Applies `edit` only if `generation` is still the latest.
    fn publish(&self, generation: u64, edit: impl FnOnce(&mut SearchState)) -> bool {
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            edit(state);
            true
        })
    }

    fn cancel_pending(&self, edit: impl FnOnce(&mut SearchState)) {
        let mut pending = self.pending();
        self.begin(edit);
        if let Some(old) = pending.take() {
            tracing::debug!(generation = old.generation, "cancelling pending search");
            old.cancel.cancel();
        }
    }

    fn schedule(self: &Arc<Self>, edit: impl FnOnce(&mut SearchState)) {
        let mut pending = self.pending();
        let generation = self.begin(edit);
        let query = self.state.borrow().query.clone();
        let cancel = CancellationToken::new();

        if let Some(old) = pending.replace(PendingSearch {
            generation,
            cancel: cancel.clone(),
        }) {
            tracing::debug!(generation = old.generation, "superseding pending search");
            old.cancel.cancel();
        }
        tokio::spawn(Arc::clone(self).run(generation, query, cancel));
    }

    async fn run(self: Arc<Self>, generation: u64, query: String, cancel: CancellationToken) {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!(generation, "debounce cancelled");
                return;
            }
            () = tokio::time::sleep(self.debounce) => {}
        }
        if !self.publish(generation, |state| state.phase = SearchPhase::InFlight) {
            return;
        }

        let started = Instant::now();
        let location = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!(generation, "search cancelled while resolving location");
                return;
            }
            location = self.resolver.resolve() => location,
        };
        let location_ms = started.elapsed().as_millis();
        let coordinate = match location {
            Ok(coordinate) => coordinate,
            Err(LocationError::PermissionDenied) => {
                tracing::error!(generation, "location permission not granted");
                self.publish(generation, |state| {
                    state.results.clear();
                    state.is_loading = false;
                    state.phase = SearchPhase::Failed;
                    state.failure = Some(SearchFailure::LocationPermissionDenied);
                });
                return;
            }
        };

        // Read once so a concurrent switch only affects the next attempt.
        let kind = **self.provider.load();
        let scope = self.scope.load_full();
        let category = resolve_category(kind, &query, scope.as_deref());

        let Some(provider) = self.registry.places(kind) else {
            tracing::error!(generation, provider = %kind, "no places provider registered");
            self.publish(generation, |state| {
                state.results.clear();
                state.is_loading = false;
                state.phase = SearchPhase::Failed;
            });
            return;
        };

        tracing::debug!(
            generation,
            query = query.trim(),
            provider = %kind,
            category = category.as_ref().map(CategoryCode::as_str),
            %coordinate,
            location_ms,
            "searching"
        );
        let request = SearchRequest::new(&query, coordinate, category).with_cancel(cancel);
        match provider.search(&request).await {
            Ok(results) => {
                let count = results.len();
                let published = self.publish(generation, |state| {
                    state.results = results;
                    state.is_loading = false;
                    state.phase = SearchPhase::Published;
                    state.failure = None;
                });
                if published {
                    tracing::debug!(
                        generation,
                        provider = %kind,
                        results = count,
                        elapsed_ms = started.elapsed().as_millis(),
                        "search published"
                    );
                } else {
                    tracing::debug!(generation, "dropping results from superseded search");
                }
            }
            Err(SearchError::Cancelled) => {
                tracing::debug!(generation, "search cancelled");
            }
        }
    }
}

/// Mirrors preference changes into the coordinator: provider switches are
/// applied and location-source changes invalidate the cached location once.
///
/// This runs behind the preference channel, so a search can start before a
/// change is seen here; the resolver checks the location source itself on
/// every call, and a change it already picked up is not invalidated twice.
async fn watch_preferences(inner: Arc<Inner>, mut preferences: watch::Receiver<Preferences>) {
    let mut last = preferences.borrow_and_update().clone();
    while preferences.changed().await.is_ok() {
        let current = preferences.borrow_and_update().clone();
        if current.provider != last.provider {
            inner.set_provider(current.provider);
        }
        if current.location_source() != last.location_source() {
            inner.resolver.refresh_if_source_changed();
        }
        last = current;
    }
}
