//! Data loading for the dashboard: one customer page plus aggregate stats per
//! filter change.
//!
//! Each [`DashboardLoader::refresh`] opens a new generation. Fetches from a
//! superseded generation are aborted, and any response that still arrives
//! late is dropped, so the latest request always wins. A customer task that
//! ends without a result (panic) still clears `loading` for its generation.

use std::{sync::Arc, time::Duration};

use shared::protocol::{CustomerStats, CustomerSummary};
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{filters::FilterState, CustomerApi, FetchError, FetchErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorSource {
    Customers,
    Stats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub source: LoadErrorSource,
    pub kind: FetchErrorKind,
    pub message: String,
}

impl LoadError {
    fn new(source: LoadErrorSource, err: &FetchError) -> Self {
        Self {
            source,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadState {
    pub customers: Vec<CustomerSummary>,
    pub total_count: u64,
    pub stats: Option<CustomerStats>,
    pub loading: bool,
    pub error: Option<LoadError>,
    pub has_next: bool,
    pub has_previous: bool,
    pub generation: u64,
}

impl Default for LoadState {
    fn default() -> Self {
        Self {
            customers: Vec::new(),
            total_count: 0,
            stats: None,
            loading: true,
            error: None,
            has_next: false,
            has_previous: false,
            generation: 0,
        }
    }
}

impl LoadState {
    fn clear_error_from(&mut self, source: LoadErrorSource) {
        if self.error.as_ref().is_some_and(|err| err.source == source) {
            self.error = None;
        }
    }
}

#[derive(Default)]
struct LoaderInner {
    state: LoadState,
    generation: u64,
    customer_task: Option<JoinHandle<()>>,
    stats_task: Option<JoinHandle<()>>,
}

pub struct DashboardLoader<A: CustomerApi> {
    api: Arc<A>,
    inner: Arc<Mutex<LoaderInner>>,
    updates: watch::Sender<LoadState>,
    debounce: Duration,
}

impl<A: CustomerApi> DashboardLoader<A> {
    pub fn new(api: A) -> Self {
        let (updates, _) = watch::channel(LoadState::default());
        Self {
            api: Arc::new(api),
            inner: Arc::new(Mutex::new(LoaderInner::default())),
            updates,
            debounce: Duration::ZERO,
        }
    }

    /// Delay applied before each customer request; a newer refresh during
    /// the delay cancels the pending one.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.updates.subscribe()
    }

    pub async fn snapshot(&self) -> LoadState {
        self.inner.lock().await.state.clone()
    }

    /// Waits until `predicate` holds for the published state.
    pub async fn wait_until(&self, mut predicate: impl FnMut(&LoadState) -> bool) -> LoadState {
        let mut rx = self.subscribe();
        let outcome = rx
            .wait_for(|state| predicate(state))
            .await
            .map(|state| state.clone());
        match outcome {
            Ok(state) => state,
            // The sender lives as long as `self`, so this only happens on teardown.
            Err(_) => self.snapshot().await,
        }
    }

    pub async fn wait_idle(&self) -> LoadState {
        self.wait_until(|state| !state.loading).await
    }

    /// Starts a new fetch cycle for `filters` and returns its generation.
    pub async fn refresh(&self, filters: FilterState) -> u64 {
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        let generation = inner.generation;

        if let Some(task) = inner.customer_task.take() {
            task.abort();
        }
        if let Some(task) = inner.stats_task.take() {
            task.abort();
        }

        inner.state.loading = true;
        inner.state.generation = generation;
        self.updates.send_replace(inner.state.clone());
        info!(generation, page = filters.page, ordering = %filters.ordering, "loader: refresh");

        inner.customer_task = Some(self.spawn_customer_fetch(generation, filters));
        inner.stats_task = Some(self.spawn_stats_fetch(generation));
        generation
    }

    fn spawn_customer_fetch(&self, generation: u64, filters: FilterState) -> JoinHandle<()> {
        let api = Arc::clone(&self.api);
        let inner = Arc::clone(&self.inner);
        let updates = self.updates.clone();
        let debounce = self.debounce;

        tokio::spawn(async move {
            let loading_guard = LoadingGuard {
                generation,
                inner: Arc::clone(&inner),
                updates: updates.clone(),
                armed: true,
            };

            if !debounce.is_zero() {
                tokio::time::sleep(debounce).await;
            }

            let result = api.fetch_customers(&filters).await;

            let mut guard = inner.lock().await;
            if guard.generation != generation {
                debug!(
                    generation,
                    current = guard.generation,
                    "loader: discarding stale customer page"
                );
                return;
            }

            let state = &mut guard.state;
            match result {
                Ok(page) => {
                    state.has_next = page.has_next();
                    state.has_previous = page.has_previous();
                    state.total_count = page.count;
                    state.customers = page.results;
                    state.clear_error_from(LoadErrorSource::Customers);
                    debug!(
                        generation,
                        count = state.total_count,
                        "loader: customer page applied"
                    );
                }
                Err(err) => {
                    warn!(generation, "loader: failed to load customers: {err}");
                    state.error = Some(LoadError::new(LoadErrorSource::Customers, &err));
                }
            }
            state.loading = false;
            updates.send_replace(state.clone());
            loading_guard.disarm();
        })
    }

    fn spawn_stats_fetch(&self, generation: u64) -> JoinHandle<()> {
        let api = Arc::clone(&self.api);
        let inner = Arc::clone(&self.inner);
        let updates = self.updates.clone();

        tokio::spawn(async move {
            let result = api.fetch_stats().await;

            let mut guard = inner.lock().await;
            if guard.generation != generation {
                debug!(generation, "loader: discarding stale stats");
                return;
            }

            let state = &mut guard.state;
            match result {
                Ok(stats) => {
                    state.stats = Some(stats);
                    state.clear_error_from(LoadErrorSource::Stats);
                }
                Err(err) => {
                    warn!(generation, "loader: failed to load stats: {err}");
                    if state.error.is_none() {
                        state.error = Some(LoadError::new(LoadErrorSource::Stats, &err));
                    }
                }
            }
            updates.send_replace(state.clone());
        })
    }
}

/// Settles `loading` for a customer fetch that ends without applying its
/// result, e.g. when the API implementation panics.
struct LoadingGuard {
    generation: u64,
    inner: Arc<Mutex<LoaderInner>>,
    updates: watch::Sender<LoadState>,
    armed: bool,
}

impl LoadingGuard {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let generation = self.generation;
        if let Ok(mut inner) = self.inner.try_lock() {
            settle_abandoned_fetch(&mut inner, generation, &self.updates);
            return;
        }

        // Lock is busy; finish on the runtime if it is still running.
        let inner = Arc::clone(&self.inner);
        let updates = self.updates.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let mut inner = inner.lock().await;
                settle_abandoned_fetch(&mut inner, generation, &updates);
            });
        }
    }
}

fn settle_abandoned_fetch(
    inner: &mut LoaderInner,
    generation: u64,
    updates: &watch::Sender<LoadState>,
) {
    // Superseded fetches leave `loading` to the newer generation.
    if inner.generation != generation || !inner.state.loading {
        return;
    }
    warn!(generation, "loader: customer fetch ended without a result");
    inner.state.loading = false;
    updates.send_replace(inner.state.clone());
}

impl<A: CustomerApi> Drop for DashboardLoader<A> {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.try_lock() {
            if let Some(task) = inner.customer_task.take() {
                task.abort();
            }
            if let Some(task) = inner.stats_task.take() {
                task.abort();
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/loader_tests.rs"]
mod tests;
