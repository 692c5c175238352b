//! Per-domain state holders.
//!
//! A store owns the rows, pagination, totals and applied filters of one list
//! view and publishes every change on a `watch` channel. Requests are
//! sequenced: only the most recently issued fetch may write its result.

use crate::domains::{Domain, DomainSource};
use crate::dto::Pagination;
use crate::error::{ConsoleError, Result, ValidationError};
use crate::fetcher::fetch_page;
use crate::filters::FilterSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePhase {
    Idle,
    Loading,
    Ready,
    Error,
}

/// What happened to a fetch once it resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// The result was written to the store.
    Applied,
    /// A newer fetch was issued meanwhile; the result was dropped.
    Superseded,
    /// The request failed; the error is in the store state.
    Failed,
}

/// Issues monotonically increasing request tokens.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, token: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == token
    }
}

#[derive(Debug, Clone)]
pub struct StoreState<D: Domain> {
    pub rows: Vec<D::Row>,
    pub pagination: Pagination,
    pub totals: Option<D::Totals>,
    /// Filters of the last successful fetch.
    pub applied_filters: Option<D::Filters>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub phase: StorePhase,
}

impl<D: Domain> Default for StoreState<D> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            pagination: Pagination::default(),
            totals: None,
            applied_filters: None,
            is_loading: false,
            error: None,
            phase: StorePhase::Idle,
        }
    }
}

pub struct DomainStore<D: Domain> {
    source: Arc<dyn DomainSource<D>>,
    state: watch::Sender<StoreState<D>>,
    sequencer: RequestSequencer,
    last_requested: Mutex<Option<D::Filters>>,
}

impl<D: Domain> DomainStore<D> {
    pub fn new(source: Arc<dyn DomainSource<D>>) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self {
            source,
            state,
            sequencer: RequestSequencer::default(),
            last_requested: Mutex::new(None),
        }
    }

    pub fn snapshot(&self) -> StoreState<D> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreState<D>> {
        self.state.subscribe()
    }

    pub fn applied_filters(&self) -> Option<D::Filters> {
        self.state.borrow().applied_filters.clone()
    }

    /// Filters of the most recently issued fetch, successful or not.
    pub fn last_requested(&self) -> Option<D::Filters> {
        self.last_requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fetches rows and totals for `filters`.
    ///
    /// Invalid filters are rejected before anything changes. On a request
    /// error the previous rows, pagination and totals are kept.
    pub async fn fetch(&self, filters: D::Filters) -> Result<FetchStatus, ValidationError> {
        filters.validate()?;

        let token = self.sequencer.issue();
        *self
            .last_requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(filters.clone());
        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
            state.phase = StorePhase::Loading;
        });

        let outcome = fetch_page::<D>(self.source.as_ref(), &filters).await;

        if !self.sequencer.is_current(token) {
            debug!("Dropping stale {} response (request {})", D::NAME, token);
            return Ok(FetchStatus::Superseded);
        }

        match outcome {
            Ok(outcome) => {
                self.state.send_modify(|state| {
                    state.rows = outcome.rows;
                    state.pagination = outcome.pagination;
                    if let Some(totals) = outcome.totals {
                        state.totals = Some(totals);
                    }
                    state.applied_filters = Some(outcome.filters);
                    state.is_loading = false;
                    state.error = None;
                    state.phase = StorePhase::Ready;
                });
                Ok(FetchStatus::Applied)
            }
            Err(err) => {
                warn!("Fetching {} failed: {}", D::NAME, err);
                self.state.send_modify(|state| {
                    state.is_loading = false;
                    state.error = Some(err.to_string());
                    state.phase = StorePhase::Error;
                });
                Ok(FetchStatus::Failed)
            }
        }
    }

    /// Re-issues the last requested filters. `None` if nothing was requested yet.
    pub async fn retry(&self) -> Option<FetchStatus> {
        let filters = self.last_requested()?;
        self.fetch(filters).await.ok()
    }

    pub fn dismiss_error(&self) {
        self.state.send_modify(|state| {
            state.error = None;
            if state.phase == StorePhase::Error {
                state.phase = if state.applied_filters.is_some() {
                    StorePhase::Ready
                } else {
                    StorePhase::Idle
                };
            }
        });
    }

    /// Runs a create/update/delete round trip. Success refreshes the list
    /// with the applied filters; failure is recorded and the rows are kept.
    pub async fn mutate<T, F>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match operation.await {
            Ok(value) => {
                if let Some(filters) = self.applied_filters().or_else(|| self.last_requested()) {
                    let _ = self.fetch(filters).await;
                }
                Ok(value)
            }
            Err(err) => {
                self.record_error(&err);
                Err(err)
            }
        }
    }

    fn record_error(&self, err: &ConsoleError) {
        warn!("{} operation failed: {}", D::NAME, err);
        self.state.send_modify(|state| {
            state.error = Some(err.to_string());
            state.phase = StorePhase::Error;
        });
    }
}

#[derive(Debug, Clone)]
pub struct ResourceState<T> {
    pub value: Option<T>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub phase: StorePhase,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            value: None,
            is_loading: false,
            error: None,
            phase: StorePhase::Idle,
        }
    }
}

/// Store for a single resource (dashboard, config list, selected entity).
pub struct ResourceStore<T> {
    name: &'static str,
    state: watch::Sender<ResourceState<T>>,
    sequencer: RequestSequencer,
}

impl<T: Clone + Send + Sync + 'static> ResourceStore<T> {
    pub fn new(name: &'static str) -> Self {
        let (state, _) = watch::channel(ResourceState::default());
        Self {
            name,
            state,
            sequencer: RequestSequencer::default(),
        }
    }

    pub fn snapshot(&self) -> ResourceState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceState<T>> {
        self.state.subscribe()
    }

    pub fn value(&self) -> Option<T> {
        self.state.borrow().value.clone()
    }

    pub async fn load<F>(&self, request: F) -> FetchStatus
    where
        F: Future<Output = Result<T>>,
    {
        let token = self.sequencer.issue();
        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
            state.phase = StorePhase::Loading;
        });

        let outcome = request.await;

        if !self.sequencer.is_current(token) {
            debug!("Dropping stale {} response (request {})", self.name, token);
            return FetchStatus::Superseded;
        }

        match outcome {
            Ok(value) => {
                self.state.send_modify(|state| {
                    state.value = Some(value);
                    state.is_loading = false;
                    state.phase = StorePhase::Ready;
                });
                FetchStatus::Applied
            }
            Err(err) => {
                warn!("Loading {} failed: {}", self.name, err);
                self.state.send_modify(|state| {
                    state.is_loading = false;
                    state.error = Some(err.to_string());
                    state.phase = StorePhase::Error;
                });
                FetchStatus::Failed
            }
        }
    }

    /// Runs `operation`; on success reloads through `reload`.
    pub async fn mutate<R, F, L>(&self, operation: F, reload: L) -> Result<R>
    where
        F: Future<Output = Result<R>>,
        L: Future<Output = Result<T>>,
    {
        match operation.await {
            Ok(value) => {
                self.load(reload).await;
                Ok(value)
            }
            Err(err) => {
                warn!("{} operation failed: {}", self.name, err);
                self.state.send_modify(|state| {
                    state.error = Some(err.to_string());
                    state.phase = StorePhase::Error;
                });
                Err(err)
            }
        }
    }

    /// Forgets the value and invalidates any request in flight.
    pub fn clear(&self) {
        self.sequencer.issue();
        self.state.send_replace(ResourceState::default());
    }

    pub fn dismiss_error(&self) {
        self.state.send_modify(|state| {
            state.error = None;
            if state.phase == StorePhase::Error {
                state.phase = if state.value.is_some() {
                    StorePhase::Ready
                } else {
                    StorePhase::Idle
                };
            }
        });
    }
}
