//! Draft/applied filter reconciliation for one list view.
//!
//! The draft is what the operator is editing; the applied set is what was
//! last committed and sent. Deep-link values form the external seed, which
//! is overlaid on either the store's previous filters or the domain
//! defaults when the view mounts.

use crate::dates::{Clock, QuickRange};
use crate::domains::Domain;
use crate::error::ValidationError;
use crate::filters::{
    normalize_text, FilterSet, PageRequest, DEFAULT_LIMIT, DEFAULT_PAGE, LIMIT_KEY, PAGE_KEY,
};
use crate::store::{DomainStore, FetchStatus};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

const AGENT_ID_KEY: &str = "agentId";

/// Field overrides arriving from outside the view, typically the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalSeed(BTreeMap<String, String>);

impl ExternalSeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_string(), value.to_string());
    }

    /// Parses `a=1&b=two` (leading `?` allowed). Undecodable pairs are skipped.
    pub fn from_query(query: &str) -> Self {
        let mut seed = Self::new();
        for pair in query.trim_start_matches('?').split('&') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match (decode_component(key), decode_component(value)) {
                (Some(key), Some(value)) => seed.insert(&key, &value),
                _ => warn!("Skipping undecodable query pair {:?}", pair),
            }
        }
        seed
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn decode_component(raw: &str) -> Option<String> {
    urlencoding::decode(&raw.replace('+', " "))
        .ok()
        .map(|decoded| decoded.into_owned())
}

fn ensure_positive(field: &'static str, value: u32) -> Result<(), ValidationError> {
    if value == 0 {
        Err(ValidationError::NotPositive {
            field,
            value: value.to_string(),
        })
    } else {
        Ok(())
    }
}

fn same_ignoring_page<F: FilterSet>(a: &F, b: &F) -> bool {
    let mut a = a.clone();
    a.page_request_mut().page = b.page_request().page;
    &a == b
}

pub struct FilterReconciler<D: Domain> {
    store: Arc<DomainStore<D>>,
    clock: Arc<dyn Clock>,
    draft: D::Filters,
    applied: D::Filters,
    seed: ExternalSeed,
    agent_scope: Option<String>,
    default_limit: u32,
}

impl<D: Domain> FilterReconciler<D> {
    pub fn new(store: Arc<DomainStore<D>>, clock: Arc<dyn Clock>) -> Self {
        let mut reconciler = Self {
            store,
            clock,
            draft: D::Filters::default(),
            applied: D::Filters::default(),
            seed: ExternalSeed::new(),
            agent_scope: None,
            default_limit: DEFAULT_LIMIT,
        };
        reconciler.draft = reconciler.defaults();
        reconciler.applied = reconciler.draft.clone();
        reconciler
    }

    /// Pins `agentId` for agent-level admins.
    pub fn with_agent_scope(mut self, agent_id: Option<String>) -> Self {
        self.agent_scope = agent_id.and_then(|id| normalize_text(&id));
        self.draft = self.defaults();
        self.applied = self.draft.clone();
        self
    }

    pub fn with_default_limit(mut self, limit: u32) -> Self {
        self.default_limit = if limit == 0 { DEFAULT_LIMIT } else { limit };
        self.draft = self.defaults();
        self.applied = self.draft.clone();
        self
    }

    pub fn store(&self) -> &Arc<DomainStore<D>> {
        &self.store
    }

    pub fn draft(&self) -> &D::Filters {
        &self.draft
    }

    pub fn applied(&self) -> &D::Filters {
        &self.applied
    }

    pub fn seed(&self) -> &ExternalSeed {
        &self.seed
    }

    pub fn agent_scope(&self) -> Option<&str> {
        self.agent_scope.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.draft != self.applied
    }

    /// Preset matching the draft dates, if any.
    pub fn active_quick_range(&self) -> Option<QuickRange> {
        QuickRange::detect(self.draft.date_range(), &self.clock.now())
    }

    fn defaults(&self) -> D::Filters {
        let mut filters = D::default_filters(&self.clock.now());
        filters.page_request_mut().limit = self.default_limit;
        self.pin_scope(&mut filters);
        filters
    }

    fn pin_scope(&self, filters: &mut D::Filters) {
        if let Some(scope) = &self.agent_scope {
            *filters.agent_id_mut() = Some(scope.clone());
        }
    }

    fn check_scope(&self, key: &str, value: &str) -> Result<(), ValidationError> {
        match &self.agent_scope {
            Some(scope) if key == AGENT_ID_KEY && value.trim() != scope.as_str() => {
                Err(ValidationError::Form(format!(
                    "agentId is fixed to {scope} for this account"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Edits one draft field. Changing any non-pagination field sends the
    /// draft back to page 1.
    pub fn set_draft_field(&mut self, key: &str, value: &str) -> Result<(), ValidationError> {
        self.check_scope(key, value)?;
        let offset = *self.clock.now().offset();
        let mut next = self.draft.clone();
        next.assign(key, value, &offset)?;
        if !D::Filters::is_pagination_key(key) && next != self.draft {
            next.page_request_mut().page = DEFAULT_PAGE;
        }
        self.draft = next;
        Ok(())
    }

    /// Overlays the seed on `base`, one field at a time; a field that fails
    /// to parse or breaks the date order is skipped.
    fn overlay_seed(&self, mut base: D::Filters, keep_dates: bool) -> D::Filters {
        let offset = *self.clock.now().offset();
        let mut dates = Vec::new();

        for (key, value) in self.seed.iter() {
            if D::Filters::is_date_key(key) {
                if keep_dates {
                    debug!("Keeping stored {} over seed value {:?}", key, value);
                } else {
                    dates.push((key, value));
                }
                continue;
            }
            if self.agent_scope.is_some() && key == AGENT_ID_KEY {
                if self.check_scope(key, value).is_err() {
                    warn!("Ignoring seed agentId {:?} outside the account scope", value);
                }
                continue;
            }
            let mut candidate = base.clone();
            match candidate.assign(key, value, &offset) {
                Ok(()) => base = candidate,
                Err(err) => warn!("Ignoring seed {}={:?}: {}", key, value, err),
            }
        }

        if !dates.is_empty() {
            let mut candidate = base.clone();
            let applied = dates
                .iter()
                .try_for_each(|(key, value)| candidate.assign(key, value, &offset))
                .and_then(|_| candidate.date_range().validate());
            match applied {
                Ok(()) => base = candidate,
                Err(err) => warn!("Ignoring seed date range: {}", err),
            }
        }

        self.pin_scope(&mut base);
        base
    }

    /// Mount-time entry point: merges the seed with the store's previous
    /// filters (or the defaults) and fetches.
    ///
    /// When the store already holds a complete date range it wins over seed
    /// dates, so navigating back to a view keeps the operator's window.
    pub async fn seed_from_external(
        &mut self,
        seed: ExternalSeed,
    ) -> Result<FetchStatus, ValidationError> {
        self.seed = seed;
        let stored = self
            .store
            .applied_filters()
            .filter(|filters| filters.date_range().is_complete());
        let keep_dates = stored.is_some();
        let base = stored.unwrap_or_else(|| self.defaults());

        let mut merged = self.overlay_seed(base.clone(), keep_dates);
        if !same_ignoring_page(&merged, &base) {
            merged.page_request_mut().page = DEFAULT_PAGE;
        }
        merged.validate()?;

        self.draft = merged.clone();
        self.applied = merged.clone();
        self.dispatch(merged).await
    }

    /// Sends `filters` to the store. When the store moved a page past the
    /// end back to the last page, the draft and applied pages follow.
    async fn dispatch(&mut self, filters: D::Filters) -> Result<FetchStatus, ValidationError> {
        let status = self.store.fetch(filters).await?;
        if status == FetchStatus::Applied {
            if let Some(stored) = self.store.applied_filters() {
                let page = stored.page_request().page;
                if page != self.applied.page_request().page {
                    debug!("{} landed on page {}", D::NAME, page);
                }
                self.applied.page_request_mut().page = page;
                self.draft.page_request_mut().page = page;
            }
        }
        Ok(status)
    }

    /// Sets both draft dates from a preset and commits.
    pub async fn apply_quick_range(
        &mut self,
        range: QuickRange,
    ) -> Result<FetchStatus, ValidationError> {
        *self.draft.date_range_mut() = range.range(&self.clock.now());
        self.commit().await
    }

    /// Validates the draft and, if it passes, makes it the applied set on
    /// page 1 and fetches. A rejected draft leaves everything untouched.
    pub async fn commit(&mut self) -> Result<FetchStatus, ValidationError> {
        self.draft.validate()?;
        let mut next = self.draft.clone();
        next.page_request_mut().page = DEFAULT_PAGE;
        self.draft = next.clone();
        self.applied = next.clone();
        self.dispatch(next).await
    }

    pub async fn reset_to_default(
        &mut self,
        preserve_external: bool,
    ) -> Result<FetchStatus, ValidationError> {
        let defaults = self.defaults();
        self.draft = if preserve_external {
            self.overlay_seed(defaults, false)
        } else {
            defaults
        };
        self.commit().await
    }

    pub async fn change_page(&mut self, page: u32) -> Result<FetchStatus, ValidationError> {
        ensure_positive(PAGE_KEY, page)?;
        let mut next = self.applied.clone();
        next.page_request_mut().page = page;
        next.validate()?;
        self.draft.page_request_mut().page = page;
        self.applied = next.clone();
        self.dispatch(next).await
    }

    /// New page size; always lands on page 1.
    pub async fn change_limit(&mut self, limit: u32) -> Result<FetchStatus, ValidationError> {
        ensure_positive(LIMIT_KEY, limit)?;
        let mut next = self.applied.clone();
        *next.page_request_mut() = PageRequest {
            page: DEFAULT_PAGE,
            limit,
        };
        next.validate()?;
        *self.draft.page_request_mut() = *next.page_request();
        self.applied = next.clone();
        self.dispatch(next).await
    }

    /// Re-issues the applied filters.
    pub async fn retry(&mut self) -> Result<FetchStatus, ValidationError> {
        self.dispatch(self.applied.clone()).await
    }
}
