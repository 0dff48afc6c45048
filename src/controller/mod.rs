//! Listing query controller
//!
//! Client-side state machine behind the listings grid: paginated loading,
//! keyword search over the whole collection and price sorting of what has
//! been fetched.
//!
//! # States
//!
//! ```text
//!            load_initial / clear_search / search("")
//!        ┌──────────────────────────────────────────────┐
//!        ▼                                              │
//!   Paginated ──── search(term) ────▶ Searching ────────┘
//!     │   ▲                               │
//!     └───┘ load_more                     └── search(term) again
//! ```
//!
//! # Concurrency
//!
//! All methods take `&self`, so a controller can be shared behind an `Arc`
//! and driven from several tasks. State lives behind a mutex that is never
//! held across an `.await`. Each mode change (initial load, search, clear)
//! bumps an epoch; a response is applied only if its epoch is still current
//! (and, for load-more, the cursor it resumed from is unchanged). Anything
//! else is discarded. At most one load-more and one search are in flight for
//! the current epoch; further calls are skipped.

use crate::config::MarketplaceConfig;
use crate::core::auth::User;
use crate::core::cursor::Cursor;
use crate::core::error::{MarketError, MarketResult, StoreError};
use crate::core::listing::Listing;
use crate::core::query::{ListingPage, SortOrder, filter_by_term};
use crate::core::service::ensure_owner;
use crate::core::store::ListingStore;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load listings. Please try again.";
pub const SEARCH_FAILED_MESSAGE: &str = "Search failed. Please try again.";
pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete listing. Please try again.";

/// Which result set the controller is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Paginated,
    Searching,
}

/// Why a call did not reach the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Load-more is disabled while showing search results
    Searching,
    /// The last page has already been fetched
    NoMore,
    /// The same kind of request is already running
    InFlight,
}

/// Result of a controller operation that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response was applied to the state
    Applied,
    /// No request was made
    Skipped(SkipReason),
    /// The response arrived after the state moved on and was dropped
    Discarded,
}

/// Point-in-time copy of what a view needs to render
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySnapshot {
    /// Listings in presentation order
    pub view: Vec<Listing>,
    pub mode: Mode,
    pub has_more: bool,
    pub search_term: String,
    pub sort_order: SortOrder,
    pub error: Option<String>,
    pub loading_more: bool,
    pub searching: bool,
}

#[derive(Debug)]
struct State {
    page: Vec<Listing>,
    cursor: Option<Cursor>,
    has_more: bool,
    mode: Mode,
    search_term: String,
    sort_order: SortOrder,
    error: Option<String>,
    epoch: u64,
    // epoch the running request was issued under
    loading_more: Option<u64>,
    searching: Option<u64>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            page: Vec::new(),
            cursor: None,
            has_more: true,
            mode: Mode::Paginated,
            search_term: String::new(),
            sort_order: SortOrder::None,
            error: None,
            epoch: 0,
            loading_more: None,
            searching: None,
        }
    }
}

impl State {
    fn is_loading_more(&self) -> bool {
        self.loading_more == Some(self.epoch)
    }

    fn is_searching(&self) -> bool {
        self.searching == Some(self.epoch)
    }

    fn next_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    fn apply_page(&mut self, page: ListingPage, page_size: usize, append: bool) {
        self.has_more = page.is_full(page_size);
        self.cursor = page.next_cursor;
        if append {
            self.page.extend(page.items);
        } else {
            self.page = page.items;
        }
        self.error = None;
    }
}

/// Drives paginated browsing, search and sorting over a [`ListingStore`]
pub struct ListingQueryController<S> {
    store: Arc<S>,
    page_size: usize,
    search_scan_warn_threshold: usize,
    state: Mutex<State>,
}

impl<S: ListingStore> ListingQueryController<S> {
    /// Create a controller using the page size and search threshold of `config`
    pub fn new(store: Arc<S>, config: &MarketplaceConfig) -> Self {
        Self {
            store,
            page_size: config.page_size(),
            search_scan_warn_threshold: config.search_scan_warn_threshold,
            state: Mutex::new(State::default()),
        }
    }

    /// Create a controller with default settings and the given page size
    pub fn with_page_size(store: Arc<S>, page_size: usize) -> Self {
        let config = MarketplaceConfig {
            page_size,
            ..MarketplaceConfig::default()
        };
        Self::new(store, &config)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Fetch the first page and switch to paginated mode
    pub async fn load_initial(&self) -> MarketResult<LoadOutcome> {
        let epoch = self.state().next_epoch();
        tracing::debug!(epoch, page_size = self.page_size, "loading first page");

        let result = self.store.list_ordered_page(self.page_size, None).await;

        let mut state = self.state();
        if state.epoch != epoch {
            return Self::stale(result.map(|_| ()), "first page");
        }
        match result {
            Ok(page) => {
                tracing::debug!(count = page.items.len(), "first page loaded");
                state.apply_page(page, self.page_size, false);
                state.mode = Mode::Paginated;
                state.search_term.clear();
                Ok(LoadOutcome::Applied)
            }
            Err(e) => Err(Self::fail(&mut state, e, LOAD_FAILED_MESSAGE)),
        }
    }

    /// Fetch the page after the current cursor and append it
    ///
    /// Skipped while searching, after the last page, or while another
    /// load-more is running.
    pub async fn load_more(&self) -> MarketResult<LoadOutcome> {
        let (epoch, cursor) = {
            let mut state = self.state();
            if state.mode == Mode::Searching {
                return Ok(LoadOutcome::Skipped(SkipReason::Searching));
            }
            if !state.has_more {
                return Ok(LoadOutcome::Skipped(SkipReason::NoMore));
            }
            if state.is_loading_more() {
                return Ok(LoadOutcome::Skipped(SkipReason::InFlight));
            }
            state.loading_more = Some(state.epoch);
            (state.epoch, state.cursor.clone())
        };
        tracing::debug!(epoch, "loading next page");

        let result = self
            .store
            .list_ordered_page(self.page_size, cursor.as_ref())
            .await;

        let mut state = self.state();
        if state.loading_more == Some(epoch) {
            state.loading_more = None;
        }
        if state.epoch != epoch || state.cursor != cursor {
            return Self::stale(result.map(|_| ()), "next page");
        }
        match result {
            Ok(page) => {
                tracing::debug!(count = page.items.len(), "next page loaded");
                state.apply_page(page, self.page_size, true);
                Ok(LoadOutcome::Applied)
            }
            Err(e) => Err(Self::fail(&mut state, e, LOAD_FAILED_MESSAGE)),
        }
    }

    /// Search titles and descriptions for `term`, ignoring case.
    ///
    /// An empty (or blank) term clears the search instead. The scan covers the
    /// whole collection client-side and does not scale to large collections.
    /// If the store fails, the previous mode and term are restored together
    /// with the page they describe.
    pub async fn search(&self, term: &str) -> MarketResult<LoadOutcome> {
        let term = term.trim();
        if term.is_empty() {
            return self.clear_search().await;
        }

        let (epoch, previous_mode, previous_term) = {
            let mut state = self.state();
            if state.is_searching() {
                return Ok(LoadOutcome::Skipped(SkipReason::InFlight));
            }
            let epoch = state.next_epoch();
            state.searching = Some(epoch);
            let previous_mode = std::mem::replace(&mut state.mode, Mode::Searching);
            let previous_term = std::mem::replace(&mut state.search_term, term.to_string());
            (epoch, previous_mode, previous_term)
        };
        tracing::debug!(epoch, term, "searching listings");

        let result = self.store.list_all().await;

        let mut state = self.state();
        if state.searching == Some(epoch) {
            state.searching = None;
        }
        if state.epoch != epoch {
            return Self::stale(result.map(|_| ()), "search");
        }
        match result {
            Ok(all) => {
                let scanned = all.len();
                if scanned > self.search_scan_warn_threshold {
                    tracing::warn!(
                        scanned,
                        threshold = self.search_scan_warn_threshold,
                        "search scanned the whole collection client-side"
                    );
                }
                let found = filter_by_term(all, term);
                tracing::debug!(scanned, found = found.len(), "search finished");
                state.page = found;
                state.cursor = None;
                state.has_more = false;
                state.error = None;
                Ok(LoadOutcome::Applied)
            }
            Err(e) => {
                // the page still belongs to the previous mode
                state.mode = previous_mode;
                state.search_term = previous_term;
                Err(Self::fail(&mut state, e, SEARCH_FAILED_MESSAGE))
            }
        }
    }

    /// Leave search mode and reload the first page
    pub async fn clear_search(&self) -> MarketResult<LoadOutcome> {
        self.state().search_term.clear();
        self.load_initial().await
    }

    /// Change presentation order; never fetches
    pub fn set_sort_order(&self, order: SortOrder) {
        self.state().sort_order = order;
    }

    /// Delete a listing shown in the current page, then resynchronize.
    ///
    /// Ownership is checked locally before the store is called. After a
    /// successful delete the first page is reloaded, or the current search is
    /// re-run when searching. A search still in flight at that point is
    /// superseded and its response discarded.
    pub async fn delete_listing(&self, user: Option<&User>, id: &str) -> MarketResult<LoadOutcome> {
        let listing = self
            .state()
            .page
            .iter()
            .find(|listing| listing.id == id)
            .cloned()
            .ok_or_else(|| MarketError::NotFound { id: id.to_string() })?;
        let user = ensure_owner(user, &listing)?;

        if let Err(e) = self.store.delete(id).await {
            return Err(Self::fail(&mut self.state(), e, DELETE_FAILED_MESSAGE));
        }
        tracing::info!(listing_id = %id, owner_id = %user.uid, "listing deleted");

        // a search already running may have read the listing before it was deleted
        self.state().searching = None;
        self.refresh().await
    }

    /// Re-run whatever produced the current page
    pub async fn refresh(&self) -> MarketResult<LoadOutcome> {
        let (mode, term) = {
            let state = self.state();
            (state.mode, state.search_term.clone())
        };
        match mode {
            Mode::Searching => self.search(&term).await,
            Mode::Paginated => self.load_initial().await,
        }
    }

    fn fail(state: &mut State, error: StoreError, message: &str) -> MarketError {
        tracing::warn!(error = %error, "listing store call failed");
        state.error = Some(message.to_string());
        MarketError::Store(error)
    }

    fn stale(result: Result<(), StoreError>, what: &str) -> MarketResult<LoadOutcome> {
        tracing::debug!(what, "discarding out-of-date response");
        result.map(|_| LoadOutcome::Discarded).map_err(MarketError::from)
    }

    // =========================================================================
    // Read access
    // =========================================================================

    /// Listings in presentation order: a sorted copy of the canonical page
    pub fn view(&self) -> Vec<Listing> {
        let state = self.state();
        state.sort_order.apply(&state.page)
    }

    /// Listings in fetch order
    pub fn page(&self) -> Vec<Listing> {
        self.state().page.clone()
    }

    pub fn mode(&self) -> Mode {
        self.state().mode
    }

    pub fn has_more(&self) -> bool {
        self.state().has_more
    }

    pub fn search_term(&self) -> String {
        self.state().search_term.clone()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.state().sort_order
    }

    /// Last user-facing failure message, cleared by the next success
    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn is_loading_more(&self) -> bool {
        self.state().is_loading_more()
    }

    pub fn is_searching(&self) -> bool {
        self.state().is_searching()
    }

    /// Whether a "load more" button should be enabled
    pub fn can_load_more(&self) -> bool {
        let state = self.state();
        state.mode == Mode::Paginated
            && state.has_more
            && !state.is_loading_more()
            && !state.page.is_empty()
    }

    /// Whether the paginated feed has been read to the end
    pub fn is_at_end(&self) -> bool {
        let state = self.state();
        state.mode == Mode::Paginated && !state.has_more && !state.page.is_empty()
    }

    /// Result counter text, e.g. `Showing 9 listings`
    pub fn summary(&self) -> String {
        let state = self.state();
        let count = state.page.len();
        let noun = if count == 1 { "listing" } else { "listings" };
        match state.mode {
            Mode::Searching => format!("Found {} {} for \"{}\"", count, noun, state.search_term),
            Mode::Paginated => format!("Showing {} {}", count, noun),
        }
    }

    pub fn snapshot(&self) -> QuerySnapshot {
        let state = self.state();
        QuerySnapshot {
            view: state.sort_order.apply(&state.page),
            mode: state.mode,
            has_more: state.has_more,
            search_term: state.search_term.clone(),
            sort_order: state.sort_order,
            error: state.error.clone(),
            loading_more: state.is_loading_more(),
            searching: state.is_searching(),
        }
    }
}
