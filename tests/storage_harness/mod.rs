//! Shared test harness for listing store and controller testing
//!
//! Provides listing fixtures, a deterministic clock and `RecordingStore`, a
//! `ListingStore` wrapper that counts calls and can hold reads until the test
//! releases them.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod controller_tests;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use marketplace::core::clock::{Clock, ManualClock};
use marketplace::core::cursor::Cursor;
use marketplace::core::error::StoreResult;
use marketplace::core::listing::{Listing, ListingPatch, NewListing};
use marketplace::core::query::ListingPage;
use marketplace::core::store::ListingStore;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Start of the deterministic test clock
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Clock advancing one second per insert, so insertion order is feed order
/// reversed
pub fn test_clock() -> Arc<dyn Clock> {
    Arc::new(ManualClock::new(epoch()))
}

pub fn new_listing(title: &str, price: f64, owner: &str) -> NewListing {
    NewListing {
        title: title.to_string(),
        description: format!("{} for sale", title),
        price,
        owner_id: owner.to_string(),
    }
}

/// Insert `count` listings titled `item-0`, `item-1`, ... owned by `owner`
pub async fn seed<S: ListingStore>(store: &S, count: usize, owner: &str) -> Vec<String> {
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let id = store
            .insert(new_listing(&format!("item-{}", i), (i + 1) as f64, owner))
            .await
            .unwrap();
        ids.push(id);
    }
    ids
}

pub fn titles(listings: &[Listing]) -> Vec<String> {
    listings.iter().map(|l| l.title.clone()).collect()
}

pub fn ids(listings: &[Listing]) -> Vec<String> {
    listings.iter().map(|l| l.id.clone()).collect()
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Holds calls until the test releases them, first come first served
pub struct Gate {
    closed: AtomicBool,
    waiting: AtomicUsize,
    permits: Semaphore,
}

impl Default for Gate {
    fn default() -> Self {
        Self {
            closed: AtomicBool::new(false),
            waiting: AtomicUsize::new(0),
            permits: Semaphore::new(0),
        }
    }
}

impl Gate {
    /// Make subsequent calls wait for `release`
    pub fn hold(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Let `n` waiting (or future) calls through
    pub fn release(&self, n: usize) {
        self.permits.add_permits(n);
    }

    /// Number of calls currently parked at the gate
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    /// Yield until `n` calls are parked at the gate
    pub async fn wait_for(&self, n: usize) {
        while self.waiting() < n {
            tokio::task::yield_now().await;
        }
    }

    async fn pass(&self) {
        if !self.closed.load(Ordering::SeqCst) {
            return;
        }
        self.waiting.fetch_add(1, Ordering::SeqCst);
        self.permits.acquire().await.unwrap().forget();
        self.waiting.fetch_sub(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// RecordingStore
// ---------------------------------------------------------------------------

/// `ListingStore` wrapper that counts calls per operation.
///
/// Page reads and full scans each pass through their own [`Gate`] so a test
/// can interleave responses deterministically.
pub struct RecordingStore<S> {
    inner: S,
    calls: Mutex<HashMap<&'static str, usize>>,
    pub page_gate: Gate,
    pub scan_gate: Gate,
}

impl<S: ListingStore> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Mutex::new(HashMap::new()),
            page_gate: Gate::default(),
            scan_gate: Gate::default(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Calls made to `op` so far
    pub fn calls(&self, op: &str) -> usize {
        self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    /// Calls made to any operation so far
    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, op: &'static str) {
        *self.calls.lock().unwrap().entry(op).or_insert(0) += 1;
    }
}

#[async_trait]
impl<S: ListingStore> ListingStore for RecordingStore<S> {
    async fn insert(&self, listing: NewListing) -> StoreResult<String> {
        self.record("insert");
        self.inner.insert(listing).await
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Listing>> {
        self.record("get_by_id");
        self.inner.get_by_id(id).await
    }

    async fn list_ordered_page(
        &self,
        page_size: usize,
        cursor: Option<&Cursor>,
    ) -> StoreResult<ListingPage> {
        self.record("list_ordered_page");
        // read after the gate opens so the response reflects the latest writes
        self.page_gate.pass().await;
        self.inner.list_ordered_page(page_size, cursor).await
    }

    async fn list_all(&self) -> StoreResult<Vec<Listing>> {
        self.record("list_all");
        self.scan_gate.pass().await;
        self.inner.list_all().await
    }

    async fn list_by_owner(&self, owner_id: &str) -> StoreResult<Vec<Listing>> {
        self.record("list_by_owner");
        self.inner.list_by_owner(owner_id).await
    }

    async fn update(&self, id: &str, patch: ListingPatch) -> StoreResult<()> {
        self.record("update");
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.record("delete");
        self.inner.delete(id).await
    }
}
