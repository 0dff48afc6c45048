//! In-memory implementation of ListingStore for testing and development

use crate::core::clock::{Clock, SystemClock};
use crate::core::cursor::{Cursor, feed_order};
use crate::core::error::{StoreError, StoreResult};
use crate::core::listing::{Listing, ListingPatch, NewListing};
use crate::core::query::ListingPage;
use crate::core::store::ListingStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// In-memory listing store
///
/// Useful for testing and development. Uses RwLock for thread-safe access;
/// clones share the same collection.
#[derive(Clone)]
pub struct InMemoryListingStore {
    listings: Arc<RwLock<HashMap<String, Listing>>>,
    clock: Arc<dyn Clock>,
    available: Arc<AtomicBool>,
}

impl InMemoryListingStore {
    /// Create an empty store stamping listings with the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store stamping listings with `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            listings: Arc::new(RwLock::new(HashMap::new())),
            clock,
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulate losing (or regaining) the connection to the store.
    ///
    /// While unavailable every operation fails with `StoreError::Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of stored listings
    pub fn len(&self) -> usize {
        self.listings.read().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::unavailable("in-memory store is offline"))
        }
    }

    fn sorted(&self, keep: impl Fn(&Listing) -> bool) -> StoreResult<Vec<Listing>> {
        self.check_available()?;
        let listings = self
            .listings
            .read()
            .map_err(|e| StoreError::backend(format!("Failed to acquire read lock: {}", e)))?;

        let mut items: Vec<Listing> = listings.values().filter(|l| keep(l)).cloned().collect();
        items.sort_by(feed_order);
        Ok(items)
    }
}

impl Default for InMemoryListingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ListingStore for InMemoryListingStore {
    async fn insert(&self, listing: NewListing) -> StoreResult<String> {
        self.check_available()?;
        let mut listings = self
            .listings
            .write()
            .map_err(|e| StoreError::backend(format!("Failed to acquire write lock: {}", e)))?;

        let id = Uuid::new_v4().to_string();
        listings.insert(
            id.clone(),
            Listing {
                id: id.clone(),
                title: listing.title,
                description: listing.description,
                price: listing.price,
                owner_id: listing.owner_id,
                created_at: self.clock.now(),
            },
        );

        Ok(id)
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Listing>> {
        self.check_available()?;
        let listings = self
            .listings
            .read()
            .map_err(|e| StoreError::backend(format!("Failed to acquire read lock: {}", e)))?;

        Ok(listings.get(id).cloned())
    }

    async fn list_ordered_page(
        &self,
        page_size: usize,
        cursor: Option<&Cursor>,
    ) -> StoreResult<ListingPage> {
        let items = self
            .sorted(|listing| cursor.is_none_or(|c| c.precedes(listing)))?
            .into_iter()
            .take(page_size)
            .collect();

        Ok(ListingPage::from_items(items))
    }

    async fn list_all(&self) -> StoreResult<Vec<Listing>> {
        self.sorted(|_| true)
    }

    async fn list_by_owner(&self, owner_id: &str) -> StoreResult<Vec<Listing>> {
        self.sorted(|listing| listing.owner_id == owner_id)
    }

    async fn update(&self, id: &str, patch: ListingPatch) -> StoreResult<()> {
        self.check_available()?;
        let mut listings = self
            .listings
            .write()
            .map_err(|e| StoreError::backend(format!("Failed to acquire write lock: {}", e)))?;

        let listing = listings.get_mut(id).ok_or_else(|| StoreError::NotFound {
            id: id.to_string(),
        })?;
        listing.apply(&patch);

        Ok(())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.check_available()?;
        let mut listings = self
            .listings
            .write()
            .map_err(|e| StoreError::backend(format!("Failed to acquire write lock: {}", e)))?;

        listings.remove(id);

        Ok(())
    }
}
