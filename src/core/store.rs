//! Document store adapter contract

use crate::core::cursor::Cursor;
use crate::core::error::StoreResult;
use crate::core::listing::{Listing, ListingPatch, NewListing};
use crate::core::query::ListingPage;
use async_trait::async_trait;

/// Typed access to the listings collection
///
/// Every call is remote I/O against the current persisted state; nothing is
/// cached. All ordered operations return listings newest first (ties broken by
/// id descending).
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Insert a listing; the store assigns `id` and `created_at`
    async fn insert(&self, listing: NewListing) -> StoreResult<String>;

    /// Point lookup. `Ok(None)` means the listing does not exist.
    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Listing>>;

    /// Fetch at most `page_size` listings starting strictly after `cursor`
    async fn list_ordered_page(
        &self,
        page_size: usize,
        cursor: Option<&Cursor>,
    ) -> StoreResult<ListingPage>;

    /// Full scan of the collection
    async fn list_all(&self) -> StoreResult<Vec<Listing>>;

    /// All listings of one owner
    async fn list_by_owner(&self, owner_id: &str) -> StoreResult<Vec<Listing>>;

    /// Merge the supplied fields into an existing listing
    ///
    /// Returns `StoreError::NotFound` if the listing does not exist.
    async fn update(&self, id: &str, patch: ListingPatch) -> StoreResult<()>;

    /// Delete a listing. Deleting a missing listing succeeds.
    async fn delete(&self, id: &str) -> StoreResult<()>;
}

#[async_trait]
impl<S: ListingStore + ?Sized> ListingStore for std::sync::Arc<S> {
    async fn insert(&self, listing: NewListing) -> StoreResult<String> {
        (**self).insert(listing).await
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Listing>> {
        (**self).get_by_id(id).await
    }

    async fn list_ordered_page(
        &self,
        page_size: usize,
        cursor: Option<&Cursor>,
    ) -> StoreResult<ListingPage> {
        (**self).list_ordered_page(page_size, cursor).await
    }

    async fn list_all(&self) -> StoreResult<Vec<Listing>> {
        (**self).list_all().await
    }

    async fn list_by_owner(&self, owner_id: &str) -> StoreResult<Vec<Listing>> {
        (**self).list_by_owner(owner_id).await
    }

    async fn update(&self, id: &str, patch: ListingPatch) -> StoreResult<()> {
        (**self).update(id, patch).await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        (**self).delete(id).await
    }
}
