//! Owner-checked, validated listing mutations
//!
//! `ListingService` is what the create form, the edit form and the delete
//! button talk to. Every check that can be made locally (signed in, owner,
//! valid input) happens before the store is called.

use crate::config::ListingLimits;
use crate::core::auth::User;
use crate::core::error::{MarketError, MarketResult};
use crate::core::listing::{Listing, ListingDraft, ListingPatch};
use crate::core::store::ListingStore;
use std::sync::Arc;

/// The single authorization rule: the owner may modify, nobody else may
pub fn can_modify(user: Option<&User>, listing: &Listing) -> bool {
    user.is_some_and(|user| listing.is_owned_by(user))
}

/// Fail with `Unauthenticated` / `UnauthorizedEdit` unless `user` owns `listing`
pub fn ensure_owner<'u>(user: Option<&'u User>, listing: &Listing) -> MarketResult<&'u User> {
    let user = user.ok_or(MarketError::Unauthenticated)?;
    if listing.is_owned_by(user) {
        Ok(user)
    } else {
        Err(MarketError::UnauthorizedEdit {
            listing_id: listing.id.clone(),
            user_id: user.uid.clone(),
        })
    }
}

/// Create, edit and delete listings on behalf of a user
pub struct ListingService<S> {
    store: Arc<S>,
    limits: ListingLimits,
}

impl<S> Clone for ListingService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            limits: self.limits,
        }
    }
}

impl<S: ListingStore> ListingService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_limits(store, ListingLimits::default())
    }

    pub fn with_limits(store: Arc<S>, limits: ListingLimits) -> Self {
        Self { store, limits }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn limits(&self) -> &ListingLimits {
        &self.limits
    }

    /// Validate `draft` and insert it as a listing owned by `user`.
    ///
    /// Returns the new listing's id.
    pub async fn create(&self, user: Option<&User>, draft: &ListingDraft) -> MarketResult<String> {
        let valid = draft.validate(&self.limits)?;
        let user = user.ok_or(MarketError::Unauthenticated)?;

        let id = self
            .store
            .insert(valid.into_new_listing(user.uid.clone()))
            .await?;

        tracing::info!(listing_id = %id, owner_id = %user.uid, "listing created");
        Ok(id)
    }

    /// Fetch a listing for editing, checking that `user` owns it
    pub async fn load_for_edit(&self, user: Option<&User>, id: &str) -> MarketResult<Listing> {
        let user = user.ok_or(MarketError::Unauthenticated)?;
        let listing = self
            .store
            .get_by_id(id)
            .await?
            .ok_or_else(|| MarketError::NotFound { id: id.to_string() })?;

        ensure_owner(Some(user), &listing)?;
        Ok(listing)
    }

    /// Replace title, description and price from a form draft
    pub async fn update(
        &self,
        user: Option<&User>,
        listing: &Listing,
        draft: &ListingDraft,
    ) -> MarketResult<()> {
        let user = ensure_owner(user, listing)?;
        let patch = draft.validate(&self.limits)?.into_patch();

        self.store.update(&listing.id, patch).await?;

        tracing::info!(listing_id = %listing.id, owner_id = %user.uid, "listing updated");
        Ok(())
    }

    /// Merge only the fields present in `patch`
    pub async fn update_fields(
        &self,
        user: Option<&User>,
        listing: &Listing,
        patch: &ListingPatch,
    ) -> MarketResult<()> {
        let user = ensure_owner(user, listing)?;
        let patch = patch.validated(&self.limits)?;

        self.store.update(&listing.id, patch).await?;

        tracing::info!(listing_id = %listing.id, owner_id = %user.uid, "listing fields updated");
        Ok(())
    }

    /// Delete a listing owned by `user`
    pub async fn delete(&self, user: Option<&User>, listing: &Listing) -> MarketResult<()> {
        let user = ensure_owner(user, listing)?;

        self.store.delete(&listing.id).await?;

        tracing::info!(listing_id = %listing.id, owner_id = %user.uid, "listing deleted");
        Ok(())
    }

    /// The signed-in user's own listings, newest first
    pub async fn listings_by_owner(&self, user: Option<&User>) -> MarketResult<Vec<Listing>> {
        let user = user.ok_or(MarketError::Unauthenticated)?;
        Ok(self.store.list_by_owner(&user.uid).await?)
    }
}
