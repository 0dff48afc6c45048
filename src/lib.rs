//! # Marketplace
//!
//! Client-side core of a small listings marketplace: users create, browse,
//! search, edit and delete listings (title, description, price) kept in a
//! managed document store, and only a listing's owner may change it.
//!
//! ## Features
//!
//! - **Store adapter**: [`ListingStore`](core::store::ListingStore) trait with
//!   in-memory and MongoDB (`mongodb_backend` feature) implementations
//! - **Cursor pagination**: newest-first pages resumed from an opaque cursor
//! - **Query controller**: paginated feed, keyword search and price sorting
//!   with protection against duplicate and out-of-date fetches
//! - **Owner checks**: validation and ownership are enforced before any write
//!   reaches the store
//! - **Auth collaborator**: [`AuthProvider`](core::auth::AuthProvider) with an
//!   observable login state
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use marketplace::prelude::*;
//!
//! let store = Arc::new(InMemoryListingStore::new());
//! let config = MarketplaceConfig::default();
//!
//! let service = ListingService::with_limits(store.clone(), config.limits);
//! let alice = User::new("alice");
//! service
//!     .create(Some(&alice), &ListingDraft::new("Lamp", "Brass desk lamp", "25"))
//!     .await?;
//!
//! let controller = ListingQueryController::new(store, &config);
//! controller.load_initial().await?;
//! controller.set_sort_order(SortOrder::PriceAscending);
//! for listing in controller.view() {
//!     println!("{} - {}", listing.title, listing.price);
//! }
//! ```

pub mod config;
pub mod controller;
pub mod core;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        auth::{AuthProvider, InMemoryAuthProvider, User},
        clock::{Clock, ManualClock, SystemClock},
        cursor::Cursor,
        error::{AuthError, MarketError, MarketResult, StoreError, StoreResult, ValidationError},
        listing::{Listing, ListingDraft, ListingPatch, NewListing},
        query::{ListingPage, SortOrder},
        service::{ListingService, can_modify},
        store::ListingStore,
    };

    // === Controller ===
    pub use crate::controller::{
        ListingQueryController, LoadOutcome, Mode, QuerySnapshot, SkipReason,
    };

    // === Storage ===
    pub use crate::storage::InMemoryListingStore;
    #[cfg(feature = "mongodb_backend")]
    pub use crate::storage::MongoListingStore;

    // === Config ===
    pub use crate::config::{ListingLimits, MarketplaceConfig};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use std::sync::Arc;
}
