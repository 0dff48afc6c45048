//! Core module containing the listing model, the store contract and the
//! collaborator traits the rest of the crate builds on

pub mod auth;
pub mod clock;
pub mod cursor;
pub mod error;
pub mod listing;
pub mod query;
pub mod service;
pub mod store;
pub mod validation;

pub use auth::{AuthProvider, InMemoryAuthProvider, User};
pub use clock::{Clock, ManualClock, SystemClock};
pub use cursor::Cursor;
pub use error::{AuthError, MarketError, MarketResult, StoreError, StoreResult, ValidationError};
pub use listing::{Listing, ListingDraft, ListingPatch, NewListing, ValidListing};
pub use query::{ListingPage, SortOrder};
pub use service::ListingService;
pub use store::ListingStore;
