//! MongoDB storage backend using the official MongoDB async driver.
//!
//! Provides `MongoListingStore`, a [`ListingStore`] backed by a single
//! collection in a `mongodb::Database`.
//!
//! # Feature flag
//!
//! This module is gated behind the `mongodb_backend` feature flag:
//! ```toml
//! [dependencies]
//! marketplace = { version = "0.1", features = ["mongodb_backend"] }
//! ```
//!
//! # Storage model
//!
//! One document per listing:
//!
//! | field         | BSON type | notes                          |
//! |---------------|-----------|--------------------------------|
//! | `_id`         | string    | UUID v4 assigned on insert     |
//! | `title`       | string    |                                |
//! | `description` | string    |                                |
//! | `price`       | double    |                                |
//! | `owner_id`    | string    |                                |
//! | `created_at`  | datetime  | millisecond precision          |
//!
//! Documents written by other clients may carry an ObjectId `_id`; it is read
//! back as its hex string and lookups by that string match it. Ties on
//! `created_at` between string and ObjectId ids are not resumable by cursor,
//! since the two BSON types never compare.
//!
//! Feed order is the compound sort `{created_at: -1, _id: -1}`. A page resumes
//! after a [`Cursor`] with a range filter on the same two keys, so pages stay
//! stable while new listings are inserted at the head.

use crate::config::MarketplaceConfig;
use crate::core::clock::{Clock, SystemClock};
use crate::core::cursor::Cursor;
use crate::core::error::{StoreError, StoreResult};
use crate::core::listing::{Listing, ListingPatch, NewListing};
use crate::core::query::ListingPage;
use crate::core::store::ListingStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::Database;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, Bson, Document, doc};
use mongodb::error::ErrorKind;
use std::sync::Arc;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Mongo's "Unauthorized" server error code
const UNAUTHORIZED_CODE: i32 = 13;

fn map_mongo_error(context: &str, err: mongodb::error::Error) -> StoreError {
    let message = format!("{}: {}", context, err);
    match err.kind.as_ref() {
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) => StoreError::Unavailable { message },
        ErrorKind::Authentication { .. } => StoreError::PermissionDenied { message },
        ErrorKind::Command(command) if command.code == UNAUTHORIZED_CODE => {
            StoreError::PermissionDenied { message }
        }
        _ => StoreError::Backend { message },
    }
}

fn serialization(message: impl Into<String>) -> StoreError {
    StoreError::Serialization {
        message: message.into(),
    }
}

fn to_bson_datetime(at: &DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(at.timestamp_millis())
}

/// Truncate to what the collection can represent
fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}

fn listing_to_document(listing: &Listing) -> Document {
    doc! {
        "_id": listing.id.as_str(),
        "title": listing.title.as_str(),
        "description": listing.description.as_str(),
        "price": listing.price,
        "owner_id": listing.owner_id.as_str(),
        "created_at": to_bson_datetime(&listing.created_at),
    }
}

fn document_to_listing(doc: &Document) -> StoreResult<Listing> {
    let text = |key: &str| {
        doc.get_str(key)
            .map(str::to_string)
            .map_err(|e| serialization(format!("field '{}': {}", key, e)))
    };

    let price = match doc.get("price") {
        Some(Bson::Double(v)) => *v,
        Some(Bson::Int32(v)) => f64::from(*v),
        // i64 prices far beyond any realistic listing lose precision here
        Some(Bson::Int64(v)) => *v as f64,
        other => return Err(serialization(format!("field 'price': unexpected {:?}", other))),
    };

    let millis = doc
        .get_datetime("created_at")
        .map_err(|e| serialization(format!("field 'created_at': {}", e)))?
        .timestamp_millis();
    let created_at = DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| serialization(format!("field 'created_at': {} out of range", millis)))?;

    let id = match doc.get("_id") {
        Some(Bson::String(id)) => id.clone(),
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        other => return Err(serialization(format!("field '_id': unexpected {:?}", other))),
    };

    Ok(Listing {
        id,
        title: text("title")?,
        description: text("description")?,
        price,
        owner_id: text("owner_id")?,
        created_at,
    })
}

/// Match a listing by id, whether it was stored as a string or as the
/// ObjectId another client's driver generated
fn id_filter(id: &str) -> Document {
    match ObjectId::parse_str(id) {
        Ok(oid) => doc! { "_id": { "$in": [id, oid] } },
        Err(_) => doc! { "_id": id },
    }
}

/// Filter matching listings strictly after `cursor` in feed order
fn after_cursor_filter(cursor: &Cursor) -> Document {
    let created_at = to_bson_datetime(&cursor.created_at);
    doc! {
        "$or": [
            { "created_at": { "$lt": created_at } },
            { "created_at": created_at, "_id": { "$lt": cursor.id.as_str() } },
        ]
    }
}

fn feed_sort() -> Document {
    doc! { "created_at": -1, "_id": -1 }
}

fn patch_to_set(patch: &ListingPatch) -> Document {
    let mut set = Document::new();
    if let Some(title) = &patch.title {
        set.insert("title", title.as_str());
    }
    if let Some(description) = &patch.description {
        set.insert("description", description.as_str());
    }
    if let Some(price) = patch.price {
        set.insert("price", price);
    }
    set
}

// ---------------------------------------------------------------------------
// MongoListingStore
// ---------------------------------------------------------------------------

/// Listing store backed by a MongoDB collection.
///
/// # Example
///
/// ```rust,ignore
/// use mongodb::Client;
/// use marketplace::storage::MongoListingStore;
///
/// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
/// let store = MongoListingStore::new(client.database("market"), "listings");
/// store.ensure_indexes().await?;
/// ```
#[derive(Clone)]
pub struct MongoListingStore {
    database: Database,
    collection: String,
    clock: Arc<dyn Clock>,
}

impl MongoListingStore {
    /// Create a store over `collection` in `database`
    pub fn new(database: Database, collection: impl Into<String>) -> Self {
        Self {
            database,
            collection: collection.into(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Create a store using the collection named in `config`
    pub fn from_config(database: Database, config: &MarketplaceConfig) -> Self {
        Self::new(database, config.collection.clone())
    }

    /// Replace the clock used to stamp `created_at`
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    fn collection(&self) -> mongodb::Collection<Document> {
        self.database.collection(&self.collection)
    }

    /// Create the indexes backing feed order and owner lookups.
    ///
    /// Idempotent, safe to call on every startup.
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        use mongodb::IndexModel;

        let indexes = vec![
            IndexModel::builder().keys(feed_sort()).build(),
            IndexModel::builder().keys(doc! { "owner_id": 1 }).build(),
        ];

        self.collection()
            .create_indexes(indexes)
            .await
            .map_err(|e| map_mongo_error("Failed to create indexes", e))?;

        Ok(())
    }

    async fn find_sorted(&self, filter: Document, limit: Option<i64>) -> StoreResult<Vec<Listing>> {
        let collection = self.collection();
        let mut find = collection.find(filter).sort(feed_sort());
        if let Some(limit) = limit {
            find = find.limit(limit);
        }

        let cursor = find
            .await
            .map_err(|e| map_mongo_error("Failed to query listings", e))?;
        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| map_mongo_error("Failed to collect listings", e))?;

        docs.iter().map(document_to_listing).collect()
    }
}

#[async_trait]
impl ListingStore for MongoListingStore {
    async fn insert(&self, new: NewListing) -> StoreResult<String> {
        let listing = Listing {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            description: new.description,
            price: new.price,
            owner_id: new.owner_id,
            created_at: truncate_to_millis(self.clock.now()),
        };

        self.collection()
            .insert_one(listing_to_document(&listing))
            .await
            .map_err(|e| map_mongo_error("Failed to create listing", e))?;

        tracing::debug!(id = %listing.id, collection = %self.collection, "listing inserted");
        Ok(listing.id)
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Listing>> {
        let doc = self
            .collection()
            .find_one(id_filter(id))
            .await
            .map_err(|e| map_mongo_error("Failed to get listing", e))?;

        doc.as_ref().map(document_to_listing).transpose()
    }

    async fn list_ordered_page(
        &self,
        page_size: usize,
        cursor: Option<&Cursor>,
    ) -> StoreResult<ListingPage> {
        // limit(0) means "no limit" to the server
        if page_size == 0 {
            return Ok(ListingPage::default());
        }

        let filter = cursor.map(after_cursor_filter).unwrap_or_default();
        let limit = i64::try_from(page_size).unwrap_or(i64::MAX);
        let items = self.find_sorted(filter, Some(limit)).await?;

        Ok(ListingPage::from_items(items))
    }

    async fn list_all(&self) -> StoreResult<Vec<Listing>> {
        self.find_sorted(doc! {}, None).await
    }

    async fn list_by_owner(&self, owner_id: &str) -> StoreResult<Vec<Listing>> {
        self.find_sorted(doc! { "owner_id": owner_id }, None).await
    }

    async fn update(&self, id: &str, patch: ListingPatch) -> StoreResult<()> {
        let set = patch_to_set(&patch);
        if set.is_empty() {
            // $set with no fields is rejected by the server
            return match self.get_by_id(id).await? {
                Some(_) => Ok(()),
                None => Err(StoreError::NotFound { id: id.to_string() }),
            };
        }

        let result = self
            .collection()
            .update_one(id_filter(id), doc! { "$set": set })
            .await
            .map_err(|e| map_mongo_error("Failed to update listing", e))?;

        if result.matched_count == 0 {
            return Err(StoreError::NotFound { id: id.to_string() });
        }

        Ok(())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.collection()
            .delete_one(id_filter(id))
            .await
            .map_err(|e| map_mongo_error("Failed to delete listing", e))?;

        Ok(())
    }
}
