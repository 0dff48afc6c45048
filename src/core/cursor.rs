//! Opaque pagination cursor
//!
//! A cursor marks the last listing of a fetched page so the next page can
//! resume strictly after it. It is a plain serializable marker (id plus
//! creation time), never a live handle into the store. Its string form is
//! URL-safe base64 of the JSON encoding and should be treated as opaque.

use crate::core::error::ValidationError;
use crate::core::listing::Listing;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

impl Cursor {
    /// Cursor positioned at `listing`
    pub fn after(listing: &Listing) -> Self {
        Self {
            id: listing.id.clone(),
            created_at: listing.created_at,
        }
    }

    /// Encode into an opaque token
    pub fn encode(&self) -> String {
        // Serializing a String and a DateTime cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decode a token produced by [`Cursor::encode`]
    pub fn decode(token: &str) -> Result<Self, ValidationError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| ValidationError::InvalidCursor)?;
        serde_json::from_slice(&bytes).map_err(|_| ValidationError::InvalidCursor)
    }

    /// Whether `listing` sorts strictly after this position in feed order
    pub fn precedes(&self, listing: &Listing) -> bool {
        feed_order_key(&self.created_at, &self.id, &listing.created_at, &listing.id)
            == Ordering::Less
    }
}

/// Feed order: newest first, ties broken by id descending
pub fn feed_order(a: &Listing, b: &Listing) -> Ordering {
    feed_order_key(&a.created_at, &a.id, &b.created_at, &b.id)
}

fn feed_order_key(
    a_created: &DateTime<Utc>,
    a_id: &str,
    b_created: &DateTime<Utc>,
    b_id: &str,
) -> Ordering {
    b_created.cmp(a_created).then_with(|| b_id.cmp(a_id))
}
