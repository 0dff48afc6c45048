//! Listing records and the payloads used to create and change them

use crate::config::ListingLimits;
use crate::core::auth::User;
use crate::core::error::ValidationError;
use crate::core::validation::validators;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A marketplace item as persisted in the document store.
///
/// `id` and `created_at` are assigned by the store at insert time and never
/// change afterwards. `owner_id` is fixed at creation; only the owner may
/// change the title, description or price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    /// Check whether `user` owns this listing
    pub fn is_owned_by(&self, user: &User) -> bool {
        self.owner_id == user.uid
    }

    /// Case-insensitive substring match on title or description.
    ///
    /// `needle` must already be lowercase.
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }

    /// Apply the fields present in `patch`
    pub fn apply(&mut self, patch: &ListingPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
    }
}

/// Insert payload: everything but the store-assigned `id` and `created_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub owner_id: String,
}

/// Merge-update payload.
///
/// Only title, description and price can be expressed here; identity,
/// ownership and creation time are out of reach by construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl ListingPatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.price.is_none()
    }

    /// Validate the supplied fields, returning a patch with trimmed text
    pub fn validated(&self, limits: &ListingLimits) -> Result<Self, ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyPatch);
        }

        let title = self
            .title
            .as_deref()
            .map(|t| validated_text("title", t, limits.title_max_len))
            .transpose()?;
        let description = self
            .description
            .as_deref()
            .map(|d| validated_text("description", d, limits.description_max_len))
            .transpose()?;
        let price = self.price.map(validators::positive).transpose()?;

        Ok(Self {
            title,
            description,
            price,
        })
    }
}

/// Raw form input for creating or editing a listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    /// Price as typed, e.g. `"19.99"`
    pub price: String,
}

/// A draft that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidListing {
    pub title: String,
    pub description: String,
    pub price: f64,
}

impl ListingDraft {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            price: price.into(),
        }
    }

    /// Prefill a draft from an existing listing (edit form)
    pub fn from_listing(listing: &Listing) -> Self {
        Self::new(
            listing.title.clone(),
            listing.description.clone(),
            listing.price.to_string(),
        )
    }

    /// Trim, check and parse every field
    pub fn validate(&self, limits: &ListingLimits) -> Result<ValidListing, ValidationError> {
        let title = validated_text("title", &self.title, limits.title_max_len)?;
        let description =
            validated_text("description", &self.description, limits.description_max_len)?;
        let price = validators::price(&self.price)?;

        Ok(ValidListing {
            title,
            description,
            price,
        })
    }
}

impl ValidListing {
    pub fn into_new_listing(self, owner_id: impl Into<String>) -> NewListing {
        NewListing {
            title: self.title,
            description: self.description,
            price: self.price,
            owner_id: owner_id.into(),
        }
    }

    pub fn into_patch(self) -> ListingPatch {
        ListingPatch {
            title: Some(self.title),
            description: Some(self.description),
            price: Some(self.price),
        }
    }
}

fn validated_text(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = validators::required(field, value)?;
    validators::max_chars(field, trimmed, max)?;
    Ok(trimmed.to_string())
}
