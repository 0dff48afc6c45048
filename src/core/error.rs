//! Typed error handling for the marketplace crate
//!
//! Callers can match on the specific failure instead of inspecting strings.
//!
//! # Error Categories
//!
//! - [`StoreError`]: failures reported by the document store (transport,
//!   permission, missing record on update)
//! - [`ValidationError`]: client-side input problems, detected before any store call
//! - [`AuthError`]: failures reported by the auth provider
//! - [`MarketError`]: the umbrella type returned by the controller and service
//!
//! # Example
//!
//! ```rust,ignore
//! match service.update(Some(&user), &listing, &draft).await {
//!     Ok(()) => {}
//!     Err(MarketError::UnauthorizedEdit { .. }) => println!("not your listing"),
//!     Err(MarketError::Validation(e)) => println!("{}", e),
//!     Err(e) => println!("{}", e.user_message()),
//! }
//! ```

use thiserror::Error;

/// The main error type for marketplace operations
#[derive(Debug, Error)]
pub enum MarketError {
    /// The document store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// User input was rejected before reaching the store
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The auth provider failed
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A non-owner tried to update or delete a listing
    #[error("user '{user_id}' may not modify listing '{listing_id}'")]
    UnauthorizedEdit { listing_id: String, user_id: String },

    /// The operation needs a signed-in user
    #[error("you must be signed in to do this")]
    Unauthenticated,

    /// A listing the caller expected to exist is gone
    #[error("listing '{id}' not found")]
    NotFound { id: String },
}

impl MarketError {
    /// Stable code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            MarketError::Store(e) => e.error_code(),
            MarketError::Validation(_) => "VALIDATION_ERROR",
            MarketError::Auth(e) => e.error_code(),
            MarketError::UnauthorizedEdit { .. } => "UNAUTHORIZED_EDIT",
            MarketError::Unauthenticated => "UNAUTHENTICATED",
            MarketError::NotFound { .. } => "LISTING_NOT_FOUND",
        }
    }

    /// Text suitable for showing to the person at the keyboard.
    ///
    /// Store failures collapse into a generic retryable message; local errors
    /// keep their specific wording.
    pub fn user_message(&self) -> String {
        match self {
            MarketError::Store(_) => "Something went wrong. Please try again.".to_string(),
            MarketError::UnauthorizedEdit { .. } => {
                "You can only edit your own listings".to_string()
            }
            MarketError::NotFound { .. } => "Listing not found".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            MarketError::Store(e) => e.is_retryable(),
            MarketError::Auth(AuthError::Unavailable { .. }) => true,
            _ => false,
        }
    }
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors reported by a [`ListingStore`](crate::core::store::ListingStore)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend could not be reached
    #[error("document store is unavailable: {message}")]
    Unavailable { message: String },

    /// The backend refused the operation
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    /// An update targeted a record that does not exist
    #[error("listing '{id}' does not exist")]
    NotFound { id: String },

    /// A stored record could not be converted to or from a listing
    #[error("failed to (de)serialize listing: {message}")]
    Serialization { message: String },

    /// Any other backend failure
    #[error("document store error: {message}")]
    Backend { message: String },
}

impl StoreError {
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::Unavailable { .. } => "STORE_UNAVAILABLE",
            StoreError::PermissionDenied { .. } => "STORE_PERMISSION_DENIED",
            StoreError::NotFound { .. } => "STORE_NOT_FOUND",
            StoreError::Serialization { .. } => "STORE_SERIALIZATION_ERROR",
            StoreError::Backend { .. } => "STORE_ERROR",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable { .. } | StoreError::Backend { .. }
        )
    }

    pub(crate) fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            message: message.into(),
        }
    }

    pub(crate) fn backend(message: impl Into<String>) -> Self {
        StoreError::Backend {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization {
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Client-side input errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is empty (after trimming)
    #[error("{field} is required")]
    Required { field: &'static str },

    /// A field exceeds its character limit
    #[error("{field} must be at most {max} characters (got {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    /// The price is not a number
    #[error("price '{value}' is not a valid number")]
    InvalidPrice { value: String },

    /// The price is zero, negative or not finite
    #[error("price must be a positive number (got {value})")]
    NonPositivePrice { value: String },

    /// An update carried no fields
    #[error("nothing to update")]
    EmptyPatch,

    /// A pagination token could not be decoded
    #[error("invalid pagination cursor")]
    InvalidCursor,
}

// =============================================================================
// Auth Errors
// =============================================================================

/// Errors reported by an [`AuthProvider`](crate::core::auth::AuthProvider)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("an account already exists for '{email}'")]
    EmailInUse { email: String },

    #[error("password must be at least {min_len} characters")]
    WeakPassword { min_len: usize },

    #[error("'{email}' is not a valid email address")]
    InvalidEmail { email: String },

    #[error("auth provider is unavailable: {message}")]
    Unavailable { message: String },
}

impl AuthError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "AUTH_INVALID_CREDENTIALS",
            AuthError::EmailInUse { .. } => "AUTH_EMAIL_IN_USE",
            AuthError::WeakPassword { .. } => "AUTH_WEAK_PASSWORD",
            AuthError::InvalidEmail { .. } => "AUTH_INVALID_EMAIL",
            AuthError::Unavailable { .. } => "AUTH_UNAVAILABLE",
        }
    }
}

// =============================================================================
// Result type aliases
// =============================================================================

/// Result of a document store call
pub type StoreResult<T> = Result<T, StoreError>;

/// Result of a controller or service call
pub type MarketResult<T> = Result<T, MarketError>;

// =============================================================================
// Tests
// =============================================================================
