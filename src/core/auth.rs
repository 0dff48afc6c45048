//! Authentication collaborator
//!
//! The marketplace does not authenticate anyone itself. It consumes an
//! [`AuthProvider`] that knows the current identity and publishes changes to it.
//! The only authorization rule applied on top is ownership: a listing may be
//! changed by the user whose `uid` equals the listing's `owner_id`.

use crate::core::error::AuthError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use uuid::Uuid;

/// An authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl User {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
        }
    }
}

/// Trait for auth providers
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The signed-in user, if any
    fn current_user(&self) -> Option<User>;

    /// Sign in with email and password
    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Create an account and sign it in
    async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Sign the current user out
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Watch login-state changes.
    ///
    /// The receiver always holds the latest identity, so late subscribers
    /// see the current state immediately.
    fn subscribe(&self) -> watch::Receiver<Option<User>>;

    /// Login-state changes as a `Stream`, starting with the current identity
    fn identity_stream(&self) -> WatchStream<Option<User>> {
        WatchStream::new(self.subscribe())
    }
}

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password: String,
}

/// In-memory auth provider for development and tests
///
/// Accounts live in process memory only and passwords are compared in plain
/// text. Emails are matched case-insensitively.
#[derive(Clone)]
pub struct InMemoryAuthProvider {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
    identity: Arc<watch::Sender<Option<User>>>,
}

impl InMemoryAuthProvider {
    pub fn new() -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
            identity: Arc::new(identity),
        }
    }

    fn publish(&self, user: Option<User>) {
        self.identity.send_replace(user);
    }
}

impl Default for InMemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid {
        Ok(email)
    } else {
        Err(AuthError::InvalidEmail { email })
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    fn current_user(&self) -> Option<User> {
        self.identity.borrow().clone()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let key = normalize_email(email)?;
        let user = {
            let accounts = self.accounts.read().map_err(|e| AuthError::Unavailable {
                message: format!("Failed to acquire read lock: {}", e),
            })?;
            match accounts.get(&key) {
                Some(account) if account.password == password => account.user.clone(),
                _ => return Err(AuthError::InvalidCredentials),
            }
        };

        tracing::info!(uid = %user.uid, "user signed in");
        self.publish(Some(user.clone()));
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let key = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword {
                min_len: MIN_PASSWORD_LEN,
            });
        }

        let user = {
            let mut accounts = self.accounts.write().map_err(|e| AuthError::Unavailable {
                message: format!("Failed to acquire write lock: {}", e),
            })?;
            if accounts.contains_key(&key) {
                return Err(AuthError::EmailInUse { email: key });
            }
            let user = User {
                uid: Uuid::new_v4().to_string(),
                email: Some(key.clone()),
                display_name: None,
            };
            accounts.insert(
                key,
                Account {
                    user: user.clone(),
                    password: password.to_string(),
                },
            );
            user
        };

        tracing::info!(uid = %user.uid, "account created");
        self.publish(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(user) = self.current_user() {
            tracing::info!(uid = %user.uid, "user signed out");
        }
        self.publish(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.identity.subscribe()
    }
}
