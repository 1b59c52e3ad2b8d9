//! Registration and authentication business rules.
//!
//! `AuthService` orchestrates the password policy, credential hasher,
//! and lockout tracker over an [`AccountStore`]. It is the sole writer
//! of user records and lockout state, keeps no cache between requests,
//! and is safe to run in any number of instances sharing one store.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

pub mod hasher;
pub mod lockout;
pub mod policy;
pub mod username;

pub use self::lockout::{LockState, LockoutTracker};
pub use self::policy::PolicyViolation;

use self::hasher::{hash_password, verify_password};
use self::policy::validate_password;
use self::username::{normalize_username, validate_username};
use crate::store::{user_key, AccountStore};

const DEFAULT_MAX_FAILS: i64 = 5;
const DEFAULT_LOCK_SECONDS: u64 = 900;

/// One registered account, stored as JSON under `user:<username>`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub password_version: u32,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    max_fails: i64,
    lock_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_fails: DEFAULT_MAX_FAILS,
            lock_seconds: DEFAULT_LOCK_SECONDS,
        }
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_fails(mut self, max_fails: i64) -> Self {
        self.max_fails = max_fails;
        self
    }

    /// Lock duration in seconds; also the failure-counting window.
    #[must_use]
    pub fn with_lock_seconds(mut self, seconds: u64) -> Self {
        self.lock_seconds = seconds;
        self
    }

    #[must_use]
    pub fn max_fails(&self) -> i64 {
        self.max_fails
    }

    #[must_use]
    pub fn lock_seconds(&self) -> u64 {
        self.lock_seconds
    }
}

/// Outcome of a registration attempt.
#[derive(Debug)]
pub enum RegisterOutcome {
    Created { username: String },
    InvalidUsername { details: Vec<String> },
    WeakPassword(PolicyViolation),
    UsernameTaken,
    /// The store did not confirm the record write.
    Failed,
}

/// Outcome of an authentication attempt. Deliberately low-information:
/// an unknown username and a wrong password are indistinguishable.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated { username: String },
    InvalidCredentials,
    Locked,
}

pub struct AuthService {
    store: Arc<dyn AccountStore>,
    lockout: LockoutTracker,
}

impl AuthService {
    #[must_use]
    pub fn new(store: Arc<dyn AccountStore>, config: &AuthConfig) -> Self {
        let lockout = LockoutTracker::new(
            store.clone(),
            config.max_fails(),
            config.lock_seconds(),
            config.lock_seconds(),
        );

        Self { store, lockout }
    }

    /// Register a user exactly once under the normalized username.
    ///
    /// Uniqueness is enforced purely by the store's atomic
    /// create-if-absent; the prior existence check only buys a friendly
    /// error without a wasted hash.
    ///
    /// # Errors
    /// Returns an error for store or hashing failures; business
    /// rejections are `Ok` variants.
    pub async fn register(&self, username: &str, password: &str) -> Result<RegisterOutcome> {
        self.store
            .ensure_connected()
            .await
            .context("store connection check failed")?;

        let username = normalize_username(username);
        if let Err(details) = validate_username(&username) {
            return Ok(RegisterOutcome::InvalidUsername { details });
        }

        if let Err(violation) = validate_password(password) {
            return Ok(RegisterOutcome::WeakPassword(violation));
        }

        let key = user_key(&username);
        if self.store.exists(&key).await? {
            return Ok(RegisterOutcome::UsernameTaken);
        }

        let record = UserRecord {
            username: username.clone(),
            password_hash: hash_password(password)?,
            created_at: Utc::now(),
            password_version: 1,
            last_login: None,
        };
        let value = serde_json::to_string(&record).context("failed to serialize user record")?;

        match self.store.create_if_absent(&key, &value).await {
            // Lost the race to a concurrent registration; never overwrite.
            Ok(false) => Ok(RegisterOutcome::UsernameTaken),
            Ok(true) => {
                debug!(username = record.username, "user registered");
                Ok(RegisterOutcome::Created {
                    username: record.username,
                })
            }
            Err(err) => {
                error!("user record write unconfirmed: {err}");
                Ok(RegisterOutcome::Failed)
            }
        }
    }

    /// Authenticate a login attempt.
    ///
    /// A locked account fails immediately without reading the record or
    /// counting a new failure. An unknown username still counts a
    /// failure so it cannot be probed apart from a wrong password.
    ///
    /// # Errors
    /// Returns an error for store or hash-parsing failures; business
    /// rejections are `Ok` variants.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<AuthOutcome> {
        self.store
            .ensure_connected()
            .await
            .context("store connection check failed")?;

        let username = normalize_username(username);

        if self.lockout.state(&username).await?.is_locked() {
            return Ok(AuthOutcome::Locked);
        }

        let Some(raw) = self.store.read(&user_key(&username)).await? else {
            self.lockout.record_failure(&username).await?;
            return Ok(AuthOutcome::InvalidCredentials);
        };

        let record: UserRecord =
            serde_json::from_str(&raw).context("corrupt user record in store")?;

        if !verify_password(&record.password_hash, password)? {
            self.lockout.record_failure(&username).await?;
            return Ok(AuthOutcome::InvalidCredentials);
        }

        self.lockout.clear(&username).await?;
        Ok(AuthOutcome::Authenticated {
            username: record.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{fail_key, lock_key, MemoryStore, Ttl};
    use tokio::time::{advance, Duration};

    fn service(store: Arc<MemoryStore>) -> AuthService {
        AuthService::new(store, &AuthConfig::default())
    }

    fn quick_service(store: Arc<MemoryStore>, max_fails: i64, lock_seconds: u64) -> AuthService {
        let config = AuthConfig::new()
            .with_max_fails(max_fails)
            .with_lock_seconds(lock_seconds);
        AuthService::new(store, &config)
    }

    #[tokio::test]
    async fn register_then_authenticate_round_trip() -> Result<()> {
        let auth = service(Arc::new(MemoryStore::new()));

        let outcome = auth.register("TestUser", "TestPass123!").await?;
        let RegisterOutcome::Created { username } = outcome else {
            panic!("expected Created, got {outcome:?}");
        };
        assert_eq!(username, "testuser");

        let outcome = auth.authenticate("TestUser", "TestPass123!").await?;
        assert_eq!(
            outcome,
            AuthOutcome::Authenticated {
                username: "testuser".to_string()
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn identity_is_case_insensitive() -> Result<()> {
        let auth = service(Arc::new(MemoryStore::new()));

        auth.register("Alice.B", "TestPass123!").await?;
        let outcome = auth.authenticate("ALICE.b", "TestPass123!").await?;
        assert_eq!(
            outcome,
            AuthOutcome::Authenticated {
                username: "alice.b".to_string()
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() -> Result<()> {
        let auth = service(Arc::new(MemoryStore::new()));

        auth.register("testuser", "TestPass123!").await?;
        let outcome = auth.register("TestUser", "OtherPass456?").await?;
        assert!(matches!(outcome, RegisterOutcome::UsernameTaken));
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_registrations_yield_one_winner() -> Result<()> {
        let auth = service(Arc::new(MemoryStore::new()));

        let (first, second) = tokio::join!(
            auth.register("testuser", "TestPass123!"),
            auth.register("TESTUSER", "OtherPass456?"),
        );

        let outcomes = [first?, second?];
        let created = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, RegisterOutcome::Created { .. }))
            .count();
        let taken = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, RegisterOutcome::UsernameTaken))
            .count();
        assert_eq!((created, taken), (1, 1));
        Ok(())
    }

    #[tokio::test]
    async fn invalid_username_reports_rule_details() -> Result<()> {
        let auth = service(Arc::new(MemoryStore::new()));

        let outcome = auth.register("ab", "TestPass123!").await?;
        let RegisterOutcome::InvalidUsername { details } = outcome else {
            panic!("expected InvalidUsername, got {outcome:?}");
        };
        assert!(details[0].contains("at least 3 characters"));
        Ok(())
    }

    #[tokio::test]
    async fn weak_password_reports_policy_details() -> Result<()> {
        let auth = service(Arc::new(MemoryStore::new()));

        let outcome = auth.register("testuser", "short").await?;
        let RegisterOutcome::WeakPassword(violation) = outcome else {
            panic!("expected WeakPassword, got {outcome:?}");
        };
        assert!(violation.message.contains("at least 6 characters"));

        // Nothing was written for the rejected registration.
        let outcome = auth.authenticate("testuser", "short").await?;
        assert_eq!(outcome, AuthOutcome::InvalidCredentials);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_look_identical() -> Result<()> {
        let auth = service(Arc::new(MemoryStore::new()));
        auth.register("testuser", "TestPass123!").await?;

        let unknown = auth.authenticate("nobody", "TestPass123!").await?;
        let wrong = auth.authenticate("testuser", "WrongPass123!").await?;
        assert_eq!(unknown, AuthOutcome::InvalidCredentials);
        assert_eq!(unknown, wrong);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_user_failures_still_accumulate() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let auth = quick_service(store.clone(), 3, 900);

        for _ in 0..3 {
            auth.authenticate("ghost", "AnyPass123!").await?;
        }

        assert_eq!(auth.authenticate("ghost", "AnyPass123!").await?, AuthOutcome::Locked);
        assert!(store.exists(&lock_key("ghost")).await?);
        Ok(())
    }

    #[tokio::test]
    async fn below_threshold_never_locks_threshold_does() -> Result<()> {
        let auth = quick_service(Arc::new(MemoryStore::new()), 5, 900);
        auth.register("testuser", "TestPass123!").await?;

        for _ in 0..4 {
            let outcome = auth.authenticate("testuser", "WrongPass123!").await?;
            assert_eq!(outcome, AuthOutcome::InvalidCredentials);
        }

        // Fifth wrong attempt trips the lock; the next attempt is
        // refused outright, even with the right password.
        let outcome = auth.authenticate("testuser", "WrongPass123!").await?;
        assert_eq!(outcome, AuthOutcome::InvalidCredentials);
        let outcome = auth.authenticate("testuser", "TestPass123!").await?;
        assert_eq!(outcome, AuthOutcome::Locked);
        Ok(())
    }

    #[tokio::test]
    async fn locked_attempts_do_not_grow_the_counter() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let auth = quick_service(store.clone(), 2, 900);
        auth.register("testuser", "TestPass123!").await?;

        auth.authenticate("testuser", "WrongPass123!").await?;
        auth.authenticate("testuser", "WrongPass123!").await?;
        let before = store.read(&fail_key("testuser")).await?;

        auth.authenticate("testuser", "WrongPass123!").await?;
        assert_eq!(store.read(&fail_key("testuser")).await?, before);
        Ok(())
    }

    #[tokio::test]
    async fn success_clears_the_failure_counter() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let auth = quick_service(store.clone(), 5, 900);
        auth.register("testuser", "TestPass123!").await?;

        auth.authenticate("testuser", "WrongPass123!").await?;
        auth.authenticate("testuser", "WrongPass123!").await?;
        assert!(store.exists(&fail_key("testuser")).await?);

        auth.authenticate("testuser", "TestPass123!").await?;
        assert!(!store.exists(&fail_key("testuser")).await?);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn lock_expiry_allows_login_again() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let auth = quick_service(store.clone(), 2, 60);
        auth.register("testuser", "TestPass123!").await?;

        auth.authenticate("testuser", "WrongPass123!").await?;
        auth.authenticate("testuser", "WrongPass123!").await?;
        assert_eq!(
            auth.authenticate("testuser", "TestPass123!").await?,
            AuthOutcome::Locked
        );

        advance(Duration::from_secs(61)).await;

        let outcome = auth.authenticate("testuser", "TestPass123!").await?;
        assert_eq!(
            outcome,
            AuthOutcome::Authenticated {
                username: "testuser".to_string()
            }
        );
        assert_eq!(store.remaining_ttl(&fail_key("testuser")).await?, Ttl::Absent);
        Ok(())
    }

    #[tokio::test]
    async fn stored_record_has_expected_shape() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let auth = service(store.clone());
        auth.register("TestUser", "TestPass123!").await?;

        let raw = store.read(&user_key("testuser")).await?.expect("record");
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        assert_eq!(value["username"], "testuser");
        assert_eq!(value["passwordVersion"], 1);
        assert_eq!(value["lastLogin"], serde_json::Value::Null);
        assert!(value["passwordHash"]
            .as_str()
            .is_some_and(|hash| hash.starts_with("$argon2id$")));
        assert!(value["createdAt"].is_string());
        Ok(())
    }
}
