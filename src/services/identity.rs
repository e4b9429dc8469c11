//! Identity service: email/password accounts and session tokens.
//!
//! Session tokens are random 64-character strings handed to the client;
//! only their SHA-256 is stored. Views observe the signed-in identity
//! through a [`SessionContext`], which is notified when the session ends.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::watch;
use tracing::{debug, info};

use super::password::{hash_password, verify_password};
use crate::config::{AuthConfig, SessionConfig};
use crate::db::{self, DbPool};
use crate::models::{new_id, Identity};
use crate::{Error, Result};

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Result of a successful register or sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct SignedIn {
    pub identity: Identity,
    #[serde(skip)]
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Observable "current identity" for one client session.
///
/// Holds the identity known when it was created and is notified when the
/// session is signed out.
#[derive(Debug, Clone)]
pub struct SessionContext {
    rx: watch::Receiver<Option<Identity>>,
}

impl SessionContext {
    pub fn new(rx: watch::Receiver<Option<Identity>>) -> Self {
        Self { rx }
    }

    pub fn signed_out() -> Self {
        let (_tx, rx) = watch::channel(None);
        Self { rx }
    }

    /// A context that never changes.
    pub fn fixed(identity: Identity) -> Self {
        let (_tx, rx) = watch::channel(Some(identity));
        Self { rx }
    }

    pub fn current(&self) -> Option<Identity> {
        self.rx.borrow().clone()
    }

    pub fn require(&self) -> Result<Identity> {
        self.current().ok_or(Error::Unauthenticated)
    }

    /// Wait for the identity to change. Returns `None` once no further
    /// change can happen.
    pub async fn changed(&mut self) -> Option<Option<Identity>> {
        match self.rx.changed().await {
            Ok(()) => Some(self.rx.borrow_and_update().clone()),
            Err(_) => None,
        }
    }
}

/// Identity provider seam. The application only talks to this trait.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account and sign it in.
    async fn register(&self, email: &str, password: &str) -> Result<SignedIn>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn>;

    /// End a session. Unknown tokens are ignored.
    async fn sign_out(&self, token: &str) -> Result<()>;

    /// Identity behind a session token, if the session is live.
    async fn resolve(&self, token: &str) -> Result<Option<Identity>>;

    /// Observable identity for a (possibly absent) session token.
    async fn watch(&self, token: Option<&str>) -> Result<SessionContext>;

    /// Purge expired sessions. Returns how many were removed.
    async fn cleanup_expired(&self) -> Result<u64>;
}

/// Account-backed identity provider.
#[derive(Clone)]
pub struct AccountService {
    db: DbPool,
    auth: AuthConfig,
    session: SessionConfig,
    hub: Arc<SessionHub>,
}

/// Per-token identity channels for live sessions.
#[derive(Default)]
struct SessionHub {
    channels: Mutex<HashMap<String, watch::Sender<Option<Identity>>>>,
}

impl SessionHub {
    fn subscribe(&self, token_hash: &str, identity: Identity) -> SessionContext {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels.retain(|_, tx| tx.receiver_count() > 0);
        let tx = channels
            .entry(token_hash.to_string())
            .or_insert_with(|| watch::channel(Some(identity)).0);
        SessionContext::new(tx.subscribe())
    }

    fn end(&self, token_hash: &str) {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(tx) = channels.remove(token_hash) {
            tx.send_replace(None);
        }
    }
}

impl AccountService {
    pub fn new(db: DbPool, auth: AuthConfig, session: SessionConfig) -> Self {
        Self {
            db,
            auth,
            session,
            hub: Arc::new(SessionHub::default()),
        }
    }

    fn normalize_email(email: &str) -> Result<String> {
        let email = email.trim().to_lowercase();
        if !EMAIL_PATTERN.is_match(&email) {
            return Err(Error::InvalidEmail);
        }
        Ok(email)
    }

    async fn open_session(&self, identity: Identity) -> Result<SignedIn> {
        let token = nanoid::nanoid!(64);
        let expires_at = Utc::now() + Duration::seconds(self.session.max_age_seconds as i64);

        db::create_session(
            &self.db,
            db::CreateSession {
                id: new_id(),
                user_id: identity.user_id.clone(),
                token_hash: hash_token(&token),
                expires_at,
            },
        )
        .await?;

        Ok(SignedIn {
            identity,
            token,
            expires_at,
        })
    }
}

#[async_trait]
impl IdentityProvider for AccountService {
    async fn register(&self, email: &str, password: &str) -> Result<SignedIn> {
        let email = Self::normalize_email(email)?;
        if password.chars().count() < self.auth.min_password_length {
            return Err(Error::WeakPassword);
        }

        let password_hash = hash_password(password, self.auth.password_iterations)?;
        let account = db::create_account(
            &self.db,
            db::CreateAccount {
                id: new_id(),
                email,
                password_hash,
            },
        )
        .await?;

        info!(user_id = %account.id, email = %account.email, "Account registered");

        self.open_session(account.identity()).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn> {
        let email = Self::normalize_email(email)?;
        let account = db::get_account_by_email(&self.db, &email)
            .await?
            .ok_or(Error::InvalidCredentials)?;

        if !verify_password(password, &account.password_hash)? {
            debug!(user_id = %account.id, "Password mismatch");
            return Err(Error::InvalidCredentials);
        }

        db::update_last_login(&self.db, &account.id).await?;
        info!(user_id = %account.id, "Signed in");

        self.open_session(account.identity()).await
    }

    async fn sign_out(&self, token: &str) -> Result<()> {
        let token_hash = hash_token(token);
        let removed = db::delete_session_by_token_hash(&self.db, &token_hash).await?;
        self.hub.end(&token_hash);
        if removed {
            info!("Session signed out");
        }
        Ok(())
    }

    async fn resolve(&self, token: &str) -> Result<Option<Identity>> {
        let token_hash = hash_token(token);
        let Some(session) = db::get_session_by_token_hash(&self.db, &token_hash).await? else {
            return Ok(None);
        };

        let expired = DateTime::parse_from_rfc3339(&session.expires_at)
            .map(|at| at.with_timezone(&Utc) < Utc::now())
            .unwrap_or(true);
        if expired {
            db::delete_session_by_token_hash(&self.db, &token_hash).await?;
            self.hub.end(&token_hash);
            return Ok(None);
        }

        let account = db::get_account(&self.db, &session.user_id).await?;
        db::touch_session(&self.db, &session.id).await?;

        Ok(Some(account.identity()))
    }

    async fn watch(&self, token: Option<&str>) -> Result<SessionContext> {
        let Some(token) = token else {
            return Ok(SessionContext::signed_out());
        };
        match self.resolve(token).await? {
            Some(identity) => Ok(self.hub.subscribe(&hash_token(token), identity)),
            None => Ok(SessionContext::signed_out()),
        }
    }

    async fn cleanup_expired(&self) -> Result<u64> {
        let purged = db::cleanup_expired_sessions(&self.db, Utc::now()).await?;
        for token_hash in &purged {
            self.hub.end(token_hash);
        }
        Ok(purged.len() as u64)
    }
}

/// Hash a session token for storage.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::{init_pool, initialize_schema};

    async fn service() -> AccountService {
        let pool = init_pool(":memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();
        let config = Config::for_tests("/tmp/unused");
        AccountService::new(pool, config.auth, config.session)
    }

    #[tokio::test]
    async fn test_register_then_sign_in() {
        let service = service().await;
        let registered = service.register("Ada@Example.com ", "secret1").await.unwrap();
        assert_eq!(registered.identity.email, "ada@example.com");
        assert_eq!(registered.token.len(), 64);

        let signed_in = service.sign_in("ada@example.com", "secret1").await.unwrap();
        assert_eq!(signed_in.identity, registered.identity);

        let resolved = service.resolve(&signed_in.token).await.unwrap();
        assert_eq!(resolved, Some(registered.identity));
    }

    #[tokio::test]
    async fn test_register_errors() {
        let service = service().await;
        assert!(matches!(
            service.register("not-an-email", "secret1").await,
            Err(Error::InvalidEmail)
        ));
        assert!(matches!(
            service.register("ada@example.com", "123").await,
            Err(Error::WeakPassword)
        ));
        service.register("ada@example.com", "secret1").await.unwrap();
        assert!(matches!(
            service.register("ada@example.com", "secret2").await,
            Err(Error::EmailInUse)
        ));
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid_credentials() {
        let service = service().await;
        service.register("ada@example.com", "secret1").await.unwrap();
        assert!(matches!(
            service.sign_in("ada@example.com", "secret2").await,
            Err(Error::InvalidCredentials)
        ));
        assert!(matches!(
            service.sign_in("bob@example.com", "secret1").await,
            Err(Error::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_sign_out_notifies_watchers() {
        let service = service().await;
        let signed_in = service.register("ada@example.com", "secret1").await.unwrap();

        let mut context = service.watch(Some(&signed_in.token)).await.unwrap();
        assert_eq!(context.current(), Some(signed_in.identity.clone()));

        service.sign_out(&signed_in.token).await.unwrap();
        assert_eq!(context.changed().await, Some(None));
        assert!(service.resolve(&signed_in.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cleanup_of_expired_session_notifies_watchers() {
        let service = service().await;
        let signed_in = service.register("ada@example.com", "secret1").await.unwrap();
        let mut context = service.watch(Some(&signed_in.token)).await.unwrap();

        sqlx::query("UPDATE sessions SET expires_at = ? WHERE token_hash = ?")
            .bind((Utc::now() - Duration::hours(1)).to_rfc3339())
            .bind(hash_token(&signed_in.token))
            .execute(&service.db)
            .await
            .unwrap();

        assert_eq!(service.cleanup_expired().await.unwrap(), 1);
        let changed = tokio::time::timeout(std::time::Duration::from_secs(1), context.changed())
            .await
            .unwrap();
        assert_eq!(changed, Some(None));
        assert!(context.current().is_none());
    }

    #[tokio::test]
    async fn test_watch_without_token_is_signed_out() {
        let service = service().await;
        let context = service.watch(None).await.unwrap();
        assert!(matches!(context.require(), Err(Error::Unauthenticated)));

        let context = service.watch(Some("bogus")).await.unwrap();
        assert!(context.current().is_none());
    }

    #[test]
    fn test_hash_token_is_stable() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
        assert_eq!(hash_token("abc").len(), 64);
    }
}
