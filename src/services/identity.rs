//! Identity service: password hashing, session-bound access tokens,
//! sign-in/sign-up/sign-out and session-change notifications.
//!
//! The identity service knows nothing about roles or centers. It answers
//! "who is this" only; authorization lives in [`super::session`].

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::db::CredentialStore;
use crate::errors::AppError;
use crate::models::user::{AuthSession, Identity};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Buffered session events per subscriber before lagging.
const EVENT_CAPACITY: usize = 64;

/// JWT claims embedded in access tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub sid: String,
    pub exp: i64,
    pub iat: i64,
}

/// Live identity session as seen by callers.
#[derive(Debug, Clone, Serialize)]
pub struct IdentitySession {
    pub session_id: Uuid,
    pub identity: Identity,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Session-change notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { session_id: Uuid, user_id: Uuid },
    SignedOut { session_id: Uuid, user_id: Uuid },
    /// Every session of the user was revoked, e.g. after a password reset.
    AllSessionsRevoked { user_id: Uuid },
}

/// Contract of the identity/session service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fails with `Unauthorized` on unknown email or wrong password alike.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentitySession, AppError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AppError>;

    /// Revokes the session behind the token. Unknown, expired and already
    /// revoked tokens are accepted silently.
    async fn sign_out(&self, access_token: &str) -> Result<(), AppError>;

    /// Returns the live session for a token, or `None` when the token is
    /// invalid, expired or revoked.
    async fn get_session(&self, access_token: &str) -> Result<Option<IdentitySession>, AppError>;

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}

/// Hash a plaintext password with argon2id.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

/// Verify a plaintext password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Reject passwords below the minimum length.
pub fn check_password_policy(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Encode an access token bound to a session.
pub fn issue_access_token(
    identity: &Identity,
    session: &AuthSession,
    jwt_secret: &str,
) -> Result<String, AppError> {
    let claims = Claims {
        sub: identity.user_id.to_string(),
        email: identity.email.clone(),
        sid: session.id.to_string(),
        exp: session.expires_at.timestamp(),
        iat: session.created_at.timestamp(),
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {e}")))
}

/// Validate a JWT and return the claims.
pub fn validate_token(token: &str, jwt_secret: &str) -> Result<Claims, AppError> {
    let decoding_key = DecodingKey::from_secret(jwt_secret.as_bytes());
    let validation = Validation::default();

    jsonwebtoken::decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized)
}

/// Identity provider backed by a [`CredentialStore`].
#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn CredentialStore>,
    jwt_secret: String,
    session_ttl: Duration,
    events: broadcast::Sender<SessionEvent>,
}

impl IdentityService {
    pub fn new(store: Arc<dyn CredentialStore>, jwt_secret: &str, session_ttl_secs: i64) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            jwt_secret: jwt_secret.to_string(),
            session_ttl: Duration::seconds(session_ttl_secs),
            events,
        }
    }

    /// Replace a user's password and revoke all of their sessions.
    pub async fn set_password(&self, user_id: Uuid, new_password: &str) -> Result<(), AppError> {
        check_password_policy(new_password)?;
        let hash = hash_password(new_password)?;
        self.store.update_password_hash(user_id, &hash).await?;
        let revoked = self.store.revoke_user_sessions(user_id).await?;
        tracing::info!(user_id = %user_id, revoked, "Password replaced, sessions revoked");
        self.publish(SessionEvent::AllSessionsRevoked { user_id });
        Ok(())
    }

    pub async fn find_identity(&self, user_id: Uuid) -> Result<Option<Identity>, AppError> {
        Ok(self
            .store
            .find_credential(user_id)
            .await?
            .map(|c| Identity {
                user_id: c.user_id,
                email: c.email,
            }))
    }

    /// Decode a token into its session and user ids without touching storage.
    fn decode_ids(&self, access_token: &str) -> Option<(Uuid, Uuid, String)> {
        let claims = validate_token(access_token, &self.jwt_secret).ok()?;
        let user_id = claims.sub.parse().ok()?;
        let session_id = claims.sid.parse().ok()?;
        Some((session_id, user_id, claims.email))
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl IdentityProvider for IdentityService {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentitySession, AppError> {
        let credential = self
            .store
            .find_credential_by_email(email.trim())
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &credential.password_hash)? {
            tracing::info!(user_id = %credential.user_id, "Password sign-in rejected");
            return Err(AppError::Unauthorized);
        }

        let expires_at = Utc::now() + self.session_ttl;
        let session = self
            .store
            .insert_session(credential.user_id, expires_at)
            .await?;
        let identity = Identity {
            user_id: credential.user_id,
            email: credential.email,
        };
        let access_token = issue_access_token(&identity, &session, &self.jwt_secret)?;

        self.publish(SessionEvent::SignedIn {
            session_id: session.id,
            user_id: identity.user_id,
        });

        Ok(IdentitySession {
            session_id: session.id,
            identity,
            access_token,
            expires_at: session.expires_at,
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AppError> {
        check_password_policy(password)?;
        let hash = hash_password(password)?;
        let email = email.trim().to_lowercase();
        let credential = self.store.insert_credential(&email, &hash).await?;
        tracing::info!(user_id = %credential.user_id, "Identity created, pending activation");
        Ok(Identity {
            user_id: credential.user_id,
            email: credential.email,
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        let Some((session_id, user_id, _)) = self.decode_ids(access_token) else {
            return Ok(());
        };
        self.store.revoke_session(session_id).await?;
        self.publish(SessionEvent::SignedOut {
            session_id,
            user_id,
        });
        Ok(())
    }

    async fn get_session(&self, access_token: &str) -> Result<Option<IdentitySession>, AppError> {
        let Some((session_id, user_id, email)) = self.decode_ids(access_token) else {
            return Ok(None);
        };
        let Some(session) = self.store.find_session(session_id).await? else {
            return Ok(None);
        };
        if session.user_id != user_id || !session.is_live(Utc::now()) {
            return Ok(None);
        }
        Ok(Some(IdentitySession {
            session_id,
            identity: Identity { user_id, email },
            access_token: access_token.to_string(),
            expires_at: session.expires_at,
        }))
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn service() -> (Arc<MemoryStore>, IdentityService) {
        let store = Arc::new(MemoryStore::new());
        let service = IdentityService::new(store.clone(), "test-secret-key-for-jwt", 3600);
        (store, service)
    }

    #[test]
    fn password_hash_and_verify() {
        let password = "SecurePassword123!";
        let hash = hash_password(password).unwrap();
        assert_ne!(hash, password);
        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("WrongPassword", &hash).unwrap());
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(check_password_policy("short").is_err());
        assert!(check_password_policy("long enough").is_ok());
    }

    #[test]
    fn invalid_token_rejected() {
        let result = validate_token("garbage.token.here", "secret");
        assert!(result.is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let identity = Identity {
            user_id: Uuid::new_v4(),
            email: "t@t.test".to_string(),
        };
        let now = Utc::now();
        // Well beyond the 60s leeway window.
        let session = AuthSession {
            id: Uuid::new_v4(),
            user_id: identity.user_id,
            created_at: now - Duration::hours(3),
            expires_at: now - Duration::hours(2),
            revoked_at: None,
        };
        let token = issue_access_token(&identity, &session, "secret").unwrap();
        assert!(validate_token(&token, "secret").is_err());
    }

    #[test]
    fn token_carries_session_and_user() {
        let identity = Identity {
            user_id: Uuid::new_v4(),
            email: "t@t.test".to_string(),
        };
        let now = Utc::now();
        let session = AuthSession {
            id: Uuid::new_v4(),
            user_id: identity.user_id,
            created_at: now,
            expires_at: now + Duration::hours(1),
            revoked_at: None,
        };
        let token = issue_access_token(&identity, &session, "secret").unwrap();
        let claims = validate_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, identity.user_id.to_string());
        assert_eq!(claims.sid, session.id.to_string());
        assert_eq!(claims.exp, session.expires_at.timestamp());
        assert!(validate_token(&token, "other-secret").is_err());
    }

    #[tokio::test]
    async fn sign_in_issues_live_session() {
        let (_, service) = service();
        service.sign_up("a@centre.test", "password-123").await.unwrap();

        let session = service
            .sign_in_with_password("a@centre.test", "password-123")
            .await
            .unwrap();
        let restored = service.get_session(&session.access_token).await.unwrap().unwrap();
        assert_eq!(restored.identity, session.identity);
        assert_eq!(restored.session_id, session.session_id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_identical() {
        let (_, service) = service();
        service.sign_up("a@centre.test", "password-123").await.unwrap();

        let wrong = service
            .sign_in_with_password("a@centre.test", "nope-nope-nope")
            .await
            .unwrap_err();
        let unknown = service
            .sign_in_with_password("ghost@centre.test", "password-123")
            .await
            .unwrap_err();
        assert!(matches!(wrong, AppError::Unauthorized));
        assert!(matches!(unknown, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn sign_out_revokes_and_is_idempotent() {
        let (_, service) = service();
        service.sign_up("a@centre.test", "password-123").await.unwrap();
        let session = service
            .sign_in_with_password("a@centre.test", "password-123")
            .await
            .unwrap();
        let mut events = service.subscribe();

        service.sign_out(&session.access_token).await.unwrap();
        service.sign_out(&session.access_token).await.unwrap();
        service.sign_out("not-a-token").await.unwrap();

        assert!(service.get_session(&session.access_token).await.unwrap().is_none());
        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::SignedOut {
                session_id: session.session_id,
                user_id: session.identity.user_id,
            }
        );
    }

    #[tokio::test]
    async fn set_password_revokes_every_session() {
        let (store, service) = service();
        let identity = service.sign_up("a@centre.test", "password-123").await.unwrap();
        let first = service
            .sign_in_with_password("a@centre.test", "password-123")
            .await
            .unwrap();
        service
            .sign_in_with_password("a@centre.test", "password-123")
            .await
            .unwrap();
        assert_eq!(store.live_session_count(identity.user_id), 2);

        service.set_password(identity.user_id, "brand-new-pass").await.unwrap();

        assert_eq!(store.live_session_count(identity.user_id), 0);
        assert!(service.get_session(&first.access_token).await.unwrap().is_none());
        assert!(service
            .sign_in_with_password("a@centre.test", "brand-new-pass")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn duplicate_sign_up_conflicts() {
        let (_, service) = service();
        service.sign_up("a@centre.test", "password-123").await.unwrap();
        let err = service
            .sign_up("a@centre.test", "password-456")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
