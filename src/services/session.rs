//! Session/role resolution.
//!
//! Turns a raw identity into a role-bearing [`Principal`]. Login, request
//! restore and the per-client [`SessionContext`] all go through
//! [`SessionResolver::resolve_identity`]; nothing else builds a principal.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::db::{CollectionSource, Directory, Scope};
use crate::errors::AppError;
use crate::models::principal::{display_name_for, Principal};
use crate::models::role::AppRole;
use crate::services::identity::{IdentityProvider, IdentitySession, SessionEvent};

/// True when a principal is present and holds one of the allowed roles.
pub fn is_route_allowed(principal: Option<&Principal>, allowed_roles: &[AppRole]) -> bool {
    principal.is_some_and(|p| allowed_roles.contains(&p.role))
}

/// Rows a principal may see: everything for super admins, their own center
/// for center admins, nothing for anyone else.
pub fn data_scope(principal: &Principal) -> Result<Scope, AppError> {
    match (principal.role, principal.tenant_id) {
        (AppRole::SuperAdmin, _) => Ok(Scope::All),
        (AppRole::CenterAdmin, Some(center_id)) => Ok(Scope::Center(center_id)),
        (AppRole::CenterAdmin, None) => Err(AppError::Forbidden(
            "Center admin is not assigned to a center".to_string(),
        )),
        _ => Err(AppError::Forbidden("Access denied".to_string())),
    }
}

/// Successful login: the principal plus the token that restores it.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedSession {
    pub principal: Principal,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    #[serde(skip)]
    pub session_id: Uuid,
}

/// Resolves identities into principals and drives login/logout/restore.
#[derive(Clone)]
pub struct SessionResolver {
    identity: Arc<dyn IdentityProvider>,
    directory: Arc<dyn Directory>,
    collections: Arc<dyn CollectionSource>,
}

impl SessionResolver {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        directory: Arc<dyn Directory>,
        collections: Arc<dyn CollectionSource>,
    ) -> Self {
        Self {
            identity,
            directory,
            collections,
        }
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    /// Build the principal for an identity, or `None` when the identity has
    /// no usable role. Lookup failures also yield `None`.
    pub async fn resolve_identity(&self, user_id: Uuid, email: &str) -> Option<Principal> {
        let lookups = tokio::try_join!(
            self.directory.find_profile(user_id),
            self.directory.find_role(user_id),
        );
        let (profile, raw_role) = match lookups {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Principal lookup failed");
                return None;
            }
        };

        let Some(raw_role) = raw_role else {
            tracing::info!(user_id = %user_id, "Identity has no role record");
            return None;
        };
        let role: AppRole = match raw_role.parse() {
            Ok(role) => role,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Unrecognized role record");
                return None;
            }
        };

        let tenant_id = if role.is_tenant_scoped() {
            profile.as_ref().and_then(|p| p.center_id)
        } else {
            None
        };
        let tenant_name = match tenant_id {
            Some(center_id) => match self.collections.find_center(center_id).await {
                Ok(center) => center.map(|c| c.name),
                Err(e) => {
                    tracing::error!(user_id = %user_id, error = %e, "Tenant lookup failed");
                    return None;
                }
            },
            None => None,
        };
        if tenant_id.is_some() && tenant_name.is_none() {
            tracing::warn!(user_id = %user_id, tenant_id = ?tenant_id, "Tenant center is missing");
        }

        Some(Principal {
            id: user_id,
            email: email.to_string(),
            display_name: display_name_for(profile.as_ref(), email),
            role,
            tenant_id,
            tenant_name,
        })
    }

    /// Password login. An identity that authenticates but has no role is
    /// signed out again and reported as not yet activated.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedSession, AppError> {
        let session = self.identity.sign_in_with_password(email, password).await?;
        let user_id = session.identity.user_id;

        match self.resolve_identity(user_id, &session.identity.email).await {
            Some(principal) => {
                tracing::info!(user_id = %user_id, role = %principal.role, "Login succeeded");
                Ok(authenticated(session, principal))
            }
            None => {
                self.identity.sign_out(&session.access_token).await?;
                tracing::info!(user_id = %user_id, "Login refused, account not activated");
                Err(AppError::AccountNotActivated)
            }
        }
    }

    /// Re-derive the principal for an existing token. A live session that no
    /// longer resolves is revoked.
    pub async fn restore(
        &self,
        access_token: &str,
    ) -> Result<Option<AuthenticatedSession>, AppError> {
        let Some(session) = self.identity.get_session(access_token).await? else {
            return Ok(None);
        };
        let user_id = session.identity.user_id;

        match self.resolve_identity(user_id, &session.identity.email).await {
            Some(principal) => Ok(Some(authenticated(session, principal))),
            None => {
                tracing::info!(user_id = %user_id, "Session no longer resolves, signing out");
                self.identity.sign_out(access_token).await?;
                Ok(None)
            }
        }
    }

    /// Revoke the session behind the token. Safe to call repeatedly.
    pub async fn logout(&self, access_token: &str) -> Result<(), AppError> {
        self.identity.sign_out(access_token).await
    }
}

fn authenticated(session: IdentitySession, principal: Principal) -> AuthenticatedSession {
    AuthenticatedSession {
        principal,
        access_token: session.access_token,
        expires_at: session.expires_at,
        session_id: session.session_id,
    }
}

/// Observable session state of one client.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Anonymous,
    Authenticated(Principal),
}

impl SessionState {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            SessionState::Anonymous => None,
            SessionState::Authenticated(p) => Some(p),
        }
    }
}

#[derive(Debug, Clone)]
struct ActiveSession {
    session_id: Uuid,
    user_id: Uuid,
    access_token: String,
}

struct Shared {
    state: watch::Sender<SessionState>,
    active: Mutex<Option<ActiveSession>>,
}

impl Shared {
    fn set(&self, active: Option<ActiveSession>, state: SessionState) {
        *self.active.lock() = active;
        self.state.send_replace(state);
    }

    fn clear(&self) -> Option<ActiveSession> {
        let previous = self.active.lock().take();
        self.state.send_replace(SessionState::Anonymous);
        previous
    }

    /// Drop to anonymous when an identity event invalidates our session.
    fn apply(&self, event: &SessionEvent) {
        let invalidated = {
            let active = self.active.lock();
            match (active.as_ref(), event) {
                (Some(a), SessionEvent::SignedOut { session_id, .. }) => a.session_id == *session_id,
                (Some(a), SessionEvent::AllSessionsRevoked { user_id }) => a.user_id == *user_id,
                _ => false,
            }
        };
        if invalidated {
            tracing::debug!(?event, "Session invalidated externally");
            self.clear();
        }
    }
}

/// Per-client session holder. Subscribers see every state change, and an
/// external sign-out of the held session moves it back to anonymous.
pub struct SessionContext {
    resolver: SessionResolver,
    shared: Arc<Shared>,
    follower: JoinHandle<()>,
}

impl SessionContext {
    /// Must be called within a tokio runtime.
    pub fn new(resolver: SessionResolver) -> Self {
        let (state, _) = watch::channel(SessionState::Anonymous);
        let shared = Arc::new(Shared {
            state,
            active: Mutex::new(None),
        });
        let follower = tokio::spawn(follow_events(
            resolver.identity().subscribe(),
            Arc::downgrade(&shared),
        ));
        Self {
            resolver,
            shared,
            follower,
        }
    }

    pub fn current(&self) -> SessionState {
        self.shared.state.borrow().clone()
    }

    pub fn principal(&self) -> Option<Principal> {
        self.current().principal().cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    /// Access token of the held session, if any.
    pub fn access_token(&self) -> Option<String> {
        self.shared
            .active
            .lock()
            .as_ref()
            .map(|a| a.access_token.clone())
    }

    /// Adopt an existing token. Leaves the context anonymous when the token
    /// does not restore to a principal.
    pub async fn restore(&self, access_token: &str) -> Result<Option<Principal>, AppError> {
        match self.resolver.restore(access_token).await? {
            Some(session) => Ok(Some(self.adopt(session))),
            None => {
                self.shared.clear();
                Ok(None)
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Principal, AppError> {
        if self.access_token().is_some() {
            self.logout().await;
        }
        match self.resolver.login(email, password).await {
            Ok(session) => Ok(self.adopt(session)),
            Err(e) => {
                self.shared.clear();
                Err(e)
            }
        }
    }

    /// Clear local state first, then revoke the identity session.
    pub async fn logout(&self) {
        if let Some(previous) = self.shared.clear() {
            if let Err(e) = self.resolver.logout(&previous.access_token).await {
                tracing::warn!(error = %e, "Identity sign-out failed after local logout");
            }
        }
    }

    fn adopt(&self, session: AuthenticatedSession) -> Principal {
        let principal = session.principal.clone();
        self.shared.set(
            Some(ActiveSession {
                session_id: session.session_id,
                user_id: principal.id,
                access_token: session.access_token,
            }),
            SessionState::Authenticated(principal.clone()),
        );
        principal
    }
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        self.follower.abort();
    }
}

async fn follow_events(
    mut events: broadcast::Receiver<SessionEvent>,
    shared: std::sync::Weak<Shared>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                shared.apply(&event);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Session event stream lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: AppRole) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            email: "p@centre.test".to_string(),
            display_name: "p".to_string(),
            role,
            tenant_id: None,
            tenant_name: None,
        }
    }

    #[test]
    fn route_allowed_requires_principal() {
        assert!(!is_route_allowed(None, &AppRole::ALL));
    }

    #[test]
    fn route_allowed_iff_role_listed() {
        for role in AppRole::ALL {
            let p = principal(role);
            assert!(is_route_allowed(Some(&p), &[role]));
            assert!(!is_route_allowed(Some(&p), &[]));
            let others: Vec<AppRole> = AppRole::ALL.into_iter().filter(|r| *r != role).collect();
            assert!(!is_route_allowed(Some(&p), &others));
        }
    }

    #[test]
    fn data_scope_by_role() {
        assert_eq!(data_scope(&principal(AppRole::SuperAdmin)).unwrap(), Scope::All);

        let center_id = Uuid::new_v4();
        let mut admin = principal(AppRole::CenterAdmin);
        admin.tenant_id = Some(center_id);
        assert_eq!(data_scope(&admin).unwrap(), Scope::Center(center_id));

        admin.tenant_id = None;
        assert!(data_scope(&admin).is_err());
        assert!(data_scope(&principal(AppRole::Student)).is_err());
    }

    #[test]
    fn state_exposes_principal() {
        let p = principal(AppRole::SuperAdmin);
        assert_eq!(SessionState::Authenticated(p.clone()).principal(), Some(&p));
        assert_eq!(SessionState::Anonymous.principal(), None);
    }
}
