//! Session/role resolution against the in-memory store.

mod common;

use std::sync::Arc;
use std::time::Duration;

use campusdesk::errors::AppError;
use campusdesk::models::center::CenterStatus;
use campusdesk::models::role::AppRole;
use campusdesk::services::identity::IdentityProvider;
use campusdesk::services::session::{SessionContext, SessionResolver, SessionState};
use common::{
    create_account, test_state, Collection, FailingDirectory, FailingSource, Lookup, PASSWORD,
};

#[tokio::test]
async fn no_role_resolves_to_nothing() {
    let (state, store) = test_state();
    let user_id = create_account(&state, &store, "pending@centre.test", None, None).await;

    assert!(state
        .sessions
        .resolve_identity(user_id, "pending@centre.test")
        .await
        .is_none());
}

#[tokio::test]
async fn unknown_role_string_resolves_to_nothing() {
    let (state, store) = test_state();
    let user_id =
        create_account(&state, &store, "odd@centre.test", Some("franchise_owner"), None).await;

    assert!(state
        .sessions
        .resolve_identity(user_id, "odd@centre.test")
        .await
        .is_none());
}

#[tokio::test]
async fn login_without_role_forces_sign_out() {
    let (state, store) = test_state();
    let user_id = create_account(&state, &store, "pending@centre.test", None, None).await;

    let err = state
        .sessions
        .login("pending@centre.test", PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::AccountNotActivated));
    assert_eq!(store.live_session_count(user_id), 0);
}

#[tokio::test]
async fn wrong_password_is_generic() {
    let (state, store) = test_state();
    create_account(&state, &store, "admin@centre.test", Some("super_admin"), None).await;

    let err = state
        .sessions
        .login("admin@centre.test", "not-the-password")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));

    let err = state
        .sessions
        .login("nobody@centre.test", PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));
}

#[tokio::test]
async fn center_admin_resolves_with_tenant() {
    let (state, store) = test_state();
    let center = store.seed_center("Kothrud", "PUN-01", CenterStatus::Active);
    create_account(
        &state,
        &store,
        "lead@kothrud.test",
        Some("center_admin"),
        Some(center.id),
    )
    .await;

    let session = state
        .sessions
        .login("lead@kothrud.test", PASSWORD)
        .await
        .unwrap();

    let principal = session.principal;
    assert_eq!(principal.role, AppRole::CenterAdmin);
    assert_eq!(principal.tenant_id, Some(center.id));
    assert_eq!(principal.tenant_name.as_deref(), Some("Kothrud"));
    assert_eq!(principal.display_name, "lead");
}

#[tokio::test]
async fn missing_tenant_center_still_resolves() {
    let (state, store) = test_state();
    let center = store.seed_center("Gone", "GONE-1", CenterStatus::Active);
    let user_id = create_account(
        &state,
        &store,
        "lead@gone.test",
        Some("center_admin"),
        Some(center.id),
    )
    .await;
    store.delete_center(center.id);

    let principal = state
        .sessions
        .resolve_identity(user_id, "lead@gone.test")
        .await
        .unwrap();
    assert_eq!(principal.tenant_id, Some(center.id));
    assert_eq!(principal.tenant_name, None);
    assert!(!principal.is_super_admin());
}

#[tokio::test]
async fn super_admin_has_no_tenant() {
    let (state, store) = test_state();
    let center = store.seed_center("Kothrud", "PUN-01", CenterStatus::Active);
    let user_id = create_account(
        &state,
        &store,
        "admin@centre.test",
        Some("super_admin"),
        Some(center.id),
    )
    .await;

    let principal = state
        .sessions
        .resolve_identity(user_id, "admin@centre.test")
        .await
        .unwrap();
    assert_eq!(principal.role, AppRole::SuperAdmin);
    assert_eq!(principal.tenant_id, None);
}

#[tokio::test]
async fn restore_revokes_sessions_that_lost_their_role() {
    let (state, store) = test_state();
    let user_id =
        create_account(&state, &store, "admin@centre.test", Some("super_admin"), None).await;
    let session = state
        .sessions
        .login("admin@centre.test", PASSWORD)
        .await
        .unwrap();

    assert!(state
        .sessions
        .restore(&session.access_token)
        .await
        .unwrap()
        .is_some());

    store.seed_raw_role(user_id, "retired");
    assert!(state
        .sessions
        .restore(&session.access_token)
        .await
        .unwrap()
        .is_none());
    assert_eq!(store.live_session_count(user_id), 0);
}

#[tokio::test]
async fn context_login_logout_cycle() {
    let (state, store) = test_state();
    let user_id =
        create_account(&state, &store, "admin@centre.test", Some("super_admin"), None).await;
    let context = SessionContext::new(state.sessions.clone());
    let mut changes = context.subscribe();

    assert_eq!(context.current(), SessionState::Anonymous);

    let principal = context.login("admin@centre.test", PASSWORD).await.unwrap();
    assert_eq!(principal.id, user_id);
    changes.changed().await.unwrap();
    assert_eq!(
        *changes.borrow_and_update(),
        SessionState::Authenticated(principal.clone())
    );

    context.logout().await;
    assert_eq!(context.current(), SessionState::Anonymous);
    assert!(context.access_token().is_none());
    assert_eq!(store.live_session_count(user_id), 0);

    // Logging out twice is harmless.
    context.logout().await;
    assert_eq!(context.current(), SessionState::Anonymous);
}

#[tokio::test]
async fn context_stays_anonymous_for_pending_accounts() {
    let (state, store) = test_state();
    create_account(&state, &store, "pending@centre.test", None, None).await;
    let context = SessionContext::new(state.sessions.clone());

    let err = context
        .login("pending@centre.test", PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccountNotActivated));
    assert_eq!(context.current(), SessionState::Anonymous);
}

#[tokio::test]
async fn context_follows_external_sign_out() {
    let (state, store) = test_state();
    create_account(&state, &store, "admin@centre.test", Some("super_admin"), None).await;
    let context = SessionContext::new(state.sessions.clone());
    context.login("admin@centre.test", PASSWORD).await.unwrap();
    let token = context.access_token().unwrap();
    let mut changes = context.subscribe();
    changes.borrow_and_update();

    state.identity.sign_out(&token).await.unwrap();

    tokio::time::timeout(Duration::from_secs(2), changes.changed())
        .await
        .expect("context did not react to sign-out")
        .unwrap();
    assert_eq!(context.current(), SessionState::Anonymous);
}

#[tokio::test]
async fn context_follows_password_reset() {
    let (state, store) = test_state();
    let user_id =
        create_account(&state, &store, "admin@centre.test", Some("super_admin"), None).await;
    let context = SessionContext::new(state.sessions.clone());
    context.login("admin@centre.test", PASSWORD).await.unwrap();
    let mut changes = context.subscribe();
    changes.borrow_and_update();

    state
        .identity
        .set_password(user_id, "another-password")
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(2), changes.changed())
        .await
        .expect("context did not react to revocation")
        .unwrap();
    assert_eq!(context.current(), SessionState::Anonymous);
}

#[tokio::test]
async fn context_restore_adopts_existing_token() {
    let (state, store) = test_state();
    create_account(&state, &store, "admin@centre.test", Some("super_admin"), None).await;
    let session = state
        .sessions
        .login("admin@centre.test", PASSWORD)
        .await
        .unwrap();

    let context = SessionContext::new(state.sessions.clone());
    let restored = context.restore(&session.access_token).await.unwrap();
    assert_eq!(restored, Some(session.principal.clone()));
    assert_eq!(context.principal(), Some(session.principal));

    let stranger = SessionContext::new(state.sessions.clone());
    assert_eq!(stranger.restore("not-a-token").await.unwrap(), None);
    assert_eq!(stranger.current(), SessionState::Anonymous);
}

#[tokio::test]
async fn directory_failure_resolves_to_nothing() {
    for failing in [Lookup::Profile, Lookup::Role] {
        let (state, store) = test_state();
        let user_id =
            create_account(&state, &store, "admin@centre.test", Some("super_admin"), None).await;
        let resolver = SessionResolver::new(
            state.identity.clone(),
            Arc::new(FailingDirectory {
                inner: store.clone(),
                failing,
            }),
            store.clone(),
        );

        assert!(
            resolver
                .resolve_identity(user_id, "admin@centre.test")
                .await
                .is_none(),
            "{failing:?} failure should not resolve"
        );

        let err = resolver
            .login("admin@centre.test", PASSWORD)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AccountNotActivated));
        assert_eq!(store.live_session_count(user_id), 0);
    }
}

#[tokio::test]
async fn tenant_lookup_failure_resolves_to_nothing() {
    let (state, store) = test_state();
    let center = store.seed_center("Kothrud", "PUN-01", CenterStatus::Active);
    let user_id = create_account(
        &state,
        &store,
        "lead@kothrud.test",
        Some("center_admin"),
        Some(center.id),
    )
    .await;
    let resolver = SessionResolver::new(
        state.identity.clone(),
        store.clone(),
        Arc::new(FailingSource {
            inner: store.clone(),
            failing: Collection::CenterLookup,
        }),
    );

    assert!(resolver
        .resolve_identity(user_id, "lead@kothrud.test")
        .await
        .is_none());

    let err = resolver
        .login("lead@kothrud.test", PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccountNotActivated));
    assert_eq!(store.live_session_count(user_id), 0);
}
