//! Privileged account operations.
//!
//! Each operation checks the caller's role itself. Route extractors guard
//! the HTTP surface too, but nothing here relies on them.

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::db::{CollectionSource, Directory};
use crate::errors::AppError;
use crate::models::principal::{Principal, Profile};
use crate::models::role::AppRole;
use crate::models::user::{ActivateAccount, CreateCenterAdmin, ManagedAccount, ResetPassword};
use crate::services::identity::{IdentityProvider, IdentityService};

fn require_super_admin(caller: &Principal) -> Result<(), AppError> {
    if caller.is_super_admin() {
        Ok(())
    } else {
        tracing::warn!(user_id = %caller.id, role = %caller.role, "Privileged operation refused");
        Err(AppError::Forbidden("Super admin access required".to_string()))
    }
}

#[derive(Clone)]
pub struct AdminService {
    identity: Arc<IdentityService>,
    directory: Arc<dyn Directory>,
    collections: Arc<dyn CollectionSource>,
}

impl AdminService {
    pub fn new(
        identity: Arc<IdentityService>,
        directory: Arc<dyn Directory>,
        collections: Arc<dyn CollectionSource>,
    ) -> Self {
        Self {
            identity,
            directory,
            collections,
        }
    }

    async fn require_center(&self, center_id: Uuid) -> Result<(), AppError> {
        self.collections
            .find_center(center_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Center not found".to_string()))
    }

    /// Create an identity bound to a center with the center_admin role.
    ///
    /// The steps are not atomic. If the role assignment fails the identity
    /// is left without a role, which resolves to no principal.
    pub async fn create_center_admin(
        &self,
        caller: &Principal,
        input: &CreateCenterAdmin,
    ) -> Result<ManagedAccount, AppError> {
        require_super_admin(caller)?;
        input.validate()?;
        self.require_center(input.center_id).await?;

        let identity = self.identity.sign_up(&input.email, &input.password).await?;
        let full_name = input.full_name.trim().to_string();
        self.directory
            .upsert_profile(&Profile {
                user_id: identity.user_id,
                email: identity.email.clone(),
                full_name: Some(full_name.clone()),
                center_id: Some(input.center_id),
            })
            .await?;
        self.directory
            .assign_role(identity.user_id, AppRole::CenterAdmin)
            .await?;

        tracing::info!(
            user_id = %identity.user_id,
            center_id = %input.center_id,
            created_by = %caller.id,
            "Center admin created"
        );
        Ok(ManagedAccount {
            user_id: identity.user_id,
            email: identity.email,
            full_name: Some(full_name),
            role: AppRole::CenterAdmin,
            center_id: Some(input.center_id),
        })
    }

    /// Replace a center admin's password and revoke their sessions.
    pub async fn reset_center_admin_password(
        &self,
        caller: &Principal,
        user_id: Uuid,
        input: &ResetPassword,
    ) -> Result<(), AppError> {
        require_super_admin(caller)?;
        input.validate()?;

        let role = self.directory.find_role(user_id).await?;
        if role.as_deref() != Some(AppRole::CenterAdmin.as_str()) {
            return Err(AppError::NotFound("Center admin not found".to_string()));
        }
        self.identity.set_password(user_id, &input.new_password).await?;
        tracing::info!(user_id = %user_id, reset_by = %caller.id, "Center admin password reset");
        Ok(())
    }

    /// Grant a role to a pending (roleless) account.
    pub async fn activate_account(
        &self,
        caller: &Principal,
        user_id: Uuid,
        input: &ActivateAccount,
    ) -> Result<ManagedAccount, AppError> {
        require_super_admin(caller)?;

        let identity = self
            .identity
            .find_identity(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;
        if self.directory.find_role(user_id).await?.is_some() {
            return Err(AppError::Conflict("Account is already active".to_string()));
        }

        let center_id = match (input.role.is_tenant_scoped(), input.center_id) {
            (true, Some(center_id)) => {
                self.require_center(center_id).await?;
                Some(center_id)
            }
            (true, None) => {
                return Err(AppError::Validation(format!(
                    "center_id is required for role {}",
                    input.role
                )))
            }
            (false, _) => None,
        };

        let existing = self.directory.find_profile(user_id).await?;
        let full_name = existing.and_then(|p| p.full_name);
        self.directory
            .upsert_profile(&Profile {
                user_id,
                email: identity.email.clone(),
                full_name: full_name.clone(),
                center_id,
            })
            .await?;
        self.directory.assign_role(user_id, input.role).await?;

        tracing::info!(
            user_id = %user_id,
            role = %input.role,
            activated_by = %caller.id,
            "Account activated"
        );
        Ok(ManagedAccount {
            user_id,
            email: identity.email,
            full_name,
            role: input.role,
            center_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::center::CenterStatus;

    fn setup() -> (Arc<MemoryStore>, AdminService) {
        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(IdentityService::new(store.clone(), "admin-test-secret", 3600));
        let admin = AdminService::new(identity, store.clone(), store.clone());
        (store, admin)
    }

    fn caller(role: AppRole) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            email: "caller@franchise.test".to_string(),
            display_name: "caller".to_string(),
            role,
            tenant_id: None,
            tenant_name: None,
        }
    }

    fn new_admin(center_id: Uuid) -> CreateCenterAdmin {
        CreateCenterAdmin {
            center_id,
            email: "lead@north.test".to_string(),
            password: "initial-pass".to_string(),
            full_name: "North Lead".to_string(),
        }
    }

    #[tokio::test]
    async fn non_super_admins_are_refused() {
        let (store, admin) = setup();
        let center = store.seed_center("North", "N1", CenterStatus::Active);

        for role in [AppRole::CenterAdmin, AppRole::Student, AppRole::Coordinator] {
            let who = caller(role);
            let err = admin
                .create_center_admin(&who, &new_admin(center.id))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)));

            let err = admin
                .reset_center_admin_password(
                    &who,
                    Uuid::new_v4(),
                    &ResetPassword {
                        new_password: "whatever-123".to_string(),
                    },
                )
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)));

            let err = admin
                .activate_account(
                    &who,
                    Uuid::new_v4(),
                    &ActivateAccount {
                        role: AppRole::Student,
                        center_id: None,
                    },
                )
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)));
        }
    }

    #[tokio::test]
    async fn creates_center_admin_bound_to_center() {
        let (store, admin) = setup();
        let center = store.seed_center("North", "N1", CenterStatus::Active);

        let account = admin
            .create_center_admin(&caller(AppRole::SuperAdmin), &new_admin(center.id))
            .await
            .unwrap();
        assert_eq!(account.role, AppRole::CenterAdmin);
        assert_eq!(
            store.find_role(account.user_id).await.unwrap().as_deref(),
            Some("center_admin")
        );
        let profile = store.find_profile(account.user_id).await.unwrap().unwrap();
        assert_eq!(profile.center_id, Some(center.id));
    }

    #[tokio::test]
    async fn unknown_center_is_rejected() {
        let (_, admin) = setup();
        let err = admin
            .create_center_admin(&caller(AppRole::SuperAdmin), &new_admin(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn password_reset_only_targets_center_admins() {
        let (store, admin) = setup();
        let super_admin = caller(AppRole::SuperAdmin);
        let center = store.seed_center("North", "N1", CenterStatus::Active);
        let account = admin
            .create_center_admin(&super_admin, &new_admin(center.id))
            .await
            .unwrap();
        let reset = ResetPassword {
            new_password: "replacement-1".to_string(),
        };

        admin
            .reset_center_admin_password(&super_admin, account.user_id, &reset)
            .await
            .unwrap();

        store.seed_raw_role(account.user_id, "super_admin");
        let err = admin
            .reset_center_admin_password(&super_admin, account.user_id, &reset)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn activation_is_one_way() {
        let (store, admin) = setup();
        let super_admin = caller(AppRole::SuperAdmin);
        let center = store.seed_center("North", "N1", CenterStatus::Active);
        let pending = admin
            .identity
            .sign_up("new@north.test", "pending-pass")
            .await
            .unwrap();

        let missing_center = admin
            .activate_account(
                &super_admin,
                pending.user_id,
                &ActivateAccount {
                    role: AppRole::CenterAdmin,
                    center_id: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(missing_center, AppError::Validation(_)));

        let activated = admin
            .activate_account(
                &super_admin,
                pending.user_id,
                &ActivateAccount {
                    role: AppRole::CenterAdmin,
                    center_id: Some(center.id),
                },
            )
            .await
            .unwrap();
        assert_eq!(activated.center_id, Some(center.id));

        let again = admin
            .activate_account(
                &super_admin,
                pending.user_id,
                &ActivateAccount {
                    role: AppRole::Student,
                    center_id: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(again, AppError::Conflict(_)));
    }
}
