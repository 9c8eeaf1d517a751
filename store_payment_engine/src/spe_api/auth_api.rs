use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Roles, UserAccount, UserId},
    traits::{AuthApiError, AuthManagement, SeedResult},
};

/// User and role lookups for token issuance, and the default administrator seed.
pub struct AuthApi<B> {
    db: B,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl<B> AuthApi<B>
where B: AuthManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn user_by_username(&self, username: &str) -> Result<UserAccount, AuthApiError> {
        self.db
            .fetch_user_by_username(username)
            .await?
            .ok_or_else(|| AuthApiError::UserNotFound(username.to_string()))
    }

    pub async fn roles_for_user(&self, user_id: UserId) -> Result<Roles, AuthApiError> {
        self.db.fetch_roles_for_user(user_id).await
    }

    /// Creates the administrator `username` if the system has no administrator yet. Running this again is harmless.
    pub async fn seed_admin(&self, username: &str) -> Result<SeedResult, AuthApiError> {
        let result = self.db.create_admin_if_missing(username).await?;
        match &result {
            SeedResult::Created(admin) => info!("🔑️ Administrator '{}' created with id {}", admin.username, admin.id),
            SeedResult::AlreadyExists(admin) => {
                info!("🔑️ An administrator already exists ('{}'). Nothing was changed.", admin.username)
            },
        }
        Ok(result)
    }
}
