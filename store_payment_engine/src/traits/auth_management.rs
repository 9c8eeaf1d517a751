use thiserror::Error;

use crate::db_types::{Roles, UserAccount, UserId};

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User {0} does not exist")]
    UserNotFound(String),
    #[error("Invalid username. {0}")]
    InvalidUsername(String),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}

/// The outcome of [`AuthManagement::create_admin_if_missing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedResult {
    Created(UserAccount),
    /// An administrator already existed. Nothing was changed.
    AlreadyExists(UserAccount),
}

impl SeedResult {
    pub fn account(&self) -> &UserAccount {
        match self {
            SeedResult::Created(a) | SeedResult::AlreadyExists(a) => a,
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait AuthManagement {
    async fn fetch_user_by_username(&self, username: &str) -> Result<Option<UserAccount>, AuthApiError>;

    async fn fetch_roles_for_user(&self, user_id: UserId) -> Result<Roles, AuthApiError>;

    /// Creates an administrative user called `username` unless some administrator already exists.
    ///
    /// This must be idempotent: running it any number of times leaves exactly one seeded administrator.
    async fn create_admin_if_missing(&self, username: &str) -> Result<SeedResult, AuthApiError>;
}
