use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{StoreId, UserAccount, UserId};

pub async fn fetch_user(id: UserId, conn: &mut SqliteConnection) -> Result<Option<UserAccount>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_user_by_username(
    username: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<UserAccount>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE username = $1").bind(username).fetch_optional(conn).await?;
    Ok(user)
}

/// The earliest-created administrator, if there is one.
pub async fn first_admin(conn: &mut SqliteConnection) -> Result<Option<UserAccount>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE is_admin = 1 ORDER BY id ASC LIMIT 1")
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

/// Inserts an administrator called `username`, but only if no administrator exists yet. Check and insert are one
/// statement, so concurrent seeders cannot create two.
pub async fn insert_admin_if_none(
    username: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<UserAccount>, sqlx::Error> {
    let user: Option<UserAccount> = sqlx::query_as(
        r#"
            INSERT INTO users (username, is_admin)
            SELECT $1, 1
            WHERE NOT EXISTS (SELECT 1 FROM users WHERE is_admin = 1)
            RETURNING *;
        "#,
    )
    .bind(username)
    .fetch_optional(conn)
    .await?;
    if let Some(u) = &user {
        debug!("🗃️ Administrator '{}' created with id {}", u.username, u.id);
    }
    Ok(user)
}

pub async fn insert_user(
    username: &str,
    is_admin: bool,
    store_id: Option<StoreId>,
    conn: &mut SqliteConnection,
) -> Result<UserAccount, sqlx::Error> {
    let user = sqlx::query_as("INSERT INTO users (username, is_admin, store_id) VALUES ($1, $2, $3) RETURNING *")
        .bind(username)
        .bind(is_admin)
        .bind(store_id)
        .fetch_one(conn)
        .await?;
    Ok(user)
}
