use std::{env, env::VarError};

use chrono::Duration;
use clap::{Parser, Subcommand};
use log::*;
use store_payment_engine::{AuthApi, SeedResult, SqliteDatabase};

use crate::{
    auth::TokenIssuer,
    config::{admin_username_from_env, ServerConfig, DISPLAY_ENVS},
    errors::ServerError,
};

#[derive(Parser, Debug)]
#[command(version, about = "Order and payment server for the store back office")]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server. This is the default when no command is given.
    Serve,
    /// Create the administrator account if no administrator exists yet. Running it again changes nothing.
    #[clap(name = "seed-admin")]
    SeedAdmin {
        /// Username for the new administrator. Defaults to SPG_ADMIN_USERNAME, or `admin`.
        #[arg(short = 'u', long = "username")]
        username: Option<String>,
    },
    /// Print an access token for an existing user, signed with SPG_JWT_SECRET
    Token {
        #[arg(required = true, index = 1)]
        username: String,
        /// Token lifetime in hours. Defaults to SPG_TOKEN_LIFETIME_HOURS.
        #[arg(long = "hours")]
        hours: Option<i64>,
    },
    /// Print the current configuration variables, excluding secrets
    Env,
}

async fn open_database(config: &ServerConfig) -> Result<SqliteDatabase, ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 1)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.auto_migrate {
        db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))?;
    }
    Ok(db)
}

pub async fn seed_admin(config: &ServerConfig, username: Option<String>) -> Result<(), ServerError> {
    let username = username.unwrap_or_else(admin_username_from_env);
    let db = open_database(config).await?;
    let api = AuthApi::new(db);
    match api.seed_admin(&username).await? {
        SeedResult::Created(account) => {
            println!("Created administrator {} ({})", account.username, account.id)
        },
        SeedResult::AlreadyExists(account) => {
            println!("An administrator already exists: {} ({}). Nothing was changed.", account.username, account.id)
        },
    }
    Ok(())
}

pub async fn print_token(config: &ServerConfig, username: &str, hours: Option<i64>) -> Result<(), ServerError> {
    if env::var("SPG_JWT_SECRET").is_err() {
        warn!("🔑️ SPG_JWT_SECRET is not set. The token will not be accepted by any running server.");
    }
    let lifetime = match hours {
        Some(h) if h > 0 => Some(Duration::hours(h)),
        Some(h) => return Err(ServerError::ConfigurationError(format!("Token lifetime must be positive, not {h}"))),
        None => None,
    };
    let db = open_database(config).await?;
    let account = AuthApi::new(db).user_by_username(username).await?;
    let token = TokenIssuer::new(&config.auth).issue_token(&account, lifetime)?;
    println!("{token}");
    Ok(())
}

pub fn display_envs() {
    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    });
    let secret = if env::var("SPG_JWT_SECRET").is_ok() { "Set (hidden)" } else { "Not set" };
    println!("  {:<35} {secret:<15}", "SPG_JWT_SECRET");
}
