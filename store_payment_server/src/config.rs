use std::env;

use chrono::Duration;
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use spg_common::{helpers::parse_boolean_flag, normalize_currency_code, Secret, DEFAULT_CURRENCY_CODE};

use crate::errors::ServerError;

const DEFAULT_SPG_HOST: &str = "127.0.0.1";
const DEFAULT_SPG_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/store_payments.db";
const DEFAULT_MAX_DB_CONNECTIONS: u32 = 25;
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::hours(24);
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Environment variables that are safe to print. Secrets are never listed here.
pub const DISPLAY_ENVS: [&str; 9] = [
    "RUST_LOG",
    "SPG_HOST",
    "SPG_PORT",
    "SPG_DATABASE_URL",
    "SPG_MAX_DB_CONNECTIONS",
    "SPG_TOKEN_LIFETIME_HOURS",
    "SPG_DEFAULT_CURRENCY",
    "SPG_AUTO_MIGRATE",
    "SPG_ADMIN_USERNAME",
];

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_db_connections: u32,
    pub auth: AuthConfig,
    /// The currency assigned to orders that do not name one
    pub default_currency: String,
    /// Run database migrations when the server starts
    pub auto_migrate: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SPG_HOST.to_string(),
            port: DEFAULT_SPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_db_connections: DEFAULT_MAX_DB_CONNECTIONS,
            auth: AuthConfig::default(),
            default_currency: DEFAULT_CURRENCY_CODE.to_string(),
            auto_migrate: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SPG_HOST").ok().unwrap_or_else(|| DEFAULT_SPG_HOST.into());
        let port = env::var("SPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SPG_PORT. {e} Using the default, {DEFAULT_SPG_PORT}, instead."
                    );
                    DEFAULT_SPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SPG_PORT);
        let database_url = env::var("SPG_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ SPG_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_db_connections = env::var("SPG_MAX_DB_CONNECTIONS")
            .ok()
            .and_then(|s| {
                s.parse::<u32>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for SPG_MAX_DB_CONNECTIONS. {e}"))
                    .ok()
            })
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_DB_CONNECTIONS);
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let default_currency = env::var("SPG_DEFAULT_CURRENCY")
            .ok()
            .map(|s| normalize_currency_code(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY_CODE.to_string());
        let auto_migrate = parse_boolean_flag(env::var("SPG_AUTO_MIGRATE").ok(), true);
        Self { host, port, database_url, max_db_connections, auth, default_currency, auto_migrate }
    }
}

pub fn admin_username_from_env() -> String {
    env::var("SPG_ADMIN_USERNAME")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string())
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HMAC secret used to sign and verify access tokens.
    pub jwt_secret: Secret<String>,
    /// How long issued access tokens remain valid
    pub token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. DO NOT operate on \
             production like this, since every access token becomes invalid when the server restarts. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect::<String>();
        Self { jwt_secret: Secret::new(secret), token_lifetime: DEFAULT_TOKEN_LIFETIME }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S, token_lifetime: Duration) -> Self {
        Self { jwt_secret: Secret::new(secret.into()), token_lifetime }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret = env::var("SPG_JWT_SECRET")
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [SPG_JWT_SECRET]")))?;
        if secret.len() < 16 {
            return Err(ServerError::ConfigurationError("SPG_JWT_SECRET must be at least 16 characters".into()));
        }
        let token_lifetime = env::var("SPG_TOKEN_LIFETIME_HOURS")
            .map_err(|_| {
                info!(
                    "🪛️ SPG_TOKEN_LIFETIME_HOURS is not set. Using the default value of {} hrs.",
                    DEFAULT_TOKEN_LIFETIME.num_hours()
                )
            })
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for SPG_TOKEN_LIFETIME_HOURS. {e}"))
                    .and_then(|h| {
                        if h > 0 {
                            Ok(Duration::hours(h))
                        } else {
                            warn!("🪛️ SPG_TOKEN_LIFETIME_HOURS must be positive");
                            Err(())
                        }
                    })
            })
            .ok()
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);
        Ok(Self { jwt_secret: Secret::new(secret), token_lifetime })
    }
}
