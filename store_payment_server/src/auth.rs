//! Access tokens.
//!
//! Callers identify themselves with an HS256-signed JWT. The [`crate::middleware::JwtMiddlewareFactory`] validates the
//! token on every `/api` request and stores the resulting [`JwtClaims`] in the request extensions, where handlers pick
//! them up as an extractor.
use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::{Duration, Utc};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};
use store_payment_engine::{
    db_types::{Role, Roles, UserAccount, UserId},
    Caller,
};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id
    pub sub: UserId,
    pub username: String,
    pub roles: Roles,
    /// Expiry, in seconds since the Unix epoch
    pub exp: i64,
}

impl JwtClaims {
    pub fn user_id(&self) -> UserId {
        self.sub
    }

    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }

    pub fn caller(&self) -> Caller {
        if self.is_admin() {
            Caller::admin(self.sub)
        } else {
            Caller::user(self.sub)
        }
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned().ok_or_else(|| {
            warn!("🔑️ A handler asked for JWT claims, but the request was not authenticated");
            ServerError::AuthenticationError(AuthError::MissingToken)
        });
        ready(claims)
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        Self { encoding_key, lifetime: config.token_lifetime }
    }

    /// Issue a new access token for the given account. The account's roles are copied into the token, so role changes
    /// only take effect once the holder gets a new token.
    pub fn issue_token(&self, account: &UserAccount, lifetime: Option<Duration>) -> Result<String, AuthError> {
        let lifetime = lifetime.unwrap_or(self.lifetime);
        let claims = JwtClaims {
            sub: account.id,
            username: account.username.clone(),
            roles: account.roles(),
            exp: (Utc::now() + lifetime).timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        debug!("🔑️ Issued access token for {} valid for {} minutes", account.username, lifetime.num_minutes());
        Ok(token)
    }
}

pub fn validate_token(token: &str, secret: &str) -> Result<JwtClaims, AuthError> {
    let data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidSignature => AuthError::ValidationError(e.to_string()),
        _ => AuthError::PoorlyFormattedToken(e.to_string()),
    })?;
    Ok(data.claims)
}
