//! Bearer token middleware.
//!
//! Reads the access token from `Authorization: Bearer <token>` or, failing that, the `spg_access_token` header. A
//! valid token's claims are inserted into the request extensions. Requests with a missing or invalid token are
//! rejected with 401 Unauthorized before they reach a handler.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;
use spg_common::Secret;

use crate::{
    auth::validate_token,
    errors::{AuthError, ServerError},
};

pub const ACCESS_TOKEN_HEADER: &str = "spg_access_token";

pub struct JwtMiddlewareFactory {
    secret: Secret<String>,
}

impl JwtMiddlewareFactory {
    pub fn new(secret: Secret<String>) -> Self {
        Self { secret }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = JwtMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtMiddlewareService { secret: self.secret.clone(), service: Rc::new(service) })
    }
}

pub struct JwtMiddlewareService<S> {
    secret: Secret<String>,
    service: Rc<S>,
}

fn extract_token(req: &ServiceRequest) -> Option<String> {
    let headers = req.headers();
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());
    bearer
        .or_else(|| headers.get(ACCESS_TOKEN_HEADER).and_then(|v| v.to_str().ok()).map(|t| t.trim().to_string()))
        .filter(|t| !t.is_empty())
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.secret.clone();
        Box::pin(async move {
            let Some(token) = extract_token(&req) else {
                debug!("🔑️ No access token on request to {}", req.path());
                return Err(ServerError::AuthenticationError(AuthError::MissingToken).into());
            };
            match validate_token(&token, secret.reveal()) {
                Ok(claims) => {
                    trace!("🔑️ {} authenticated as {:?}", claims.username, claims.roles);
                    req.extensions_mut().insert(claims);
                    service.call(req).await
                },
                Err(e) => {
                    info!("🔑️ Rejected access token on request to {}. {e}", req.path());
                    Err(ServerError::AuthenticationError(e).into())
                },
            }
        })
    }
}
