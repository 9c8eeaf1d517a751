//! Access control list middleware.
//!
//! Place it on any route or scope that sits behind [`super::JwtMiddlewareFactory`]. It checks the claims stored by the
//! JWT middleware against the roles the route requires. Callers holding every required role pass through; everyone
//! else gets a 403 Forbidden response.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;
use store_payment_engine::db_types::Role;

use crate::{
    auth::JwtClaims,
    errors::{AuthError, ServerError},
};

pub struct AclMiddlewareFactory {
    required_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(required_roles: &[Role]) -> Self {
        AclMiddlewareFactory { required_roles: required_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AclMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { required_roles: self.required_roles.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    required_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
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
        let required_roles = self.required_roles.clone();
        Box::pin(async move {
            let claims = req.extensions().get::<JwtClaims>().cloned();
            let Some(claims) = claims else {
                warn!("🔑️ No JWT claims found in request extensions. Is the ACL middleware outside the JWT middleware?");
                return Err(ServerError::AuthenticationError(AuthError::MissingToken).into());
            };
            if required_roles.iter().all(|role| claims.roles.contains(role)) {
                service.call(req).await
            } else {
                debug!("🔑️ {} lacks one of the roles {required_roles:?} for {}", claims.username, req.path());
                let missing =
                    required_roles.iter().filter(|r| !claims.roles.contains(*r)).map(|r| r.as_str()).collect::<Vec<_>>();
                Err(ServerError::AuthenticationError(AuthError::InsufficientPermissions(format!(
                    "Required roles: {}",
                    missing.join(", ")
                )))
                .into())
            }
        })
    }
}
