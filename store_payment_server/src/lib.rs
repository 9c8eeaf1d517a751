//! # Store payment server
//! The HTTP front end of the store payment engine. It is responsible for:
//! * Authenticating callers from a bearer access token.
//! * Translating requests into engine calls on behalf of the authenticated caller.
//! * Mapping engine errors onto HTTP status codes.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/orders`, `/api/orders/{id}`, `/api/orders/{id}/cancel`, `/api/orders/{id}/pay`
//! * `/api/payments`, `/api/payments/{id}`, `/api/payments/{id}/refund`
//! * `/api/stores/{store_id}/inventory/{product_id}`
//!
//! Everything under `/api` requires an access token. See [auth](auth/index.html).

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
