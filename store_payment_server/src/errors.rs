use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    web,
    HttpResponse,
};
use log::error;
use store_payment_engine::{
    provider::ProviderError as PaymentProviderError,
    AccountApiError,
    AuthApiError,
    InventoryApiError,
    PaymentGatewayError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    PaymentGateway(#[from] PaymentGatewayError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
                AuthError::AccountNotFound => StatusCode::FORBIDDEN,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::PaymentGateway(e) => gateway_status_code(e),
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("💻️ {self}");
        }
        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

/// Rejected bodies, query strings and path segments are reported as [`ServerError::InvalidRequestBody`], so that they
/// get the same JSON error body as every other failure.
pub fn configure_extractor_errors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default().error_handler(|e, _req| ServerError::InvalidRequestBody(e.to_string()).into()),
    )
    .app_data(web::QueryConfig::default().error_handler(|e, _req| ServerError::InvalidRequestBody(e.to_string()).into()))
    .app_data(web::PathConfig::default().error_handler(|e, _req| ServerError::InvalidRequestBody(e.to_string()).into()));
}

fn gateway_status_code(e: &PaymentGatewayError) -> StatusCode {
    use PaymentGatewayError::*;
    match e {
        EmptyOrder
        | InvalidQuantity { .. }
        | AmountOverflow
        | NoActiveStore
        | ProductUnavailable(_)
        | InvalidTransition { .. }
        | AlreadyPaid(_)
        | OrderNotPayable(..)
        | NonPositiveAmount(_)
        | ClientSuppliedAmount
        | CurrencyMismatch { .. }
        | NotRefundable(..)
        | NoLinkedOrder(_)
        | InvalidRefundAmount { .. }
        | InvalidRequest(_) => StatusCode::BAD_REQUEST,
        OrderNotFound(_) | PaymentNotFound(_) => StatusCode::NOT_FOUND,
        Forbidden(_) => StatusCode::FORBIDDEN,
        ProviderError(PaymentProviderError::Unavailable(_)) => StatusCode::BAD_GATEWAY,
        ProviderError(PaymentProviderError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
        DatabaseError(_) | AccountError(_) | InventoryError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Access token has expired.")]
    TokenExpired,
    #[error("Access token signature is invalid. {0}")]
    ValidationError(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("User account not found.")]
    AccountNotFound,
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::UserNotFound(_) => Self::AuthenticationError(AuthError::AccountNotFound),
            AuthApiError::InvalidUsername(_) => Self::InvalidRequestBody(e.to_string()),
            AuthApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::QueryError(s) => Self::InvalidRequestBody(s),
            AccountApiError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
        }
    }
}

impl From<InventoryApiError> for ServerError {
    fn from(e: InventoryApiError) -> Self {
        match e {
            InventoryApiError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
        }
    }
}
