//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Machine code for a filter that cannot be derived (bad blacklist or strict `where`).
pub const E_WHERE_CLAUSE_UNPARSEABLE: &str = "E_WHERE_CLAUSE_UNPARSEABLE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid `criteria.blacklist`. Should be an array of strings (parameter names), got {0}")]
    InvalidBlacklist(&'static str),
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("duplicate {kind}: {id}")]
    Duplicate { kind: &'static str, id: String },
    #[error("invalid limit for {0}: must be a positive integer")]
    InvalidLimit(String),
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not parse `where` parameter: {0}")]
    WhereClauseUnparseable(String),
    #[error("unknown entity type '{0}' referenced by relation '{1}'")]
    MissingEntityType(String, String),
    #[error("subscription: {0}")]
    Subscription(String),
    #[error("internal: {0}")]
    Internal(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Stable code surfaced to clients in the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(ConfigError::InvalidBlacklist(_)) => E_WHERE_CLAUSE_UNPARSEABLE,
            AppError::Config(_) => "config_error",
            AppError::WhereClauseUnparseable(_) => E_WHERE_CLAUSE_UNPARSEABLE,
            AppError::MissingEntityType(..) => "missing_entity_type",
            AppError::Subscription(_) => "subscription_error",
            AppError::Internal(_) => "internal_error",
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::MissingEntityType(..) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::WhereClauseUnparseable(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Subscription(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
