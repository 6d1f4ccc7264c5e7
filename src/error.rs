use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Map, Value};

use crate::tenancy::gate::{TENANT_REQUIRED_ERROR, TENANT_REQUIRED_MESSAGE};

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Forbidden(String),
    BadRequest(String),
    Conflict(String),
    TenantRequired,
    Internal(String),
    Database(sqlx::Error),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            AppError::TenantRequired => write!(f, "Bad Request: {TENANT_REQUIRED_ERROR}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            AppError::Database(err) => write!(f, "Database Error: {err}"),
        }
    }
}

impl AppError {
    /// Status code and caller-visible message. Internal details are logged, not returned.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::TenantRequired => {
                (StatusCode::BAD_REQUEST, TENANT_REQUIRED_ERROR.to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        }
    }

    /// Render this error in the `{ <entity>, success, errors }` shape used by mutations.
    pub fn in_mutation(self, entity: &'static str) -> MutationError {
        MutationError {
            entity,
            error: self,
        }
    }

    /// Map a failed insert/update, turning constraint violations into caller errors.
    pub fn from_write(err: sqlx::Error, conflict: &str, missing: &str) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound(missing.to_string()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(conflict.to_string())
            }
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound(missing.to_string())
            }
            _ => AppError::Database(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::TenantRequired = self {
            let body = json!({
                "error": TENANT_REQUIRED_ERROR,
                "message": TENANT_REQUIRED_MESSAGE,
            });
            return (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();
        }

        let (status, message) = self.status_and_message();
        let body = json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

/// A failed mutation. Keeps the status of the underlying error class.
#[derive(Debug)]
pub struct MutationError {
    entity: &'static str,
    error: AppError,
}

impl IntoResponse for MutationError {
    fn into_response(self) -> Response {
        if let AppError::TenantRequired = self.error {
            return self.error.into_response();
        }

        let (status, message) = self.error.status_and_message();
        let mut body = Map::new();
        body.insert(self.entity.to_string(), Value::Null);
        body.insert("success".to_string(), Value::Bool(false));
        body.insert("errors".to_string(), json!([message]));
        (status, axum::Json(Value::Object(body))).into_response()
    }
}
