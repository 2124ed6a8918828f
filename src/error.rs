use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Semantic error classes surfaced to callers of the return workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    PolicyViolation,
    InvalidInput,
    OutOfStock,
    Conflict,
    DependencyFailure,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("return request {0} not found")]
    RequestNotFound(i64),

    #[error("invalid order {0}")]
    InvalidOrder(i64),

    #[error("product {product_id} not found in order {order_id}")]
    LineItemNotFound { order_id: i64, product_id: i64 },

    #[error("product item {0} not found")]
    ItemNotFound(String),

    #[error("{0}")]
    NotFound(String),

    #[error("return policy '{policy_type}' is not applicable for product {product_id}")]
    PolicyNotApplicable { product_id: i64, policy_type: String },

    #[error("return policy duration of {duration_days} days has been exceeded ({elapsed_days} days since order)")]
    PolicyExpired { duration_days: i32, elapsed_days: i64 },

    #[error("invalid serial number {0}")]
    InvalidSerialNumber(String),

    #[error("no serial number assigned to return request {0}")]
    SerialNumberMissing(i64),

    #[error("invalid process '{0}'")]
    InvalidProcess(String),

    #[error("return request {0} is closed")]
    RequestClosed(i64),

    #[error("{0}")]
    BadRequest(String),

    #[error("product {0} is out of stock for replacement")]
    OutOfStock(i64),

    #[error("return request {0} was modified concurrently")]
    Conflict(i64),

    #[error("return request {0} is under technical review")]
    RequestInReview(i64),

    #[error("{operation} failed: {message}")]
    Dependency {
        operation: &'static str,
        message: String,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::RequestNotFound(_)
            | AppError::InvalidOrder(_)
            | AppError::LineItemNotFound { .. }
            | AppError::ItemNotFound(_)
            | AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::PolicyNotApplicable { .. } | AppError::PolicyExpired { .. } => {
                ErrorKind::PolicyViolation
            }
            AppError::InvalidSerialNumber(_)
            | AppError::SerialNumberMissing(_)
            | AppError::InvalidProcess(_)
            | AppError::RequestClosed(_)
            | AppError::BadRequest(_) => ErrorKind::InvalidInput,
            AppError::OutOfStock(_) => ErrorKind::OutOfStock,
            AppError::Conflict(_) | AppError::RequestInReview(_) => ErrorKind::Conflict,
            AppError::Dependency { .. } | AppError::Database(_) => ErrorKind::DependencyFailure,
        }
    }

    /// Wraps a collaborator failure, keeping not-found errors as they are.
    pub fn dependency(operation: &'static str, err: AppError) -> AppError {
        match err {
            AppError::ItemNotFound(_) | AppError::Dependency { .. } => err,
            other => AppError::Dependency {
                operation,
                message: other.to_string(),
            },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::PolicyViolation | ErrorKind::InvalidInput | ErrorKind::OutOfStock => {
                StatusCode::BAD_REQUEST
            }
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::DependencyFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = Json(serde_json::json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        }));
        (status, body).into_response()
    }
}
