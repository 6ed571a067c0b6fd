// apps/payout_console/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use payout_engine::{PayoutError, PipelineError, StoreError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  /// Bad or missing webhook signature.
  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  /// The request conflicts with the current state (already paid, not shipped, account not ready...).
  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Payment Processing Error: {message}")]
  Payment { retryable: bool, message: String },

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: PipelineError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(err) => AppError::Internal(err.to_string()),
    }
  }
}

impl From<PayoutError> for AppError {
  fn from(err: PayoutError) -> Self {
    let message = err.to_string();
    match err {
      PayoutError::InvalidInput(_) => AppError::Validation(message),
      PayoutError::NotFound(_) => AppError::NotFound(message),
      PayoutError::NotEligible { .. }
      | PayoutError::AlreadyPaid { .. }
      | PayoutError::AccountNotReady { .. }
      | PayoutError::InvalidTransition { .. } => AppError::Conflict(message),
      PayoutError::Processor { retryable, .. } => AppError::Payment { retryable, message },
      PayoutError::TransferNotRecorded { .. } => AppError::Payment {
        retryable: true,
        message,
      },
      PayoutError::Storage(StoreError::Conflict(_)) => AppError::Conflict(message),
      PayoutError::Storage(StoreError::NotFound(_)) => AppError::NotFound(message),
      PayoutError::Storage(StoreError::Backend(_)) => AppError::Internal(message),
      PayoutError::Pipeline(source) => AppError::Workflow { source },
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::Payment { retryable: true, .. } => StatusCode::SERVICE_UNAVAILABLE,
      AppError::Payment { retryable: false, .. } => StatusCode::PAYMENT_REQUIRED,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Workflow { .. } | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, "Responding with error");
    }
    let body = match self {
      AppError::Payment { retryable, message } => json!({"error": message, "retryable": retryable}),
      AppError::Sqlx(_) => json!({"error": "Database operation failed"}),
      AppError::Config(m) => json!({"error": "Configuration issue", "detail": m}),
      AppError::Workflow { source } => json!({"error": "Workflow processing error", "detail": source.to_string()}),
      AppError::Internal(m) => json!({"error": "An internal error occurred", "detail": m}),
      AppError::Validation(m) | AppError::Auth(m) | AppError::NotFound(m) | AppError::Conflict(m) => {
        json!({"error": m})
      }
    };
    HttpResponse::build(status).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
