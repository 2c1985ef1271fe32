//! API error type, response envelope, and [`axum::response::IntoResponse`]
//! implementation.
//!
//! Every body carries `success`. Failures add `error` and, for validation
//! failures only, `details`. Persistence and internal causes are logged here
//! and never sent to the caller.

use std::any::Any;

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use fitlog_core::{Error, validate::ValidationErrors};
use serde::Serialize;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] Error),

  #[error("method not allowed")]
  MethodNotAllowed,
}

/// The failure envelope.
#[derive(Debug, Serialize)]
pub struct Failure {
  pub success: bool,
  pub error:   String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub details: Option<ValidationErrors>,
}

fn failure(status: StatusCode, error: impl Into<String>) -> Response {
  let body = Failure { success: false, error: error.into(), details: None };
  (status, Json(body)).into_response()
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::MethodNotAllowed => {
        failure(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
      }
      ApiError::Core(Error::MalformedRequest(reason)) => {
        tracing::debug!(%reason, "rejected malformed request body");
        failure(StatusCode::BAD_REQUEST, "Invalid JSON")
      }
      ApiError::Core(Error::Validation(details)) => {
        let body = Failure {
          success: false,
          error:   "Validation failed".to_string(),
          details: Some(details),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
      }
      ApiError::Core(Error::DuplicateDate(date)) => failure(
        StatusCode::CONFLICT,
        format!("Entry already exists for date {date}"),
      ),
      ApiError::Core(Error::Persistence(e)) => {
        tracing::error!(error = %e, "failed to save entry");
        failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save entry")
      }
      ApiError::Core(Error::Internal(e)) => {
        tracing::error!(error = %e, "internal error");
        failure(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
      }
    }
  }
}

/// Response for a handler that panicked. Used with
/// [`tower_http::catch_panic::CatchPanicLayer::custom`].
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
  let detail = panic
    .downcast_ref::<String>()
    .map(String::as_str)
    .or_else(|| panic.downcast_ref::<&str>().copied())
    .unwrap_or("unknown panic payload");
  tracing::error!(panic = detail, "handler panicked");
  failure(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}
