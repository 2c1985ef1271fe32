//! Handlers for the `/entries` endpoint.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/entries` | All stored entries, append order |
//! | `POST` | `/entries` | Body: one day's measurements; returns 201 + stored entry |
//! | other  | `/entries` | 405 |

use std::sync::Arc;

use axum::{
  Json,
  body::Bytes,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use fitlog_core::{Error, entry::Entry, store::EntryStore, validate};
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ListResponse {
  pub success: bool,
  pub entries: Vec<Entry>,
  pub count:   usize,
  pub version: String,
}

/// `GET /entries`
pub async fn list<S>(State(store): State<Arc<S>>) -> Result<Json<ListResponse>, ApiError>
where
  S: EntryStore,
{
  let document = store.read_all().await?;
  Ok(Json(ListResponse {
    success: true,
    count:   document.entries.len(),
    entries: document.entries,
    version: document.version,
  }))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
  pub success: bool,
  pub entry:   Entry,
}

/// `POST /entries`: returns 201 + the stored [`Entry`].
///
/// The body is parsed by hand rather than with the `Json` extractor so that
/// a malformed payload gets the standard failure envelope.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
  S: EntryStore,
{
  let input: Value = serde_json::from_slice(&body)
    .map_err(|e| Error::MalformedRequest(e.to_string()))?;
  let candidate = validate::validate_today(&input)?;
  let entry = store.append(candidate).await?;

  tracing::info!(id = %entry.id, date = %entry.date, "recorded entry");
  Ok((StatusCode::CREATED, Json(CreatedResponse { success: true, entry })))
}

// ─── Anything else ────────────────────────────────────────────────────────────

pub async fn method_not_allowed() -> ApiError { ApiError::MethodNotAllowed }
