//! JSON HTTP API for fitlog.
//!
//! Exposes an axum [`Router`] backed by any [`fitlog_core::store::EntryStore`].
//! CORS, cache headers and transport concerns are the caller's
//! responsibility; the router only needs method, body and headers forwarded
//! unchanged.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", fitlog_api::api_router(store.clone()))
//! ```

pub mod entries;
pub mod error;

use std::sync::Arc;

use axum::{Router, routing::get};
use fitlog_core::store::EntryStore;
use tower_http::catch_panic::CatchPanicLayer;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type. A panicking handler yields a 500 envelope instead
/// of tearing down the connection.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: EntryStore + 'static,
{
  Router::new()
    .route(
      "/entries",
      get(entries::list::<S>)
        .post(entries::create::<S>)
        // `get` would otherwise answer HEAD too.
        .head(entries::method_not_allowed)
        .fallback(entries::method_not_allowed),
    )
    .layer(CatchPanicLayer::custom(error::panic_response))
    .with_state(store)
}

// ─── Integration tests ────────────────────────────────────────────────────────
