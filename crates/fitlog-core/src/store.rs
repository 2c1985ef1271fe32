//! The `EntryStore` trait.
//!
//! Implemented by storage backends (e.g. `fitlog-store-json`). The API layer
//! depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  Result,
  entry::{Document, Entry, NewEntry},
};

/// A date-keyed, append-only log of daily entries.
///
/// There is no update or delete. All methods return `Send` futures so the
/// trait can be used from a multi-threaded runtime behind `axum`.
pub trait EntryStore: Send + Sync {
  /// Return the full document.
  ///
  /// A missing or unreadable backing document is not an error: the backend
  /// replaces it with an empty one and returns that.
  fn read_all(&self) -> impl Future<Output = Result<Document>> + Send + '_;

  /// Assign `id` and `timestamp`, append, and persist.
  ///
  /// Fails with [`crate::Error::DuplicateDate`] if an entry for the same date
  /// already exists, in which case nothing is written. Implementations must
  /// serialise the read-check-write so two concurrent appends for one date
  /// cannot both succeed.
  fn append(
    &self,
    entry: NewEntry,
  ) -> impl Future<Output = Result<Entry>> + Send + '_;
}
