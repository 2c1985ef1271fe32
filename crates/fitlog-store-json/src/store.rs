//! [`JsonStore`], the flat-file implementation of [`EntryStore`].

use std::{
  ffi::OsString,
  path::{Path, PathBuf},
  sync::{Arc, Mutex, PoisonError},
};

use chrono::{DateTime, Utc};
use fitlog_core::{
  Error, PersistenceError, Result,
  entry::{Document, Entry, NewEntry},
  store::EntryStore,
};
use uuid::Uuid;

use crate::fs::{FileSystem, StdFileSystem};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An entry store backed by a single JSON document on disk.
///
/// Cloning is cheap; clones share the same write lock. Every operation takes
/// that lock, so the read-check-write in [`EntryStore::append`] is serialised
/// within the process.
pub struct JsonStore<F: FileSystem = StdFileSystem> {
  inner: Arc<Inner<F>>,
}

impl<F: FileSystem> Clone for JsonStore<F> {
  fn clone(&self) -> Self { Self { inner: Arc::clone(&self.inner) } }
}

struct Inner<F> {
  path:      PathBuf,
  temp_path: PathBuf,
  fs:        F,
  lock:      Mutex<()>,
}

impl JsonStore {
  /// A store for the document at `path`. Nothing is touched on disk until
  /// the first read or append.
  pub fn open(path: impl Into<PathBuf>) -> Self { Self::with_fs(path, StdFileSystem) }
}

impl<F: FileSystem> JsonStore<F> {
  pub fn with_fs(path: impl Into<PathBuf>, fs: F) -> Self {
    let path = path.into();
    let temp_path = sibling(&path, ".tmp");
    Self {
      inner: Arc::new(Inner { path, temp_path, fs, lock: Mutex::new(()) }),
    }
  }

  /// The canonical document path.
  pub fn path(&self) -> &Path { &self.inner.path }

  /// Run `op` on the blocking pool while holding the store lock.
  async fn locked<T, Op>(&self, op: Op) -> Result<T>
  where
    T: Send + 'static,
    Op: FnOnce(&Inner<F>) -> Result<T> + Send + 'static,
  {
    let inner = Arc::clone(&self.inner);
    tokio::task::spawn_blocking(move || {
      // A panic mid-operation cannot leave the file half-written, so a
      // poisoned lock is still safe to take.
      let _guard = inner.lock.lock().unwrap_or_else(PoisonError::into_inner);
      op(&*inner)
    })
    .await
    .map_err(|e| Error::Internal(format!("store task failed: {e}")))?
  }
}

// ─── EntryStore impl ─────────────────────────────────────────────────────────

impl<F: FileSystem> EntryStore for JsonStore<F> {
  async fn read_all(&self) -> Result<Document> {
    self
      .locked(|inner| {
        let now = Utc::now();
        Ok(inner.load(now).unwrap_or_else(|e| {
          tracing::error!(
            path = %inner.path.display(),
            error = %e,
            "failed to read stored document; serving an empty one"
          );
          Document::empty(now)
        }))
      })
      .await
  }

  async fn append(&self, entry: NewEntry) -> Result<Entry> {
    self.locked(move |inner| inner.append(entry, Utc::now())).await
  }
}

// ─── Blocking operations ─────────────────────────────────────────────────────

impl<F: FileSystem> Inner<F> {
  /// Read the document, reinitialising it if it is missing or unparseable.
  ///
  /// A file that exists but cannot be read is an error and is never
  /// overwritten.
  fn load(&self, now: DateTime<Utc>) -> Result<Document, PersistenceError> {
    let bytes = self
      .fs
      .read(&self.path)
      .map_err(|source| PersistenceError::ReadFailed {
        path: self.path.clone(),
        source,
      })?;

    match bytes {
      Some(bytes) => match Document::from_stored(&bytes) {
        Ok(stored) => {
          if !stored.skipped.is_empty() {
            for skipped in &stored.skipped {
              tracing::warn!(
                path = %self.path.display(),
                index = skipped.index,
                error = %skipped.error,
                "skipping unreadable entry"
              );
            }
            self.preserve_corrupt(&bytes, now);
            self.persist_logged(&stored.document);
          }
          return Ok(stored.document);
        }
        Err(e) => {
          tracing::warn!(
            path = %self.path.display(),
            error = %e,
            "stored document is corrupt; reinitialising"
          );
          self.preserve_corrupt(&bytes, now);
        }
      },
      None => {
        tracing::info!(path = %self.path.display(), "creating new document");
      }
    }

    let document = Document::empty(now);
    self.persist_logged(&document);
    Ok(document)
  }

  /// [`Self::persist`] for recovery paths, where failing to write is logged
  /// and the in-memory document is still served.
  fn persist_logged(&self, document: &Document) {
    if let Err(e) = self.persist(document) {
      tracing::error!(
        path = %self.path.display(),
        error = %e,
        "failed to persist recovered document"
      );
    }
  }

  fn append(&self, candidate: NewEntry, now: DateTime<Utc>) -> Result<Entry> {
    let mut document = self.load(now)?;

    if document.find_by_date(candidate.date).is_some() {
      return Err(Error::DuplicateDate(candidate.date));
    }

    let entry = candidate.into_entry(Uuid::new_v4().to_string(), now);
    document.push(entry.clone());
    self.persist(&document)?;

    tracing::debug!(id = %entry.id, date = %entry.date, "appended entry");
    Ok(entry)
  }

  /// Serialise `document` to the temporary file and rename it over the
  /// canonical path. On any failure the canonical file is left as it was.
  fn persist(&self, document: &Document) -> Result<(), PersistenceError> {
    let json =
      serde_json::to_vec_pretty(document).map_err(PersistenceError::EncodeFailed)?;

    if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
      self
        .fs
        .create_dir_all(dir)
        .map_err(|source| PersistenceError::WriteFailed {
          path: dir.to_path_buf(),
          source,
        })?;
    }

    if let Err(source) = self.fs.write(&self.temp_path, &json) {
      self.discard_temp();
      return Err(PersistenceError::WriteFailed {
        path: self.temp_path.clone(),
        source,
      });
    }

    if let Err(source) = self.fs.rename(&self.temp_path, &self.path) {
      self.discard_temp();
      return Err(PersistenceError::RenameFailed {
        from: self.temp_path.clone(),
        to: self.path.clone(),
        source,
      });
    }

    Ok(())
  }

  /// Best-effort removal of an orphaned temporary file.
  fn discard_temp(&self) {
    if let Err(e) = self.fs.remove_file(&self.temp_path) {
      tracing::debug!(
        path = %self.temp_path.display(),
        error = %e,
        "could not remove temporary file"
      );
    }
  }

  /// Keep a copy of a document that is about to lose data, next to the
  /// canonical one and stamped with `now`. Best-effort.
  fn preserve_corrupt(&self, bytes: &[u8], now: DateTime<Utc>) {
    let suffix = format!(".corrupt-{}", now.format("%Y%m%dT%H%M%S%.3fZ"));
    let backup = sibling(&self.path, &suffix);
    match self.fs.write(&backup, bytes) {
      Ok(()) => tracing::warn!(path = %backup.display(), "saved corrupt document"),
      Err(e) => tracing::warn!(
        path = %backup.display(),
        error = %e,
        "could not save corrupt document"
      ),
    }
  }
}

/// `path` with `suffix` appended to its file name (`entries.json.tmp`).
fn sibling(path: &Path, suffix: &str) -> PathBuf {
  let mut name = OsString::from(path.as_os_str());
  name.push(suffix);
  PathBuf::from(name)
}
