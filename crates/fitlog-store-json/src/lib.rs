//! Flat-file JSON backend for the fitlog entry store.
//!
//! The whole collection lives in one pretty-printed JSON document. Every
//! append rewrites it in full through a temporary sibling file that is
//! renamed over the canonical path, so readers never see a partial write.
//! Blocking file work runs on tokio's blocking pool.

mod fs;
mod store;

pub use fs::{FileSystem, StdFileSystem};
pub use store::JsonStore;
