//! The filesystem operations the store needs, behind a trait so failures can
//! be injected in tests.

use std::{
  fs::{self, File},
  io::{self, Write as _},
  path::Path,
};

pub trait FileSystem: Send + Sync + 'static {
  /// Read a whole file. `Ok(None)` if it does not exist.
  fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>>;

  /// Create or truncate `path` and write `contents` durably.
  fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

  /// Atomically replace `to` with `from`.
  fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

  fn remove_file(&self, path: &Path) -> io::Result<()>;

  /// Create `path` and any missing parents. Succeeds if it already exists.
  fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
  fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
      Ok(bytes) => Ok(Some(bytes)),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e),
    }
  }

  fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents)?;
    file.sync_all()
  }

  fn rename(&self, from: &Path, to: &Path) -> io::Result<()> { fs::rename(from, to) }

  fn remove_file(&self, path: &Path) -> io::Result<()> { fs::remove_file(path) }

  #[cfg(unix)]
  fn create_dir_all(&self, path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt as _;
    fs::DirBuilder::new().recursive(true).mode(0o775).create(path)
  }

  #[cfg(not(unix))]
  fn create_dir_all(&self, path: &Path) -> io::Result<()> { fs::create_dir_all(path) }
}
