//! Temp Store - unique temporary paths that clean up after themselves.
//!
//! The [`TempStore`] owns one root directory under the platform temp dir.
//! Every file or directory it hands out lives under that root and is removed
//! when its handle drops; the root itself goes away with the store.
//!
//! [`TempStore::shared`] hands every caller in the process the same store
//! for a given parent directory, so all managers there share one root.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::Mutex;
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::common::config::{MAX_SUFFIX_LEN, MIN_SUFFIX_LEN, ROOT_DIR_PREFIX, SUFFIX_LEN_STEP};
use crate::common::{CacheError, Result};

/// Live shared stores by parent directory.
static SHARED_STORES: Lazy<Mutex<HashMap<PathBuf, Weak<TempStore>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// How [`TempStore::make_file`] opens the new file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Write,
    ReadWrite,
}

/// Allocates uniquely named temporary files and directories.
///
/// # Naming
/// ```text
/// {parent}/residency-XXXX/            root, created on first use
/// {parent}/residency-XXXX/dump-YYYY   file from make_file("dump-", ..)
/// ```
/// A name collision retries with a suffix two characters longer, from 4 up
/// to 64 random alphanumeric characters.
///
/// # Thread Safety
/// The root is created at most once (`OnceCell`); all other operations only
/// touch the filesystem, so the store is `Send + Sync`.
pub struct TempStore {
    /// Directory the root is created in.
    parent: PathBuf,

    /// The root, created lazily.
    root: OnceCell<PathBuf>,
}

impl TempStore {
    /// Create a store rooted under the platform temp dir.
    pub fn new() -> Self {
        Self::with_parent(std::env::temp_dir())
    }

    /// Create a store rooted under `parent`.
    pub fn with_parent(parent: impl Into<PathBuf>) -> Self {
        Self {
            parent: parent.into(),
            root: OnceCell::new(),
        }
    }

    /// Directory the root is created in.
    pub fn parent(&self) -> &Path {
        &self.parent
    }

    /// The process-wide store for `parent`.
    ///
    /// Callers asking for the same parent get the same store until the last
    /// of them drops it, which removes the root. A later call starts a new
    /// root.
    pub fn shared(parent: impl Into<PathBuf>) -> Arc<TempStore> {
        let parent = parent.into();
        let mut stores = SHARED_STORES.lock();
        if let Some(store) = stores.get(&parent).and_then(Weak::upgrade) {
            return store;
        }

        stores.retain(|_, store| store.strong_count() > 0);
        let store = Arc::new(TempStore::with_parent(parent.clone()));
        stores.insert(parent, Arc::downgrade(&store));
        store
    }

    /// Return the root directory, creating it on first call.
    ///
    /// # Errors
    /// - `CacheError::TempAllocation` if no free root name is found
    /// - `CacheError::Io` if the parent directory is unusable
    pub fn shared_root(&self) -> Result<&Path> {
        let root = self.root.get_or_try_init(|| {
            let root = create_unique(&self.parent, ROOT_DIR_PREFIX, |path| {
                fs::create_dir(path)
            })?;
            tracing::info!(root = %root.display(), "temp root created");
            Ok::<_, CacheError>(root)
        })?;
        Ok(root.as_path())
    }

    /// Create a fresh directory `{root}/{prefix}{random}`.
    pub fn make_subdirectory(&self, prefix: &str) -> Result<TempDir> {
        let root = self.shared_root()?;
        let path = create_unique(root, prefix, |path| fs::create_dir(path))?;
        Ok(TempDir { path })
    }

    /// Create and open a fresh file `{root}/{prefix}{random}`.
    pub fn make_file(&self, prefix: &str, mode: OpenMode) -> Result<TempFile> {
        let root = self.shared_root()?;
        let mut file = None;
        let path = create_unique(root, prefix, |path| {
            file = Some(
                OpenOptions::new()
                    .read(mode == OpenMode::ReadWrite)
                    .write(true)
                    .create_new(true)
                    .open(path)?,
            );
            Ok(())
        })?;

        match file {
            Some(file) => Ok(TempFile {
                path,
                file: Some(file),
            }),
            None => Err(CacheError::TempAllocation {
                prefix: prefix.to_string(),
            }),
        }
    }
}

impl Default for TempStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TempStore {
    fn drop(&mut self) {
        if let Some(root) = self.root.get() {
            match fs::remove_dir_all(root) {
                Ok(()) => tracing::info!(root = %root.display(), "temp root removed"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(root = %root.display(), error = %e, "failed to remove temp root"),
            }
        }
    }
}

/// A temporary file, deleted when dropped.
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
    file: Option<File>,
}

impl TempFile {
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The open handle, if it has not been closed.
    pub fn file(&mut self) -> Option<&mut File> {
        self.file.as_mut()
    }

    /// Close the handle but keep the file on disk until drop.
    pub fn close(&mut self) {
        self.file = None;
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        // Some platforms refuse to delete open files.
        self.file = None;
        remove_best_effort(&self.path, fs::remove_file(&self.path));
    }
}

/// A temporary directory, removed with its contents when dropped.
#[derive(Debug)]
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        remove_best_effort(&self.path, fs::remove_dir_all(&self.path));
    }
}

fn remove_best_effort(path: &Path, result: io::Result<()>) {
    match result {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove temp path"),
    }
}

fn random_suffix(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Try `create` on `{dir}/{prefix}{suffix}` with growing suffixes.
///
/// Only `AlreadyExists` counts as a collision; any other error aborts.
fn create_unique<F>(dir: &Path, prefix: &str, mut create: F) -> Result<PathBuf>
where
    F: FnMut(&Path) -> io::Result<()>,
{
    let mut len = MIN_SUFFIX_LEN;
    while len <= MAX_SUFFIX_LEN {
        let path = dir.join(format!("{}{}", prefix, random_suffix(len)));
        match create(&path) {
            Ok(()) => return Ok(path),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                tracing::debug!(path = %path.display(), "temp name collision");
                len += SUFFIX_LEN_STEP;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(CacheError::TempAllocation {
        prefix: prefix.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_shared_root_is_idempotent() {
        let parent = tempdir().unwrap();
        let store = TempStore::with_parent(parent.path());

        let a = store.shared_root().unwrap().to_path_buf();
        let b = store.shared_root().unwrap().to_path_buf();
        assert_eq!(a, b);
        assert!(a.is_dir());
        assert!(a.starts_with(parent.path()));
        let name = a.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(ROOT_DIR_PREFIX));
    }

    #[test]
    fn test_shared_store_per_parent() {
        let parent = tempdir().unwrap();
        let other = tempdir().unwrap();

        let a = TempStore::shared(parent.path());
        let b = TempStore::shared(parent.path());
        let c = TempStore::shared(other.path());
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));

        let root = a.shared_root().unwrap().to_path_buf();
        assert_eq!(b.shared_root().unwrap(), root.as_path());

        drop(a);
        assert!(root.exists());
        drop(b);
        assert!(!root.exists());

        let fresh = TempStore::shared(parent.path());
        assert_ne!(fresh.shared_root().unwrap(), root.as_path());
    }

    #[test]
    fn test_root_removed_on_drop() {
        let parent = tempdir().unwrap();
        let store = TempStore::with_parent(parent.path());
        let root = store.shared_root().unwrap().to_path_buf();
        let file = store.make_file("x-", OpenMode::Write).unwrap();
        std::mem::forget(file); // leak the handle: the root still goes

        drop(store);
        assert!(!root.exists());
    }

    #[test]
    fn test_make_file_naming_and_cleanup() {
        let parent = tempdir().unwrap();
        let store = TempStore::with_parent(parent.path());

        let mut file = store.make_file("dump-", OpenMode::Write).unwrap();
        let path = file.path().to_path_buf();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("dump-"));
        assert_eq!(name.len(), "dump-".len() + MIN_SUFFIX_LEN);
        assert!(name["dump-".len()..].chars().all(|c| c.is_ascii_alphanumeric()));

        file.file().unwrap().write_all(b"abc").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"abc");

        drop(file);
        assert!(!path.exists());
        assert!(store.shared_root().unwrap().exists());
    }

    #[test]
    fn test_make_subdirectory() {
        let parent = tempdir().unwrap();
        let store = TempStore::with_parent(parent.path());

        let dir = store.make_subdirectory("sub-").unwrap();
        let path = dir.path().to_path_buf();
        assert!(path.is_dir());
        fs::write(path.join("inner"), b"1").unwrap();

        drop(dir);
        assert!(!path.exists());
    }

    #[test]
    fn test_closed_file_still_deleted() {
        let parent = tempdir().unwrap();
        let store = TempStore::with_parent(parent.path());

        let mut file = store.make_file("c-", OpenMode::ReadWrite).unwrap();
        file.close();
        assert!(file.file().is_none());
        let path = file.path().to_path_buf();
        assert!(path.exists());
        drop(file);
        assert!(!path.exists());
    }

    #[test]
    fn test_collisions_grow_suffix() {
        let parent = tempdir().unwrap();
        let mut attempts = Vec::new();

        let path = create_unique(parent.path(), "p-", |path| {
            attempts.push(path.to_path_buf());
            if attempts.len() < 3 {
                Err(io::Error::new(io::ErrorKind::AlreadyExists, "taken"))
            } else {
                Ok(())
            }
        })
        .unwrap();

        let lens: Vec<usize> = attempts
            .iter()
            .map(|p| p.file_name().unwrap().len() - "p-".len())
            .collect();
        assert_eq!(lens, vec![4, 6, 8]);
        assert_eq!(path, attempts[2]);
    }

    #[test]
    fn test_exhausted_names_fail() {
        let parent = tempdir().unwrap();
        let mut calls = 0;
        let result = create_unique(parent.path(), "p-", |_| {
            calls += 1;
            Err(io::Error::new(io::ErrorKind::AlreadyExists, "taken"))
        });

        assert!(matches!(result, Err(CacheError::TempAllocation { .. })));
        assert_eq!(calls, (MAX_SUFFIX_LEN - MIN_SUFFIX_LEN) / SUFFIX_LEN_STEP + 1);
    }

    #[test]
    fn test_other_io_errors_abort() {
        let parent = tempdir().unwrap();
        let result = create_unique(parent.path(), "p-", |_| {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "no"))
        });
        assert!(matches!(result, Err(CacheError::Io(_))));
    }

    #[test]
    fn test_thousand_files_are_unique() {
        let parent = tempdir().unwrap();
        let store = TempStore::with_parent(parent.path());

        let files: Vec<TempFile> = (0..1000)
            .map(|_| store.make_file("u-", OpenMode::Write).unwrap())
            .collect();
        let paths: HashSet<PathBuf> = files.iter().map(|f| f.path().to_path_buf()).collect();
        assert_eq!(paths.len(), 1000);
        assert!(paths.iter().all(|p| p.exists()));

        drop(files);
        assert!(paths.iter().all(|p| !p.exists()));
        assert!(store.shared_root().unwrap().exists());
    }
}
