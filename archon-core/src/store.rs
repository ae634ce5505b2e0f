//! File-backed task store.
//!
//! One JSON array in one file, every operation a whole-file
//! read-modify-write under a single in-process mutex. Safe for
//! multi-threaded use within one process; nothing guards against other
//! processes writing the same path (documented scope boundary, not a bug).
//!
//! Writes land in a temp file first and are renamed into place, so a crash
//! mid-write cannot leave the store truncated.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::StoreError;
use crate::task::Task;

pub struct FileTaskStore {
    inner: Mutex<StoreInner>,
}

struct StoreInner {
    path: PathBuf,
}

impl FileTaskStore {
    /// Opens (or initializes) the store at `path`. Parent directories are
    /// created as needed; a missing file starts as an empty array.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                    path: path.clone(),
                    source,
                })?;
            }
        }
        if !path.exists() {
            write_atomic(&path, "[]")?;
        }
        Ok(Self {
            inner: Mutex::new(StoreInner { path }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // The guarded state is just a path; a panic elsewhere cannot leave
        // it inconsistent, so poisoning is recoverable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All records in on-disk order (not guaranteed sorted).
    pub fn list(&self) -> Result<Vec<Task>, StoreError> {
        self.lock().read()
    }

    pub fn get(&self, identifier: &str) -> Result<Task, StoreError> {
        self.lock()
            .read()?
            .into_iter()
            .find(|t| t.identifier == identifier)
            .ok_or_else(|| StoreError::NotFound(identifier.to_string()))
    }

    /// Upsert: any existing record with the same identifier is replaced.
    pub fn save(&self, task: Task) -> Result<Task, StoreError> {
        let inner = self.lock();
        let mut tasks = inner.read()?;
        tasks.retain(|t| t.identifier != task.identifier);
        tasks.push(task.clone());
        inner.write(&tasks)?;
        Ok(task)
    }

    /// No-op (not an error) when the identifier is absent.
    pub fn delete(&self, identifier: &str) -> Result<(), StoreError> {
        let inner = self.lock();
        let mut tasks = inner.read()?;
        tasks.retain(|t| t.identifier != identifier);
        inner.write(&tasks)
    }

    /// Discards the current collection and writes `tasks` verbatim.
    pub fn replace_all(&self, tasks: &[Task]) -> Result<(), StoreError> {
        self.lock().write(tasks)
    }

    /// Empties the file. Callers wanting a removal count take it from
    /// `list()` beforehand.
    pub fn purge(&self) -> Result<(), StoreError> {
        self.lock().write(&[])
    }
}

impl StoreInner {
    fn read(&self) -> Result<Vec<Task>, StoreError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, tasks: &[Task]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(tasks).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        write_atomic(&self.path, &json)?;
        tracing::debug!(path = %self.path.display(), count = tasks.len(), "wrote task store");
        Ok(())
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents).map_err(|source| StoreError::Io {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}
