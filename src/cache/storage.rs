//! Cache storage trait and filesystem implementation.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A stored response.
#[derive(Debug, Clone)]
pub struct CachedEntry {
  /// The raw response exactly as it was written
  pub response: Value,
  /// When the entry was written
  pub cached_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Error)]
pub enum StorageError {
  #[error("failed to create cache directory {path}: {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
  #[error("failed to read cache entry {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
  #[error("corrupt cache entry {path}: {source}")]
  Corrupt {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
  #[error("failed to serialize cache entry {path}: {source}")]
  Serialize {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
  #[error("failed to write cache entry {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Trait for cache storage backends.
///
/// Entries are addressed by the file stem of a [`super::QueryKey`].
pub trait CacheStorage: Send + Sync {
  /// Read an entry. `Ok(None)` means no entry exists.
  fn read(&self, stem: &str) -> Result<Option<CachedEntry>, StorageError>;

  /// Store an entry, replacing any previous one.
  fn write(&self, stem: &str, response: &Value) -> Result<(), StorageError>;
}

/// One JSON file per key under a single directory.
#[derive(Debug, Clone)]
pub struct FsStorage {
  dir: PathBuf,
}

impl FsStorage {
  /// Open storage rooted at `dir`, creating the directory if absent.
  pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
    let storage = Self { dir: dir.into() };
    storage.ensure_dir()?;
    Ok(storage)
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  fn entry_path(&self, stem: &str) -> PathBuf {
    self.dir.join(format!("{stem}.json"))
  }

  // create_dir_all tolerates a concurrent creator, so this is safe to call on every write
  fn ensure_dir(&self) -> Result<(), StorageError> {
    fs::create_dir_all(&self.dir).map_err(|source| StorageError::CreateDir {
      path: self.dir.clone(),
      source,
    })
  }
}

impl CacheStorage for FsStorage {
  fn read(&self, stem: &str) -> Result<Option<CachedEntry>, StorageError> {
    let path = self.entry_path(stem);

    let bytes = match fs::read(&path) {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(source) => return Err(StorageError::Read { path, source }),
    };

    let response =
      serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt {
        path: path.clone(),
        source,
      })?;

    let cached_at = fs::metadata(&path)
      .and_then(|meta| meta.modified())
      .ok()
      .map(DateTime::<Utc>::from);

    Ok(Some(CachedEntry {
      response,
      cached_at,
    }))
  }

  fn write(&self, stem: &str, response: &Value) -> Result<(), StorageError> {
    self.ensure_dir()?;
    let path = self.entry_path(stem);

    let bytes = serde_json::to_vec(response).map_err(|source| StorageError::Serialize {
      path: path.clone(),
      source,
    })?;

    write_atomic(&path, &bytes).map_err(|source| StorageError::Write { path, source })
  }
}

/// Write a file atomically: write to a sibling temp file, then rename over the target.
///
/// A reader (or a cancelled run) never observes a partially written file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
  let mut temp_name = path.as_os_str().to_owned();
  temp_name.push(format!(".{}.tmp", std::process::id()));
  let temp_path = PathBuf::from(temp_name);

  let result = (|| {
    let mut file = File::create(&temp_path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    fs::rename(&temp_path, path)
  })();

  if result.is_err() {
    let _ = fs::remove_file(&temp_path);
  }
  result
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use tempfile::tempdir;

  #[test]
  fn test_missing_entry_is_none() {
    let dir = tempdir().unwrap();
    let storage = FsStorage::open(dir.path()).unwrap();

    assert!(storage.read("s3-list_buckets-us-east-1-abc").unwrap().is_none());
  }

  #[test]
  fn test_round_trip_preserves_iso_timestamps() {
    let dir = tempdir().unwrap();
    let storage = FsStorage::open(dir.path()).unwrap();
    let response = json!([
      { "Name": "logs", "CreationDate": "2019-03-04T05:06:07+00:00" },
      { "Name": "assets", "CreationDate": "2021-11-30T23:59:59.123000+00:00" }
    ]);

    storage.write("s3-list_buckets-us-east-1-abc", &response).unwrap();
    let entry = storage.read("s3-list_buckets-us-east-1-abc").unwrap().unwrap();

    assert_eq!(entry.response, response);
    assert_eq!(
      entry.response[0]["CreationDate"],
      "2019-03-04T05:06:07+00:00"
    );
    assert!(entry.cached_at.is_some());
  }

  #[test]
  fn test_corrupt_entry_is_an_error() {
    let dir = tempdir().unwrap();
    let storage = FsStorage::open(dir.path()).unwrap();
    fs::write(dir.path().join("sqs-list_queues-eu-west-1-abc.json"), "{\"Queue").unwrap();

    let err = storage.read("sqs-list_queues-eu-west-1-abc").unwrap_err();
    assert!(matches!(err, StorageError::Corrupt { .. }));
  }

  #[test]
  fn test_write_leaves_no_temp_files() {
    let dir = tempdir().unwrap();
    let storage = FsStorage::open(dir.path()).unwrap();

    storage.write("a", &json!({"x": 1})).unwrap();
    storage.write("a", &json!({"x": 2})).unwrap();

    let names: Vec<String> = fs::read_dir(dir.path())
      .unwrap()
      .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
      .collect();
    assert_eq!(names, vec!["a.json".to_string()]);
    assert_eq!(storage.read("a").unwrap().unwrap().response, json!({"x": 2}));
  }

  #[test]
  fn test_write_recreates_cleared_directory() {
    let dir = tempdir().unwrap();
    let cache_dir = dir.path().join("cache");
    let storage = FsStorage::open(&cache_dir).unwrap();
    assert!(cache_dir.is_dir());

    fs::remove_dir_all(&cache_dir).unwrap();
    storage.write("b", &json!({})).unwrap();

    assert!(cache_dir.join("b.json").exists());
  }
}
