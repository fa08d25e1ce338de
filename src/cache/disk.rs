//! Disk Cache Module
//!
//! Filesystem-backed store: one regular file per key under a root directory,
//! with an in-memory index of the files believed present.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glob::Pattern;
use tokio::fs::{self, DirBuilder, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::cache::stats::StatsRecorder;
use crate::cache::{fill_or_not_found, wildcard_prefix, Cache, CacheStats, Filler, Object};
use crate::error::{CacheError, Result};

// == Disk Cache ==
/// Cache that persists each object as `root/<key>`.
///
/// The index maps absolute file paths to their last written size. It only
/// decides hit or miss before the filesystem is touched; a file that vanished
/// behind the index's back is treated as a miss.
#[derive(Debug)]
pub struct DiskCache {
    root: PathBuf,
    index: RwLock<HashMap<PathBuf, u64>>,
    stats: StatsRecorder,
    next_temp: AtomicU64,
}

/// Suffix of in-progress writes; such files are never indexed.
const TEMP_SUFFIX: &str = ".tiercache-tmp";

impl DiskCache {
    // == Constructor ==
    /// Opens a disk cache rooted at `root`, creating the directory if needed
    /// and indexing every file already present.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        create_dir_all(&root).await?;
        let root = fs::canonicalize(&root)
            .await
            .map_err(|err| CacheError::storage(&root, err))?;

        let cache = Self {
            root,
            index: RwLock::new(HashMap::new()),
            stats: StatsRecorder::default(),
            next_temp: AtomicU64::new(0),
        };
        cache.rescan().await?;
        Ok(cache)
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // == Rescan ==
    /// Rebuilds the index from the files currently under the root.
    ///
    /// Returns the number of files found.
    pub async fn rescan(&self) -> Result<usize> {
        let root = self.root.clone();
        let found = tokio::task::spawn_blocking(move || scan(&root))
            .await
            .map_err(|err| CacheError::storage(&self.root, io::Error::other(err)))?;

        let count = found.len();
        *self.index.write().await = found;
        info!("Disk cache at {} indexed {} files", self.root.display(), count);
        Ok(count)
    }

    // == Length ==
    /// Returns the number of indexed files.
    pub async fn len(&self) -> usize {
        self.index.read().await.len()
    }

    /// Returns true if no files are indexed.
    pub async fn is_empty(&self) -> bool {
        self.index.read().await.is_empty()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let index = self.index.read().await;
        let bytes = index.values().sum::<u64>() as usize;
        self.stats.snapshot(index.len(), bytes)
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        Ok(self.root.join(relative_path(key)?))
    }

    /// Expands a `del` argument into the existing paths it names.
    async fn matches(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let Some(prefix) = wildcard_prefix(pattern) else {
            let path = self.resolve(pattern)?;
            return Ok(match fs::symlink_metadata(&path).await {
                Ok(_) => vec![path],
                Err(_) => Vec::new(),
            });
        };

        // Only the directory part is a key path; the last part is a raw
        // name prefix, so `.` or an empty string there stay literal.
        let (dir, partial) = match prefix.rsplit_once('/') {
            Some((dir, partial)) => (self.resolve(dir)?, partial),
            None => (self.root.clone(), prefix),
        };
        let dir = dir
            .to_str()
            .ok_or_else(|| CacheError::InvalidKey(pattern.to_string()))?;
        let glob_pattern = format!("{}/{}*", Pattern::escape(dir), Pattern::escape(partial));

        let paths = glob::glob(&glob_pattern)
            .map_err(|_| CacheError::InvalidKey(pattern.to_string()))?;
        let mut matched = Vec::new();
        for entry in paths {
            match entry {
                Ok(path) if is_dot_entry(&path) => {}
                Ok(path) => matched.push(path),
                Err(err) => {
                    warn!("Could not read {} while expanding {}: {}", err.path().display(), pattern, err);
                    self.stats.record_removal_failure();
                }
            }
        }
        Ok(matched)
    }
}

#[async_trait]
impl Cache for DiskCache {
    async fn get(&self, key: &str, filler: Option<&dyn Filler>) -> Result<Object> {
        let path = self.resolve(key)?;

        let indexed = self.index.read().await.contains_key(&path);
        if !indexed {
            self.stats.record_miss(filler.is_some());
            return fill_or_not_found(self, key, filler).await;
        }

        let mut file = match File::open(&path).await {
            Ok(file) => file,
            Err(err) => {
                debug!("Indexed file {} could not be opened: {}", path.display(), err);
                self.index.write().await.remove(&path);
                self.stats.record_miss(filler.is_some());
                return fill_or_not_found(self, key, filler).await;
            }
        };

        let metadata = file
            .metadata()
            .await
            .map_err(|err| CacheError::storage(&path, err))?;
        let modified = metadata
            .modified()
            .map_err(|err| CacheError::storage(&path, err))?;

        let mut data = Vec::with_capacity(metadata.len() as usize);
        file.read_to_end(&mut data)
            .await
            .map_err(|err| CacheError::storage(&path, err))?;

        self.stats.record_hit();
        Ok(Object::new(data, DateTime::<Utc>::from(modified)))
    }

    async fn set(&self, key: &str, object: Object, _write_through: bool) -> Result<()> {
        let path = self.resolve(key)?;

        if let Some(dir) = path.parent() {
            create_dir_all(dir).await?;
        }
        let temp = temp_path(&path, self.next_temp.fetch_add(1, Ordering::Relaxed));
        if let Err(err) = write_file(&temp, &object).await {
            let _ = fs::remove_file(&temp).await;
            return Err(CacheError::storage(&path, err));
        }
        if let Err(err) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(CacheError::storage(&path, err));
        }

        self.index.write().await.insert(path, object.len() as u64);
        Ok(())
    }

    async fn del(&self, pattern: &str) {
        let matched = match self.matches(pattern).await {
            Ok(matched) => matched,
            Err(err) => {
                warn!("Could not expand delete pattern {}: {}", pattern, err);
                self.stats.record_removal_failure();
                return;
            }
        };

        let mut index = self.index.write().await;
        for path in matched {
            index.retain(|indexed, _| !indexed.starts_with(&path));

            let removed = match fs::symlink_metadata(&path).await {
                Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(&path).await,
                Ok(_) => fs::remove_file(&path).await,
                Err(err) => Err(err),
            };
            match removed {
                Ok(()) => debug!("Removed {}", path.display()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    warn!("Could not remove {}: {}", path.display(), err);
                    self.stats.record_removal_failure();
                }
            }
        }
    }
}

// == Utility Functions ==
/// Maps a slash-separated key to a path relative to the root.
///
/// Only canonical keys map to files. Empty, `.` and `..` components are
/// rejected rather than normalized, so `a//b` is never an alias of `a/b`
/// (they are distinct keys in a memory tier) and no key leaves the root.
fn relative_path(key: &str) -> Result<PathBuf> {
    let mut path = PathBuf::new();
    for part in key.split('/') {
        match part {
            "" | "." | ".." => return Err(CacheError::InvalidKey(key.to_string())),
            part => path.push(part),
        }
    }
    Ok(path)
}

/// glob yields `dir/.` and `dir/..` for patterns starting with a dot.
fn is_dot_entry(path: &Path) -> bool {
    let raw = path.to_string_lossy();
    raw.ends_with("/.") || raw.ends_with("/..")
}

async fn create_dir_all(dir: &Path) -> Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o700);
    builder
        .create(dir)
        .await
        .map_err(|err| CacheError::storage(dir, err))
}

/// Sibling path an object is written to before being renamed into place.
fn temp_path(path: &Path, id: u64) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{id}{TEMP_SUFFIX}"))
}

async fn write_file(path: &Path, object: &Object) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(&object.data).await?;
    file.flush().await?;

    let file = file.into_std().await;
    file.set_modified(SystemTime::from(object.modified))
}

fn scan(root: &Path) -> HashMap<PathBuf, u64> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Skipping unreadable cache entry: {}", err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| !entry.file_name().to_string_lossy().ends_with(TEMP_SUFFIX))
        .filter_map(|entry| {
            let size = entry.metadata().ok()?.len();
            Some((entry.into_path(), size))
        })
        .collect()
}
