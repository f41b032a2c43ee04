//! # File Store
//!
//! One TOML document per scheme at `<dir>/<id>.toml`. Writes go through a
//! temporary file and a rename. A sibling `<id>.lock` file, created
//! exclusively, serializes allocation across processes.
//!
//! A lock older than the stale age is broken only by the process holding
//! `<id>.lock.break`. The breaker moves the lock aside under a unique name and
//! judges the age of the file it actually moved, so a lock created after the
//! first age check is put back instead of deleted.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use uuid::Uuid;
use walkdir::WalkDir;

use super::SchemeStore;
use crate::{
    constants::{LOCK_FILE_EXTENSION, SCHEME_FILE_EXTENSION, STALE_LOCK_SECS},
    error::{Error, Result},
    scheme::{validate_id, NumberingScheme},
};

/// Directory-backed scheme store
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    stale_after: Duration,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            stale_after: Duration::from_secs(STALE_LOCK_SECS),
        }
    }

    /// Overrides the age after which a leftover lock file is discarded.
    #[must_use]
    pub const fn stale_after(mut self, age: Duration) -> Self {
        self.stale_after = age;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the scheme document for `id`
    pub fn path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{SCHEME_FILE_EXTENSION}"))
    }

    fn lock_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{LOCK_FILE_EXTENSION}"))
    }

    fn load(path: &Path) -> Result<NumberingScheme> {
        let content = fs::read_to_string(path).map_err(|e| Error::storage(path, e))?;
        let mut scheme: NumberingScheme = toml::from_str(&content)
            .map_err(|e| Error::Serialization(format!("{}: {e}", path.display())))?;

        // The file name is authoritative
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            if scheme.id != stem {
                tracing::warn!(file = %path.display(), id = %scheme.id, "scheme id differs from file name");
                scheme.id = stem.to_string();
            }
        }
        Ok(scheme)
    }

    /// Removes a lock file left behind by a crashed process.
    ///
    /// Returns `Ok(false)` when the lock is fresh or another process is
    /// breaking it right now.
    fn clear_stale_lock(&self, path: &Path) -> Result<bool> {
        match file_age(path)? {
            None => return Ok(true),
            Some(age) if age < self.stale_after => return Ok(false),
            Some(_) => {}
        }

        let breaker = with_suffix(path, ".break");
        if !self.take_breaker(&breaker)? {
            return Ok(false);
        }
        let cleared = self.move_aside_if_stale(path);
        if let Err(e) = fs::remove_file(&breaker) {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!(breaker = %breaker.display(), error = %e, "failed to remove lock breaker");
            }
        }
        cleared
    }

    fn take_breaker(&self, breaker: &Path) -> Result<bool> {
        for _ in 0..2 {
            match OpenOptions::new().write(true).create_new(true).open(breaker) {
                Ok(_) => return Ok(true),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    // Outlives its holder only if that process died mid-break
                    match file_age(breaker)? {
                        Some(age) if age < self.stale_after => return Ok(false),
                        _ => remove_if_present(breaker)?,
                    }
                }
                Err(e) => return Err(Error::storage(breaker, e)),
            }
        }
        Ok(false)
    }

    /// Renames the lock to a unique name, then deletes it if it is still stale.
    fn move_aside_if_stale(&self, path: &Path) -> Result<bool> {
        let moved = with_suffix(path, &format!(".{}.stale", Uuid::new_v4().simple()));
        match fs::rename(path, &moved) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(Error::storage(path, e)),
        }

        let age = file_age(&moved)?.unwrap_or_default();
        let fresh = age < self.stale_after;
        if fresh {
            // Released and taken again since the first check
            if let Err(e) = fs::hard_link(&moved, path) {
                tracing::warn!(lock = %path.display(), error = %e, "failed to restore scheme lock");
            }
        } else {
            tracing::warn!(lock = %path.display(), age_secs = age.as_secs(), "removing stale scheme lock");
        }
        remove_if_present(&moved)?;
        Ok(!fresh)
    }
}

/// Age of a file by modification time, `None` when it does not exist.
fn file_age(path: &Path) -> Result<Option<Duration>> {
    match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => Ok(Some(
            SystemTime::now()
                .duration_since(modified)
                .unwrap_or_default(),
        )),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::storage(path, e)),
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::storage(path, e)),
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

impl SchemeStore for FileStore {
    fn get(&self, id: &str) -> Result<NumberingScheme> {
        validate_id(id)?;
        let path = self.path(id);
        if !path.exists() {
            return Err(Error::SchemeNotFound(id.to_string()));
        }
        Self::load(&path)
    }

    fn save(&self, scheme: &NumberingScheme) -> Result<()> {
        validate_id(&scheme.id)?;
        fs::create_dir_all(&self.dir).map_err(|e| Error::storage(&self.dir, e))?;

        let content =
            toml::to_string_pretty(scheme).map_err(|e| Error::Serialization(e.to_string()))?;

        let path = self.path(&scheme.id);
        let tmp = self.dir.join(format!(".{}.{SCHEME_FILE_EXTENSION}.tmp", scheme.id));
        fs::write(&tmp, content).map_err(|e| Error::storage(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| Error::storage(&path, e))
    }

    fn list(&self) -> Result<Vec<NumberingScheme>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut schemes = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .is_some_and(|ext| ext == SCHEME_FILE_EXTENSION)
            })
            .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
            .map(|e| Self::load(e.path()))
            .collect::<Result<Vec<_>>>()?;

        schemes.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(schemes)
    }

    fn try_lock(&self, id: &str) -> Result<bool> {
        validate_id(id)?;
        fs::create_dir_all(&self.dir).map_err(|e| Error::storage(&self.dir, e))?;
        let path = self.lock_path(id);

        for _ in 0..2 {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    if let Err(e) = writeln!(file, "{}", std::process::id()) {
                        drop(file);
                        remove_if_present(&path)?;
                        return Err(Error::storage(&path, e));
                    }
                    return Ok(true);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if !self.clear_stale_lock(&path)? {
                        return Ok(false);
                    }
                }
                Err(e) => return Err(Error::storage(&path, e)),
            }
        }
        Ok(false)
    }

    fn unlock(&self, id: &str) -> Result<()> {
        remove_if_present(&self.lock_path(id))
    }
}
