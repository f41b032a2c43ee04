//! # Configuration
//!
//! Project configuration resolved against the project root, plus factories
//! for the scheme store and generator the commands run against.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

pub mod project;

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Result;

pub use self::project::ProjectConfig;
use crate::{
    constants::PROJECT_CONFIG_FILE,
    context::SystemClock,
    generator::Generator,
    storage::FileStore,
};

/// Project configuration with its resolved root
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Resolved project root path
    pub project_root: PathBuf,
}

impl Config {
    /// Loads configuration from the nearest .accession file upward
    pub fn load() -> Result<Self> {
        let project_root = ProjectConfig::find_project_root().ok_or_else(|| {
            anyhow::anyhow!(
                "Not in an accession project (no {PROJECT_CONFIG_FILE} file found). Run `acn init` first."
            )
        })?;

        Self::load_from(&project_root)
    }

    /// Loads configuration for a known project root
    pub fn load_from(project_root: &Path) -> Result<Self> {
        let project = ProjectConfig::load(project_root)?;

        Ok(Self {
            project,
            project_root: project_root.to_path_buf(),
        })
    }

    /// Creates a config for initialization (no existing project required)
    pub fn for_init() -> Result<Self> {
        let project_root = std::env::current_dir()
            .map_err(|e| anyhow::anyhow!("Cannot get current directory: {e}"))?;

        Ok(Self {
            project: ProjectConfig::default(),
            project_root,
        })
    }

    /// Returns the scheme directory path
    pub fn scheme_path(&self) -> PathBuf {
        self.project.scheme_path(&self.project_root)
    }

    /// Opens the file-backed scheme store
    pub fn store(&self) -> FileStore {
        FileStore::new(self.scheme_path())
    }

    /// Builds a generator over the project's schemes using the system clock
    pub fn generator(&self) -> Generator<FileStore, SystemClock> {
        Generator::new(self.store(), SystemClock)
            .strict(self.project.strict)
            .random_length(self.project.random_length)
            .with_retry(
                self.project.lock_attempts,
                Duration::from_millis(self.project.lock_backoff_ms),
            )
    }

    /// Returns path relative to project root
    pub fn relative_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.project_root)
            .map_or_else(|_| path.to_path_buf(), Path::to_path_buf)
    }
}
