//! # Project Configuration
//!
//! Handles the project-level configuration stored at `.accession` in the project root.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_LOCK_ATTEMPTS, DEFAULT_LOCK_BACKOFF_MS, DEFAULT_RANDOM_LENGTH, DEFAULT_SCHEME_DIR,
    PROJECT_CONFIG_FILE,
};

/// Project configuration stored at .accession in project root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Directory holding scheme documents (default: "schemes")
    #[serde(default = "default_scheme_dir")]
    pub scheme_dir: String,

    /// Fail generation when a contextual token has no value
    #[serde(default)]
    pub strict: bool,

    /// Attempts to take a busy scheme lock before giving up
    #[serde(default = "default_lock_attempts")]
    pub lock_attempts: u32,

    /// Base backoff between lock attempts in milliseconds
    #[serde(default = "default_lock_backoff_ms")]
    pub lock_backoff_ms: u64,

    /// Length of `{RANDOM}` without a parameter
    #[serde(default = "default_random_length")]
    pub random_length: usize,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            scheme_dir: DEFAULT_SCHEME_DIR.to_string(),
            strict: false,
            lock_attempts: DEFAULT_LOCK_ATTEMPTS,
            lock_backoff_ms: DEFAULT_LOCK_BACKOFF_MS,
            random_length: DEFAULT_RANDOM_LENGTH,
        }
    }
}

fn default_scheme_dir() -> String {
    DEFAULT_SCHEME_DIR.to_string()
}

#[allow(clippy::missing_const_for_fn)] // serde default functions can't be const
fn default_lock_attempts() -> u32 {
    DEFAULT_LOCK_ATTEMPTS
}

#[allow(clippy::missing_const_for_fn)]
fn default_lock_backoff_ms() -> u64 {
    DEFAULT_LOCK_BACKOFF_MS
}

#[allow(clippy::missing_const_for_fn)]
fn default_random_length() -> usize {
    DEFAULT_RANDOM_LENGTH
}

impl ProjectConfig {
    /// Finds the project root by searching for .accession file upward
    pub fn find_project_root() -> Option<PathBuf> {
        let mut current = env::current_dir().ok()?;

        loop {
            if current.join(PROJECT_CONFIG_FILE).exists() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Returns the path to the project config file
    pub fn path(project_root: &Path) -> PathBuf {
        project_root.join(PROJECT_CONFIG_FILE)
    }

    /// Loads the project config from .accession in the given directory
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = Self::path(project_root);

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read project config: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse project config: {}", path.display()))
    }

    /// Saves the project config to .accession with comments for every option
    pub fn save(&self, project_root: &Path) -> Result<()> {
        let path = Self::path(project_root);
        let scheme_dir = toml::Value::String(self.scheme_dir.clone()).to_string();

        let content = format!(
            r#"# accession Project Configuration
# Location: {PROJECT_CONFIG_FILE} at the project root

# Directory holding one TOML document per numbering scheme
# (relative to the project root).
# Default: "{DEFAULT_SCHEME_DIR}"
scheme_dir = {scheme_dir}

# When true, generating an identifier fails if a contextual token such as
# {{REPO}} or {{FONDS}} has no value and the scheme defines no default.
# When false, the token name is written instead (e.g. "REPO/FONDS/0001").
# Default: false
strict = {strict}

# How often a busy scheme lock is retried before allocation fails, and the
# base backoff between attempts in milliseconds.
# Defaults: {DEFAULT_LOCK_ATTEMPTS} attempts, {DEFAULT_LOCK_BACKOFF_MS} ms
lock_attempts = {lock_attempts}
lock_backoff_ms = {lock_backoff_ms}

# Number of characters produced by {{RANDOM}} without a length parameter.
# Default: {DEFAULT_RANDOM_LENGTH}
random_length = {random_length}
"#,
            strict = self.strict,
            lock_attempts = self.lock_attempts,
            lock_backoff_ms = self.lock_backoff_ms,
            random_length = self.random_length,
        );

        fs::write(&path, content)
            .with_context(|| format!("Failed to write project config: {}", path.display()))
    }

    /// Returns the full path to the scheme directory
    pub fn scheme_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.scheme_dir)
    }
}
