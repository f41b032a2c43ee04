//! # Test Harness
//!
//! Provides utilities for integration testing accession inside throwaway
//! project directories.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use accession::{
    commands::{self, SchemeAddArgs},
    storage::SchemeStore,
    Config, FileStore, NumberingScheme, Sector,
};
use tempfile::TempDir;

/// Global lock to ensure tests run sequentially.
/// This prevents races when tests change the current directory.
static TEST_LOCK: Mutex<()> = Mutex::new(());

/// Test environment owning a temporary project directory.
pub struct TestEnv {
    /// Temporary directory for the project
    pub project_dir: TempDir,
    /// Original current directory to restore on drop
    original_cwd: PathBuf,
    /// Guard for the test lock
    #[allow(dead_code)]
    test_guard: std::sync::MutexGuard<'static, ()>,
}

impl TestEnv {
    /// Creates a new test environment and changes into its project directory.
    pub fn new() -> Self {
        // Recover from poisoned mutex (if a previous test panicked while holding the lock)
        let test_guard = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        let project_dir = TempDir::new().expect("Failed to create temp project dir");
        let original_cwd = env::current_dir().expect("Failed to get current dir");
        env::set_current_dir(project_dir.path()).expect("Failed to change to project dir");

        Self {
            project_dir,
            original_cwd,
            test_guard,
        }
    }

    /// Returns the path to the project directory.
    pub fn project_path(&self) -> &Path {
        self.project_dir.path()
    }

    /// Returns the path where project config would be stored.
    pub fn project_config_path(&self) -> PathBuf {
        self.project_dir.path().join(".accession")
    }

    /// Returns the path to the scheme directory.
    pub fn scheme_dir(&self) -> PathBuf {
        self.project_dir.path().join("schemes")
    }

    /// Returns the path of a scheme document.
    pub fn scheme_file(&self, id: &str) -> PathBuf {
        self.scheme_dir().join(format!("{id}.toml"))
    }

    /// Creates a project config file with the given content.
    pub fn write_project_config(&self, content: &str) {
        fs::write(self.project_config_path(), content).expect("Failed to write project config");
    }

    /// Opens a store over the scheme directory.
    pub fn store(&self) -> FileStore {
        FileStore::new(self.scheme_dir())
    }

    /// Loads a scheme straight from disk.
    pub fn read_scheme(&self, id: &str) -> NumberingScheme {
        self.store().get(id).expect("Failed to read scheme")
    }

    /// Lists the scheme documents in the scheme directory.
    pub fn list_scheme_files(&self) -> Vec<PathBuf> {
        if !self.scheme_dir().exists() {
            return Vec::new();
        }
        let mut files: Vec<_> = fs::read_dir(self.scheme_dir())
            .expect("Failed to read directory")
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        files.sort();
        files
    }

    /// Loads the project config for the test project.
    pub fn config(&self) -> Config {
        Config::load_from(self.project_path()).expect("Failed to load config")
    }
}

impl Drop for TestEnv {
    fn drop(&mut self) {
        let _ = env::set_current_dir(&self.original_cwd);
    }
}

// =============================================================================
// Test Setup Helpers
// =============================================================================

/// Creates an initialized project (config, scheme directory, seed scheme).
pub fn setup_test_env() -> TestEnv {
    let env = TestEnv::new();
    commands::init().expect("init should succeed");
    env
}

/// Builder for `scheme add` arguments.
pub struct SchemeBuilder {
    args: SchemeAddArgs,
}

impl SchemeBuilder {
    pub fn new(id: &str, pattern: &str) -> Self {
        Self {
            args: SchemeAddArgs {
                id: id.to_string(),
                pattern: pattern.to_string(),
                ..SchemeAddArgs::default()
            },
        }
    }

    pub fn sector(mut self, sector: Sector) -> Self {
        self.args.sector = sector;
        self
    }

    pub fn reset(mut self, reset: accession::SequenceReset) -> Self {
        self.args.reset = reset;
        self
    }

    pub fn fill_gaps(mut self) -> Self {
        self.args.fill_gaps = true;
        self
    }

    pub fn default_for_sector(mut self) -> Self {
        self.args.is_default = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.args.inactive = true;
        self
    }

    pub fn manual(mut self, regex: Option<&str>) -> Self {
        self.args.allow_manual_override = true;
        self.args.validation_regex = regex.map(str::to_string);
        self
    }

    pub fn set(mut self, field: &str, value: &str) -> Self {
        self.args.defaults.push((field.to_string(), value.to_string()));
        self
    }

    pub fn replace(mut self) -> Self {
        self.args.replace = true;
        self
    }

    pub fn add(self) -> anyhow::Result<()> {
        commands::scheme::add(self.args)
    }
}
