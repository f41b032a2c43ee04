//! # Constants
//!
//! Centralized constants for magic values used throughout accession.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

// =============================================================================
// UI Display
// =============================================================================

/// Column width for scheme id in list display.
pub const UI_COL_ID_WIDTH: usize = 20;

/// Column width for sector in list display.
pub const UI_COL_SECTOR_WIDTH: usize = 8;

/// Maximum length for pattern display in lists (truncated with ellipsis).
pub const UI_PATTERN_TRUNCATE_LEN: usize = 40;

// =============================================================================
// Sequencing
// =============================================================================

/// Counter value after a reset boundary; the first value issued in an epoch is `floor + 1`.
pub const SEQUENCE_FLOOR: u64 = 0;

/// First stand-in sequence value used by previews.
pub const PREVIEW_SEQUENCE_START: u64 = 1;

/// Most identifiers one `generate --count` or `preview --count` call produces.
pub const MAX_BATCH_SIZE: u64 = 10_000;

/// Default number of attempts to take a busy scheme lock.
pub const DEFAULT_LOCK_ATTEMPTS: u32 = 50;

/// Base backoff between lock attempts (multiplied by the attempt number).
pub const DEFAULT_LOCK_BACKOFF_MS: u64 = 2;

/// Upper bound for a single backoff sleep.
pub const MAX_LOCK_BACKOFF_MS: u64 = 100;

/// Age after which a leftover lock file is considered abandoned.
pub const STALE_LOCK_SECS: u64 = 30;

// =============================================================================
// Tokens
// =============================================================================

/// Largest accepted token parameter (`{SEQ:n}` width, `{RANDOM:n}` length).
pub const MAX_TOKEN_PARAM: u32 = 255;

/// Length of `{RANDOM}` when no parameter is given.
pub const DEFAULT_RANDOM_LENGTH: usize = 4;

/// Maximum length of a repository code built from a name's initials.
pub const MAX_ABBREVIATION_LEN: usize = 6;

// =============================================================================
// File System
// =============================================================================

/// Project configuration file name (at the project root).
pub const PROJECT_CONFIG_FILE: &str = ".accession";

/// Default directory holding scheme documents (relative to the project root).
pub const DEFAULT_SCHEME_DIR: &str = "schemes";

/// Extension of scheme documents.
pub const SCHEME_FILE_EXTENSION: &str = "toml";

/// Extension of per-scheme lock files.
pub const LOCK_FILE_EXTENSION: &str = "lock";

// =============================================================================
// Seed Scheme
// =============================================================================

/// Id of the scheme created by `acn init`.
pub const SEED_SCHEME_ID: &str = "archive-standard";

/// Display name of the seed scheme.
pub const SEED_SCHEME_NAME: &str = "Archive Standard";

/// Pattern of the seed scheme.
pub const SEED_SCHEME_PATTERN: &str = "{REPO}/{FONDS}/{SEQ:4}";

// =============================================================================
// Logging
// =============================================================================

/// Environment variable read for the log filter (falls back to `RUST_LOG`).
pub const LOG_ENV_VAR: &str = "ACN_LOG";

/// Log filter used when no environment variable is set.
pub const DEFAULT_LOG_FILTER: &str = "warn";
