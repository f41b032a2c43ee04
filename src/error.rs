//! # Errors
//!
//! Error taxonomy for pattern parsing, identifier generation and sequence allocation.
//! Overflowing a sequence width is not an error; see [`crate::render::Warning`].
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

use std::path::PathBuf;

use crate::constants::MAX_TOKEN_PARAM;

/// Result alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the identifier engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A catalog token carries a parameter that is not an integer in `0..=MAX_TOKEN_PARAM`.
    #[error(
        "malformed parameter '{param}' for token {{{token}}}: expected an integer from 0 to {}",
        MAX_TOKEN_PARAM
    )]
    MalformedParam { token: String, param: String },

    /// Strict mode: a contextual token had no value and no scheme default.
    #[error("no value supplied for token {{{token}}}")]
    UnresolvedToken { token: String },

    /// A reset would re-issue values already handed out in this epoch.
    #[error(
        "cannot reset sequence to {requested}: {highest} has already been issued (use force to override)"
    )]
    InvalidReset { requested: u64, highest: u64 },

    /// The scheme stayed locked for every allocation attempt.
    #[error("sequence allocation for scheme '{scheme}' failed after {attempts} attempts (lock contention)")]
    AllocationFailed { scheme: String, attempts: u32 },

    /// The counter cannot advance by the requested amount without wrapping.
    #[error("sequence for scheme '{scheme}' is exhausted at {current} (requested {requested} more)")]
    SequenceExhausted {
        scheme: String,
        current: u64,
        requested: u64,
    },

    #[error("numbering scheme '{0}' not found")]
    SchemeNotFound(String),

    #[error("numbering scheme '{0}' is not active")]
    SchemeInactive(String),

    /// No active, auto-generating default scheme exists for the sector.
    #[error("no default numbering scheme for sector '{0}'")]
    NoDefaultScheme(String),

    #[error("invalid validation pattern '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("identifier '{identifier}' does not match the scheme's validation pattern '{pattern}'")]
    InvalidIdentifier { identifier: String, pattern: String },

    #[error("numbering scheme '{0}' does not allow manual identifiers")]
    ManualOverrideDisallowed(String),

    /// Only values that were actually issued can return to the fill-gaps pool.
    #[error("cannot reclaim {value}: only values between 1 and {current} have been issued")]
    InvalidReclaim { value: u64, current: u64 },

    #[error("invalid scheme id '{0}': use letters, digits, '-' or '_'")]
    InvalidSchemeId(String),

    #[error("storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to (de)serialize scheme: {0}")]
    Serialization(String),
}

impl Error {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Whether the caller may reasonably retry the same request later.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::AllocationFailed { .. })
    }
}
