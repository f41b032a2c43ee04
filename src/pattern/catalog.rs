//! # Token Catalog
//!
//! The fixed vocabulary of pattern tokens. Names are case-sensitive and appear
//! brace-delimited in patterns, e.g. `{PREFIX}-{YEAR}-{SEQ:5}`.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

use std::fmt;

/// Semantic kind of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Next value from the scheme's sequence allocator
    Sequence,
    /// Derived from the injected clock
    Date,
    /// Supplied by the caller's entity context
    Contextual,
    /// Fresh random value on every generation
    Random,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequence => write!(f, "sequence"),
            Self::Date => write!(f, "date"),
            Self::Contextual => write!(f, "contextual"),
            Self::Random => write!(f, "random"),
        }
    }
}

/// What the optional `:n` parameter means for a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    None,
    /// Zero-pad to `n` digits
    Width,
    /// Produce `n` characters
    Length,
}

/// A catalog entry
#[derive(Debug, Clone, Copy)]
pub struct TokenSpec {
    pub name: &'static str,
    pub kind: TokenKind,
    pub param: Param,
    pub description: &'static str,
}

pub const SEQ: &str = "SEQ";
pub const YEAR: &str = "YEAR";
pub const YY: &str = "YY";
pub const MONTH: &str = "MONTH";
pub const DAY: &str = "DAY";
pub const UUID: &str = "UUID";
pub const RANDOM: &str = "RANDOM";

/// Tokens resolved from caller-supplied entity data.
pub const CONTEXT_FIELDS: &[&str] = &[
    "PREFIX",
    "REPO",
    "FONDS",
    "SERIES",
    "COLLECTION",
    "DEPT",
    "TYPE",
    "PROJECT",
    "ITEM",
];

const CATALOG: &[TokenSpec] = &[
    TokenSpec {
        name: SEQ,
        kind: TokenKind::Sequence,
        param: Param::Width,
        description: "Next sequence value, zero-padded to n digits",
    },
    TokenSpec {
        name: YEAR,
        kind: TokenKind::Date,
        param: Param::None,
        description: "Current year (4 digits)",
    },
    TokenSpec {
        name: YY,
        kind: TokenKind::Date,
        param: Param::None,
        description: "Current year (2 digits)",
    },
    TokenSpec {
        name: MONTH,
        kind: TokenKind::Date,
        param: Param::None,
        description: "Current month (01-12)",
    },
    TokenSpec {
        name: DAY,
        kind: TokenKind::Date,
        param: Param::None,
        description: "Current day of month (01-31)",
    },
    TokenSpec {
        name: "PREFIX",
        kind: TokenKind::Contextual,
        param: Param::None,
        description: "Scheme or caller prefix",
    },
    TokenSpec {
        name: "REPO",
        kind: TokenKind::Contextual,
        param: Param::None,
        description: "Repository code",
    },
    TokenSpec {
        name: "FONDS",
        kind: TokenKind::Contextual,
        param: Param::None,
        description: "Fonds code",
    },
    TokenSpec {
        name: "SERIES",
        kind: TokenKind::Contextual,
        param: Param::None,
        description: "Series code",
    },
    TokenSpec {
        name: "COLLECTION",
        kind: TokenKind::Contextual,
        param: Param::None,
        description: "Collection code",
    },
    TokenSpec {
        name: "DEPT",
        kind: TokenKind::Contextual,
        param: Param::None,
        description: "Department code",
    },
    TokenSpec {
        name: "TYPE",
        kind: TokenKind::Contextual,
        param: Param::None,
        description: "Record or object type",
    },
    TokenSpec {
        name: "PROJECT",
        kind: TokenKind::Contextual,
        param: Param::None,
        description: "Project code",
    },
    TokenSpec {
        name: "ITEM",
        kind: TokenKind::Contextual,
        param: Param::None,
        description: "Item code",
    },
    TokenSpec {
        name: UUID,
        kind: TokenKind::Random,
        param: Param::None,
        description: "Random UUID (v4)",
    },
    TokenSpec {
        name: RANDOM,
        kind: TokenKind::Random,
        param: Param::Length,
        description: "n random alphanumeric characters",
    },
];

/// Looks up a token by its exact (case-sensitive) name.
pub fn lookup(name: &str) -> Option<&'static TokenSpec> {
    CATALOG.iter().find(|spec| spec.name == name)
}

/// Returns the full catalog in display order.
pub const fn catalog() -> &'static [TokenSpec] {
    CATALOG
}
