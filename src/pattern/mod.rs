//! # Patterns
//!
//! Parsed form of a user-authored identifier pattern such as `{REPO}/{FONDS}/{SEQ:4}`.
//!
//! A [`PatternDefinition`] is immutable and side-effect free to build, so it can be
//! cached per scheme until the scheme's pattern text changes.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

pub mod catalog;
pub mod parser;

use std::fmt;

pub use self::{
    catalog::{TokenKind, TokenSpec},
    parser::parse,
};

/// One piece of a parsed pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text emitted unchanged (includes unknown `{TOKENS}`)
    Literal(String),
    /// A catalog token with its optional parameter
    TokenRef { name: String, param: Option<u32> },
}

impl Segment {
    /// Returns the catalog kind for token segments.
    pub fn kind(&self) -> Option<TokenKind> {
        match self {
            Self::Literal(_) => None,
            Self::TokenRef { name, .. } => catalog::lookup(name).map(|spec| spec.kind),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.write_str(text),
            Self::TokenRef { name, param: None } => write!(f, "{{{name}}}"),
            Self::TokenRef {
                name,
                param: Some(p),
            } => write!(f, "{{{name}:{p}}}"),
        }
    }
}

/// A parsed pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternDefinition {
    pub(crate) source: String,
    pub(crate) segments: Vec<Segment>,
    pub(crate) unknown: Vec<String>,
}

impl PatternDefinition {
    /// The raw pattern text this definition was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Brace bodies that were not catalog tokens, in order of first appearance
    pub fn unknown_tokens(&self) -> &[String] {
        &self.unknown
    }

    /// Whether rendering needs a value from the sequence allocator
    pub fn uses_sequence(&self) -> bool {
        self.segments
            .iter()
            .any(|s| s.kind() == Some(TokenKind::Sequence))
    }

    /// Contextual token names referenced by the pattern (deduplicated)
    pub fn contextual_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::TokenRef { name, .. } = segment {
                if segment.kind() == Some(TokenKind::Contextual) && !fields.contains(&name.as_str())
                {
                    fields.push(name);
                }
            }
        }
        fields
    }
}

impl fmt::Display for PatternDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}
