//! # Rendering
//!
//! Substitutes resolved values into a parsed pattern. Pure: no I/O, no clock,
//! no allocation side effects.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

use std::fmt::{self, Write};

use crate::{
    context::ResolvedContext,
    pattern::{PatternDefinition, Segment, TokenKind},
};

/// Non-fatal conditions observed while producing an identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The sequence value has more digits than the configured `{SEQ:n}` width.
    /// The value is emitted in full; identifiers are never truncated.
    SequenceOverflow { width: u32, value: u64 },
    /// A generated identifier does not satisfy the scheme's validation pattern
    ValidationMismatch { identifier: String, pattern: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SequenceOverflow { width, value } => write!(
                f,
                "sequence value {value} exceeds configured width {width}; identifier widened"
            ),
            Self::ValidationMismatch {
                identifier,
                pattern,
            } => write!(
                f,
                "identifier '{identifier}' does not match validation pattern '{pattern}'"
            ),
        }
    }
}

/// Rendered identifier plus any warnings raised while rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub value: String,
    pub warnings: Vec<Warning>,
}

/// Renders `definition` with the values in `context`.
///
/// Tokens with no value in `context` are written back in their `{TOKEN}` form.
pub fn render(definition: &PatternDefinition, context: &ResolvedContext) -> Rendered {
    let mut value = String::with_capacity(definition.source().len() + 8);
    let mut warnings = Vec::new();

    for (index, segment) in definition.segments().iter().enumerate() {
        let (name, param) = match segment {
            Segment::Literal(text) => {
                value.push_str(text);
                continue;
            }
            Segment::TokenRef { name, param } => (name, *param),
        };

        let resolved = match segment.kind() {
            Some(TokenKind::Sequence) => context.sequence().map(|seq| {
                if let Some(warning) = write_sequence(&mut value, seq, param) {
                    tracing::warn!(%warning, "sequence overflow");
                    warnings.push(warning);
                }
            }),
            Some(TokenKind::Random) => context.random(index).map(|v| value.push_str(v)),
            Some(TokenKind::Date | TokenKind::Contextual) => {
                context.value(name).map(|v| value.push_str(v))
            }
            // Parser never emits unknown TokenRefs; keep the text if one is built by hand
            None => None,
        };

        if resolved.is_none() {
            let _ = write!(value, "{segment}");
        }
    }

    Rendered { value, warnings }
}

/// Writes the zero-padded sequence value and reports overflow.
fn write_sequence(out: &mut String, seq: u64, width: Option<u32>) -> Option<Warning> {
    let width = width.unwrap_or(0);
    let _ = write!(out, "{seq:0width$}", width = width as usize);

    let digits = seq.checked_ilog10().map_or(1, |d| d + 1);
    (width > 0 && digits > width).then_some(Warning::SequenceOverflow { width, value: seq })
}
