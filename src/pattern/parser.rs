//! # Pattern Parser
//!
//! Scans a pattern left-to-right into literal and token segments.
//!
//! Parsing is lenient: unknown token names, unterminated braces and empty
//! patterns never fail. Only a catalog token with a non-numeric or
//! out-of-range parameter (e.g. `{SEQ:abc}`, `{RANDOM:100000}`) is rejected.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

use super::{catalog, PatternDefinition, Segment};
use crate::{
    constants::MAX_TOKEN_PARAM,
    error::{Error, Result},
};

const OPEN: char = '{';
const CLOSE: char = '}';
const PARAM_SEPARATOR: char = ':';

/// Parses a pattern string into a [`PatternDefinition`].
pub fn parse(pattern: &str) -> Result<PatternDefinition> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut unknown = Vec::new();
    let mut literal = String::new();
    let mut rest = pattern;

    while let Some(start) = rest.find(OPEN) {
        literal.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len_utf8()..];

        let Some(end) = after_open.find(CLOSE) else {
            // Unterminated: everything from the brace on is literal text
            literal.push_str(&rest[start..]);
            rest = "";
            break;
        };

        let body = &after_open[..end];
        rest = &after_open[end + CLOSE.len_utf8()..];

        let (name, param) = match body.split_once(PARAM_SEPARATOR) {
            Some((name, param)) => (name, Some(param)),
            None => (body, None),
        };

        if catalog::lookup(name).is_none() {
            // Unknown token, keep as-is
            literal.push(OPEN);
            literal.push_str(body);
            literal.push(CLOSE);
            if !unknown.iter().any(|u: &String| u == body) {
                unknown.push(body.to_string());
            }
            continue;
        }

        let param = param.map(|raw| parse_param(name, raw)).transpose()?;

        flush_literal(&mut segments, &mut literal);
        segments.push(Segment::TokenRef {
            name: name.to_string(),
            param,
        });
    }

    literal.push_str(rest);
    flush_literal(&mut segments, &mut literal);

    tracing::debug!(
        pattern,
        segments = segments.len(),
        unknown = unknown.len(),
        "parsed pattern"
    );

    Ok(PatternDefinition {
        source: pattern.to_string(),
        segments,
        unknown,
    })
}

fn parse_param(name: &str, raw: &str) -> Result<u32> {
    // u32::from_str accepts a leading '+', which is not a plain integer here
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed(name, raw));
    }
    raw.parse::<u32>()
        .ok()
        .filter(|&value| value <= MAX_TOKEN_PARAM)
        .ok_or_else(|| malformed(name, raw))
}

fn malformed(name: &str, raw: &str) -> Error {
    Error::MalformedParam {
        token: name.to_string(),
        param: raw.to_string(),
    }
}

fn flush_literal(segments: &mut Vec<Segment>, literal: &mut String) {
    if literal.is_empty() {
        return;
    }
    // Adjacent literal runs are always merged
    if let Some(Segment::Literal(prev)) = segments.last_mut() {
        prev.push_str(literal);
        literal.clear();
    } else {
        segments.push(Segment::Literal(std::mem::take(literal)));
    }
}
