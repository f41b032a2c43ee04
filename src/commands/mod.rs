//! # Commands
//!
//! CLI command implementations for accession.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

pub mod completions;
pub mod generate;
pub mod info;
pub mod init;
pub mod preview;
pub mod scheme;
pub mod sequence;
pub mod tokens;
pub mod validate;

pub use self::{
    generate::{execute as generate, GenerateArgs, Target},
    info::execute as info,
    init::execute as init,
    preview::{execute as preview, PreviewArgs},
    scheme::SchemeAddArgs,
    sequence::{peek, reclaim, reset},
    tokens::execute as tokens,
    validate::{check, validate},
};

/// Parses a `KEY=VALUE` argument.
pub fn parse_field(arg: &str) -> Result<(String, String), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{arg}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing field name in '{arg}'"));
    }
    Ok((key.to_uppercase(), value.to_string()))
}
