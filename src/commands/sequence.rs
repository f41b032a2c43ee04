//! # Sequence Commands
//!
//! Inspects and administers a scheme's sequence counter: peek, reset, reclaim.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use crate::{config::Config, error::Error};

/// Executes the peek command: prints the next value without allocating it.
pub fn peek(scheme_id: &str) -> Result<()> {
    let config = Config::load()?;
    let next = config.generator().allocator().peek(scheme_id)?;
    println!("{next}");
    Ok(())
}

/// Executes the reset command.
pub fn reset(scheme_id: &str, to: u64, force: bool) -> Result<()> {
    let config = Config::load()?;
    let generator = config.generator();

    match generator.allocator().reset(scheme_id, to, force) {
        Ok(()) => {}
        Err(err @ Error::InvalidReset { .. }) => {
            return Err(err).context("Reset rejected; pass --force to accept duplicate identifiers");
        }
        Err(err) => return Err(err.into()),
    }

    let next = to
        .checked_add(1)
        .map_or_else(|| "none (sequence exhausted)".to_string(), |n| n.to_string());
    println!("{} Reset '{}': next value is {}", "✓".green(), scheme_id, next);
    if force {
        eprintln!(
            "{} values above {} may be issued again",
            "warning:".yellow(),
            to
        );
    }
    Ok(())
}

/// Executes the reclaim command.
pub fn reclaim(scheme_id: &str, value: u64) -> Result<()> {
    let config = Config::load()?;
    let pooled = config.generator().allocator().reclaim(scheme_id, value)?;

    if pooled {
        println!("{} Value {} returned to '{}'", "✓".green(), value, scheme_id);
    } else {
        println!(
            "{}",
            format!("Value {value} not pooled (scheme does not fill gaps, or already reclaimed)")
                .dimmed()
        );
    }
    Ok(())
}
