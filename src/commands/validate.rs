//! # Validate and Check Commands
//!
//! `validate` checks a pattern before it is saved; `check` tests a manually
//! entered identifier against a scheme's rules.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

use anyhow::Result;
use owo_colors::OwoColorize;

use crate::{
    config::Config,
    context::SystemClock,
    generator::Generator,
    pattern::Segment,
    storage::MemoryStore,
    ui,
};

/// Executes the validate command: lists the parsed segments of a pattern.
pub fn validate(pattern: &str) -> Result<()> {
    let generator = Generator::new(MemoryStore::new(), SystemClock);
    let definition = generator.validate_pattern(pattern)?;

    if definition.is_empty() {
        println!("{}", "Empty pattern (renders as an empty string).".dimmed());
        return Ok(());
    }

    for segment in definition.segments() {
        match segment {
            Segment::Literal(text) => println!("  {:<12} {:?}", "literal".dimmed(), text),
            Segment::TokenRef { .. } => {
                let kind = segment
                    .kind()
                    .map_or_else(|| "unknown".to_string(), |k| k.to_string());
                println!("  {:<12} {}", kind.cyan(), segment);
            }
        }
    }

    ui::print_warnings(
        &definition
            .unknown_tokens()
            .iter()
            .map(|t| format!("unknown token {{{t}}} is kept as literal text"))
            .collect::<Vec<_>>(),
    );
    if !definition.uses_sequence() {
        ui::print_warnings(&["pattern has no {SEQ} token; identifiers may repeat"]);
    }
    println!("{} Pattern is valid", "✓".green());

    Ok(())
}

/// Executes the check command.
pub fn check(scheme_id: &str, identifier: &str) -> Result<()> {
    let config = Config::load()?;
    config
        .generator()
        .check_identifier(scheme_id, identifier)?;
    println!(
        "{} '{}' is acceptable for scheme '{}'",
        "✓".green(),
        identifier,
        scheme_id
    );
    Ok(())
}
