//! # Preview Command
//!
//! Shows sample output for a pattern without touching any sequence counter.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use super::generate::entity_context;
use crate::{context::SystemClock, generator::Generator, storage::MemoryStore, ui};

/// Arguments for the preview command
#[derive(Debug, Clone)]
pub struct PreviewArgs {
    pub pattern: String,
    pub fields: Vec<(String, String)>,
    pub repo_name: Option<String>,
    /// Number of samples (stand-in sequence values 1..=count)
    pub count: u64,
}

/// Executes the preview command.
///
/// Works outside a project: previews never read or write schemes.
pub fn execute(args: &PreviewArgs) -> Result<()> {
    let generator = Generator::new(MemoryStore::new(), SystemClock);
    let entity = entity_context(&args.fields, args.repo_name.as_deref());

    let definition = generator
        .validate_pattern(&args.pattern)
        .with_context(|| format!("Invalid pattern '{}'", args.pattern))?;
    ui::print_warnings(
        &definition
            .unknown_tokens()
            .iter()
            .map(|t| format!("unknown token {{{t}}} is kept as literal text"))
            .collect::<Vec<_>>(),
    );

    for _ in 0..args.count.max(1) {
        let rendered = generator.preview(&args.pattern, &entity)?;
        ui::print_warnings(&rendered.warnings);
        println!("{}", rendered.value);
    }
    eprintln!("{}", "(preview only, no sequence values were allocated)".dimmed());

    Ok(())
}
