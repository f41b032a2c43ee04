//! # Scheme Commands
//!
//! Creates, lists and shows numbering schemes.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use crate::{
    config::Config,
    context::{Clock, SystemClock},
    scheme::{NumberingScheme, Sector, SequenceReset},
    storage::SchemeStore,
    ui,
};

/// Arguments for `scheme add`
#[derive(Debug, Clone, Default)]
pub struct SchemeAddArgs {
    pub id: String,
    pub name: Option<String>,
    pub sector: Sector,
    pub pattern: String,
    pub reset: SequenceReset,
    pub fill_gaps: bool,
    pub validation_regex: Option<String>,
    pub allow_manual_override: bool,
    pub is_default: bool,
    pub inactive: bool,
    pub no_auto_generate: bool,
    /// Fallback values for contextual tokens
    pub defaults: Vec<(String, String)>,
    /// Replace an existing scheme (keeps its counter state)
    pub replace: bool,
}

/// Executes `scheme add`.
pub fn add(args: SchemeAddArgs) -> Result<()> {
    let config = Config::load()?;
    let generator = config.generator();
    let store = generator.store();

    if store.path(&args.id).exists() && !args.replace {
        anyhow::bail!(
            "Scheme '{}' already exists (use --replace to overwrite its settings)",
            args.id
        );
    }

    // Sequence state of a replaced scheme is kept by the store update
    let mut scheme = NumberingScheme::new(&args.id, args.sector, &args.pattern)?;
    scheme.name = args.name.unwrap_or_else(|| args.id.clone());
    scheme.sequence_reset = args.reset;
    scheme.fill_gaps = args.fill_gaps;
    scheme.validation_regex = args.validation_regex.filter(|r| !r.is_empty());
    scheme.allow_manual_override = args.allow_manual_override;
    scheme.is_default = args.is_default;
    scheme.is_active = !args.inactive;
    scheme.auto_generate = !args.no_auto_generate;
    for (field, value) in args.defaults {
        scheme.defaults.insert(field.to_uppercase(), value);
    }

    let definition = generator
        .validate_pattern(&scheme.pattern)
        .with_context(|| format!("Invalid pattern '{}'", scheme.pattern))?;
    ui::print_warnings(
        &definition
            .unknown_tokens()
            .iter()
            .map(|t| format!("unknown token {{{t}}} will be kept as literal text"))
            .collect::<Vec<_>>(),
    );
    if !definition.uses_sequence() {
        ui::print_warnings(&["pattern has no {SEQ} token; identifiers may repeat"]);
    }

    generator.save_scheme(&scheme)?;
    ui::print_success("Saved scheme", &config, &store.path(&scheme.id));

    Ok(())
}

/// Executes `scheme list`.
pub fn list(sector: Option<Sector>) -> Result<()> {
    let config = Config::load()?;
    let store = config.store();

    let schemes: Vec<_> = store
        .list()?
        .into_iter()
        .filter(|s| sector.map_or(true, |wanted| s.sector == wanted))
        .collect();

    if schemes.is_empty() {
        println!("{}", "No schemes found.".dimmed());
        return Ok(());
    }

    let now = SystemClock.now();
    println!("{}", ui::scheme_header().bold());
    for scheme in &schemes {
        println!("{}", ui::scheme_row(scheme, scheme.next_value_at(now)));
    }

    let mut counts: Vec<_> = ui::count_by(&schemes, |s| s.sector).into_iter().collect();
    counts.sort_by_key(|(sector, _)| sector.as_str());
    let summary: Vec<_> = counts
        .iter()
        .map(|(sector, count)| format!("{sector}: {count}"))
        .collect();
    println!(
        "{}",
        format!("{} scheme(s) ({})", schemes.len(), summary.join(", ")).dimmed()
    );

    Ok(())
}

/// Executes `scheme show`.
pub fn show(id: &str) -> Result<()> {
    let config = Config::load()?;
    let scheme = config.store().get(id)?;
    ui::print_scheme_details(&scheme, scheme.next_value_at(SystemClock.now()));
    Ok(())
}
