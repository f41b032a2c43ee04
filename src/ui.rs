//! # UI Utilities
//!
//! Shared output helpers for commands: success lines, warnings, scheme tables.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

use std::{collections::HashMap, fmt::Display, hash::Hash, path::Path};

use owo_colors::OwoColorize;

use crate::{
    config::Config,
    constants::{UI_COL_ID_WIDTH, UI_COL_SECTOR_WIDTH, UI_PATTERN_TRUNCATE_LEN},
    scheme::NumberingScheme,
};

// =============================================================================
// Aggregation Utilities
// =============================================================================

/// Counts occurrences by a single key extracted from each item.
pub fn count_by<T, K, F>(items: &[T], key_fn: F) -> HashMap<K, usize>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut counts = HashMap::new();
    for item in items {
        *counts.entry(key_fn(item)).or_insert(0) += 1;
    }
    counts
}

// =============================================================================
// Messages
// =============================================================================

/// Prints a success message with a path.
///
/// Format: `✓ {verb}: {relative_path}`
pub fn print_success(verb: &str, config: &Config, path: &Path) {
    println!(
        "{} {}: {}",
        "✓".green(),
        verb,
        config.relative_path(path).display()
    );
}

/// Prints warnings with yellow prefix to stderr.
pub fn print_warnings<W: Display>(warnings: &[W]) {
    for warning in warnings {
        eprintln!("{} {}", "warning:".yellow(), warning);
    }
}

// =============================================================================
// Scheme Display
// =============================================================================

/// One table row: ID | Sector | Next | Flags | Pattern
pub fn scheme_row(scheme: &NumberingScheme, next: u64) -> String {
    let mut flags = Vec::new();
    if scheme.is_default {
        flags.push("default");
    }
    if !scheme.is_active {
        flags.push("inactive");
    }
    if scheme.fill_gaps {
        flags.push("gaps");
    }
    if !scheme.auto_generate {
        flags.push("manual");
    }

    format!(
        "{:<id_w$} {:<sector_w$} {:>8}  {:<24}  {}",
        truncate(&scheme.id, UI_COL_ID_WIDTH),
        scheme.sector,
        next,
        flags.join(","),
        truncate(&scheme.pattern, UI_PATTERN_TRUNCATE_LEN),
        id_w = UI_COL_ID_WIDTH,
        sector_w = UI_COL_SECTOR_WIDTH,
    )
}

/// Header matching [`scheme_row`]
pub fn scheme_header() -> String {
    format!(
        "{:<id_w$} {:<sector_w$} {:>8}  {:<24}  {}",
        "ID",
        "SECTOR",
        "NEXT",
        "FLAGS",
        "PATTERN",
        id_w = UI_COL_ID_WIDTH,
        sector_w = UI_COL_SECTOR_WIDTH,
    )
}

/// Prints every field of a scheme as `key: value` lines.
pub fn print_scheme_details(scheme: &NumberingScheme, next: u64) {
    let line = |key: &str, value: &dyn Display| {
        println!("{:>20} {}", format!("{key}:").dimmed(), value);
    };
    let or_dash = |v: Option<&str>| v.unwrap_or("-").to_string();

    line("id", &scheme.id);
    line("name", &scheme.name);
    line("sector", &scheme.sector);
    line("pattern", &scheme.pattern);
    line("current sequence", &scheme.current_sequence);
    line("next value", &next);
    line("reset", &scheme.sequence_reset);
    line("epoch", &or_dash(scheme.epoch.as_deref()));
    line("fill gaps", &scheme.fill_gaps);
    if !scheme.reclaimed.is_empty() {
        let pool: Vec<_> = scheme.reclaimed.iter().map(u64::to_string).collect();
        line("reclaimed", &pool.join(", "));
    }
    line("validation", &or_dash(scheme.validation_regex.as_deref()));
    line("manual override", &scheme.allow_manual_override);
    line("active", &scheme.is_active);
    line("default", &scheme.is_default);
    line("auto generate", &scheme.auto_generate);
    for (field, value) in &scheme.defaults {
        line(&format!("default {field}"), value);
    }
}

// =============================================================================
// String Utilities
// =============================================================================

/// Truncates a string to the specified maximum length, adding ellipsis if truncated.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::Sector;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly-10", 10), "exactly-10");
        assert_eq!(truncate("much-too-long", 5), "much…");
        assert_eq!(truncate("ééééé", 3), "éé…");
    }

    #[test]
    fn test_count_by() {
        let schemes = [
            NumberingScheme::new("a", Sector::Archive, "{SEQ}").unwrap(),
            NumberingScheme::new("b", Sector::Archive, "{SEQ}").unwrap(),
            NumberingScheme::new("c", Sector::Dam, "{SEQ}").unwrap(),
        ];
        let counts = count_by(&schemes, |s| s.sector);
        assert_eq!(counts[&Sector::Archive], 2);
        assert_eq!(counts[&Sector::Dam], 1);
    }

    #[test]
    fn test_scheme_row_flags() {
        let mut scheme = NumberingScheme::new("acc", Sector::Museum, "{SEQ:4}").unwrap();
        scheme.is_default = true;
        scheme.fill_gaps = true;
        let row = scheme_row(&scheme, 12);
        assert!(row.starts_with("acc"));
        assert!(row.contains("museum"));
        assert!(row.contains("default,gaps"));
        assert!(row.ends_with("{SEQ:4}"));
    }
}
