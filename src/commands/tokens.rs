//! # Tokens Command
//!
//! Prints the token catalog.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

use owo_colors::OwoColorize;

use crate::pattern::catalog::{self, Param};

/// Executes the tokens command.
pub fn execute() {
    for spec in catalog::catalog() {
        let usage = match spec.param {
            Param::None => format!("{{{}}}", spec.name),
            Param::Width | Param::Length => format!("{{{0}}} {{{0}:n}}", spec.name),
        };
        println!(
            "  {:<22} {:<11} {}",
            usage,
            spec.kind.to_string().dimmed(),
            spec.description
        );
    }
}
