//! # Init Command
//!
//! Initializes a new accession project in the current directory and seeds the
//! "Archive Standard" scheme.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

use std::fs;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use crate::{
    config::{project::ProjectConfig, Config},
    constants::{SEED_SCHEME_ID, SEED_SCHEME_NAME, SEED_SCHEME_PATTERN},
    scheme::{NumberingScheme, Sector},
};

/// Executes the init command.
pub fn execute() -> Result<()> {
    let config = Config::for_init()?;

    // Check if already initialized
    let config_path = ProjectConfig::path(&config.project_root);
    if config_path.exists() {
        anyhow::bail!(
            "Project already initialized (found {})",
            config_path.display()
        );
    }

    config.project.save(&config.project_root)?;

    let scheme_path = config.scheme_path();
    fs::create_dir_all(&scheme_path).with_context(|| {
        format!(
            "Failed to create scheme directory: {}",
            scheme_path.display()
        )
    })?;

    let mut seed = NumberingScheme::new(SEED_SCHEME_ID, Sector::Archive, SEED_SCHEME_PATTERN)?;
    seed.name = SEED_SCHEME_NAME.to_string();
    seed.is_default = true;
    seed.allow_manual_override = true;
    config
        .generator()
        .save_scheme(&seed)
        .context("Failed to create seed scheme")?;

    println!("{} Initialized accession project", "✓".green());
    println!("  {} {}", "Config:".dimmed(), config_path.display());
    println!("  {} {}", "Schemes:".dimmed(), scheme_path.display());
    println!(
        "  {} {} {}",
        "Seeded:".dimmed(),
        SEED_SCHEME_ID,
        SEED_SCHEME_PATTERN.dimmed()
    );

    Ok(())
}
