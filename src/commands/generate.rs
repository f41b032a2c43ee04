//! # Generate Command
//!
//! Generates identifiers from a scheme, or from a sector's default scheme.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

use anyhow::{Context, Result};

use crate::{config::Config, context::EntityContext, scheme::Sector, ui};

/// Where to take the numbering scheme from
#[derive(Debug, Clone)]
pub enum Target {
    Scheme(String),
    Sector(Sector),
}

/// Arguments for the generate command
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    pub target: Target,
    /// Contextual token values (`REPO`, `FONDS`, ...)
    pub fields: Vec<(String, String)>,
    /// Full repository name, abbreviated into `REPO` when no code is given
    pub repo_name: Option<String>,
    /// Fail on missing contextual values even if the project is lenient
    pub strict: bool,
    /// Number of identifiers to generate in one reservation
    pub count: u64,
}

/// Builds the entity context from `KEY=VALUE` fields and an optional repository name.
pub fn entity_context(fields: &[(String, String)], repo_name: Option<&str>) -> EntityContext {
    let entity: EntityContext = fields.iter().map(|(k, v)| (k, v.clone())).collect();
    match repo_name {
        Some(name) => entity.with_repository_name(name),
        None => entity,
    }
}

/// Executes the generate command. Prints one identifier per line.
pub fn execute(args: &GenerateArgs) -> Result<()> {
    let config = Config::load()?;
    let generator = config
        .generator()
        .strict(config.project.strict || args.strict);
    let entity = entity_context(&args.fields, args.repo_name.as_deref());

    let scheme_id = match &args.target {
        Target::Scheme(id) => id.clone(),
        Target::Sector(sector) if args.count == 1 => {
            let generated = generator.next_reference(*sector, &entity)?;
            ui::print_warnings(&generated.warnings);
            println!("{}", generated.identifier);
            return Ok(());
        }
        Target::Sector(sector) => generator
            .default_scheme(*sector)?
            .filter(|s| s.auto_generate)
            .map(|s| s.id)
            .ok_or_else(|| anyhow::anyhow!("No default numbering scheme for sector '{sector}'"))?,
    };

    if args.count == 1 {
        let generated = generator
            .generate_identifier(&scheme_id, &entity)
            .with_context(|| format!("Failed to generate identifier with scheme '{scheme_id}'"))?;
        ui::print_warnings(&generated.warnings);
        println!("{}", generated.identifier);
        return Ok(());
    }

    let batch = generator
        .generate_batch(&scheme_id, &entity, args.count)
        .with_context(|| format!("Failed to generate identifiers with scheme '{scheme_id}'"))?;
    for generated in &batch {
        ui::print_warnings(&generated.warnings);
        println!("{}", generated.identifier);
    }

    Ok(())
}
