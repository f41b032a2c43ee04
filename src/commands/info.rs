//! # Info Command
//!
//! Shows whether numbering is enabled per sector and what the next identifier looks like.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

use anyhow::Result;
use owo_colors::OwoColorize;

use crate::{config::Config, scheme::Sector};

/// Executes the info command for one sector, or all sectors.
pub fn execute(sector: Option<Sector>) -> Result<()> {
    let config = Config::load()?;
    let generator = config.generator();
    let sectors = sector.map_or_else(|| Sector::ALL.to_vec(), |s| vec![s]);

    for sector in sectors {
        let info = generator.numbering_info(sector)?;
        match (info.scheme_id, info.next_preview) {
            (Some(id), Some(next)) if info.enabled => {
                let mode = if info.auto_generate { "auto" } else { "manual" };
                println!(
                    "{:<8} {} {} {} {}",
                    sector,
                    id,
                    format!("[{mode}]").dimmed(),
                    "next:".dimmed(),
                    next
                );
            }
            _ => println!("{:<8} {}", sector, "disabled".dimmed()),
        }
    }

    Ok(())
}
