// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Scan command - lists every repository under the scan root

use super::{scan_records, Output};
use crate::config::Config;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tracing::info;

/// Command-line overrides for the configured scan options
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanFlags {
    /// Maximum depth, overriding the configured one
    pub max_depth: Option<usize>,
    /// Fail on unreadable directories
    pub strict: bool,
    /// Follow symbolic links
    pub follow_symlinks: bool,
}

/// Run the scan command
pub fn run(config: &Config, root: Option<PathBuf>, flags: ScanFlags, output: Output) -> Result<()> {
    let mut options = config.scan_options();
    if flags.max_depth.is_some() {
        options.max_depth = flags.max_depth;
    }
    if flags.strict {
        options.skip_unreadable = false;
    }
    if flags.follow_symlinks {
        options.follow_symlinks = true;
    }

    let (root, records) = scan_records(config, root.as_deref(), &options)?;
    info!("Scanned {}", root.display());

    if output.json {
        let json = serde_json::to_string_pretty(&records).context("Failed to serialize repositories")?;
        println!("{json}");
        return Ok(());
    }

    if records.is_empty() {
        println!("No git repositories found in {}", root.display());
        return Ok(());
    }

    println!("Found {} repositories:", records.len());
    println!();

    let width = records.iter().map(|r| r.name.chars().count()).max().unwrap_or(0);
    for record in &records {
        let path = record.path.display().to_string();
        if output.color {
            println!("  {:<width$}  {}", record.name.bold(), path.dimmed());
        } else {
            println!("  {:<width$}  {}", record.name, path);
        }
    }

    Ok(())
}
