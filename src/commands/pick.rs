// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Pick command - prints the best match, like pressing Enter in the picker

use super::{scan_records, Output};
use crate::config::Config;
use crate::matcher::best_match;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// Run the pick command
pub fn run(
    config: &Config,
    query: &[String],
    root: Option<PathBuf>,
    command: bool,
    output: Output,
) -> Result<()> {
    let query = query.join(" ");
    let (root, records) = scan_records(config, root.as_deref(), &config.scan_options())?;

    let Some(record) = best_match(&query, &records) else {
        if records.is_empty() {
            bail!("No git repositories found in {}", root.display());
        }
        bail!("No repository matches '{query}'");
    };

    if output.json {
        let json = serde_json::to_string_pretty(record).context("Failed to serialize repository")?;
        println!("{json}");
    } else if command {
        println!("{}", config.render_open_command(record));
    } else {
        println!("{}", record.path.display());
    }

    Ok(())
}
