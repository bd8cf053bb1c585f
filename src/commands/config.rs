// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Config command - shows the effective configuration

use super::Output;
use crate::config::{default_config_path, Config};
use anyhow::{Context, Result};

/// Print the effective configuration
pub fn run(config: &Config, output: Output) -> Result<()> {
    if output.json {
        let json = serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
        println!("{json}");
        return Ok(());
    }

    if let Some(path) = default_config_path() {
        println!("# default file: {}", path.display());
    }
    print!("{}", config.to_toml()?);
    Ok(())
}
