// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

use crate::config::Config;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Launch the interactive picker and print the chosen repository
pub fn run(config: &Config, root: Option<PathBuf>, command: bool) -> Result<()> {
    tracing::info!("Launching picker...");
    let root = config.resolve_scan_root(root.as_deref())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let chosen = {
        let _guard = runtime.enter();
        crate::tui::run(root, config.scan_options())
    };
    // An abandoned scan may still be walking; don't wait for it
    runtime.shutdown_background();
    let chosen = chosen?;

    if let Some(record) = chosen {
        if command {
            println!("{}", config.render_open_command(&record));
        } else {
            println!("{}", record.path.display());
        }
    }
    Ok(())
}
