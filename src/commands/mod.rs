// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod completions;
pub mod config;
pub mod find;
pub mod pick;
pub mod scan;
pub mod view;

use crate::config::Config;
use crate::scanner::{self, ScanOptions};
use crate::types::RepositoryRecord;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Output settings shared by every command
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    /// Emit JSON instead of text
    pub json: bool,
    /// Use ANSI colors in text output
    pub color: bool,
}

/// Resolve the scan root and scan it synchronously
pub(crate) fn scan_records(
    config: &Config,
    root: Option<&Path>,
    options: &ScanOptions,
) -> Result<(PathBuf, Vec<RepositoryRecord>)> {
    let root = config.resolve_scan_root(root)?;
    let records = scanner::scan(&root, options)
        .with_context(|| format!("Failed to scan {}", root.display()))?;
    Ok((root, records))
}
