// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Repopick library - find every git repository under a directory and pick one
//!
//! This crate provides the two halves of a repository picker: a scanner that
//! discovers `.git` marker directories below a root, and a fuzzy ranker that
//! filters and orders the discovered repositories on every keystroke.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod commands;
pub mod config;
pub mod matcher;
pub mod scanner;
pub mod service;
pub mod tui;

/// Core data types shared by the scanner, the ranker and the callers
pub mod types {
    use serde::{Deserialize, Serialize};
    use std::path::{Path, PathBuf};

    // =========================================================================
    // Repository Record
    // =========================================================================

    /// A repository discovered by one scan
    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct RepositoryRecord {
        /// Path relative to the scan root, used for display and matching
        pub name: String,
        /// Absolute path to the repository root (parent of `.git`)
        pub path: PathBuf,
    }

    impl RepositoryRecord {
        /// Create a record from a display name and repository root
        #[must_use]
        pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
            Self {
                name: name.into(),
                path: path.into(),
            }
        }

        /// Repository root as a path
        #[must_use]
        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    // =========================================================================
    // Scored Candidate
    // =========================================================================

    /// A record that matched a query, with its score and matched positions
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ScoredCandidate<'a> {
        /// The matched record
        pub record: &'a RepositoryRecord,
        /// Match score, higher is better
        pub score: u32,
        /// Char indices into the name of the characters the query consumed
        pub positions: Vec<usize>,
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::matcher::{best_match, fuzzy_match, rank, score_candidates};
    pub use crate::scanner::{scan, ScanError, ScanOptions};
    pub use crate::service::{ScanService, ScanState};
    pub use crate::types::*;
    pub use anyhow::{Context, Result};
}
