// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Find command - ranks repositories against a fuzzy query

use super::{scan_records, Output};
use crate::config::Config;
use crate::matcher::score_candidates;
use crate::types::{RepositoryRecord, ScoredCandidate};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One line of `find --json` output
#[derive(Debug, Serialize)]
struct FoundRepo<'a> {
    name: &'a str,
    path: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<u32>,
}

/// Run the find command
pub fn run(
    config: &Config,
    query: &[String],
    root: Option<PathBuf>,
    limit: Option<usize>,
    show_scores: bool,
    output: Output,
) -> Result<()> {
    let query = query.join(" ");
    let (root, records) = scan_records(config, root.as_deref(), &config.scan_options())?;

    let matches = ranked(&query, &records);
    debug!("{} of {} repositories match {:?}", matches.len(), records.len(), query);
    let shown = &matches[..limit.map_or(matches.len(), |n| n.min(matches.len()))];

    if output.json {
        let rows: Vec<FoundRepo<'_>> = shown
            .iter()
            .map(|m| FoundRepo {
                name: &m.record.name,
                path: &m.record.path,
                score: m.score,
            })
            .collect();
        let json = serde_json::to_string_pretty(&rows).context("Failed to serialize matches")?;
        println!("{json}");
        return Ok(());
    }

    if shown.is_empty() {
        if records.is_empty() {
            println!("No git repositories found in {}", root.display());
        } else {
            println!("No repositories match '{query}'");
        }
        return Ok(());
    }

    for m in shown {
        let name = highlight(&m.record.name, &m.positions, output.color);
        let path = m.record.path.display().to_string();
        let path = if output.color { path.dimmed().to_string() } else { path };
        match (show_scores, m.score) {
            (true, Some(score)) => println!("{score:>4}  {name}  {path}"),
            _ => println!("{name}  {path}"),
        }
    }

    Ok(())
}

/// A ranked row; `score` is None when the query was empty
#[derive(Debug)]
struct Ranked<'a> {
    record: &'a RepositoryRecord,
    score: Option<u32>,
    positions: Vec<usize>,
}

fn ranked<'a>(query: &str, records: &'a [RepositoryRecord]) -> Vec<Ranked<'a>> {
    if query.is_empty() {
        return records
            .iter()
            .map(|record| Ranked {
                record,
                score: None,
                positions: Vec::new(),
            })
            .collect();
    }

    score_candidates(query, records)
        .into_iter()
        .map(|ScoredCandidate { record, score, positions }| Ranked {
            record,
            score: Some(score),
            positions,
        })
        .collect()
}

/// Emphasise the matched characters of `name`
pub(crate) fn highlight(name: &str, positions: &[usize], color: bool) -> String {
    if !color || positions.is_empty() {
        return name.to_string();
    }

    name.chars()
        .enumerate()
        .map(|(idx, ch)| {
            if positions.contains(&idx) {
                ch.green().bold().to_string()
            } else {
                ch.to_string()
            }
        })
        .collect()
}
