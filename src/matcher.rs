// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Fuzzy matching and ranking of repository names
//!
//! A query matches a name when its characters appear in the name in order,
//! ignoring case. Each matched character is worth one point plus the length of
//! the run of matches directly before it, and matches that land on the start
//! of the name or right after `-`, `_` or `/` earn a flat bonus.
//!
//! Ranking is pure and cheap (linear in candidates times name length), so it
//! is meant to be re-run on every keystroke.

use crate::types::{RepositoryRecord, ScoredCandidate};

/// Points for each matched character, before the run bonus
pub const MATCH_POINTS: u32 = 1;

/// Bonus for a match at the start of the name or after a separator
pub const BOUNDARY_BONUS: u32 = 5;

/// Characters that start a new word for the boundary bonus
pub const BOUNDARY_CHARS: [char; 3] = ['-', '_', '/'];

/// Result of matching one query against one text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyMatch {
    /// Total score, higher is better
    pub score: u32,
    /// Char indices into the text as given, one per matched character
    pub positions: Vec<usize>,
}

/// Match `query` against `text`.
///
/// Returns `None` when some query character cannot be consumed.
#[must_use]
pub fn fuzzy_match(query: &str, text: &str) -> Option<FuzzyMatch> {
    match_pattern(&normalize_query(query), text)
}

/// Filter and order `candidates` for `query`, best match first.
///
/// An empty query returns every candidate in its original order without
/// scoring. Otherwise non-matches are dropped and equal scores keep their
/// input order.
#[must_use]
pub fn rank<'a>(query: &str, candidates: &'a [RepositoryRecord]) -> Vec<&'a RepositoryRecord> {
    if query.is_empty() {
        return candidates.iter().collect();
    }

    score_candidates(query, candidates)
        .into_iter()
        .map(|candidate| candidate.record)
        .collect()
}

/// Score every candidate that matches `query`, sorted best first (stable).
#[must_use]
pub fn score_candidates<'a>(
    query: &str,
    candidates: &'a [RepositoryRecord],
) -> Vec<ScoredCandidate<'a>> {
    let pattern = normalize_query(query);

    let mut scored: Vec<ScoredCandidate<'a>> = candidates
        .iter()
        .filter_map(|record| {
            let found = match_pattern(&pattern, &record.name)?;
            Some(ScoredCandidate {
                record,
                score: found.score,
                positions: found.positions,
            })
        })
        .collect();

    // sort_by is stable, so ties keep the scan's alphabetical order
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}

/// The record a picker would activate for `query`, if any
#[must_use]
pub fn best_match<'a>(query: &str, candidates: &'a [RepositoryRecord]) -> Option<&'a RepositoryRecord> {
    rank(query, candidates).into_iter().next()
}

fn normalize_query(query: &str) -> Vec<char> {
    query
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

fn match_pattern(pattern: &[char], text: &str) -> Option<FuzzyMatch> {
    // Lower-cased chars, each tagged with the index of the char it came from
    let text: Vec<(usize, char)> = text
        .chars()
        .enumerate()
        .flat_map(|(idx, ch)| ch.to_lowercase().map(move |lower| (idx, lower)))
        .collect();
    if pattern.len() > text.len() {
        return None;
    }

    let mut next = 0;
    let mut score: u32 = 0;
    let mut run: u32 = 0;
    let mut hits = Vec::with_capacity(pattern.len());

    for (pos, &(_, ch)) in text.iter().enumerate() {
        if next == pattern.len() {
            break;
        }
        if ch == pattern[next] {
            score = score.saturating_add(MATCH_POINTS + run);
            run += 1;
            hits.push(pos);
            next += 1;
        } else {
            run = 0;
        }
    }

    if next < pattern.len() {
        return None;
    }

    let mut positions: Vec<usize> = Vec::with_capacity(hits.len());
    for &pos in &hits {
        if pos == 0 || BOUNDARY_CHARS.contains(&text[pos - 1].1) {
            score = score.saturating_add(BOUNDARY_BONUS);
        }
        let original = text[pos].0;
        if positions.last() != Some(&original) {
            positions.push(original);
        }
    }

    Some(FuzzyMatch { score, positions })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(names: &[&str]) -> Vec<RepositoryRecord> {
        names
            .iter()
            .map(|n| RepositoryRecord::new(*n, format!("/home/u/{n}")))
            .collect()
    }

    fn ranked_names<'a>(query: &str, candidates: &'a [RepositoryRecord]) -> Vec<&'a str> {
        rank(query, candidates).into_iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_scores_boundaries_and_runs() {
        // m@0 (1 + 5), p after '-' (1 + 5)
        assert_eq!(fuzzy_match("mp", "my-project").unwrap().score, 12);
        // y@1 (1), p after '-' (1 + 5)
        assert_eq!(fuzzy_match("yp", "my-project").unwrap().score, 7);
        // m@0 (1 + 5), y@1 (2)
        assert_eq!(fuzzy_match("my", "my-project").unwrap().score, 8);
    }

    #[test]
    fn test_consecutive_run_grows() {
        // 1 + 2 + 3 + 4, plus boundary at 0
        let found = fuzzy_match("repo", "repo").unwrap();
        assert_eq!(found.score, 15);
        assert_eq!(found.positions, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_run_resets_on_gap() {
        // a@1 (1), b@3 (1); no boundaries
        assert_eq!(fuzzy_match("ab", "xaxb").unwrap().score, 2);
    }

    #[test]
    fn test_boundary_chars() {
        assert_eq!(fuzzy_match("b", "a_b").unwrap().score, 6);
        assert_eq!(fuzzy_match("b", "a/b").unwrap().score, 6);
        assert_eq!(fuzzy_match("b", "a.b").unwrap().score, 1);
        assert_eq!(fuzzy_match("b", "a b").unwrap().score, 1);
    }

    #[test]
    fn test_case_insensitive_and_whitespace_stripped() {
        let upper = fuzzy_match("M P", "My-Project").unwrap();
        let lower = fuzzy_match("mp", "my-project").unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_positions_index_original_chars() {
        // 'İ' lower-cases to two chars; positions still index the name as given
        let found = fuzzy_match("x", "İx").unwrap();
        assert_eq!(found.positions, vec![1]);
        assert_eq!(found.score, 1);

        let found = fuzzy_match("ib", "İ-b").unwrap();
        assert_eq!(found.positions, vec![0, 2]);
    }

    #[test]
    fn test_greedy_first_occurrence() {
        // Greedy left-to-right picks the first 'a', not the boundary one
        let found = fuzzy_match("a", "xa-a").unwrap();
        assert_eq!(found.positions, vec![1]);
        assert_eq!(found.score, 1);
    }

    #[test]
    fn test_non_match() {
        assert!(fuzzy_match("ba", "frontend-app").is_none());
        assert!(fuzzy_match("longer", "long").is_none());
        assert!(fuzzy_match("ab", "ba").is_none());
    }

    #[test]
    fn test_whitespace_only_query_matches_everything() {
        let found = fuzzy_match("   ", "anything").unwrap();
        assert_eq!(found.score, 0);
        assert!(found.positions.is_empty());
    }

    #[test]
    fn test_empty_query_is_passthrough() {
        let candidates = records(&["zeta", "alpha", "mid"]);
        assert_eq!(ranked_names("", &candidates), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_filters_to_subsequence_matches() {
        let candidates = records(&["frontend-app", "backend-api", "infra-tools"]);
        assert_eq!(ranked_names("ba", &candidates), vec!["backend-api"]);
    }

    #[test]
    fn test_boundary_match_ranks_first() {
        let candidates = records(&["myproject2", "my-project"]);
        assert_eq!(ranked_names("mp", &candidates), vec!["my-project", "myproject2"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let candidates = records(&["b-x", "a-x", "c-x"]);
        assert_eq!(ranked_names("x", &candidates), vec!["b-x", "a-x", "c-x"]);
    }

    #[test]
    fn test_empty_candidates() {
        assert!(rank("abc", &[]).is_empty());
        assert!(rank("", &[]).is_empty());
    }

    #[test]
    fn test_best_match() {
        let candidates = records(&["myproject2", "my-project"]);
        assert_eq!(best_match("mp", &candidates).unwrap().name, "my-project");
        assert!(best_match("zzz", &candidates).is_none());
        assert_eq!(best_match("", &candidates).unwrap().name, "myproject2");
    }

    #[test]
    fn test_score_candidates_carries_positions() {
        let candidates = records(&["tools/repo-pick"]);
        let scored = score_candidates("rp", &candidates);
        assert_eq!(scored.len(), 1);
        // Greedy: the 'p' inside "repo" is taken before the one after '-'
        assert_eq!(scored[0].positions, vec![6, 8]);
        // r after '/' (1 + 5), p (1)
        assert_eq!(scored[0].score, 7);
    }
}
