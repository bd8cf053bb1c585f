// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Repository scanning
//!
//! Walks a root directory once, collects every `.git` marker directory, and
//! turns each marker's parent into a [`RepositoryRecord`]. Scans are
//! all-or-nothing: either the whole walk succeeds or a [`ScanError`] is
//! returned and no records are.

use crate::types::RepositoryRecord;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Directory name that marks a repository root
pub const REPO_MARKER: &str = ".git";

/// Errors a scan can report
#[derive(Debug, Error)]
pub enum ScanError {
    /// The root is missing, not a directory, or not readable
    #[error("cannot read scan root {}: {source}", path.display())]
    RootUnreadable {
        /// The configured scan root
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },
    /// Any other I/O failure during the walk
    #[error("scan failed at {}: {source}", path.display())]
    TraversalFailure {
        /// The entry being read when the walk failed
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },
}

impl ScanError {
    /// Path the error refers to
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::RootUnreadable { path, .. } | Self::TraversalFailure { path, .. } => path,
        }
    }
}

/// Scan configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Maximum walk depth below the root (None = unbounded)
    pub max_depth: Option<usize>,
    /// Follow symbolic links while walking
    pub follow_symlinks: bool,
    /// Skip permission-denied entries below the root instead of failing
    pub skip_unreadable: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            follow_symlinks: false,
            skip_unreadable: true,
        }
    }
}

/// Scan `root` for repositories, sorted by name.
///
/// # Errors
///
/// Returns [`ScanError::RootUnreadable`] when the root cannot be listed and
/// [`ScanError::TraversalFailure`] when the walk fails below it.
pub fn scan(root: &Path, options: &ScanOptions) -> Result<Vec<RepositoryRecord>, ScanError> {
    let root = absolute_root(root)?;
    check_root(&root)?;

    info!("Scanning {} for repositories", root.display());

    let mut walker = WalkDir::new(&root).follow_links(options.follow_symlinks);
    if let Some(depth) = options.max_depth {
        walker = walker.max_depth(depth);
    }

    let mut records = Vec::new();
    let mut seen = HashSet::new();

    // Nothing below a hidden directory survives the name filter, so those
    // subtrees are pruned. The root itself is exempt.
    let mut entries = walker
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || is_marker(entry) || !is_hidden(entry));

    while let Some(entry) = entries.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                handle_walk_error(&root, err, options)?;
                continue;
            }
        };

        if entry.depth() == 0 || !is_marker(&entry) {
            continue;
        }

        // Never descend into the marker itself
        entries.skip_current_dir();

        if let Some(record) = record_for_marker(&root, entry.path()) {
            if seen.insert(record.path.clone()) {
                debug!("Found repository {}", record.name);
                records.push(record);
            }
        }
    }

    sort_records(&mut records);
    info!("Found {} repositories under {}", records.len(), root.display());

    Ok(records)
}

/// Sort records by name, locale style
pub fn sort_records(records: &mut [RepositoryRecord]) {
    records.sort_by(|a, b| compare_names(&a.name, &b.name));
}

/// ASCII whitespace and punctuation in root-collation primary order
const PUNCTUATION_ORDER: &str = "\t\n\u{b}\u{c}\r _-,;:!?.'\"()[]{}@*/\\&#%`^+<=>|~$";

/// Compare two names the way the root locale collation would.
///
/// The primary order folds case and ranks punctuation before digits before
/// letters, with punctuation in collation order (`_` < `-` < `.` < `/`).
/// Names equal under that order put lower case before upper case, then fall
/// back to code point order. Accents are not folded.
#[must_use]
pub fn compare_names(a: &str, b: &str) -> Ordering {
    primary_keys(a)
        .cmp(primary_keys(b))
        .then_with(|| lower_case_first(a, b))
        .then_with(|| a.cmp(b))
}

fn primary_keys(name: &str) -> impl Iterator<Item = (u8, u32)> + '_ {
    name.chars().flat_map(char::to_lowercase).map(primary_key)
}

fn primary_key(ch: char) -> (u8, u32) {
    match PUNCTUATION_ORDER.find(ch) {
        Some(rank) => (0, u32::try_from(rank).unwrap_or(u32::MAX)),
        None if ch.is_ascii_digit() => (1, ch as u32),
        None => (2, ch as u32),
    }
}

fn lower_case_first(a: &str, b: &str) -> Ordering {
    for (x, y) in a.chars().zip(b.chars()) {
        if x != y {
            return match (x.is_lowercase(), y.is_lowercase()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => Ordering::Equal,
            };
        }
    }
    Ordering::Equal
}

fn absolute_root(root: &Path) -> Result<PathBuf, ScanError> {
    let joined = if root.is_absolute() {
        root.to_path_buf()
    } else {
        let cwd = std::env::current_dir().map_err(|source| ScanError::RootUnreadable {
            path: root.to_path_buf(),
            source,
        })?;
        cwd.join(root)
    };

    Ok(joined
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect())
}

fn check_root(root: &Path) -> Result<(), ScanError> {
    let unreadable = |source: io::Error| ScanError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(root).map_err(unreadable)?;
    if !metadata.is_dir() {
        return Err(unreadable(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a directory",
        )));
    }
    fs::read_dir(root).map_err(unreadable)?;

    Ok(())
}

fn handle_walk_error(
    root: &Path,
    err: walkdir::Error,
    options: &ScanOptions,
) -> Result<(), ScanError> {
    let path = err.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);

    if err.depth() == 0 {
        return Err(ScanError::RootUnreadable {
            path,
            source: io::Error::from(err),
        });
    }

    let denied = err
        .io_error()
        .is_some_and(|e| e.kind() == io::ErrorKind::PermissionDenied);
    if denied && options.skip_unreadable {
        warn!("Skipping unreadable directory {}", path.display());
        return Ok(());
    }

    Err(ScanError::TraversalFailure {
        path,
        source: io::Error::from(err),
    })
}

fn is_marker(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name() == REPO_MARKER
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Build the record for a marker, or None if the repository is hidden
fn record_for_marker(root: &Path, marker: &Path) -> Option<RepositoryRecord> {
    let repo_root = marker.parent()?;
    let relative = repo_root.strip_prefix(root).ok()?;

    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    if segments.iter().any(|s| s.starts_with('.')) {
        debug!("Ignoring hidden repository {}", repo_root.display());
        return None;
    }

    let name = if segments.is_empty() {
        // The root is itself a repository
        repo_root.file_name().map_or_else(
            || repo_root.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        )
    } else {
        segments.join("/")
    };

    Some(RepositoryRecord::new(name, repo_root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_repo(root: &Path, rel: &str) {
        fs::create_dir_all(root.join(rel).join(REPO_MARKER)).unwrap();
    }

    fn names(records: &[RepositoryRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_name_and_path_derivation() {
        let dir = TempDir::new().unwrap();
        make_repo(dir.path(), "proj/sub");

        let records = scan(dir.path(), &ScanOptions::default()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "proj/sub");
        assert_eq!(records[0].path, dir.path().join("proj").join("sub"));
    }

    #[test]
    fn test_hidden_repositories_excluded() {
        let dir = TempDir::new().unwrap();
        make_repo(dir.path(), ".cache");
        make_repo(dir.path(), ".config/nvim");
        make_repo(dir.path(), "work/.hidden/tool");
        make_repo(dir.path(), "visible");

        let records = scan(dir.path(), &ScanOptions::default()).unwrap();

        assert_eq!(names(&records), vec!["visible"]);
    }

    #[test]
    fn test_sorted_case_insensitively() {
        let dir = TempDir::new().unwrap();
        for name in ["zeta", "Alpha", "beta"] {
            make_repo(dir.path(), name);
        }

        let records = scan(dir.path(), &ScanOptions::default()).unwrap();

        assert_eq!(names(&records), vec!["Alpha", "beta", "zeta"]);
    }

    #[test]
    fn test_nested_repositories_found() {
        let dir = TempDir::new().unwrap();
        make_repo(dir.path(), "app");
        make_repo(dir.path(), "app/vendor/lib");

        let records = scan(dir.path(), &ScanOptions::default()).unwrap();

        assert_eq!(names(&records), vec!["app", "app/vendor/lib"]);
    }

    #[test]
    fn test_marker_file_is_not_a_repository() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("worktree")).unwrap();
        fs::write(dir.path().join("worktree").join(REPO_MARKER), "gitdir: ../main/.git/worktrees/x").unwrap();
        make_repo(dir.path(), "main");

        let records = scan(dir.path(), &ScanOptions::default()).unwrap();

        assert_eq!(names(&records), vec!["main"]);
    }

    #[test]
    fn test_marker_contents_not_scanned() {
        let dir = TempDir::new().unwrap();
        make_repo(dir.path(), "outer");
        fs::create_dir_all(dir.path().join("outer/.git/modules/inner/.git")).unwrap();

        let records = scan(dir.path(), &ScanOptions::default()).unwrap();

        assert_eq!(names(&records), vec!["outer"]);
    }

    #[test]
    fn test_root_is_repository() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("solo");
        make_repo(&root, "");

        let records = scan(&root, &ScanOptions::default()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "solo");
        assert_eq!(records[0].path, root);
    }

    #[test]
    fn test_hidden_root_is_still_scanned() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join(".projects");
        make_repo(&root, "tool");

        let records = scan(&root, &ScanOptions::default()).unwrap();

        assert_eq!(names(&records), vec!["tool"]);
    }

    #[test]
    fn test_max_depth_limits_walk() {
        let dir = TempDir::new().unwrap();
        make_repo(dir.path(), "shallow");
        make_repo(dir.path(), "deep/er/still");

        let options = ScanOptions {
            max_depth: Some(2),
            ..ScanOptions::default()
        };
        let records = scan(dir.path(), &options).unwrap();

        assert_eq!(names(&records), vec!["shallow"]);
    }

    #[test]
    fn test_missing_root_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let err = scan(&missing, &ScanOptions::default()).unwrap_err();

        assert!(matches!(err, ScanError::RootUnreadable { .. }));
        assert_eq!(err.path(), missing);
    }

    #[test]
    fn test_file_root_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, "x").unwrap();

        let err = scan(&file, &ScanOptions::default()).unwrap_err();

        assert!(matches!(err, ScanError::RootUnreadable { .. }));
    }

    #[test]
    fn test_empty_tree() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("just/folders")).unwrap();

        let records = scan(dir.path(), &ScanOptions::default()).unwrap();

        assert!(records.is_empty());
    }

    /// Lock `dir` and report whether the lock is enforced; privileged users
    /// can read through it, in which case the test has nothing to check.
    #[cfg(unix)]
    fn lock(dir: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o000)).unwrap();
        fs::read_dir(dir).is_err()
    }

    #[cfg(unix)]
    fn unlock(dir: &Path) {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory() {
        let dir = TempDir::new().unwrap();
        make_repo(dir.path(), "open/app");
        make_repo(dir.path(), "locked/secret");
        let locked = dir.path().join("locked");

        if !lock(&locked) {
            unlock(&locked);
            return;
        }
        let lenient = scan(dir.path(), &ScanOptions::default());
        let strict = scan(
            dir.path(),
            &ScanOptions {
                skip_unreadable: false,
                ..ScanOptions::default()
            },
        );
        unlock(&locked);

        assert_eq!(names(&lenient.unwrap()), vec!["open/app"]);
        match strict {
            Err(ScanError::TraversalFailure { path, .. }) => assert_eq!(path, locked),
            other => panic!("expected traversal failure, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_followed_only_when_asked() {
        let dir = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        make_repo(elsewhere.path(), "linked");
        make_repo(dir.path(), "local");
        std::os::unix::fs::symlink(elsewhere.path(), dir.path().join("shared")).unwrap();

        let plain = scan(dir.path(), &ScanOptions::default()).unwrap();
        let followed = scan(
            dir.path(),
            &ScanOptions {
                follow_symlinks: true,
                ..ScanOptions::default()
            },
        )
        .unwrap();

        assert_eq!(names(&plain), vec!["local"]);
        assert_eq!(names(&followed), vec!["local", "shared/linked"]);
        assert_eq!(followed[1].path, dir.path().join("shared").join("linked"));
    }

    #[test]
    fn test_compare_names_tie_breaks() {
        assert_eq!(compare_names("alpha", "Alpha"), Ordering::Less);
        assert_eq!(compare_names("Beta", "alpha"), Ordering::Greater);
        assert_eq!(compare_names("my-project", "myproject"), Ordering::Less);
        assert_eq!(compare_names("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_punctuation_in_collation_order() {
        let mut records: Vec<RepositoryRecord> =
            ["foo/bar", "foo.bar", "foo-bar", "foo_bar", "Foo", "foo"]
                .iter()
                .map(|n| RepositoryRecord::new(*n, format!("/r/{n}")))
                .collect();

        sort_records(&mut records);

        assert_eq!(
            names(&records),
            vec!["foo", "Foo", "foo_bar", "foo-bar", "foo.bar", "foo/bar"]
        );
    }

    #[test]
    fn test_symbols_before_digits_before_letters() {
        assert_eq!(compare_names("a~b", "a1"), Ordering::Less);
        assert_eq!(compare_names("a1", "ab"), Ordering::Less);
        assert_eq!(compare_names("a{x", "a-x"), Ordering::Greater);
    }
}
