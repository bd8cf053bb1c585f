// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Settings are layered: built-in defaults, then a TOML file, then
//! `REPOPICK_*` environment variables. The scanner never reads any of this
//! itself; callers resolve a root and options here and pass them in.

use crate::scanner::ScanOptions;
use crate::types::RepositoryRecord;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Placeholder replaced by the quoted repository path in the open command
pub const PATH_PLACEHOLDER: &str = "{path}";

/// Open command used when none is configured
pub const DEFAULT_OPEN_COMMAND: &str = "code {path}";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory to scan; empty means the home directory
    pub scan_root: String,
    /// Command template for opening a repository, `{path}` is substituted
    pub open_command: String,
    /// Maximum scan depth below the root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    /// Skip unreadable directories instead of failing the scan
    pub skip_unreadable: bool,
    /// Follow symbolic links while scanning
    pub follow_symlinks: bool,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan_root: String::new(),
            open_command: DEFAULT_OPEN_COMMAND.to_string(),
            max_depth: None,
            skip_unreadable: true,
            follow_symlinks: false,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Root to scan: the override if given, else the configured root, else home.
    ///
    /// A configured root starting with `~/` is expanded against the home
    /// directory.
    ///
    /// # Errors
    ///
    /// Fails when a home directory is needed but cannot be determined.
    pub fn resolve_scan_root(&self, root_override: Option<&Path>) -> Result<PathBuf> {
        if let Some(root) = root_override {
            return Ok(root.to_path_buf());
        }

        let configured = self.scan_root.trim();
        if configured.is_empty() || configured == "~" {
            return home_dir();
        }
        if let Some(rest) = configured.strip_prefix("~/") {
            return Ok(home_dir()?.join(rest));
        }

        Ok(PathBuf::from(configured))
    }

    /// Scan options derived from this configuration
    #[must_use]
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            max_depth: self.max_depth,
            skip_unreadable: self.skip_unreadable,
            follow_symlinks: self.follow_symlinks,
        }
    }

    /// Render the open command for `record`, quoting its path
    #[must_use]
    pub fn render_open_command(&self, record: &RepositoryRecord) -> String {
        let template = if self.open_command.trim().is_empty() {
            DEFAULT_OPEN_COMMAND
        } else {
            self.open_command.as_str()
        };
        let quoted = format!("\"{}\"", record.path.display());
        template.replace(PATH_PLACEHOLDER, &quoted)
    }

    /// Serialize as TOML
    ///
    /// # Errors
    ///
    /// Fails if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

/// Default location of the configuration file
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "hyperpolymath", "repopick")
        .map(|d| d.config_dir().join("config.toml"))
}

/// Load configuration from `path`, or the default file if it exists.
///
/// An explicitly given file must exist; the default file is optional.
///
/// # Errors
///
/// Fails when the file cannot be read or a value has the wrong type.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let mut builder = ::config::Config::builder();

    match path {
        Some(file) => {
            debug!("Loading configuration from {}", file.display());
            builder = builder.add_source(::config::File::from(file.to_path_buf()).required(true));
        }
        None => {
            if let Some(file) = default_config_path() {
                builder = builder.add_source(::config::File::from(file).required(false));
            }
        }
    }

    let settings = builder
        .add_source(::config::Environment::with_prefix("REPOPICK").try_parsing(true))
        .build()
        .context("Failed to load configuration")?;

    settings
        .try_deserialize()
        .context("Invalid configuration")
}

fn home_dir() -> Result<PathBuf> {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .context("Could not determine the home directory")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.scan_root.is_empty());
        assert_eq!(config.open_command, "code {path}");
        assert!(config.scan_options().skip_unreadable);
        assert!(!config.scan_options().follow_symlinks);
    }

    #[test]
    fn test_override_wins() {
        let config = Config {
            scan_root: "/srv/code".into(),
            ..Config::default()
        };
        let root = config.resolve_scan_root(Some(Path::new("/tmp/x"))).unwrap();
        assert_eq!(root, PathBuf::from("/tmp/x"));
    }

    #[test]
    fn test_configured_root() {
        let config = Config {
            scan_root: "/srv/code".into(),
            ..Config::default()
        };
        assert_eq!(config.resolve_scan_root(None).unwrap(), PathBuf::from("/srv/code"));
    }

    #[test]
    fn test_empty_root_is_home() {
        let home = directories::BaseDirs::new().unwrap().home_dir().to_path_buf();
        let config = Config::default();
        assert_eq!(config.resolve_scan_root(None).unwrap(), home);

        let tilde = Config {
            scan_root: "~/src".into(),
            ..Config::default()
        };
        assert_eq!(tilde.resolve_scan_root(None).unwrap(), home.join("src"));
    }

    #[test]
    fn test_render_open_command() {
        let record = RepositoryRecord::new("proj", "/home/u/proj");
        let config = Config {
            open_command: "nvim {path} +Explore".into(),
            ..Config::default()
        };
        assert_eq!(config.render_open_command(&record), "nvim \"/home/u/proj\" +Explore");

        let blank = Config {
            open_command: String::new(),
            ..Config::default()
        };
        assert_eq!(blank.render_open_command(&record), "code \"/home/u/proj\"");
    }

    #[test]
    fn test_load_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config.toml");
        fs::write(
            &file,
            "scan_root = \"/srv/code\"\nopen_command = \"zed {path}\"\nmax_depth = 4\nfollow_symlinks = true\n",
        )
        .unwrap();

        let config = load(Some(&file)).unwrap();

        assert_eq!(config.scan_root, "/srv/code");
        assert_eq!(config.open_command, "zed {path}");
        assert_eq!(config.max_depth, Some(4));
        assert!(config.skip_unreadable);
        assert!(config.scan_options().follow_symlinks);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = TempDir::new().unwrap();
        assert!(load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_toml_output() {
        let text = Config::default().to_toml().unwrap();
        assert!(text.contains("open_command = \"code {path}\""));
        assert!(!text.contains("max_depth"));
    }
}
