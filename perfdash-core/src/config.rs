//! Dashboard configuration, loaded from an INI file.
//!
//! All settings live in the `[dashboard]` section:
//!
//! ```ini
//! [dashboard]
//! APP_VERSION = 1.3
//! CUSTOM_LINK = dashboard
//! DATABASE = sqlite://perfdash.db
//! GROUP_BY = customer
//! GIT = ../.git
//! ```
//!
//! When `GIT` points at a VCS metadata directory, the commit hash found
//! through its HEAD file overrides `APP_VERSION`. Keeping the version in a
//! config file goes stale quickly; reading it from the repository does not.

use std::fs;
use std::path::{Path, PathBuf};

use config::{File, FileFormat, Value};

use crate::error::{DashboardError, Result};

/// Resolved dashboard settings.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Version of the monitored application. Stored with every measurement
    /// so execution times can be compared across releases.
    pub version: String,

    /// URL prefix the HTML dashboard pages are mounted under.
    pub link: String,

    /// sqlx database URL for the measurement store.
    pub database_url: String,

    /// Optional grouping tag; grouped queries split results on this column.
    pub group_by: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            link: "dashboard".to_string(),
            database_url: "sqlite://perfdash.db".to_string(),
            group_by: None,
        }
    }
}

impl DashboardConfig {
    /// Load settings from an INI file, applying defaults for absent keys.
    ///
    /// Recognized keys in the `[dashboard]` section: `APP_VERSION`,
    /// `CUSTOM_LINK`, `DATABASE`, `GROUP_BY`, `GIT`. Keys are matched
    /// case-insensitively. A `GIT` entry is resolved relative to the config
    /// file and its derived version wins over `APP_VERSION`.
    ///
    /// # Errors
    ///
    /// Fails on a missing or malformed file, and on a configured but
    /// unreadable VCS ref.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .add_source(File::from(path).format(FileFormat::Ini))
            .build()?;

        // A file without a [dashboard] section is all defaults.
        let section = settings.get_table("dashboard").unwrap_or_default();

        let mut cfg = Self::default();
        if let Some(version) = get_str(&section, "APP_VERSION")? {
            cfg.version = version;
        }
        if let Some(link) = get_str(&section, "CUSTOM_LINK")? {
            cfg.link = link;
        }
        if let Some(database) = get_str(&section, "DATABASE")? {
            cfg.database_url = database;
        }
        if let Some(group_by) = get_str(&section, "GROUP_BY")? {
            cfg.group_by = Some(group_by);
        }

        // GIT is resolved last so it overrides APP_VERSION.
        if let Some(git) = get_str(&section, "GIT")? {
            let git_dir = match path.parent() {
                Some(parent) => parent.join(&git),
                None => PathBuf::from(&git),
            };
            cfg.version = vcs_version(&git_dir)?;
            tracing::debug!(version = %cfg.version, "version derived from VCS ref");
        }

        Ok(cfg)
    }
}

/// Case-insensitive lookup of a string value in a config section.
fn get_str(section: &config::Map<String, Value>, key: &str) -> Result<Option<String>> {
    let found = section
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.clone());

    match found {
        Some(value) => value
            .into_string()
            .map(Some)
            .map_err(|e| DashboardError::invalid_value(key, e.to_string())),
        None => Ok(None),
    }
}

/// Derive a version string from a VCS metadata directory.
///
/// Reads `<dir>/HEAD`. A symbolic ref (`ref: refs/heads/main`) is followed
/// to the named ref file and its commit hash returned; a detached HEAD
/// already holds the hash directly.
fn vcs_version(git_dir: &Path) -> Result<String> {
    let head_path = git_dir.join("HEAD");
    let head = fs::read_to_string(&head_path)
        .map_err(|e| DashboardError::vcs_ref(&head_path, e))?;
    let head = head.trim();

    match head.strip_prefix("ref:") {
        Some(ref_name) => {
            let ref_path = git_dir.join(ref_name.trim());
            let commit = fs::read_to_string(&ref_path)
                .map_err(|e| DashboardError::vcs_ref(&ref_path, e))?;
            Ok(commit.trim().to_string())
        }
        None => Ok(head.to_string()),
    }
}
