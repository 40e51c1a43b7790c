//! Project signatures: ecosystems, their markers, and their disposable
//! directories. The signature table is embedded at compile time from
//! `signatures.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::identifier::Identifier;

/// Binds one marker-matching strategy to the relative paths that become
/// deletion candidates once a root matches.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub identifier: Identifier,
    /// Candidate target paths relative to a matched root, in configured
    /// order. An empty entry means the matched root itself.
    pub relative_targets: Vec<String>,
}

impl Configuration {
    /// Exact marker check. Delegates unchanged to the identifier.
    pub fn matches(&self, path: &Path) -> bool {
        self.identifier.matches(path)
    }

    /// Cheap precheck against a candidate root. Delegates unchanged to
    /// the identifier.
    pub fn matches_optimistically(&self, root: &Path) -> bool {
        self.identifier.matches_optimistically(root)
    }

    /// Resolve each relative target against `root` and keep the ones
    /// that are directories on disk right now, in configured order.
    /// A candidate that does not exist is silently omitted.
    pub fn generate_target_list(&self, root: &Path) -> Vec<PathBuf> {
        self.relative_targets
            .iter()
            .map(|relative| {
                if relative.is_empty() {
                    root.to_path_buf()
                } else {
                    root.join(relative)
                }
            })
            .filter(|target| fs::metadata(target).map(|m| m.is_dir()).unwrap_or(false))
            .collect()
    }
}

/// A named ecosystem signature: one or more independent configurations.
/// A root may satisfy several of them, and several projects may match
/// the same root.
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    pub configurations: Vec<Configuration>,
}

// Embed the signature table directly in the binary at compile time.
const SIGNATURES_TOML: &str = include_str!("../signatures.toml");

#[derive(Debug, Deserialize)]
struct SignatureTable {
    #[serde(rename = "project")]
    projects: Vec<ProjectEntry>,
}

#[derive(Debug, Deserialize)]
struct ProjectEntry {
    name: String,
    #[serde(rename = "configuration")]
    configurations: Vec<ConfigurationEntry>,
}

#[derive(Debug, Deserialize)]
struct ConfigurationEntry {
    identifier: Identifier,
    targets: Vec<String>,
}

/// Load the embedded signature table into the ordered project list the
/// scanner consumes.
pub fn load_projects() -> Result<Vec<Project>> {
    let table: SignatureTable =
        toml::from_str(SIGNATURES_TOML).context("failed to parse embedded signature table")?;

    Ok(table
        .projects
        .into_iter()
        .map(|entry| Project {
            name: entry.name,
            configurations: entry
                .configurations
                .into_iter()
                .map(|config| Configuration {
                    identifier: config.identifier,
                    relative_targets: config.targets,
                })
                .collect(),
        })
        .collect())
}
