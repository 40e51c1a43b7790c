//! Project-root marker matching strategies.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// A strategy for recognizing the marker that flags a project root.
///
/// Two checks are exposed. [`Identifier::matches`] is the exact,
/// filesystem-verified check against a concrete path: it distinguishes
/// files from directories, requires existence, and answers `false` for
/// anything it cannot stat. [`Identifier::matches_optimistically`] is a
/// cheap precheck against a candidate root directory, run before
/// committing to target-list generation; it may accept paths a later
/// exact check would reject, and callers must re-verify anything it
/// accepts.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Identifier {
    /// A marker file with an exact base name, optionally constrained to
    /// sit under a parent directory with the given suffix.
    FileName {
        name: String,
        #[serde(default)]
        directory: Option<String>,
    },
    /// A directory containing at least one entry with the given
    /// extension (stored without the leading dot). Sibling entries with
    /// other extensions are irrelevant.
    FileExtensionInDirectory { directory: String, extension: String },
    /// A marker file with an exact base name inside a specific
    /// subdirectory of the root.
    FileNameInDirectory { directory: String, name: String },
}

impl Identifier {
    /// Exact check against a concrete path. Never fails loudly: any
    /// path that cannot be stat'd does not match.
    pub fn matches(&self, path: &Path) -> bool {
        match self {
            Identifier::FileName { name, directory } => {
                file_name_matches(path, name, directory.as_deref())
            }
            Identifier::FileNameInDirectory { directory, name } => {
                file_name_matches(path, name, Some(directory))
            }
            Identifier::FileExtensionInDirectory { extension, .. } => {
                let Ok(metadata) = fs::metadata(path) else {
                    return false;
                };
                if !metadata.is_dir() {
                    return false;
                }
                let Ok(entries) = fs::read_dir(path) else {
                    return false;
                };
                entries.flatten().any(|entry| {
                    Path::new(&entry.file_name())
                        .extension()
                        .is_some_and(|ext| ext == extension.as_str())
                })
            }
        }
    }

    /// Cheap precheck against a candidate root directory: resolve where
    /// the marker would live under `root` and run the exact check
    /// there. An empty or absent directory constraint means the root
    /// itself, not any ancestor.
    pub fn matches_optimistically(&self, root: &Path) -> bool {
        let candidate = match self {
            Identifier::FileName { name, directory } => {
                join_all(root, [directory.as_deref().unwrap_or(""), name])
            }
            Identifier::FileNameInDirectory { directory, name } => {
                join_all(root, [directory.as_str(), name])
            }
            Identifier::FileExtensionInDirectory { directory, .. } => {
                join_all(root, [directory.as_str()])
            }
        };
        self.matches(&candidate)
    }
}

/// True when `path` is an existing file with base name `name`, and (if
/// constrained) its parent path ends with the `directory` suffix,
/// compared component-wise.
fn file_name_matches(path: &Path, name: &str, directory: Option<&str>) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if metadata.is_dir() {
        return false;
    }
    if !path.file_name().is_some_and(|f| f == name) {
        return false;
    }
    match directory {
        None => true,
        Some("") => true,
        Some(dir) => path.parent().is_some_and(|parent| parent.ends_with(dir)),
    }
}

/// Join non-empty segments onto `root`.
fn join_all<'a>(root: &Path, segments: impl IntoIterator<Item = &'a str>) -> PathBuf {
    let mut joined = root.to_path_buf();
    for segment in segments {
        if !segment.is_empty() {
            joined.push(segment);
        }
    }
    joined
}
