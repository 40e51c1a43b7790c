//! The scan engine: a single pre-order walk that matches project
//! signatures, prunes already-classified subtrees, measures sizes, and
//! streams batches of deletion candidates to a consumer.

use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use log::{debug, warn};
use thiserror::Error;
use walkdir::WalkDir;

use crate::project::Project;

/// Fatal scan errors. Everything else that goes wrong during a walk is
/// recovered locally: the offending entry or subtree is skipped and the
/// walk continues elsewhere.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The root path could not be resolved or opened. Reported before
    /// any emission; there are no partial results.
    #[error("cannot open scan root {path}: {source}")]
    RootPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The root path resolved to something other than a directory.
    #[error("scan root is not a directory: {path}")]
    RootNotADirectory { path: PathBuf },
}

/// Cooperative cancellation flag threaded from the consumer to the
/// scanner. The scanner polls it before descending into each subtree
/// and before each emission, so an aborting consumer stops the walk
/// promptly instead of leaving it blocked on a full channel.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One emitted batch: the target directories newly discovered for a
/// single project name, each with its measured size in MiB. Every path
/// in `targets` existed and was a directory at the moment of emission.
#[derive(Debug, Clone)]
pub struct MatchInfo {
    pub project: String,
    pub targets: BTreeMap<PathBuf, f64>,
}

/// The set of directories already classified as disposable during the
/// current walk; append-only for the walk's lifetime.
///
/// Keyed on path components rather than raw strings, so coverage is a
/// component-wise prefix test: `/a/target-backup` is not covered by a
/// recorded `/a/target`.
#[derive(Debug, Default)]
struct TargetTrie {
    root: TrieNode,
}

#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<OsString, TrieNode>,
    terminal: bool,
}

impl TargetTrie {
    /// True when `path` equals a recorded target or lies beneath one.
    fn covers(&self, path: &Path) -> bool {
        let mut node = &self.root;
        for component in path.components() {
            if node.terminal {
                return true;
            }
            match node.children.get(component.as_os_str()) {
                Some(child) => node = child,
                None => return false,
            }
        }
        node.terminal
    }

    /// Record `path`. Returns false without recording when the path is
    /// already covered by an existing entry, or would itself cover one:
    /// no two recorded paths ever stand in an ancestor/descendant
    /// relation.
    fn insert(&mut self, path: &Path) -> bool {
        if self.covers(path) {
            return false;
        }
        if self.contains_beneath(path) {
            return false;
        }
        let mut node = &mut self.root;
        for component in path.components() {
            node = node
                .children
                .entry(component.as_os_str().to_os_string())
                .or_default();
        }
        node.terminal = true;
        true
    }

    /// True when some recorded target lies strictly beneath `path`.
    fn contains_beneath(&self, path: &Path) -> bool {
        let mut node = &self.root;
        for component in path.components() {
            match node.children.get(component.as_os_str()) {
                Some(child) => node = child,
                // Nothing was ever recorded through this prefix.
                None => return false,
            }
        }
        // Every recorded path ends in a terminal, so any child subtree
        // here contains at least one.
        !node.children.is_empty()
    }
}

/// Walks a tree once, applying every project's configurations, and
/// streams each batch of newly discovered targets.
#[derive(Debug)]
pub struct Scanner {
    root: PathBuf,
    projects: Vec<Project>,
}

impl Scanner {
    /// Validate the root up front. A root that cannot be resolved or
    /// opened is the one fatal failure, surfaced here before any
    /// scanning starts.
    pub fn new(root: impl Into<PathBuf>, projects: Vec<Project>) -> Result<Self, ScanError> {
        let requested = root.into();
        let root = requested
            .canonicalize()
            .map_err(|source| ScanError::RootPath {
                path: requested.clone(),
                source,
            })?;
        if !root.is_dir() {
            return Err(ScanError::RootNotADirectory { path: root });
        }
        // Probe readability now rather than emitting an empty stream
        // for a root we cannot descend into.
        fs::read_dir(&root).map_err(|source| ScanError::RootPath {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root, projects })
    }

    /// The resolved root this scanner will walk.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run the walk to completion, sending one [`MatchInfo`] per
    /// project name per batch of newly discovered targets. Consumes the
    /// scanner: the traversal cannot be restarted. The stream closes
    /// (sender dropped) exactly once, when the walk finishes, is
    /// cancelled, or the receiver hangs up.
    pub fn run(self, sender: Sender<MatchInfo>, cancel: &CancelToken) {
        let mut known = TargetTrie::default();
        let mut walker = WalkDir::new(&self.root).into_iter();

        while let Some(entry) = walker.next() {
            if cancel.is_cancelled() {
                return;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("skipping unreadable entry: {err}");
                    continue;
                }
            };
            let path = entry.path();

            // Never re-descend into a directory already classified as
            // disposable, and never evaluate configurations against it.
            if known.covers(path) {
                if entry.file_type().is_dir() {
                    walker.skip_current_dir();
                }
                continue;
            }

            // Only directories can be project roots.
            if !entry.file_type().is_dir() {
                continue;
            }

            for (project, targets) in self.collect_new_targets(path, &mut known) {
                let targets: BTreeMap<PathBuf, f64> = targets
                    .into_iter()
                    .map(|target| {
                        let size = directory_size_mib(&target);
                        (target, size)
                    })
                    .collect();

                if cancel.is_cancelled() {
                    return;
                }
                if sender.send(MatchInfo { project, targets }).is_err() {
                    // Receiver hung up; nobody is listening anymore.
                    return;
                }
            }

            // An empty relative target can classify the directory we
            // are standing in; its subtree is pruned like any other.
            if known.covers(path) {
                walker.skip_current_dir();
            }
        }
    }

    /// Evaluate every configuration of every project against `root`,
    /// record the verified targets, and group the new ones by project
    /// name in first-appearance order. A target claimed by an earlier
    /// project is not re-attributed to a later one.
    fn collect_new_targets(
        &self,
        root: &Path,
        known: &mut TargetTrie,
    ) -> Vec<(String, Vec<PathBuf>)> {
        let mut batches: Vec<(String, Vec<PathBuf>)> = Vec::new();

        for project in &self.projects {
            for configuration in &project.configurations {
                if !configuration.matches_optimistically(root) {
                    continue;
                }
                // An optimistic match is only a hint; the target list
                // re-verifies existence on disk.
                for target in configuration.generate_target_list(root) {
                    if !known.insert(&target) {
                        continue;
                    }
                    debug!(
                        "{} project at {}: target {}",
                        project.name,
                        root.display(),
                        target.display()
                    );
                    match batches.iter_mut().find(|(name, _)| *name == project.name) {
                        Some((_, targets)) => targets.push(target),
                        None => batches.push((project.name.clone(), vec![target])),
                    }
                }
            }
        }

        batches
    }
}

/// Measure a directory: the recursive sum of regular-file byte sizes,
/// in MiB. Directories themselves contribute zero, and unreadable
/// entries contribute zero without aborting the sum.
fn directory_size_mib(root: &Path) -> f64 {
    let mut total: u64 = 0;
    for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
        if entry.file_type().is_file() {
            if let Ok(metadata) = entry.metadata() {
                total += metadata.len();
            }
        }
    }
    total as f64 / 1024.0 / 1024.0
}
