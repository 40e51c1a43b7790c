//! Reclaim - Build-Artifact Reclamation
//!
//! Reclaim walks a directory tree looking for the disposable directories
//! that software ecosystems regenerate on demand (a `node_modules` next
//! to a `package.json`, a `target` next to a `Cargo.toml`) and offers
//! them for deletion, one batch at a time.
//!
//! ## Architecture
//!
//! The scan engine is a single-threaded pre-order walk. At every
//! directory it asks each project signature for a cheap optimistic
//! match, verifies the candidate targets on disk, records them in an
//! append-only set with component-wise prefix semantics, and never
//! descends into anything it has already classified as disposable.
//! Discovered batches stream to the consumer over a single-slot
//! channel; a cancellation token lets the consumer stop the walk
//! mid-flight.

pub mod identifier;
pub mod project;
pub mod scanner;

// Re-export commonly used items
pub use identifier::Identifier;
pub use project::{load_projects, Configuration, Project};
pub use scanner::{CancelToken, MatchInfo, ScanError, Scanner};
