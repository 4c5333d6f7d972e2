//! The per-family set of files fwbaseline owns.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::fs_abstraction::FileSystem;

/// Unit file plus the two ruleset snapshots for one address family.
///
/// The three paths are created together by `install` and deleted together by
/// `remove`; any other combination on disk is a partial state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedArtifactSet {
    pub unit_file: PathBuf,
    pub empty_ruleset: PathBuf,
    pub hardened_ruleset: PathBuf,
}

/// What is currently on disk for one family
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ArtifactStatus {
    Unmanaged,
    Managed,
    Partial {
        present: Vec<PathBuf>,
        missing: Vec<PathBuf>,
    },
}

impl ManagedArtifactSet {
    pub fn paths(&self) -> [&Path; 3] {
        [
            self.unit_file.as_path(),
            self.empty_ruleset.as_path(),
            self.hardened_ruleset.as_path(),
        ]
    }

    /// Split the paths into (present, missing)
    pub fn partition(&self, fs: &dyn FileSystem) -> (Vec<PathBuf>, Vec<PathBuf>) {
        let mut present = Vec::new();
        let mut missing = Vec::new();
        for path in self.paths() {
            if fs.exists(path) {
                present.push(path.to_path_buf());
            } else {
                missing.push(path.to_path_buf());
            }
        }
        (present, missing)
    }

    pub fn inspect(&self, fs: &dyn FileSystem) -> ArtifactStatus {
        let (present, missing) = self.partition(fs);
        if present.is_empty() {
            ArtifactStatus::Unmanaged
        } else if missing.is_empty() {
            ArtifactStatus::Managed
        } else {
            ArtifactStatus::Partial { present, missing }
        }
    }
}
