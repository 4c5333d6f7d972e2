//! Lifecycle of the shared ruleset directory.
//!
//! `remove` must leave the host as the first `install` found it: the ruleset
//! directory is deleted only if it did not exist before fwbaseline created
//! it. That fact is captured once and persisted in a small JSON marker
//! outside the directory, written atomically on the first install and deleted
//! when the last family is removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{FwError, FwResult};
use crate::fs_abstraction::FileSystem;

/// Whether the ruleset directory pre-dates fwbaseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryState {
    #[default]
    Unknown,
    Present,
    Absent,
}

/// Persisted record of the first install
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub config_dir_preexisted: bool,
    /// The marker's own parent directory was created by fwbaseline
    #[serde(default)]
    pub state_dir_created: bool,
    pub recorded_at: DateTime<Utc>,
}

pub struct DirectoryLifecycleTracker<'a> {
    fs: &'a dyn FileSystem,
    config_dir: PathBuf,
    state_file: PathBuf,
    state: DirectoryState,
    marker: Option<Marker>,
}

impl<'a> DirectoryLifecycleTracker<'a> {
    pub fn new(fs: &'a dyn FileSystem, config: &Config) -> Self {
        Self {
            fs,
            config_dir: config.config_dir.clone(),
            state_file: config.state_file.clone(),
            state: DirectoryState::Unknown,
            marker: None,
        }
    }

    pub fn state(&self) -> DirectoryState {
        self.state
    }

    pub fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    /// Determine whether the directory pre-dates this tool.
    ///
    /// Must run before the install path creates anything. A persisted marker
    /// wins over the live directory, since after an install the directory
    /// exists regardless of who created it. Later calls return the first
    /// captured value.
    pub fn capture_initial_state(&mut self) -> FwResult<DirectoryState> {
        if self.state != DirectoryState::Unknown {
            return Ok(self.state);
        }

        self.marker = self.load_marker()?;
        self.state = match &self.marker {
            Some(marker) if marker.config_dir_preexisted => DirectoryState::Present,
            Some(_) => DirectoryState::Absent,
            None if self.fs.exists(&self.config_dir) => DirectoryState::Present,
            None => DirectoryState::Absent,
        };

        debug!(
            "{} initial state: {:?} (marker: {})",
            self.config_dir.display(),
            self.state,
            if self.marker.is_some() { "yes" } else { "no" }
        );
        Ok(self.state)
    }

    fn load_marker(&self) -> FwResult<Option<Marker>> {
        if !self.fs.exists(&self.state_file) {
            return Ok(None);
        }

        let content = self.fs.read_to_string(&self.state_file).map_err(|e| {
            FwError::Directory(format!("Failed to read {}: {}", self.state_file.display(), e))
        })?;
        let marker = serde_json::from_str(&content).map_err(|e| {
            FwError::Directory(format!(
                "Corrupted state marker {}: {}",
                self.state_file.display(),
                e
            ))
        })?;
        Ok(Some(marker))
    }

    /// Persist the captured state if no marker exists yet. An existing marker
    /// is never rewritten.
    pub fn record(&mut self) -> FwResult<()> {
        let state = self.capture_initial_state()?;
        if self.marker.is_some() {
            return Ok(());
        }

        let state_dir = self.state_file.parent().ok_or_else(|| {
            FwError::Directory(format!(
                "State file has no parent directory: {}",
                self.state_file.display()
            ))
        })?;

        let state_dir_created = !self.fs.exists(state_dir);
        if state_dir_created {
            self.fs
                .create_dir_all(state_dir)
                .and_then(|_| self.fs.set_permissions_mode(state_dir, 0o700))
                .map_err(|e| dir_err("create", state_dir, e))?;
        }

        let marker = Marker {
            config_dir_preexisted: state == DirectoryState::Present,
            state_dir_created,
            recorded_at: Utc::now(),
        };
        let content = serde_json::to_string_pretty(&marker)
            .map_err(|e| FwError::Directory(format!("Failed to serialize marker: {}", e)))?;
        self.fs
            .write_atomic(&self.state_file, content.as_bytes())
            .map_err(|e| dir_err("write", &self.state_file, e))?;

        debug!("Recorded {:?} in {}", state, self.state_file.display());
        self.marker = Some(marker);
        Ok(())
    }

    /// Create the ruleset directory when missing
    pub fn ensure_config_dir(&self) -> FwResult<()> {
        if !self.fs.exists(&self.config_dir) {
            info!("Creating {}...", self.config_dir.display());
            self.fs
                .create_dir_all(&self.config_dir)
                .map_err(|e| dir_err("create", &self.config_dir, e))?;
        }
        Ok(())
    }

    /// Final cleanup once no family is managed anymore.
    ///
    /// The directory is removed only when it did not pre-exist and is empty;
    /// files placed there by someone else are never deleted.
    pub fn finalize_on_remove(&mut self, state: DirectoryState) -> FwResult<()> {
        match state {
            DirectoryState::Absent if self.fs.exists(&self.config_dir) => {
                let empty = self
                    .fs
                    .is_dir_empty(&self.config_dir)
                    .map_err(|e| dir_err("inspect", &self.config_dir, e))?;
                if empty {
                    info!("Removing {}...", self.config_dir.display());
                    self.fs
                        .remove_dir(&self.config_dir)
                        .map_err(|e| dir_err("remove", &self.config_dir, e))?;
                } else {
                    warn!(
                        "Keeping {}: it contains files not managed by fwbaseline",
                        self.config_dir.display()
                    );
                }
            }
            DirectoryState::Absent => {}
            DirectoryState::Present => {
                debug!("{} pre-existed, leaving it in place", self.config_dir.display());
            }
            DirectoryState::Unknown => {
                warn!(
                    "Initial state of {} unknown, leaving it in place",
                    self.config_dir.display()
                );
            }
        }

        self.forget()
    }

    fn forget(&mut self) -> FwResult<()> {
        if self.fs.exists(&self.state_file) {
            self.fs
                .remove_file(&self.state_file)
                .map_err(|e| dir_err("remove", &self.state_file, e))?;
        }

        let created = self.marker.as_ref().map_or(false, |m| m.state_dir_created);
        if let (true, Some(state_dir)) = (created, self.state_file.parent()) {
            let empty = self.fs.exists(state_dir)
                && self
                    .fs
                    .is_dir_empty(state_dir)
                    .map_err(|e| dir_err("inspect", state_dir, e))?;
            if empty {
                self.fs
                    .remove_dir(state_dir)
                    .map_err(|e| dir_err("remove", state_dir, e))?;
            }
        }

        self.marker = None;
        Ok(())
    }
}

fn dir_err(action: &str, path: &Path, err: std::io::Error) -> FwError {
    FwError::Directory(format!("Failed to {} {}: {}", action, path.display(), err))
}
