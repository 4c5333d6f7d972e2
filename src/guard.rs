//! Precondition checks run before any mutation.

use tracing::debug;

use crate::artifacts::ArtifactStatus;
use crate::config::Config;
use crate::error::{FwError, FwResult};
use crate::family::AddressFamily;
use crate::fs_abstraction::FileSystem;

/// Read-only inspection of a family's managed artifacts
pub struct PreconditionGuard<'a> {
    fs: &'a dyn FileSystem,
    config: &'a Config,
}

impl<'a> PreconditionGuard<'a> {
    pub fn new(fs: &'a dyn FileSystem, config: &'a Config) -> Self {
        Self { fs, config }
    }

    pub fn inspect(&self, family: AddressFamily) -> ArtifactStatus {
        self.config.artifacts(family).inspect(self.fs)
    }

    /// Fails if any artifact for `family` already exists
    pub fn assert_absent(&self, family: AddressFamily) -> FwResult<()> {
        let (present, _) = self.config.artifacts(family).partition(self.fs);
        if !present.is_empty() {
            return Err(FwError::AlreadyManaged { family, present });
        }
        debug!("{}: no managed artifacts present", family);
        Ok(())
    }

    /// Fails if any artifact for `family` is missing
    pub fn assert_present(&self, family: AddressFamily) -> FwResult<()> {
        let (_, missing) = self.config.artifacts(family).partition(self.fs);
        if !missing.is_empty() {
            return Err(FwError::NotManaged { family, missing });
        }
        debug!("{}: all managed artifacts present", family);
        Ok(())
    }
}
