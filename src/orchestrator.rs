//! Install/remove state machine.
//!
//! Every family in scope is guarded before anything is touched, then the
//! families are processed one after another in [`AddressFamily::ALL`] order.
//! The first failure aborts the run; completed steps are not rolled back.

use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::artifacts::ArtifactStatus;
use crate::config::Config;
use crate::enforcer::PacketFilter;
use crate::error::{FwError, FwResult};
use crate::family::AddressFamily;
use crate::fs_abstraction::FileSystem;
use crate::guard::PreconditionGuard;
use crate::policy::PolicyEngine;
use crate::service::{ServiceManager, ServiceUnitManager};
use crate::state::DirectoryLifecycleTracker;
use crate::toolchain::Toolchain;

/// Last step the orchestrator completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ScopeResolved,
    Guarded,
    Materialized,
    Activated,
    Deactivated,
    Done,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Install,
    Remove,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Install => write!(f, "install"),
            Operation::Remove => write!(f, "remove"),
        }
    }
}

pub struct Orchestrator<'a> {
    config: &'a Config,
    fs: &'a dyn FileSystem,
    filter: &'a dyn PacketFilter,
    services: &'a dyn ServiceManager,
    toolchain: &'a Toolchain,
    phase: Phase,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a Config,
        fs: &'a dyn FileSystem,
        filter: &'a dyn PacketFilter,
        services: &'a dyn ServiceManager,
        toolchain: &'a Toolchain,
    ) -> Self {
        Self {
            config,
            fs,
            filter,
            services,
            toolchain,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run `operation` over `scope` (`None` = both families).
    ///
    /// Returns the families that were processed.
    pub fn run(
        &mut self,
        operation: Operation,
        scope: Option<AddressFamily>,
    ) -> FwResult<Vec<AddressFamily>> {
        debug!("Starting {} (scope: {:?})", operation, scope);
        let result = match operation {
            Operation::Install => self.run_install(scope),
            Operation::Remove => self.run_remove(scope),
        };
        self.phase = if result.is_ok() {
            Phase::Done
        } else {
            Phase::Aborted
        };
        result
    }

    pub fn install(&mut self, scope: Option<AddressFamily>) -> FwResult<Vec<AddressFamily>> {
        self.run(Operation::Install, scope)
    }

    pub fn remove(&mut self, scope: Option<AddressFamily>) -> FwResult<Vec<AddressFamily>> {
        self.run(Operation::Remove, scope)
    }

    fn advance(&mut self, phase: Phase) {
        debug!("Phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    fn run_install(&mut self, scope: Option<AddressFamily>) -> FwResult<Vec<AddressFamily>> {
        let mut tracker = DirectoryLifecycleTracker::new(self.fs, self.config);
        tracker.capture_initial_state()?;

        let families = AddressFamily::scope(scope);
        self.advance(Phase::ScopeResolved);

        let guard = PreconditionGuard::new(self.fs, self.config);
        let units = ServiceUnitManager::new(self.services, self.fs, self.config, self.toolchain);
        for &family in &families {
            guard.assert_absent(family)?;
            // Unit rendering must not fail after the live ruleset changed
            units.generate_unit(family)?;
        }
        self.advance(Phase::Guarded);

        tracker.record()?;
        tracker.ensure_config_dir()?;

        let engine = PolicyEngine::new(self.filter, self.fs);

        for &family in &families {
            let artifacts = self.config.artifacts(family);
            engine.materialize_empty(family, &artifacts)?;
            engine.materialize_hardened(family, &artifacts)?;
            self.advance(Phase::Materialized);

            units.activate(family)?;
            self.advance(Phase::Activated);
            info!("{} baseline firewall installed", family);
        }

        Ok(families)
    }

    fn run_remove(&mut self, scope: Option<AddressFamily>) -> FwResult<Vec<AddressFamily>> {
        let mut tracker = DirectoryLifecycleTracker::new(self.fs, self.config);
        let initial = tracker.capture_initial_state()?;

        let families = AddressFamily::scope(scope);
        self.advance(Phase::ScopeResolved);

        let guard = PreconditionGuard::new(self.fs, self.config);
        for &family in &families {
            guard.assert_present(family)?;
        }
        self.advance(Phase::Guarded);

        let units = ServiceUnitManager::new(self.services, self.fs, self.config, self.toolchain);

        for &family in &families {
            // The unit's stop action reads empty.vF, so it goes first
            units.deactivate(family)?;
            self.advance(Phase::Deactivated);

            let artifacts = self.config.artifacts(family);
            self.delete(&artifacts.hardened_ruleset)?;
            self.delete(&artifacts.empty_ruleset)?;
            info!("{} baseline firewall removed", family);
        }

        let remaining: Vec<AddressFamily> = AddressFamily::ALL
            .into_iter()
            .filter(|&f| guard.inspect(f) != ArtifactStatus::Unmanaged)
            .collect();
        if remaining.is_empty() {
            tracker.finalize_on_remove(initial)?;
        } else {
            debug!(
                "Keeping {}: still in use by {:?}",
                self.config.config_dir.display(),
                remaining
            );
        }

        Ok(families)
    }

    fn delete(&self, path: &Path) -> FwResult<()> {
        info!("Removing {}...", path.display());
        self.fs.remove_file(path).map_err(|e| {
            FwError::Directory(format!("Failed to remove {}: {}", path.display(), e))
        })
    }
}
