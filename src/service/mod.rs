//! systemd integration: one restore unit per address family.

mod unit;

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

pub(crate) use unit::validate_unit_path;
pub use unit::ServiceUnitSpec;

use crate::cmd_abstraction::{args_to_strings, exec_checked, CommandExecutor};
use crate::config::Config;
use crate::error::{FwError, FwResult};
use crate::family::AddressFamily;
use crate::fs_abstraction::FileSystem;
use crate::toolchain::Toolchain;

/// Service-manager capabilities used by the unit lifecycle
pub trait ServiceManager: Send + Sync {
    fn reload_units(&self) -> Result<()>;
    fn enable(&self, unit: &str) -> Result<()>;
    fn start(&self, unit: &str) -> Result<()>;
    fn stop(&self, unit: &str) -> Result<()>;
    fn disable(&self, unit: &str) -> Result<()>;
    fn is_active(&self, unit: &str) -> Result<bool>;
}

/// [`ServiceManager`] backed by `systemctl`
pub struct Systemctl<E: CommandExecutor> {
    executor: E,
    program: PathBuf,
}

impl<E: CommandExecutor> Systemctl<E> {
    pub fn new(executor: E, program: PathBuf) -> Self {
        Self { executor, program }
    }

    fn run(&self, args: &[&str]) -> Result<()> {
        exec_checked(&self.executor, &self.program, args)?;
        Ok(())
    }
}

impl<E: CommandExecutor> ServiceManager for Systemctl<E> {
    fn reload_units(&self) -> Result<()> {
        self.run(&["daemon-reload"])
    }

    fn enable(&self, unit: &str) -> Result<()> {
        self.run(&["enable", unit])
    }

    fn start(&self, unit: &str) -> Result<()> {
        self.run(&["start", unit])
    }

    fn stop(&self, unit: &str) -> Result<()> {
        self.run(&["stop", unit])
    }

    fn disable(&self, unit: &str) -> Result<()> {
        self.run(&["disable", unit])
    }

    fn is_active(&self, unit: &str) -> Result<bool> {
        // is-active exits non-zero for inactive/failed/unknown units
        let output = self
            .executor
            .execute(&self.program, &args_to_strings(&["is-active", "--quiet", unit]))?;
        Ok(output.success)
    }
}

/// Writes, activates and tears down the per-family units
pub struct ServiceUnitManager<'a> {
    services: &'a dyn ServiceManager,
    fs: &'a dyn FileSystem,
    config: &'a Config,
    toolchain: &'a Toolchain,
}

impl<'a> ServiceUnitManager<'a> {
    pub fn new(
        services: &'a dyn ServiceManager,
        fs: &'a dyn FileSystem,
        config: &'a Config,
        toolchain: &'a Toolchain,
    ) -> Self {
        Self {
            services,
            fs,
            config,
            toolchain,
        }
    }

    pub fn generate_unit(&self, family: AddressFamily) -> FwResult<ServiceUnitSpec> {
        ServiceUnitSpec::for_family(
            family,
            &self.toolchain.family(family)?.restore,
            &self.config.artifacts(family),
        )
    }

    /// Write the unit, reload definitions, enable it for boot and start it now
    pub fn activate(&self, family: AddressFamily) -> FwResult<()> {
        let unit = self.config.unit_name(family);
        let path = self.config.artifacts(family).unit_file;
        let spec = self.generate_unit(family)?;

        info!("Creating {}...", path.display());
        self.fs
            .write_atomic(&path, spec.render().as_bytes())
            .map_err(|e| lifecycle_err(unit, "write", e))?;

        info!("Reloading systemd...");
        self.services
            .reload_units()
            .map_err(|e| lifecycle_err(unit, "daemon-reload", e))?;

        info!("Enabling {}...", unit);
        self.services
            .enable(unit)
            .map_err(|e| lifecycle_err(unit, "enable", e))?;

        info!("Starting {}...", unit);
        self.services
            .start(unit)
            .map_err(|e| lifecycle_err(unit, "start", e))?;

        Ok(())
    }

    /// Stop and disable the unit, then delete its file.
    ///
    /// The stop action restores `empty.vF`, so this must run while the
    /// ruleset files still exist.
    pub fn deactivate(&self, family: AddressFamily) -> FwResult<()> {
        let unit = self.config.unit_name(family);
        let path = self.config.artifacts(family).unit_file;

        info!("Stopping {}...", unit);
        self.services
            .stop(unit)
            .map_err(|e| lifecycle_err(unit, "stop", e))?;

        info!("Disabling {}...", unit);
        self.services
            .disable(unit)
            .map_err(|e| lifecycle_err(unit, "disable", e))?;

        info!("Removing {}...", path.display());
        self.fs
            .remove_file(&path)
            .map_err(|e| lifecycle_err(unit, "remove", e))?;

        self.services
            .reload_units()
            .map_err(|e| lifecycle_err(unit, "daemon-reload", e))?;

        Ok(())
    }
}

fn lifecycle_err(unit: &str, action: &'static str, err: impl std::fmt::Display) -> FwError {
    FwError::ServiceLifecycle {
        unit: unit.to_string(),
        action,
        reason: format!("{:#}", err),
    }
}
