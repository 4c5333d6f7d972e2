//! CLI command implementations.

pub mod install;
pub mod remove;
pub mod status;

use std::path::Path;

use crate::cmd_abstraction::RealCommandExecutor;
use crate::config::Config;
use crate::enforcer::{check_root, IptablesFilter};
use crate::error::FwResult;
use crate::family::AddressFamily;
use crate::fs_abstraction::real_fs;
use crate::orchestrator::Orchestrator;
use crate::service::Systemctl;
use crate::toolchain::Toolchain;

/// Live collaborators for a privileged install or remove
pub struct HostContext {
    pub config: Config,
    pub toolchain: Toolchain,
    filter: IptablesFilter<RealCommandExecutor>,
    services: Systemctl<RealCommandExecutor>,
}

impl HostContext {
    /// Preflight: privilege check, configuration, then executable resolution
    /// for the families in `scope`. Nothing on the host is modified.
    pub fn prepare(config_path: &Path, scope: Option<AddressFamily>) -> FwResult<Self> {
        check_root()?;
        let config = Config::load_or_default(config_path)?;
        let toolchain = Toolchain::resolve(&AddressFamily::scope(scope), &config.search_paths)?;

        Ok(Self {
            filter: IptablesFilter::new(RealCommandExecutor::new(), toolchain.clone()),
            services: Systemctl::new(
                RealCommandExecutor::new(),
                toolchain.systemctl().to_path_buf(),
            ),
            config,
            toolchain,
        })
    }

    pub fn orchestrator(&self) -> Orchestrator<'_> {
        Orchestrator::new(
            &self.config,
            real_fs(),
            &self.filter,
            &self.services,
            &self.toolchain,
        )
    }
}

/// Human-readable scope, e.g. "IPv4 and IPv6"
pub fn describe_scope(scope: Option<AddressFamily>) -> String {
    AddressFamily::scope(scope)
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" and ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_scope() {
        assert_eq!(describe_scope(Some(AddressFamily::V6)), "IPv6");
        assert_eq!(describe_scope(None), "IPv4 and IPv6");
    }
}
