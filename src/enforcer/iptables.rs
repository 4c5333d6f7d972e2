//! iptables / ip6tables backend implementation.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

use super::{Chain, Directive, PacketFilter, Target};
use crate::cmd_abstraction::{exec_checked, CommandExecutor};
use crate::family::AddressFamily;
use crate::toolchain::Toolchain;

const TABLE: &str = "filter";

/// Packet filter driven through the iptables command-line tools
pub struct IptablesFilter<E: CommandExecutor> {
    executor: E,
    toolchain: Toolchain,
}

impl<E: CommandExecutor> IptablesFilter<E> {
    pub fn new(executor: E, toolchain: Toolchain) -> Self {
        Self {
            executor,
            toolchain,
        }
    }

    /// Run `iptables -w -t filter <args>` for the family
    fn filter_cmd(&self, family: AddressFamily, args: &[&str]) -> Result<String> {
        let mut full = vec!["-w", "-t", TABLE];
        full.extend_from_slice(args);
        debug!("{} {}", family.filter_program(), full.join(" "));
        exec_checked(&self.executor, &self.toolchain.family(family)?.filter, &full)
    }
}

impl<E: CommandExecutor> PacketFilter for IptablesFilter<E> {
    fn flush_to_default(&self, family: AddressFamily) -> Result<()> {
        // Policies first so the host is never left default-deny with no rules
        for chain in Chain::BUILTIN {
            self.apply(family, &Directive::policy(chain, Target::Accept))?;
        }
        self.filter_cmd(family, &["-F"])?;
        self.filter_cmd(family, &["-X"])?;
        self.filter_cmd(family, &["-Z"])?;
        Ok(())
    }

    fn apply(&self, family: AddressFamily, directive: &Directive) -> Result<()> {
        let args = directive.to_args();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.filter_cmd(family, &args)
            .with_context(|| format!("Failed to apply '{}'", directive))?;
        Ok(())
    }

    fn save(&self, family: AddressFamily) -> Result<String> {
        exec_checked(
            &self.executor,
            &self.toolchain.family(family)?.save,
            &["-t", TABLE],
        )
    }

    fn restore(&self, family: AddressFamily, path: &Path) -> Result<()> {
        let path_str = path
            .to_str()
            .with_context(|| format!("Ruleset path is not valid UTF-8: {}", path.display()))?;
        exec_checked(
            &self.executor,
            &self.toolchain.family(family)?.restore,
            &["-w", path_str],
        )?;
        Ok(())
    }
}
