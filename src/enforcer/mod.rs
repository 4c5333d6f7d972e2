//! Packet-filter collaborator (iptables / ip6tables).

mod iptables;
pub mod ruleset;

use anyhow::Result;
use std::path::Path;

pub use iptables::IptablesFilter;
pub use ruleset::{Chain, Directive, RulesetSnapshot, Target};

use crate::error::{FwError, FwResult};
use crate::family::AddressFamily;

/// The four primitives the policy engine needs from the packet filter.
///
/// Every operation targets the `filter` table of one address family.
pub trait PacketFilter: Send + Sync {
    /// Reset to accept-all: every built-in policy ACCEPT, rules flushed,
    /// user chains deleted, counters zeroed.
    fn flush_to_default(&self, family: AddressFamily) -> Result<()>;

    /// Apply a single policy or append directive to the live ruleset
    fn apply(&self, family: AddressFamily, directive: &Directive) -> Result<()>;

    /// Dump the live ruleset in `iptables-save` format
    fn save(&self, family: AddressFamily) -> Result<String>;

    /// Replace the live ruleset with the contents of `path`
    fn restore(&self, family: AddressFamily, path: &Path) -> Result<()>;
}

/// Check if running as root (effective UID == 0)
pub fn check_root() -> FwResult<()> {
    // SAFETY: geteuid() has no preconditions, never fails and does not
    // modify any state.
    let euid = unsafe { libc::geteuid() };

    if euid != 0 {
        return Err(FwError::Privilege(
            "this operation changes the host firewall and requires root. Please run with sudo."
                .to_string(),
        ));
    }
    Ok(())
}
