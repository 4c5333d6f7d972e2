//! Baseline ruleset construction and persistence.
//!
//! Two snapshots are kept per address family:
//!
//! - `empty.vF`: the pass-through state (everything accepted, no rules),
//!   restored when the unit stops.
//! - `rules.vF`: the hardened state, restored when the unit starts.
//!
//! Both are produced by driving the live packet filter and saving the result,
//! so the files always contain exactly what `iptables-restore` accepts.

use std::path::Path;
use tracing::{debug, info};

use crate::artifacts::ManagedArtifactSet;
use crate::enforcer::{Chain, Directive, PacketFilter, RulesetSnapshot, Target};
use crate::error::{FwError, FwResult};
use crate::family::AddressFamily;
use crate::fs_abstraction::FileSystem;

/// Ordered directives for the hardened policy.
///
/// Default policies come first. For IPv6 the ICMPv6 accept must precede the
/// INVALID/UNTRACKED drop or neighbor discovery and PMTU stop working.
pub fn build_hardened_ruleset(family: AddressFamily) -> Vec<Directive> {
    let mut directives = vec![
        Directive::policy(Chain::Input, Target::Drop),
        Directive::policy(Chain::Forward, Target::Drop),
        Directive::policy(Chain::Output, Target::Accept),
    ];

    if family == AddressFamily::V6 {
        directives.push(Directive::append(
            Chain::Input,
            &["-p", "ipv6-icmp", "-j", "ACCEPT"],
        ));
    }

    directives.push(Directive::append(
        Chain::Input,
        &["-m", "conntrack", "--ctstate", "INVALID,UNTRACKED", "-j", "DROP"],
    ));
    directives.push(Directive::append(
        Chain::Input,
        &["-m", "conntrack", "--ctstate", "RELATED,ESTABLISHED", "-j", "ACCEPT"],
    ));
    directives.push(Directive::append(
        Chain::Input,
        &["-i", "lo", "-m", "conntrack", "--ctstate", "NEW", "-j", "ACCEPT"],
    ));

    directives
}

/// Realizes and persists the two rulesets for a family
pub struct PolicyEngine<'a> {
    filter: &'a dyn PacketFilter,
    fs: &'a dyn FileSystem,
}

impl<'a> PolicyEngine<'a> {
    pub fn new(filter: &'a dyn PacketFilter, fs: &'a dyn FileSystem) -> Self {
        Self { filter, fs }
    }

    /// Make the live state pass-through and persist it as `empty.vF`.
    ///
    /// An operator-provided `empty.vF` is restored instead of regenerated,
    /// provided it really is a pass-through ruleset.
    pub fn materialize_empty(
        &self,
        family: AddressFamily,
        artifacts: &ManagedArtifactSet,
    ) -> FwResult<()> {
        let path = &artifacts.empty_ruleset;
        let persist_err = |reason: String| FwError::RulesetPersist {
            family,
            path: path.clone(),
            reason,
        };

        if self.fs.exists(path) {
            info!("Using existing {} pass-through ruleset {}", family, path.display());
            let content = self
                .fs
                .read_to_string(path)
                .map_err(|e| persist_err(format!("read failed: {}", e)))?;
            if !RulesetSnapshot::from_saved(&content).is_pass_through() {
                return Err(persist_err(
                    "existing file is not a pass-through ruleset (expected ACCEPT policies and no rules)"
                        .to_string(),
                ));
            }
            self.filter
                .restore(family, path)
                .map_err(|e| persist_err(format!("{:#}", e)))?;
            return Ok(());
        }

        info!("Creating {} pass-through ruleset {}", family, path.display());
        self.filter
            .flush_to_default(family)
            .map_err(|e| persist_err(format!("{:#}", e)))?;
        self.save_to(family, path)?;
        Ok(())
    }

    /// Apply the hardened ruleset live and persist it as `rules.vF`
    pub fn materialize_hardened(
        &self,
        family: AddressFamily,
        artifacts: &ManagedArtifactSet,
    ) -> FwResult<RulesetSnapshot> {
        let path = &artifacts.hardened_ruleset;
        info!("Applying {} hardened ruleset", family);

        self.filter
            .flush_to_default(family)
            .map_err(|e| FwError::RulesetPersist {
                family,
                path: path.clone(),
                reason: format!("{:#}", e),
            })?;

        for directive in build_hardened_ruleset(family) {
            debug!("{}: {}", family, directive);
            self.filter
                .apply(family, &directive)
                .map_err(|e| FwError::RulesetPersist {
                    family,
                    path: path.clone(),
                    reason: format!("{:#}", e),
                })?;
        }

        self.save_to(family, path)
    }

    fn save_to(&self, family: AddressFamily, path: &Path) -> FwResult<RulesetSnapshot> {
        let persist_err = |reason: String| FwError::RulesetPersist {
            family,
            path: path.to_path_buf(),
            reason,
        };

        let raw = self
            .filter
            .save(family)
            .map_err(|e| persist_err(format!("{:#}", e)))?;
        let snapshot = RulesetSnapshot::from_saved(&raw);
        if snapshot.policies().is_empty() {
            return Err(persist_err(format!(
                "{} returned no filter table",
                family.save_program()
            )));
        }

        self.fs
            .write_atomic(path, snapshot.as_bytes())
            .map_err(|e| persist_err(format!("write failed: {}", e)))?;
        debug!("Wrote {} ({} bytes)", path.display(), snapshot.as_bytes().len());
        Ok(snapshot)
    }
}
