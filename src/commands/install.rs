//! Install command implementation.

use anyhow::Result;
use std::path::Path;
use tracing::info;

use super::{describe_scope, HostContext};
use crate::family::AddressFamily;

/// Run the install command
pub fn run(scope: Option<AddressFamily>, config_path: &Path) -> Result<()> {
    let host = HostContext::prepare(config_path, scope)?;

    info!("Installing baseline firewall ({})...", describe_scope(scope));
    let families = host.orchestrator().install(scope)?;

    for family in families {
        let artifacts = host.config.artifacts(family);
        println!(
            "[OK] {} baseline installed: {} enabled, rules in {}",
            family,
            host.config.unit_name(family),
            artifacts.hardened_ruleset.display()
        );
    }

    Ok(())
}
