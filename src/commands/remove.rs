//! Remove command implementation.

use anyhow::Result;
use std::path::Path;
use tracing::info;

use super::{describe_scope, HostContext};
use crate::family::AddressFamily;

/// Run the remove command
pub fn run(scope: Option<AddressFamily>, config_path: &Path) -> Result<()> {
    let host = HostContext::prepare(config_path, scope)?;

    info!("Removing baseline firewall ({})...", describe_scope(scope));
    let families = host.orchestrator().remove(scope)?;

    for family in families {
        println!(
            "[OK] {} baseline removed: {} disabled",
            family,
            host.config.unit_name(family)
        );
    }

    Ok(())
}
