//! Status command implementation.
//!
//! Read-only and unprivileged: reports what is on disk and, when `systemctl`
//! is available, whether each unit is active.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::artifacts::ArtifactStatus;
use crate::cmd_abstraction::RealCommandExecutor;
use crate::config::Config;
use crate::error::FwResult;
use crate::family::AddressFamily;
use crate::fs_abstraction::{real_fs, FileSystem};
use crate::guard::PreconditionGuard;
use crate::service::{ServiceManager, Systemctl};
use crate::state::{DirectoryLifecycleTracker, DirectoryState};
use crate::toolchain::{find_executable, SYSTEMCTL};

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub families: Vec<FamilyReport>,
    pub directory: DirectoryReport,
}

#[derive(Debug, Serialize)]
pub struct FamilyReport {
    pub family: AddressFamily,
    pub unit: String,
    pub artifacts: ArtifactStatus,
    /// `None` when the service manager could not be queried
    pub active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct DirectoryReport {
    pub path: PathBuf,
    pub state: DirectoryState,
    pub recorded_at: Option<DateTime<Utc>>,
    pub state_file: PathBuf,
    /// Marker present while no family is managed, left by an install that
    /// aborted before its first family was complete
    pub orphaned: bool,
}

/// Gather the status of every family in `scope`
pub fn collect(
    config: &Config,
    fs: &dyn FileSystem,
    services: Option<&dyn ServiceManager>,
    scope: Option<AddressFamily>,
) -> FwResult<StatusReport> {
    let guard = PreconditionGuard::new(fs, config);
    let families = AddressFamily::scope(scope)
        .into_iter()
        .map(|family| {
            let unit = config.unit_name(family).to_string();
            let active = services.and_then(|s| match s.is_active(&unit) {
                Ok(active) => Some(active),
                Err(e) => {
                    debug!("Cannot query {}: {:#}", unit, e);
                    None
                }
            });
            FamilyReport {
                family,
                artifacts: guard.inspect(family),
                unit,
                active,
            }
        })
        .collect();

    let mut tracker = DirectoryLifecycleTracker::new(fs, config);
    let state = tracker.capture_initial_state()?;
    let orphaned = tracker.marker().is_some()
        && AddressFamily::ALL
            .into_iter()
            .all(|f| guard.inspect(f) == ArtifactStatus::Unmanaged);

    Ok(StatusReport {
        families,
        directory: DirectoryReport {
            path: config.config_dir.clone(),
            state,
            recorded_at: tracker.marker().map(|m| m.recorded_at),
            state_file: config.state_file.clone(),
            orphaned,
        },
    })
}

/// Run the status command
pub fn run(scope: Option<AddressFamily>, json: bool, config_path: &Path) -> Result<()> {
    let config = Config::load_or_default(config_path)?;

    let systemctl = find_executable(SYSTEMCTL, &config.search_paths)
        .map(|program| Systemctl::new(RealCommandExecutor::new(), program));
    if systemctl.is_none() {
        debug!("systemctl not found, unit activity unknown");
    }
    let services = systemctl.as_ref().map(|s| s as &dyn ServiceManager);

    let report = collect(&config, real_fs(), services, scope)?;

    if json {
        let out =
            serde_json::to_string_pretty(&report).context("Failed to serialize status report")?;
        println!("{}", out);
    } else {
        print!("{}", render(&report));
    }

    Ok(())
}

fn render(report: &StatusReport) -> String {
    let mut out = String::new();

    for entry in &report.families {
        let activity = match entry.active {
            Some(true) => "active",
            Some(false) => "inactive",
            None => "unknown",
        };
        match &entry.artifacts {
            ArtifactStatus::Managed => {
                out.push_str(&format!(
                    "{}: MANAGED ({} {})\n",
                    entry.family, entry.unit, activity
                ));
            }
            ArtifactStatus::Unmanaged => {
                out.push_str(&format!("{}: NOT MANAGED\n", entry.family));
            }
            ArtifactStatus::Partial { present, missing } => {
                out.push_str(&format!(
                    "{}: PARTIAL ({} {})\n",
                    entry.family, entry.unit, activity
                ));
                for path in present {
                    out.push_str(&format!("  present: {}\n", path.display()));
                }
                for path in missing {
                    out.push_str(&format!("  missing: {}\n", path.display()));
                }
            }
        }
    }

    let dir = &report.directory;
    let origin = match (dir.state, dir.recorded_at.is_some()) {
        (DirectoryState::Present, _) => "pre-existing",
        (DirectoryState::Absent, true) => "created by fwbaseline",
        _ => "absent",
    };
    out.push_str(&format!("Ruleset directory: {} ({})\n", dir.path.display(), origin));
    if let Some(recorded_at) = dir.recorded_at {
        let local: DateTime<chrono::Local> = recorded_at.into();
        out.push_str(&format!(
            "First install: {}\n",
            local.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    if dir.orphaned {
        out.push_str(&format!(
            "Stale marker: {} (no family is managed; left by an interrupted install)\n",
            dir.state_file.display()
        ));
    }

    out
}
