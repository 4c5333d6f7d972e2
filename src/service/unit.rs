//! systemd unit generation.

use std::path::Path;

use crate::artifacts::ManagedArtifactSet;
use crate::error::{FwError, FwResult};
use crate::family::AddressFamily;

/// Lifecycle description of one family's restore unit.
///
/// Start and reload restore the hardened ruleset, stop restores the
/// pass-through ruleset. `RemainAfterExit=yes` keeps the unit "active"
/// after the one-shot restore exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUnitSpec {
    pub description: String,
    pub exec_start: String,
    pub exec_reload: String,
    pub exec_stop: String,
}

impl ServiceUnitSpec {
    pub fn for_family(
        family: AddressFamily,
        restore_program: &Path,
        artifacts: &ManagedArtifactSet,
    ) -> FwResult<Self> {
        let start = exec_line(restore_program, &artifacts.hardened_ruleset)?;
        Ok(Self {
            description: format!("Baseline {} packet filter", family),
            exec_reload: start.clone(),
            exec_start: start,
            exec_stop: exec_line(restore_program, &artifacts.empty_ruleset)?,
        })
    }

    pub fn render(&self) -> String {
        format!(
            r#"[Unit]
Description={description}
DefaultDependencies=no
Wants=network-pre.target systemd-modules-load.service local-fs.target
Before=network-pre.target shutdown.target
After=systemd-modules-load.service local-fs.target
Conflicts=shutdown.target

[Service]
Type=oneshot
ExecStart={start}
ExecReload={reload}
ExecStop={stop}
RemainAfterExit=yes

[Install]
WantedBy=multi-user.target
"#,
            description = self.description,
            start = self.exec_start,
            reload = self.exec_reload,
            stop = self.exec_stop,
        )
    }
}

fn exec_line(program: &Path, ruleset: &Path) -> FwResult<String> {
    Ok(format!(
        "{} -w {}",
        validate_unit_path(program)?,
        validate_unit_path(ruleset)?
    ))
}

/// Validate a path before embedding it in a unit file to prevent injection.
///
/// systemd splits Exec lines on whitespace and expands `%` specifiers and
/// `$` variables, so those are rejected along with control characters.
pub(crate) fn validate_unit_path(path: &Path) -> FwResult<&str> {
    let s = path.to_str().ok_or_else(|| {
        FwError::Config(format!("Path is not valid UTF-8: {}", path.display()))
    })?;

    if !path.is_absolute() {
        return Err(FwError::Config(format!(
            "Unit paths must be absolute: {}",
            s
        )));
    }

    if let Some(bad) = s
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || matches!(c, '%' | '$' | '\\' | '"' | '\'' | ';'))
    {
        return Err(FwError::Config(format!(
            "Unsafe character {:?} in unit path: {}",
            bad, s
        )));
    }

    Ok(s)
}
