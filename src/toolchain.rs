//! Resolution of the external executables fwbaseline drives.
//!
//! All programs are resolved once at startup. A missing program is reported
//! as [`FwError::MissingDependency`] before any firewall or unit state is
//! touched.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::error::{FwError, FwResult};
use crate::family::AddressFamily;

pub const SYSTEMCTL: &str = "systemctl";

/// Absolute paths of the packet-filter programs for one family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyTools {
    pub filter: PathBuf,
    pub save: PathBuf,
    pub restore: PathBuf,
}

/// Programs for the families in scope, plus `systemctl`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    v4: Option<FamilyTools>,
    v6: Option<FamilyTools>,
    systemctl: PathBuf,
}

impl Toolchain {
    /// Resolve the programs for `families` from PATH, then `extra_dirs`
    pub fn resolve(families: &[AddressFamily], extra_dirs: &[PathBuf]) -> FwResult<Self> {
        Self::resolve_with(families, |name| find_executable(name, extra_dirs))
    }

    /// Resolve with a custom lookup function
    pub fn resolve_with<F>(families: &[AddressFamily], lookup: F) -> FwResult<Self>
    where
        F: Fn(&str) -> Option<PathBuf>,
    {
        let require = |name: &str| {
            lookup(name).ok_or_else(|| FwError::MissingDependency(name.to_string()))
        };

        let tools = |family: AddressFamily| -> FwResult<Option<FamilyTools>> {
            if !families.contains(&family) {
                return Ok(None);
            }
            Ok(Some(FamilyTools {
                filter: require(family.filter_program())?,
                save: require(family.save_program())?,
                restore: require(family.restore_program())?,
            }))
        };

        let toolchain = Self {
            v4: tools(AddressFamily::V4)?,
            v6: tools(AddressFamily::V6)?,
            systemctl: require(SYSTEMCTL)?,
        };
        tracing::debug!("Resolved toolchain: {:?}", toolchain);
        Ok(toolchain)
    }

    /// Programs for `family`; a family outside the resolved scope reports
    /// its filter program as missing
    pub fn family(&self, family: AddressFamily) -> FwResult<&FamilyTools> {
        let tools = match family {
            AddressFamily::V4 => self.v4.as_ref(),
            AddressFamily::V6 => self.v6.as_ref(),
        };
        tools.ok_or_else(|| FwError::MissingDependency(family.filter_program().to_string()))
    }

    pub fn systemctl(&self) -> &Path {
        &self.systemctl
    }
}

/// Find an executable file named `name` in PATH or one of `extra_dirs`
pub fn find_executable(name: &str, extra_dirs: &[PathBuf]) -> Option<PathBuf> {
    let path_dirs: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).collect())
        .unwrap_or_default();

    path_dirs
        .iter()
        .chain(extra_dirs.iter())
        .filter(|dir| dir.is_absolute())
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sbin(name: &str) -> Option<PathBuf> {
        Some(PathBuf::from("/usr/sbin").join(name))
    }

    #[test]
    fn test_resolve_with_all_present() {
        let toolchain = Toolchain::resolve_with(&AddressFamily::ALL, sbin).unwrap();
        assert_eq!(
            toolchain.family(AddressFamily::V6).unwrap().restore,
            PathBuf::from("/usr/sbin/ip6tables-restore")
        );
        assert_eq!(
            toolchain.family(AddressFamily::V4).unwrap().save,
            PathBuf::from("/usr/sbin/iptables-save")
        );
        assert_eq!(toolchain.systemctl(), Path::new("/usr/sbin/systemctl"));
    }

    #[test]
    fn test_resolve_with_missing_program() {
        let result = Toolchain::resolve_with(&AddressFamily::ALL, |name| {
            if name == "ip6tables-save" {
                None
            } else {
                sbin(name)
            }
        });

        match result {
            Err(FwError::MissingDependency(name)) => assert_eq!(name, "ip6tables-save"),
            other => panic!("Expected MissingDependency, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_only_families_in_scope() {
        // No ip6tables on this host
        let lookup = |name: &str| {
            if name.starts_with("ip6tables") {
                None
            } else {
                sbin(name)
            }
        };

        let toolchain = Toolchain::resolve_with(&[AddressFamily::V4], lookup).unwrap();
        assert_eq!(
            toolchain.family(AddressFamily::V4).unwrap().filter,
            PathBuf::from("/usr/sbin/iptables")
        );
        assert!(matches!(
            toolchain.family(AddressFamily::V6),
            Err(FwError::MissingDependency(name)) if name == "ip6tables"
        ));

        assert!(matches!(
            Toolchain::resolve_with(&AddressFamily::ALL, lookup),
            Err(FwError::MissingDependency(name)) if name == "ip6tables"
        ));
    }

    #[test]
    fn test_systemctl_always_required() {
        let result = Toolchain::resolve_with(&[AddressFamily::V6], |name| {
            if name == SYSTEMCTL {
                None
            } else {
                sbin(name)
            }
        });
        assert!(matches!(result, Err(FwError::MissingDependency(name)) if name == "systemctl"));
    }

    #[test]
    fn test_find_executable_in_extra_dirs() {
        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("fwbaseline-test-tool");
        std::fs::write(&bin, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();

        let found = find_executable("fwbaseline-test-tool", &[dir.path().to_path_buf()]);
        assert_eq!(found, Some(bin));
    }

    #[test]
    fn test_find_executable_skips_non_executable() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("fwbaseline-not-exec");
        std::fs::write(&file, "data").unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o644)).unwrap();

        assert!(find_executable("fwbaseline-not-exec", &[dir.path().to_path_buf()]).is_none());
    }
}
