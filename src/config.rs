//! Configuration management for fwbaseline.
//!
//! The configuration file is optional: when it does not exist every value
//! falls back to the standard Debian/Ubuntu layout (`/etc/iptables`,
//! `/etc/systemd/system`).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::artifacts::ManagedArtifactSet;
use crate::error::{FwError, FwResult};
use crate::family::AddressFamily;
use crate::service::validate_unit_path;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/fwbaseline/config.yaml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Shared directory holding the `empty.vF` / `rules.vF` rulesets
    pub config_dir: PathBuf,

    /// Directory where systemd unit files are written
    pub unit_dir: PathBuf,

    /// Marker recording whether `config_dir` pre-dated the first install
    pub state_file: PathBuf,

    /// Unit names per address family
    pub units: UnitNames,

    /// Directories searched after PATH when resolving executables
    pub search_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UnitNames {
    pub v4: String,
    pub v6: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("/etc/iptables"),
            unit_dir: PathBuf::from("/etc/systemd/system"),
            state_file: PathBuf::from("/var/lib/fwbaseline/state.json"),
            units: UnitNames::default(),
            search_paths: vec![
                PathBuf::from("/usr/sbin"),
                PathBuf::from("/sbin"),
                PathBuf::from("/usr/bin"),
                PathBuf::from("/bin"),
            ],
        }
    }
}

impl Default for UnitNames {
    fn default() -> Self {
        Self {
            v4: "iptables.service".to_string(),
            v6: "ip6tables.service".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> FwResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            FwError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            FwError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load the file when it exists, otherwise use the built-in defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> FwResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Write the configuration as YAML, atomically
    pub fn save<P: AsRef<Path>>(&self, path: P) -> FwResult<()> {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let path = path.as_ref();
        let fail = |e: &dyn std::fmt::Display| {
            FwError::Config(format!("Failed to save {}: {}", path.display(), e))
        };

        let content = serde_yaml::to_string(self).map_err(|e| fail(&e))?;
        let parent = path.parent().unwrap_or(Path::new("/etc/fwbaseline"));
        fs::create_dir_all(parent).map_err(|e| fail(&e))?;

        let mut temp_file = NamedTempFile::new_in(parent).map_err(|e| fail(&e))?;
        temp_file
            .write_all(content.as_bytes())
            .and_then(|_| temp_file.as_file().sync_all())
            .map_err(|e| fail(&e))?;
        temp_file.persist(path).map_err(|e| fail(&e.error))?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> FwResult<()> {
        for (name, path) in [
            ("config_dir", &self.config_dir),
            ("unit_dir", &self.unit_dir),
            ("state_file", &self.state_file),
        ] {
            if !path.is_absolute() {
                return Err(FwError::Config(format!(
                    "{} must be an absolute path: {}",
                    name,
                    path.display()
                )));
            }
        }

        // Ruleset paths and the restore programs end up in Exec lines
        for path in [&self.config_dir, &self.unit_dir]
            .into_iter()
            .chain(&self.search_paths)
        {
            validate_unit_path(path)?;
        }

        if self.state_file.starts_with(&self.config_dir) {
            return Err(FwError::Config(format!(
                "state_file {} must live outside config_dir {}",
                self.state_file.display(),
                self.config_dir.display()
            )));
        }

        for unit in [&self.units.v4, &self.units.v6] {
            if !is_valid_unit_name(unit) {
                return Err(FwError::Config(format!(
                    "Invalid unit name '{}'. Use letters, digits, '-', '_', '.' and a .service suffix",
                    unit
                )));
            }
        }

        if self.units.v4 == self.units.v6 {
            return Err(FwError::Config(format!(
                "IPv4 and IPv6 units must differ (both are '{}')",
                self.units.v4
            )));
        }

        Ok(())
    }

    pub fn unit_name(&self, family: AddressFamily) -> &str {
        match family {
            AddressFamily::V4 => &self.units.v4,
            AddressFamily::V6 => &self.units.v6,
        }
    }

    /// The three files managed for `family`
    pub fn artifacts(&self, family: AddressFamily) -> ManagedArtifactSet {
        ManagedArtifactSet {
            unit_file: self.unit_dir.join(self.unit_name(family)),
            empty_ruleset: self.config_dir.join(format!("empty.{}", family.suffix())),
            hardened_ruleset: self.config_dir.join(format!("rules.{}", family.suffix())),
        }
    }
}

/// Unit names end up in systemctl argv and file paths
fn is_valid_unit_name(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(".service") else {
        return false;
    };
    !stem.is_empty()
        && !stem.starts_with('-')
        && stem
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
