//! Error types for fwbaseline.

use std::path::PathBuf;
use thiserror::Error;

use crate::family::AddressFamily;

pub type FwResult<T> = std::result::Result<T, FwError>;

#[derive(Error, Debug)]
pub enum FwError {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Permission denied: {0}")]
    Privilege(String),

    #[error("Required executable '{0}' not found in PATH")]
    MissingDependency(String),

    #[error("{family} firewall is already managed ({}). Run 'fwbaseline remove {}' first", join_paths(.present), .family.number())]
    AlreadyManaged {
        family: AddressFamily,
        present: Vec<PathBuf>,
    },

    #[error("{family} firewall is not managed (missing {})", join_paths(.missing))]
    NotManaged {
        family: AddressFamily,
        missing: Vec<PathBuf>,
    },

    #[error("Failed to persist {family} ruleset {}: {reason}", .path.display())]
    RulesetPersist {
        family: AddressFamily,
        path: PathBuf,
        reason: String,
    },

    #[error("Service {action} of {unit} failed: {reason}")]
    ServiceLifecycle {
        unit: String,
        action: &'static str,
        reason: String,
    },

    #[error("Directory error: {0}")]
    Directory(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FwError {
    /// Identifier of the step that failed, used as the stderr prefix.
    pub fn step(&self) -> &'static str {
        match self {
            FwError::Usage(_) => "usage",
            FwError::Privilege(_) | FwError::MissingDependency(_) => "preflight",
            FwError::AlreadyManaged { .. } | FwError::NotManaged { .. } => "guard",
            FwError::RulesetPersist { .. } => "policy",
            FwError::ServiceLifecycle { .. } => "service",
            FwError::Directory(_) => "directory",
            FwError::Config(_) => "config",
        }
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_managed_message_lists_paths() {
        let err = FwError::AlreadyManaged {
            family: AddressFamily::V6,
            present: vec![
                PathBuf::from("/etc/iptables/rules.v6"),
                PathBuf::from("/etc/iptables/empty.v6"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("IPv6"));
        assert!(msg.contains("/etc/iptables/rules.v6, /etc/iptables/empty.v6"));
        assert!(msg.contains("fwbaseline remove 6"));
    }

    #[test]
    fn test_step_identifiers() {
        assert_eq!(FwError::Privilege("x".into()).step(), "preflight");
        assert_eq!(FwError::MissingDependency("iptables".into()).step(), "preflight");
        assert_eq!(
            FwError::NotManaged {
                family: AddressFamily::V4,
                missing: vec![],
            }
            .step(),
            "guard"
        );
        assert_eq!(
            FwError::ServiceLifecycle {
                unit: "iptables.service".into(),
                action: "start",
                reason: "boom".into(),
            }
            .step(),
            "service"
        );
        assert_eq!(FwError::Directory("x".into()).step(), "directory");
    }

    #[test]
    fn test_service_lifecycle_message() {
        let err = FwError::ServiceLifecycle {
            unit: "ip6tables.service".into(),
            action: "enable",
            reason: "unit not found".into(),
        };
        assert_eq!(
            err.to_string(),
            "Service enable of ip6tables.service failed: unit not found"
        );
    }
}
