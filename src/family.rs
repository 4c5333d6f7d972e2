//! Address families handled by the baseline policy.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::FwError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    /// Fixed processing order for multi-family scopes.
    pub const ALL: [AddressFamily; 2] = [AddressFamily::V4, AddressFamily::V6];

    /// Families selected by an optional CLI scope (`None` means both).
    pub fn scope(selected: Option<AddressFamily>) -> Vec<AddressFamily> {
        match selected {
            Some(family) => vec![family],
            None => Self::ALL.to_vec(),
        }
    }

    /// The CLI number for this family (`4` or `6`).
    pub fn number(self) -> u8 {
        match self {
            AddressFamily::V4 => 4,
            AddressFamily::V6 => 6,
        }
    }

    /// Ruleset file suffix (`v4` / `v6`).
    pub fn suffix(self) -> &'static str {
        match self {
            AddressFamily::V4 => "v4",
            AddressFamily::V6 => "v6",
        }
    }

    pub fn filter_program(self) -> &'static str {
        match self {
            AddressFamily::V4 => "iptables",
            AddressFamily::V6 => "ip6tables",
        }
    }

    pub fn save_program(self) -> &'static str {
        match self {
            AddressFamily::V4 => "iptables-save",
            AddressFamily::V6 => "ip6tables-save",
        }
    }

    pub fn restore_program(self) -> &'static str {
        match self {
            AddressFamily::V4 => "iptables-restore",
            AddressFamily::V6 => "ip6tables-restore",
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => f.write_str("IPv4"),
            AddressFamily::V6 => f.write_str("IPv6"),
        }
    }
}

impl FromStr for AddressFamily {
    type Err = FwError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "4" => Ok(AddressFamily::V4),
            "6" => Ok(AddressFamily::V6),
            other => Err(FwError::Usage(format!(
                "invalid address family '{}' (expected 4 or 6)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_family() {
        assert_eq!("4".parse::<AddressFamily>().unwrap(), AddressFamily::V4);
        assert_eq!("6".parse::<AddressFamily>().unwrap(), AddressFamily::V6);
        assert!("5".parse::<AddressFamily>().is_err());
        assert!("v4".parse::<AddressFamily>().is_err());
        assert!("install".parse::<AddressFamily>().is_err());
    }

    #[test]
    fn test_scope_defaults_to_both_in_order() {
        assert_eq!(
            AddressFamily::scope(None),
            vec![AddressFamily::V4, AddressFamily::V6]
        );
        assert_eq!(
            AddressFamily::scope(Some(AddressFamily::V6)),
            vec![AddressFamily::V6]
        );
    }

    #[test]
    fn test_programs() {
        assert_eq!(AddressFamily::V4.filter_program(), "iptables");
        assert_eq!(AddressFamily::V6.save_program(), "ip6tables-save");
        assert_eq!(AddressFamily::V6.restore_program(), "ip6tables-restore");
    }
}
