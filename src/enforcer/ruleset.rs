//! Packet-filter directives and saved ruleset snapshots.

use std::fmt;

/// Built-in chains of the `filter` table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chain {
    Input,
    Forward,
    Output,
}

impl Chain {
    pub const BUILTIN: [Chain; 3] = [Chain::Input, Chain::Forward, Chain::Output];

    pub fn as_str(self) -> &'static str {
        match self {
            Chain::Input => "INPUT",
            Chain::Forward => "FORWARD",
            Chain::Output => "OUTPUT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Accept,
    Drop,
}

impl Target {
    pub fn as_str(self) -> &'static str {
        match self {
            Target::Accept => "ACCEPT",
            Target::Drop => "DROP",
        }
    }
}

/// One iptables invocation against the `filter` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `-P CHAIN TARGET`
    Policy { chain: Chain, target: Target },
    /// `-A CHAIN <spec...>`
    Append { chain: Chain, spec: Vec<String> },
}

impl Directive {
    pub fn policy(chain: Chain, target: Target) -> Self {
        Directive::Policy { chain, target }
    }

    pub fn append(chain: Chain, spec: &[&str]) -> Self {
        Directive::Append {
            chain,
            spec: spec.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Arguments passed to `iptables`/`ip6tables` after the table selector
    pub fn to_args(&self) -> Vec<String> {
        match self {
            Directive::Policy { chain, target } => vec![
                "-P".to_string(),
                chain.as_str().to_string(),
                target.as_str().to_string(),
            ],
            Directive::Append { chain, spec } => {
                let mut args = vec!["-A".to_string(), chain.as_str().to_string()];
                args.extend(spec.iter().cloned());
                args
            }
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_args().join(" "))
    }
}

/// Normalized `iptables-save -t filter` output.
///
/// Comment lines (which carry timestamps) are dropped and chain counters are
/// reset to `[0:0]`, so saving the same live state twice yields identical
/// bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulesetSnapshot {
    text: String,
}

impl RulesetSnapshot {
    pub fn from_saved(raw: &str) -> Self {
        let mut text = String::with_capacity(raw.len());
        for line in raw.lines().filter_map(normalize_line) {
            text.push_str(&line);
            text.push('\n');
        }
        Self { text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// `(chain, policy)` pairs from the `:CHAIN POLICY [p:b]` lines.
    /// User-defined chains report `-` as their policy.
    pub fn policies(&self) -> Vec<(&str, &str)> {
        self.text
            .lines()
            .filter_map(|line| line.strip_prefix(':'))
            .filter_map(|decl| {
                let mut parts = decl.split_whitespace();
                Some((parts.next()?, parts.next()?))
            })
            .collect()
    }

    /// The `-A ...` rule lines, in order
    pub fn rules(&self) -> Vec<&str> {
        self.text
            .lines()
            .filter(|line| line.starts_with("-A "))
            .collect()
    }

    fn has_filter_table(&self) -> bool {
        let mut lines = self.text.lines();
        lines.any(|l| l == "*filter") && lines.any(|l| l == "COMMIT")
    }

    /// True for the accept-everything state: a filter table whose built-in
    /// chains all default to ACCEPT, with no rules and no user chains.
    pub fn is_pass_through(&self) -> bool {
        if !self.has_filter_table() || !self.rules().is_empty() {
            return false;
        }

        let policies = self.policies();
        let builtins_accept = Chain::BUILTIN.iter().all(|chain| {
            policies
                .iter()
                .any(|(name, policy)| *name == chain.as_str() && *policy == "ACCEPT")
        });
        builtins_accept && policies.len() == Chain::BUILTIN.len()
    }
}

fn normalize_line(line: &str) -> Option<String> {
    let line = line.trim_end();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    if line.starts_with(':') {
        if let Some(idx) = line.rfind(" [") {
            if line.ends_with(']') {
                return Some(format!("{} [0:0]", &line[..idx]));
            }
        }
    }

    Some(line.to_string())
}
