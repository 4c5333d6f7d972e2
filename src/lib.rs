//! # fwbaseline - baseline packet-filter policy for Linux hosts
//!
//! Installs or removes a fixed, stateful firewall baseline for IPv4 and IPv6
//! and binds each ruleset to a systemd unit so it is restored at boot and
//! torn down on stop.
//!
//! ## Policy
//!
//! - INPUT and FORWARD default to DROP, OUTPUT to ACCEPT
//! - INVALID/UNTRACKED inbound packets are dropped
//! - RELATED/ESTABLISHED inbound traffic is accepted
//! - New connections on the loopback interface are accepted
//! - IPv6 additionally accepts all ICMPv6 (neighbor discovery, PMTU)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (clap): install | remove | status  [4|6]               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Orchestrator                                               │
//! │    ├── PreconditionGuard (all families, before mutation)    │
//! │    ├── DirectoryLifecycleTracker (state.json marker)        │
//! │    ├── PolicyEngine (empty.vF / rules.vF snapshots)         │
//! │    └── ServiceUnitManager (iptables / ip6tables units)      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Collaborators                                              │
//! │    ├── PacketFilter: iptables, ip6tables, -save, -restore   │
//! │    ├── ServiceManager: systemctl                            │
//! │    └── FileSystem: atomic writes via tempfile               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use fwbaseline::commands::HostContext;
//! use fwbaseline::family::AddressFamily;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     // Root check, config and executable resolution for IPv6 only
//!     let scope = Some(AddressFamily::V6);
//!     let host = HostContext::prepare(Path::new("/etc/fwbaseline/config.yaml"), scope)?;
//!
//!     // Install the IPv6 baseline only
//!     host.orchestrator().install(scope)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`artifacts`] - The per-family set of managed files
//! - [`cli`] - Command-line interface definitions
//! - [`cmd_abstraction`] - Command execution abstraction for testability
//! - [`commands`] - CLI command implementations
//! - [`config`] - Configuration parsing and validation
//! - [`enforcer`] - Packet-filter abstraction (iptables, ip6tables)
//! - [`error`] - Error types
//! - [`family`] - IPv4 / IPv6 selection
//! - [`fs_abstraction`] - Filesystem abstraction with atomic writes
//! - [`guard`] - Precondition checks
//! - [`orchestrator`] - Install/remove state machine
//! - [`policy`] - Hardened ruleset and snapshot persistence
//! - [`service`] - systemd unit generation and lifecycle
//! - [`state`] - Ruleset directory bookkeeping
//! - [`toolchain`] - Executable resolution

pub mod artifacts;
pub mod cli;
pub mod cmd_abstraction;
pub mod commands;
pub mod config;
pub mod enforcer;
pub mod error;
pub mod family;
pub mod fs_abstraction;
pub mod guard;
pub mod orchestrator;
pub mod policy;
pub mod service;
pub mod state;
pub mod toolchain;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::{FwError, FwResult};
pub use family::AddressFamily;
