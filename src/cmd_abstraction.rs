//! Command execution abstraction for testability.
//!
//! The iptables and systemctl collaborators shell out through
//! [`CommandExecutor`], which lets unit tests assert on the exact argv without
//! touching the host firewall.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, Stdio};

#[cfg(test)]
use mockall::automock;

/// Output from command execution
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Standard output from the command
    pub stdout: String,
    /// Standard error from the command
    pub stderr: String,
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
    /// The exit code, if available
    pub code: Option<i32>,
}

/// Trait for command execution, allowing dependency injection for testing.
#[cfg_attr(test, automock)]
pub trait CommandExecutor: Send + Sync {
    /// Execute `cmd` with `args` and capture its output.
    ///
    /// Returns `Err` only when the process could not be spawned; a non-zero
    /// exit is reported through [`CommandOutput::success`].
    fn execute(&self, cmd: &Path, args: &[String]) -> Result<CommandOutput>;
}

/// Real implementation of CommandExecutor that runs actual system commands.
#[derive(Debug, Clone, Default)]
pub struct RealCommandExecutor;

impl RealCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for RealCommandExecutor {
    fn execute(&self, cmd: &Path, args: &[String]) -> Result<CommandOutput> {
        let output = Command::new(cmd)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("Failed to execute {}", cmd.display()))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }
}

/// Run a command and return its stdout, failing on a non-zero exit.
pub fn exec_checked<E: CommandExecutor + ?Sized>(
    executor: &E,
    cmd: &Path,
    args: &[&str],
) -> Result<String> {
    let output = executor.execute(cmd, &args_to_strings(args))?;
    if output.success {
        Ok(output.stdout)
    } else {
        let detail = output.stderr.trim();
        match output.code {
            Some(code) => anyhow::bail!(
                "{} {} exited with status {}: {}",
                cmd.display(),
                args.join(" "),
                code,
                detail
            ),
            None => anyhow::bail!(
                "{} {} was terminated by a signal: {}",
                cmd.display(),
                args.join(" "),
                detail
            ),
        }
    }
}

/// Helper function to convert a slice of &str to Vec<String>.
///
/// mockall has issues with lifetimes in `&[&str]`, so the trait takes
/// `&[String]` instead.
pub fn args_to_strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_to_strings() {
        let args = args_to_strings(&["-t", "filter", "-F"]);
        assert_eq!(args, vec!["-t", "filter", "-F"]);
        assert!(args_to_strings(&[]).is_empty());
    }

    #[test]
    fn test_real_command_executor_execute_echo() {
        let executor = RealCommandExecutor::new();
        let args = args_to_strings(&["-n", "hello"]);
        let output = executor.execute(Path::new("echo"), &args).unwrap();
        assert!(output.success);
        assert_eq!(output.stdout, "hello");
    }

    #[test]
    fn test_real_command_executor_execute_failure() {
        let executor = RealCommandExecutor::new();
        let args = args_to_strings(&["--invalid-flag"]);
        // Command runs, just fails
        let output = executor.execute(Path::new("ls"), &args).unwrap();
        assert!(!output.success);
    }

    #[test]
    fn test_real_command_executor_spawn_failure() {
        let executor = RealCommandExecutor::new();
        let result = executor.execute(Path::new("/nonexistent/binary"), &[]);
        assert!(result.is_err());
    }

    #[test]
    fn test_exec_checked_reports_stderr() {
        let mut mock = MockCommandExecutor::new();
        mock.expect_execute()
            .withf(|cmd, args| cmd == Path::new("/usr/sbin/iptables") && args == ["-L".to_string()])
            .times(1)
            .returning(|_, _| {
                Ok(CommandOutput {
                    stdout: String::new(),
                    stderr: "Permission denied (you must be root)\n".to_string(),
                    success: false,
                    code: Some(4),
                })
            });

        let err = exec_checked(&mock, Path::new("/usr/sbin/iptables"), &["-L"]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("status 4"));
        assert!(msg.contains("you must be root"));
    }

    #[test]
    fn test_exec_checked_returns_stdout() {
        let mut mock = MockCommandExecutor::new();
        mock.expect_execute().returning(|_, _| {
            Ok(CommandOutput {
                stdout: "active\n".to_string(),
                stderr: String::new(),
                success: true,
                code: Some(0),
            })
        });

        let out = exec_checked(&mock, Path::new("systemctl"), &["is-active", "x"]).unwrap();
        assert_eq!(out, "active\n");
    }
}
