//! Remote execution capability
//!
//! The task runner depends on the [`Remote`] trait only: run a shell command,
//! upload a file, download a file. The concrete SSH transport lives in
//! [`ssh`]; tests substitute recording doubles.

pub mod ssh;

use crate::error::Result;
use std::path::Path;

/// Maximum command length accepted for dispatch (4 KB)
pub const MAX_COMMAND_LEN: usize = 4_096;

/// Maximum captured output per stream (10 MB)
pub const MAX_OUTPUT_SIZE: usize = 10_485_760;

/// Capability set for one authenticated connection to a target host
///
/// Implementations are synchronous and blocking: each call completes (or
/// fails) before the next is issued. A `Remote` is created by the caller
/// before a task executes and dropped afterwards; the task runner holds no
/// reference beyond a single invocation.
pub trait Remote {
    /// Execute a shell command on the remote host.
    ///
    /// Returns the exit status and captured output without treating a
    /// non-zero exit as an error; callers decide whether it aborts.
    /// Transport failures (lost connection, channel errors) are errors.
    fn run(&mut self, command: &str) -> Result<RunOutput>;

    /// Upload a local file to an absolute remote path
    fn put(&mut self, local: &Path, remote_path: &str) -> Result<()>;

    /// Download an absolute remote path to a local file
    fn get(&mut self, remote_path: &str, local: &Path) -> Result<()>;

    /// Host this remote is connected to, for diagnostics
    fn host(&self) -> &str;
}

/// Captured result of one remote command
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// True if either stream exceeded MAX_OUTPUT_SIZE
    pub truncated: bool,
}

impl RunOutput {
    /// True when the command exited zero
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Quote a value for safe interpolation into a POSIX shell command.
///
/// Wraps the value in single quotes, closing and reopening around any
/// embedded single quote (`'` becomes `'\''`). Configuration values and
/// CLI parameters pass through this before landing in a command string.
pub fn sh_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}

/// Truncate string output to MAX_OUTPUT_SIZE
///
/// Returns (truncated_string, was_truncated)
pub(crate) fn truncate_output(data: &str) -> (String, bool) {
    let bytes = data.as_bytes();
    let truncated = bytes.len() > MAX_OUTPUT_SIZE;

    if truncated {
        let truncated_bytes = &bytes[..MAX_OUTPUT_SIZE];
        let output = String::from_utf8_lossy(truncated_bytes).to_string();
        (output, true)
    } else {
        (data.to_string(), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_output_success() {
        let output = RunOutput {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
            truncated: false,
        };
        assert!(output.success());

        let output = RunOutput {
            exit_code: 1,
            stdout: String::new(),
            stderr: String::new(),
            truncated: false,
        };
        assert!(!output.success());
    }

    #[test]
    fn test_sh_quote_plain() {
        assert_eq!(sh_quote("master"), "'master'");
        assert_eq!(sh_quote("/srv/logbook"), "'/srv/logbook'");
    }

    #[test]
    fn test_sh_quote_special_characters() {
        assert_eq!(sh_quote("a b"), "'a b'");
        assert_eq!(sh_quote("$(rm -rf /)"), "'$(rm -rf /)'");
        assert_eq!(sh_quote("a;b"), "'a;b'");
    }

    #[test]
    fn test_sh_quote_embedded_quote() {
        assert_eq!(sh_quote("it's"), r#"'it'\''s'"#);
    }

    #[test]
    fn test_truncate_output() {
        let small_data = "hello world";
        let (output, truncated) = truncate_output(small_data);
        assert_eq!(output, "hello world");
        assert!(!truncated);

        // Create large data
        let large_data = "x".repeat(MAX_OUTPUT_SIZE + 1000);
        let (output, truncated) = truncate_output(&large_data);
        assert_eq!(output.len(), MAX_OUTPUT_SIZE);
        assert!(truncated);
    }
}
