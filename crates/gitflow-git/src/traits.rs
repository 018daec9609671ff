//! Trait abstractions for running git commands.
//!
//! This module defines the `CommandRunner` trait which abstracts process
//! execution, enabling dependency injection and testability.

use std::future::Future;
use std::path::Path;

use crate::{Error, Result};

/// Captured result of a single git invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Standard error, lossily decoded.
    pub stderr: String,
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Output of a command that exited with status 0.
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            code: Some(0),
        }
    }

    /// Output of a command that exited with `code`.
    #[must_use]
    pub fn failed(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            code: Some(code),
        }
    }

    /// Whether the command exited with status 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Standard output with surrounding whitespace removed.
    #[must_use]
    pub fn trimmed(&self) -> &str {
        self.stdout.trim()
    }

    /// Standard output followed by standard error.
    ///
    /// Git reports merge conflicts on stdout and most other problems on
    /// stderr, so classification looks at both.
    #[must_use]
    pub fn combined(&self) -> String {
        match (self.stdout.trim(), self.stderr.trim()) {
            ("", err) => err.to_string(),
            (out, "") => out.to_string(),
            (out, err) => format!("{out}\n{err}"),
        }
    }

    /// Convert a nonzero exit into [`Error::CommandFailed`].
    ///
    /// # Errors
    /// Returns `CommandFailed` carrying the raw diagnostics when the command
    /// did not succeed.
    pub fn into_result(self, args: &[String]) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(Error::CommandFailed {
                command: args.join(" "),
                code: self.code,
                stderr: self.combined(),
            })
        }
    }
}

/// Trait for executing git command lines.
///
/// This trait abstracts process execution, allowing for:
/// - Dependency injection in the workflow engine
/// - Scripted in-memory implementations for testing
/// - Alternative implementations (e.g., dry-run recording)
///
/// Implementations return `Ok` for every command that ran, whatever its
/// exit status; `Err` is reserved for commands that could not be run at
/// all (missing executable, timeout).
pub trait CommandRunner: Send + Sync {
    /// Run `git <args>` inside `cwd`.
    fn run(
        &self,
        args: &[String],
        cwd: &Path,
    ) -> impl Future<Output = Result<CommandOutput>> + Send;
}
