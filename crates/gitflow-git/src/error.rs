//! Error types for gitflow-git.

use std::time::Duration;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running or interpreting git commands.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The git executable could not be started.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        /// Program that was invoked.
        program: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The git executable did not answer `--version` as expected.
    #[error("'{0}' does not look like a git executable")]
    NotGit(String),

    /// A command exceeded the configured timeout.
    #[error("git {command} timed out after {}s", after.as_secs())]
    Timeout {
        /// Arguments of the command, joined for display.
        command: String,
        /// Configured limit.
        after: Duration,
    },

    /// A command exited with a status the caller did not expect.
    #[error("git {command} failed (exit {}): {}", code.map_or_else(|| "signal".to_string(), |c| c.to_string()), stderr.trim())]
    CommandFailed {
        /// Arguments of the command, joined for display.
        command: String,
        /// Exit code, absent when killed by a signal.
        code: Option<i32>,
        /// Captured standard error, unmodified.
        stderr: String,
    },

    /// Not inside a git repository.
    #[error("not a git repository")]
    NotARepository,

    /// HEAD is detached (not on a branch).
    #[error("HEAD is detached - checkout a branch first")]
    DetachedHead,

    /// Git produced output that could not be parsed.
    #[error("unexpected output from git {command}: {output}")]
    UnexpectedOutput {
        /// Arguments of the command, joined for display.
        command: String,
        /// The offending output.
        output: String,
    },
}
