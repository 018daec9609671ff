//! Process-backed command runner.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{Error, Result};
use crate::traits::{CommandOutput, CommandRunner};

/// A discovered git executable.
///
/// Discovery happens once at startup; the result is handed to [`GitCli`]
/// explicitly rather than kept in process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitTool {
    /// Path (or bare program name resolved through `PATH`).
    pub path: PathBuf,
    /// Version string reported by `git --version`, e.g. `2.43.0`.
    pub version: String,
}

impl GitTool {
    /// Locate git, preferring `hint` when one is configured.
    ///
    /// # Errors
    /// Returns `Spawn` if the executable cannot be started and `NotGit` if
    /// it does not identify itself as git.
    pub async fn discover(hint: Option<&str>) -> Result<Self> {
        let path = PathBuf::from(hint.filter(|h| !h.trim().is_empty()).unwrap_or("git"));

        let output = Command::new(&path)
            .arg("--version")
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| Error::Spawn {
                program: path.display().to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let version = parse_version(&stdout)
            .ok_or_else(|| Error::NotGit(path.display().to_string()))?;

        tracing::debug!(path = %path.display(), %version, "discovered git");
        Ok(Self { path, version })
    }
}

/// Extract the version number from `git --version` output.
fn parse_version(output: &str) -> Option<String> {
    output
        .trim()
        .strip_prefix("git version ")
        .and_then(|rest| rest.split_whitespace().next())
        .map(String::from)
}

/// Runs git as a child process.
#[derive(Debug, Clone)]
pub struct GitCli {
    tool: GitTool,
    timeout: Option<Duration>,
}

impl GitCli {
    /// Create a runner for the given git executable.
    #[must_use]
    pub const fn new(tool: GitTool) -> Self {
        Self {
            tool,
            timeout: None,
        }
    }

    /// Kill and report any command running longer than `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The executable this runner invokes.
    #[must_use]
    pub const fn tool(&self) -> &GitTool {
        &self.tool
    }

    /// Resolve the top-level directory of the repository containing `dir`.
    ///
    /// # Errors
    /// Returns `NotARepository` when `dir` is not inside a work tree.
    pub async fn toplevel(&self, dir: &Path) -> Result<PathBuf> {
        let args = vec!["rev-parse".to_string(), "--show-toplevel".to_string()];
        let output = self.run(&args, dir).await?;
        if !output.success() {
            return Err(Error::NotARepository);
        }
        Ok(PathBuf::from(output.trimmed()))
    }
}

impl CommandRunner for GitCli {
    fn run(
        &self,
        args: &[String],
        cwd: &Path,
    ) -> impl Future<Output = Result<CommandOutput>> + Send {
        let mut command = Command::new(&self.tool.path);
        command
            .args(args)
            .current_dir(cwd)
            // Conflict detection matches git's English diagnostics.
            .env("LC_ALL", "C")
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let shown = args.join(" ");
        let program = self.tool.path.display().to_string();
        let timeout = self.timeout;

        async move {
            tracing::debug!(command = %shown, "running git");

            let pending = command.output();
            let output = match timeout {
                Some(after) => tokio::time::timeout(after, pending)
                    .await
                    .map_err(|_| Error::Timeout {
                        command: shown.clone(),
                        after,
                    })?,
                None => pending.await,
            }
            .map_err(|source| Error::Spawn { program, source })?;

            let output = CommandOutput {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                code: output.status.code(),
            };

            tracing::debug!(command = %shown, code = ?output.code, "git finished");
            Ok(output)
        }
    }
}
