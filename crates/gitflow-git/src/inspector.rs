//! Read-only repository queries.
//!
//! Each query is a single git command. Nothing here retries or mutates the
//! repository; unexpected exit statuses surface as [`Error::CommandFailed`].

use std::path::Path;

use crate::error::{Error, Result};
use crate::traits::{CommandOutput, CommandRunner};

/// How two refs relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Divergence {
    /// Both point at the same history.
    Equal,
    /// The first ref has commits the second lacks.
    Ahead(usize),
    /// The second ref has commits the first lacks.
    Behind(usize),
    /// Both sides have unique commits.
    Diverged {
        /// Commits only on the first ref.
        ahead: usize,
        /// Commits only on the second ref.
        behind: usize,
    },
}

impl Divergence {
    const fn from_counts(ahead: usize, behind: usize) -> Self {
        match (ahead, behind) {
            (0, 0) => Self::Equal,
            (a, 0) => Self::Ahead(a),
            (0, b) => Self::Behind(b),
            (ahead, behind) => Self::Diverged { ahead, behind },
        }
    }

    /// Whether the first ref is missing commits from the second.
    #[must_use]
    pub const fn is_behind(self) -> bool {
        matches!(self, Self::Behind(_) | Self::Diverged { .. })
    }
}

/// Repository inspector bound to a runner and a working directory.
#[derive(Debug)]
pub struct Inspector<'a, R: CommandRunner> {
    runner: &'a R,
    workdir: &'a Path,
}

impl<'a, R: CommandRunner> Inspector<'a, R> {
    /// Create an inspector for the repository at `workdir`.
    #[must_use]
    pub const fn new(runner: &'a R, workdir: &'a Path) -> Self {
        Self { runner, workdir }
    }

    async fn git(&self, args: &[&str]) -> Result<(Vec<String>, CommandOutput)> {
        let args: Vec<String> = args.iter().map(ToString::to_string).collect();
        let output = self.runner.run(&args, self.workdir).await?;
        Ok((args, output))
    }

    /// Run a query where exit 0 means yes and exit 1 means no.
    async fn probe(&self, args: &[&str]) -> Result<bool> {
        let (args, output) = self.git(args).await?;
        match output.code {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => output.into_result(&args).map(|_| false),
        }
    }

    /// Run a query that must succeed and return its trimmed stdout.
    async fn read(&self, args: &[&str]) -> Result<String> {
        let (args, output) = self.git(args).await?;
        Ok(output.into_result(&args)?.trimmed().to_string())
    }

    // === Branches ===

    /// Get the name of the current branch.
    ///
    /// # Errors
    /// Returns `DetachedHead` when HEAD does not point at a branch.
    pub async fn current_branch(&self) -> Result<String> {
        let (args, output) = self.git(&["symbolic-ref", "--quiet", "--short", "HEAD"]).await?;
        match output.code {
            Some(0) => Ok(output.trimmed().to_string()),
            Some(1) => Err(Error::DetachedHead),
            _ => Err(output.into_result(&args).err().unwrap_or(Error::NotARepository)),
        }
    }

    /// Check if a local branch exists.
    ///
    /// # Errors
    /// Returns error if the query cannot be run.
    pub async fn branch_exists(&self, name: &str) -> Result<bool> {
        let reference = format!("refs/heads/{name}");
        self.probe(&["show-ref", "--verify", "--quiet", reference.as_str()])
            .await
    }

    /// Check if `remote` has a tracking ref for `name`.
    ///
    /// # Errors
    /// Returns error if the query cannot be run.
    pub async fn remote_branch_exists(&self, remote: &str, name: &str) -> Result<bool> {
        let reference = format!("refs/remotes/{remote}/{name}");
        self.probe(&["show-ref", "--verify", "--quiet", reference.as_str()])
            .await
    }

    /// Check if a tag exists.
    ///
    /// # Errors
    /// Returns error if the query cannot be run.
    pub async fn tag_exists(&self, name: &str) -> Result<bool> {
        let reference = format!("refs/tags/{name}");
        self.probe(&["show-ref", "--verify", "--quiet", reference.as_str()])
            .await
    }

    /// List all local branches.
    ///
    /// # Errors
    /// Returns error if the listing fails.
    pub async fn local_branches(&self) -> Result<Vec<String>> {
        let out = self
            .read(&["for-each-ref", "--format=%(refname:short)", "refs/heads"])
            .await?;
        Ok(lines(&out))
    }

    /// List remote-tracking branches as `remote/branch`.
    ///
    /// Symbolic remote HEADs are skipped.
    ///
    /// # Errors
    /// Returns error if the listing fails.
    pub async fn remote_branches(&self) -> Result<Vec<String>> {
        let out = self
            .read(&["for-each-ref", "--format=%(refname:short)", "refs/remotes"])
            .await?;
        Ok(lines(&out)
            .into_iter()
            .filter(|name| name.contains('/') && !name.ends_with("/HEAD"))
            .collect())
    }

    /// List configured remotes.
    ///
    /// # Errors
    /// Returns error if the listing fails.
    pub async fn remotes(&self) -> Result<Vec<String>> {
        let out = self.read(&["remote"]).await?;
        Ok(lines(&out))
    }

    // === History ===

    /// Check whether HEAD points at a commit (false for a fresh repository).
    ///
    /// # Errors
    /// Returns error if the query cannot be run.
    pub async fn has_commits(&self) -> Result<bool> {
        self.probe(&["rev-parse", "--verify", "--quiet", "HEAD"])
            .await
    }

    /// Check if `ancestor` is reachable from `descendant`.
    ///
    /// # Errors
    /// Returns error if either ref is unknown.
    pub async fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool> {
        self.probe(&["merge-base", "--is-ancestor", ancestor, descendant])
            .await
    }

    /// Compare two refs by counting commits unique to each side.
    ///
    /// # Errors
    /// Returns error if either ref is unknown or the output is malformed.
    pub async fn divergence(&self, first: &str, second: &str) -> Result<Divergence> {
        let range = format!("{first}...{second}");
        let out = self
            .read(&["rev-list", "--left-right", "--count", range.as_str()])
            .await?;

        let mut counts = out.split_whitespace().map(str::parse::<usize>);
        match (counts.next(), counts.next()) {
            (Some(Ok(ahead)), Some(Ok(behind))) => Ok(Divergence::from_counts(ahead, behind)),
            _ => Err(Error::UnexpectedOutput {
                command: format!("rev-list --left-right --count {range}"),
                output: out,
            }),
        }
    }

    // === Working tree ===

    /// Check if tracked files have no uncommitted changes.
    ///
    /// Untracked files are ignored; they never block a merge of their own.
    ///
    /// # Errors
    /// Returns error if status cannot be read.
    pub async fn is_clean(&self) -> Result<bool> {
        let out = self
            .read(&["status", "--porcelain", "--untracked-files=no"])
            .await?;
        Ok(out.is_empty())
    }

    /// Files left unmerged by a conflicting merge or rebase.
    ///
    /// # Errors
    /// Returns error if the diff cannot be read.
    pub async fn unmerged_files(&self) -> Result<Vec<String>> {
        let out = self
            .read(&["diff", "--name-only", "--diff-filter=U"])
            .await?;
        Ok(lines(&out))
    }

    /// Check if a merge is waiting to be concluded.
    ///
    /// # Errors
    /// Returns error if the query cannot be run.
    pub async fn merge_in_progress(&self) -> Result<bool> {
        self.probe(&["rev-parse", "--verify", "--quiet", "MERGE_HEAD"])
            .await
    }

    // === Config ===

    /// Read a git config value, `None` when unset.
    ///
    /// # Errors
    /// Returns error if the config cannot be read.
    pub async fn config(&self, key: &str) -> Result<Option<String>> {
        let (args, output) = self.git(&["config", "--get", key]).await?;
        match output.code {
            Some(0) => Ok(Some(output.stdout.trim_end_matches('\n').to_string())),
            Some(1) => Ok(None),
            _ => output.into_result(&args).map(|_| None),
        }
    }
}

fn lines(out: &str) -> Vec<String> {
    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}
