//! Snapshot of the repository facts that validation depends on.

use std::collections::BTreeSet;

use gitflow_git::{CommandRunner, Inspector};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::flow_config::FlowConfig;

/// Repository facts gathered before an action is planned.
///
/// Read once per action; validation never re-queries git for anything
/// captured here.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepositoryState {
    /// Checked-out branch, `None` on a detached HEAD.
    pub current_branch: Option<String>,
    /// No uncommitted changes to tracked files.
    pub clean: bool,
    /// HEAD points at a commit.
    pub has_commits: bool,
    /// Local branch names.
    pub local_branches: BTreeSet<String>,
    /// Remote-tracking branches as `remote/branch`.
    pub remote_branches: BTreeSet<String>,
    /// Configured remotes.
    pub remotes: Vec<String>,
    /// Flow configuration, `None` when not initialized.
    pub config: Option<FlowConfig>,
}

impl RepositoryState {
    /// Read the current state of the repository.
    ///
    /// # Errors
    /// Returns error if any query fails.
    pub async fn read<R: CommandRunner>(inspector: &Inspector<'_, R>) -> Result<Self> {
        let current_branch = match inspector.current_branch().await {
            Ok(branch) => Some(branch),
            Err(gitflow_git::Error::DetachedHead) => None,
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            current_branch,
            clean: inspector.is_clean().await?,
            has_commits: inspector.has_commits().await?,
            local_branches: inspector.local_branches().await?.into_iter().collect(),
            remote_branches: inspector.remote_branches().await?.into_iter().collect(),
            remotes: inspector.remotes().await?,
            config: FlowConfig::read(inspector).await?,
        })
    }

    /// The flow configuration.
    ///
    /// # Errors
    /// Returns `NotInitialized` if the repository has none.
    pub fn config(&self) -> Result<&FlowConfig> {
        self.config.as_ref().ok_or(Error::NotInitialized)
    }

    /// Fail with `DirtyTree` unless the working tree is clean.
    ///
    /// # Errors
    /// Returns `DirtyTree` on uncommitted changes.
    pub const fn require_clean(&self) -> Result<()> {
        if self.clean { Ok(()) } else { Err(Error::DirtyTree) }
    }

    #[must_use]
    pub fn has_branch(&self, name: &str) -> bool {
        self.local_branches.contains(name)
    }

    #[must_use]
    pub fn has_remote(&self, remote: &str) -> bool {
        self.remotes.iter().any(|r| r == remote)
    }

    #[must_use]
    pub fn has_remote_branch(&self, remote: &str, name: &str) -> bool {
        self.remote_branches.contains(&format!("{remote}/{name}"))
    }

    /// Local branches starting with `prefix`, sorted.
    #[must_use]
    pub fn branches_with_prefix(&self, prefix: &str) -> Vec<&str> {
        self.local_branches
            .iter()
            .filter(|b| b.starts_with(prefix))
            .map(String::as_str)
            .collect()
    }

    /// Name of the checked-out branch for messages.
    #[must_use]
    pub fn current_label(&self) -> String {
        self.current_branch
            .clone()
            .unwrap_or_else(|| "(detached HEAD)".into())
    }
}
