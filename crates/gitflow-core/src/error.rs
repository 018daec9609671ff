//! Error types for gitflow-core.

use std::path::PathBuf;

use crate::policy::BranchKind;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Terminal failures of a workflow action.
///
/// Precondition variants are raised before any mutating git command runs.
/// Recoverable conflicts are not errors; see [`crate::Progress::Suspended`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No git-flow configuration in this repository.
    #[error("gitflow is not initialized in this repository - run `gitflow init` first")]
    NotInitialized,

    /// Tracked files have uncommitted changes.
    #[error("working tree has uncommitted changes - commit or stash them and try again")]
    DirtyTree,

    /// The branch an action would create already exists.
    #[error("branch '{0}' already exists")]
    BranchExists(String),

    /// A branch the action needs does not exist.
    #[error("branch '{0}' does not exist")]
    BranchMissing(String),

    /// The branch does not contain the latest commits of its base.
    #[error("'{branch}' is not up to date with '{base}' - rebase it first (`gitflow feature rebase`)")]
    NotUpToDate {
        /// Branch being finished.
        branch: String,
        /// Branch it must contain.
        base: String,
    },

    /// The local branch is missing commits that exist on its remote.
    #[error("'{local}' is behind '{remote}' - pull or reconcile the branches first")]
    Diverged {
        /// Local branch.
        local: String,
        /// Remote-tracking counterpart.
        remote: String,
    },

    /// Invalid identifier or branch name.
    #[error("invalid name '{name}': {reason}")]
    InvalidName {
        /// The invalid name.
        name: String,
        /// Why the name is invalid.
        reason: String,
    },

    /// The flow configuration breaks an invariant.
    #[error("invalid gitflow configuration: {0}")]
    InvalidConfig(String),

    /// The current branch is not a branch of the expected kind.
    #[error("not on a {kind} branch (current branch: {current}) - checkout the {kind} branch first")]
    NotOnBranch {
        /// Expected kind.
        kind: BranchKind,
        /// What is checked out instead.
        current: String,
    },

    /// Another branch of the same kind is still open.
    #[error("{kind} branch '{branch}' is still in progress - finish it before starting another")]
    InProgress {
        /// Kind of branch.
        kind: BranchKind,
        /// The open branch.
        branch: String,
    },

    /// The tag an action would create already exists.
    #[error("tag '{0}' already exists")]
    TagExists(String),

    /// A remediation was offered for a different step than the suspended one.
    #[error("remediation targets step {requested} but the action is suspended at step {suspended}")]
    InvalidRemediation {
        /// Step named by the remediation.
        requested: usize,
        /// Step the plan is suspended at.
        suspended: usize,
    },

    /// A plan step failed in a way that cannot be recovered.
    ///
    /// Earlier steps are not rolled back; `completed` lists what already
    /// happened so the user can finish by hand.
    #[error("step {} ({step}) failed: {source}", index + 1)]
    StepFailed {
        /// Zero-based index of the failed step.
        index: usize,
        /// Description of the failed step.
        step: String,
        /// Descriptions of steps that succeeded before it.
        completed: Vec<String>,
        /// Underlying git failure with its raw diagnostics.
        #[source]
        source: gitflow_git::Error,
    },

    /// A read-only repository query failed.
    #[error("could not inspect repository: {0}")]
    Inspection(#[from] gitflow_git::Error),

    /// Settings file parsing error.
    #[error("failed to parse {file}: {message}")]
    SettingsParse {
        /// File that failed to parse.
        file: PathBuf,
        /// Parser diagnostics.
        message: String,
    },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error was raised before any mutation took place.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NotInitialized
                | Self::DirtyTree
                | Self::BranchExists(_)
                | Self::BranchMissing(_)
                | Self::NotUpToDate { .. }
                | Self::Diverged { .. }
                | Self::InvalidName { .. }
                | Self::InvalidConfig(_)
                | Self::NotOnBranch { .. }
                | Self::InProgress { .. }
                | Self::TagExists(_)
        )
    }
}
