//! Ordered git command plans.
//!
//! A [`Plan`] is fully computed from validated repository state before any
//! of its steps run, so a rejected action never leaves partial changes.

use serde::Serialize;

/// What a step does, independent of its exact arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    PointHead,
    InitialCommit,
    TrackBranch,
    CreateBranch,
    SetConfig,
    Checkout,
    StartBranch,
    Fetch,
    Rebase,
    Merge,
    Tag,
    DeleteBranch,
    DeleteRemoteBranch,
    Push,
}

/// Whether a step changes repository state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepRole {
    Query,
    Mutation,
}

/// Which recoverable failure a step may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictClass {
    /// Any failure is fatal.
    None,
    /// Content conflicts while merging.
    Merge,
    /// Content conflicts while replaying commits.
    Rebase,
    /// The remote rejected the update.
    Push,
}

/// One git command in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationStep {
    pub kind: StepKind,
    /// Human-readable description, e.g. `merge 'release/1.0' into 'develop'`.
    pub description: String,
    /// Arguments passed to git.
    pub args: Vec<String>,
    pub role: StepRole,
    pub conflict: ConflictClass,
}

impl OperationStep {
    fn new(kind: StepKind, description: String, args: &[&str]) -> Self {
        Self {
            kind,
            description,
            args: args.iter().map(ToString::to_string).collect(),
            role: StepRole::Mutation,
            conflict: ConflictClass::None,
        }
    }

    const fn with_conflict(mut self, conflict: ConflictClass) -> Self {
        self.conflict = conflict;
        self
    }

    /// Point an unborn HEAD at `branch`.
    #[must_use]
    pub fn point_head(branch: &str) -> Self {
        let reference = format!("refs/heads/{branch}");
        Self::new(
            StepKind::PointHead,
            format!("point HEAD at '{branch}'"),
            &["symbolic-ref", "HEAD", reference.as_str()],
        )
    }

    /// Create an empty root commit.
    #[must_use]
    pub fn initial_commit() -> Self {
        Self::new(
            StepKind::InitialCommit,
            "create initial commit".into(),
            &["commit", "--allow-empty", "--quiet", "-m", "Initial commit"],
        )
    }

    /// Create a local branch tracking `remote/branch`.
    #[must_use]
    pub fn track(branch: &str, remote: &str) -> Self {
        let upstream = format!("{remote}/{branch}");
        Self::new(
            StepKind::TrackBranch,
            format!("create '{branch}' tracking '{upstream}'"),
            &["branch", "--track", branch, upstream.as_str()],
        )
    }

    /// Create `name` at `base` without checking it out.
    #[must_use]
    pub fn create_branch(name: &str, base: &str) -> Self {
        Self::new(
            StepKind::CreateBranch,
            format!("create '{name}' from '{base}'"),
            &["branch", "--no-track", name, base],
        )
    }

    #[must_use]
    pub fn set_config(key: &str, value: &str) -> Self {
        Self::new(
            StepKind::SetConfig,
            format!("set {key} to '{value}'"),
            &["config", key, value],
        )
    }

    #[must_use]
    pub fn checkout(branch: &str) -> Self {
        Self::new(
            StepKind::Checkout,
            format!("checkout '{branch}'"),
            &["checkout", branch],
        )
    }

    /// Create `name` at `base` and check it out.
    #[must_use]
    pub fn start_branch(name: &str, base: &str) -> Self {
        Self::new(
            StepKind::StartBranch,
            format!("create and checkout '{name}' from '{base}'"),
            &["checkout", "-b", name, base],
        )
    }

    /// Refresh remote-tracking refs.
    #[must_use]
    pub fn fetch(remote: &str) -> Self {
        let mut step = Self::new(
            StepKind::Fetch,
            format!("fetch from '{remote}'"),
            &["fetch", "--prune", remote],
        );
        step.role = StepRole::Query;
        step
    }

    /// Replay `branch` on top of `onto`.
    #[must_use]
    pub fn rebase(onto: &str, branch: &str) -> Self {
        Self::new(
            StepKind::Rebase,
            format!("rebase '{branch}' onto '{onto}'"),
            &["rebase", onto, branch],
        )
        .with_conflict(ConflictClass::Rebase)
    }

    /// Merge `source` into the checked-out `target` with a merge commit.
    #[must_use]
    pub fn merge(source: &str, target: &str) -> Self {
        Self::new(
            StepKind::Merge,
            format!("merge '{source}' into '{target}'"),
            &["merge", "--no-ff", "--no-edit", source],
        )
        .with_conflict(ConflictClass::Merge)
    }

    /// Annotated tag on `target`.
    #[must_use]
    pub fn tag(name: &str, message: &str, target: &str) -> Self {
        Self::new(
            StepKind::Tag,
            format!("tag '{target}' as '{name}'"),
            &["tag", "-a", name, "-m", message, target],
        )
    }

    /// Delete a fully merged local branch.
    #[must_use]
    pub fn delete_branch(branch: &str) -> Self {
        Self::new(
            StepKind::DeleteBranch,
            format!("delete branch '{branch}'"),
            &["branch", "-d", branch],
        )
    }

    #[must_use]
    pub fn delete_remote_branch(remote: &str, branch: &str) -> Self {
        Self::new(
            StepKind::DeleteRemoteBranch,
            format!("delete '{branch}' from '{remote}'"),
            &["push", remote, "--delete", branch],
        )
        .with_conflict(ConflictClass::Push)
    }

    /// Push `branches` and the annotated tags reachable from them.
    #[must_use]
    pub fn push(remote: &str, branches: &[&str]) -> Self {
        let mut args = vec!["push", "--follow-tags", remote];
        args.extend_from_slice(branches);
        Self::new(
            StepKind::Push,
            format!("push {} and tags to '{remote}'", quoted(branches)),
            &args,
        )
        .with_conflict(ConflictClass::Push)
    }

    /// Whether the step changes repository state.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        matches!(self.role, StepRole::Mutation)
    }
}

fn quoted(names: &[&str]) -> String {
    names
        .iter()
        .map(|n| format!("'{n}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The ordered steps of one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    /// Label of the action the plan implements.
    pub action: String,
    pub steps: Vec<OperationStep>,
    /// Question to confirm before anything runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<String>,
    /// Facts worth reporting that did not become steps.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl Plan {
    #[must_use]
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            steps: Vec::new(),
            confirmation: None,
            notes: Vec::new(),
        }
    }

    pub fn push(&mut self, step: OperationStep) {
        self.steps.push(step);
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// Whether running the plan would change nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        !self.steps.iter().any(OperationStep::is_mutation)
    }
}
