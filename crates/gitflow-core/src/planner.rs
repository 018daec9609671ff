//! Validation and plan construction for each workflow action.
//!
//! Every check here runs before the first mutating command, so a rejected
//! action leaves the repository untouched.

use gitflow_git::CommandRunner;

use crate::action::{FinishOptions, InitOptions, WorkflowAction};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::plan::{OperationStep, Plan};
use crate::policy::{BranchKind, BranchPolicy};
use crate::state::RepositoryState;

impl<R: CommandRunner> Engine<R> {
    /// Validate `action` against the current repository and build its plan.
    ///
    /// # Errors
    /// Returns the first precondition the repository fails, or an
    /// inspection error if git cannot be queried.
    pub async fn plan(&self, action: &WorkflowAction) -> Result<Plan> {
        let state = self.state().await?;
        tracing::debug!(action = action.label(), ?state.current_branch, "validating");

        let mut plan = match action {
            WorkflowAction::Initialize(options) => self.plan_initialize(&state, options)?,
            WorkflowAction::FeatureStart(name) => {
                self.plan_start(&state, BranchKind::Feature, name).await?
            }
            WorkflowAction::FeatureRebase(name) => {
                self.plan_feature_rebase(&state, name.as_deref())?
            }
            WorkflowAction::FeatureFinish(name) => {
                self.plan_feature_finish(&state, name.as_deref()).await?
            }
            WorkflowAction::ReleaseStart(name) => {
                self.plan_start(&state, BranchKind::Release, name).await?
            }
            WorkflowAction::ReleaseFinish(options) => {
                self.plan_versioned_finish(&state, BranchKind::Release, options)
                    .await?
            }
            WorkflowAction::HotfixStart(name) => {
                self.plan_start(&state, BranchKind::Hotfix, name).await?
            }
            WorkflowAction::HotfixFinish(options) => {
                self.plan_versioned_finish(&state, BranchKind::Hotfix, options)
                    .await?
            }
        };

        action.label().clone_into(&mut plan.action);
        Ok(plan)
    }

    fn plan_initialize(&self, state: &RepositoryState, options: &InitOptions) -> Result<Plan> {
        let config = &options.config;
        config.validate()?;

        let mut plan = Plan::new("init");
        if let Some(existing) = &state.config {
            if !options.reinitialize {
                plan.note(format!(
                    "already initialized (main: '{}', develop: '{}')",
                    existing.main, existing.develop
                ));
                return Ok(plan);
            }
        }

        let remote = self.remote.as_str();
        if !state.has_commits {
            plan.push(OperationStep::point_head(&config.main));
            plan.push(OperationStep::initial_commit());
        } else if !state.has_branch(&config.main) {
            if state.has_remote_branch(remote, &config.main) {
                plan.push(OperationStep::track(&config.main, remote));
            } else {
                return Err(Error::BranchMissing(config.main.clone()));
            }
        }

        if !state.has_branch(&config.develop) {
            if state.has_remote_branch(remote, &config.develop) {
                plan.push(OperationStep::track(&config.develop, remote));
            } else {
                plan.push(OperationStep::create_branch(&config.develop, &config.main));
            }
        }

        for (key, value) in config.entries() {
            plan.push(OperationStep::set_config(key, value));
        }
        plan.push(OperationStep::checkout(&config.develop));

        Ok(plan)
    }

    async fn plan_start(&self, state: &RepositoryState, kind: BranchKind, name: &str) -> Result<Plan> {
        let config = state.config()?;
        let policy = BranchPolicy::new(config);
        let branch = policy.branch_name(kind, name)?;

        if state.has_branch(&branch) || state.has_remote_branch(&self.remote, &branch) {
            return Err(Error::BranchExists(branch.to_string()));
        }

        if matches!(kind, BranchKind::Release | BranchKind::Hotfix) {
            if let Some(open) = state.branches_with_prefix(config.prefix(kind)).first() {
                return Err(Error::InProgress {
                    kind,
                    branch: (*open).to_string(),
                });
            }

            let tag = policy.tag_name(name)?;
            if self.inspector().tag_exists(&tag).await? {
                return Err(Error::TagExists(tag));
            }
        }

        let source = policy.required_source(kind);
        if !state.has_branch(source) {
            return Err(Error::BranchMissing(source.to_string()));
        }
        self.require_not_behind_remote(state, source).await?;

        let mut plan = Plan::new(kind.as_str());
        plan.push(OperationStep::start_branch(&branch, source));
        Ok(plan)
    }

    fn plan_feature_rebase(&self, state: &RepositoryState, name: Option<&str>) -> Result<Plan> {
        let config = state.config()?;
        let (branch, _) = resolve_branch(state, BranchKind::Feature, name)?;
        state.require_clean()?;

        if !state.has_branch(&config.develop) {
            return Err(Error::BranchMissing(config.develop.clone()));
        }

        let mut plan = Plan::new("feature rebase");
        if state.has_remote_branch(&self.remote, &branch) {
            plan.confirmation = Some(format!(
                "'{branch}' has been published to '{}'. Rebasing rewrites commits others may have pulled. Rebase anyway?",
                self.remote
            ));
        }
        if state.has_remote(&self.remote) {
            plan.push(OperationStep::fetch(&self.remote));
        }
        plan.push(OperationStep::rebase(&config.develop, &branch));
        Ok(plan)
    }

    async fn plan_feature_finish(&self, state: &RepositoryState, name: Option<&str>) -> Result<Plan> {
        let config = state.config()?;
        let (branch, _) = resolve_branch(state, BranchKind::Feature, name)?;
        state.require_clean()?;

        let develop = config.develop.as_str();
        if !state.has_branch(develop) {
            return Err(Error::BranchMissing(develop.to_string()));
        }
        if !self.inspector().is_ancestor(develop, &branch).await? {
            return Err(Error::NotUpToDate {
                branch,
                base: develop.to_string(),
            });
        }
        self.require_not_behind_remote(state, &branch).await?;
        self.require_not_behind_remote(state, develop).await?;

        let mut plan = Plan::new("feature finish");
        plan.push(OperationStep::checkout(develop));
        plan.push(OperationStep::merge(&branch, develop));
        plan.push(OperationStep::delete_branch(&branch));
        if state.has_remote_branch(&self.remote, &branch) {
            plan.push(OperationStep::delete_remote_branch(&self.remote, &branch));
        }
        Ok(plan)
    }

    async fn plan_versioned_finish(
        &self,
        state: &RepositoryState,
        kind: BranchKind,
        options: &FinishOptions,
    ) -> Result<Plan> {
        let config = state.config()?;
        let policy = BranchPolicy::new(config);
        let (branch, identifier) = resolve_branch(state, kind, options.name.as_deref())?;
        state.require_clean()?;

        let targets = policy.finish_targets(kind, &identifier)?;
        for target in &targets.merge_into {
            if !state.has_branch(target) {
                return Err(Error::BranchMissing(target.clone()));
            }
            self.require_not_behind_remote(state, target).await?;
        }
        self.require_not_behind_remote(state, &branch).await?;

        if let Some(tag) = &targets.tag {
            if self.inspector().tag_exists(tag).await? {
                return Err(Error::TagExists(tag.clone()));
            }
        }

        let message = options
            .message
            .clone()
            .unwrap_or_else(|| format!("{} {identifier}", title_case(kind.as_str())));

        let mut plan = Plan::new(kind.as_str());
        for (i, target) in targets.merge_into.iter().enumerate() {
            plan.push(OperationStep::checkout(target));
            plan.push(OperationStep::merge(&branch, target));
            if i == 0 {
                if let Some(tag) = &targets.tag {
                    plan.push(OperationStep::tag(tag, &message, target));
                }
            }
        }
        plan.push(OperationStep::delete_branch(&branch));
        if state.has_remote_branch(&self.remote, &branch) {
            plan.push(OperationStep::delete_remote_branch(&self.remote, &branch));
        }

        if options.push {
            if state.has_remote(&self.remote) {
                let refs: Vec<&str> = targets.merge_into.iter().map(String::as_str).collect();
                plan.push(OperationStep::push(&self.remote, &refs));
            } else {
                plan.note(format!("no remote '{}'; nothing was pushed", self.remote));
            }
        }

        Ok(plan)
    }

    /// Fail with `Diverged` if `branch` lacks commits from its remote counterpart.
    async fn require_not_behind_remote(&self, state: &RepositoryState, branch: &str) -> Result<()> {
        if !state.has_remote_branch(&self.remote, branch) {
            return Ok(());
        }

        let remote_branch = format!("{}/{branch}", self.remote);
        let divergence = self.inspector().divergence(branch, &remote_branch).await?;
        if divergence.is_behind() {
            return Err(Error::Diverged {
                local: branch.to_string(),
                remote: remote_branch,
            });
        }
        Ok(())
    }
}

/// Resolve the branch a rebase or finish operates on.
///
/// A named branch must exist and be checked out; without a name the
/// current branch must carry the kind's prefix.
fn resolve_branch(
    state: &RepositoryState,
    kind: BranchKind,
    name: Option<&str>,
) -> Result<(String, String)> {
    let config = state.config()?;
    let policy = BranchPolicy::new(config);
    let current = state.current_label();

    match name {
        Some(identifier) => {
            let branch = policy.branch_name(kind, identifier)?.to_string();
            if !state.has_branch(&branch) {
                return Err(Error::BranchMissing(branch));
            }
            if state.current_branch.as_deref() != Some(branch.as_str()) {
                return Err(Error::NotOnBranch { kind, current });
            }
            Ok((branch, identifier.to_string()))
        }
        None => {
            let identifier = state
                .current_branch
                .as_deref()
                .and_then(|b| policy.identifier_of(kind, b))
                .map(String::from)
                .ok_or(Error::NotOnBranch {
                    kind,
                    current: current.clone(),
                })?;
            Ok((current, identifier))
        }
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
