//! The workflow engine.
//!
//! Runs a validated [`Plan`] one step at a time. Each mutating step is
//! classified before the next one runs: success advances, a recognised
//! conflict suspends the action as a [`Suspended`] value, anything else
//! aborts with [`Error::StepFailed`]. Earlier steps are never rolled back.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use gitflow_git::{CommandOutput, CommandRunner, Inspector};
use serde::Serialize;

use crate::action::WorkflowAction;
use crate::error::{Error, Result};
use crate::plan::{OperationStep, Plan};
use crate::recovery::{self, RecoverableFailure, Remediation, RemediationKind};
use crate::state::RepositoryState;
use crate::traits::Prompter;

/// Lifecycle of one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionState {
    NotStarted,
    Validating,
    Executing(usize),
    AwaitingRecovery(usize),
    Completed,
    Aborted,
}

/// Summary of a finished action.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Action label, e.g. `release finish`.
    pub action: String,
    /// `Completed` or `Aborted`.
    pub state: ActionState,
    /// Descriptions of the steps that ran, in order.
    pub completed: Vec<String>,
    /// Informational notes.
    pub notes: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl Report {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.state == ActionState::Completed
    }
}

/// A plan in flight.
#[derive(Debug, Clone)]
struct Execution {
    plan: Plan,
    next: usize,
    completed: Vec<String>,
    notes: Vec<String>,
    state: ActionState,
    started_at: DateTime<Utc>,
}

impl Execution {
    fn new(plan: Plan) -> Self {
        let notes = plan.notes.clone();
        let mut execution = Self {
            plan,
            next: 0,
            completed: Vec::new(),
            notes,
            state: ActionState::NotStarted,
            started_at: Utc::now(),
        };
        execution.enter(ActionState::Validating);
        execution
    }

    fn enter(&mut self, state: ActionState) {
        tracing::info!(action = %self.plan.action, from = ?self.state, to = ?state, "state transition");
        self.state = state;
    }

    fn step(&self) -> Option<&OperationStep> {
        self.plan.steps.get(self.next)
    }

    fn advance(&mut self) {
        if let Some(step) = self.plan.steps.get(self.next) {
            self.completed.push(step.description.clone());
        }
        self.next += 1;
    }

    fn skip(&mut self) {
        if let Some(step) = self.plan.steps.get(self.next) {
            self.notes.push(format!("skipped: {}", step.description));
        }
        self.next += 1;
    }

    fn finish(mut self, state: ActionState) -> Report {
        self.enter(state);
        Report {
            action: self.plan.action,
            state,
            completed: self.completed,
            notes: self.notes,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }

    fn fail(mut self, source: gitflow_git::Error) -> Error {
        let index = self.next;
        let step = self
            .step()
            .map(|s| s.description.clone())
            .unwrap_or_default();
        self.enter(ActionState::Aborted);
        Error::StepFailed {
            index,
            step,
            completed: self.completed,
            source,
        }
    }
}

/// An action stopped at a recoverable failure.
///
/// Holds everything needed to continue; resume it with [`Engine::resume`]
/// after any delay.
#[derive(Debug, Clone)]
pub struct Suspended {
    execution: Execution,
    failure: RecoverableFailure,
}

impl Suspended {
    #[must_use]
    pub const fn plan(&self) -> &Plan {
        &self.execution.plan
    }

    /// Index of the suspended step.
    #[must_use]
    pub const fn step(&self) -> usize {
        self.execution.next
    }

    #[must_use]
    pub const fn failure(&self) -> &RecoverableFailure {
        &self.failure
    }

    /// Steps that completed before the suspension.
    #[must_use]
    pub fn completed(&self) -> &[String] {
        &self.execution.completed
    }
}

/// Where an action stands after running as far as it can.
#[derive(Debug, Clone)]
pub enum Progress {
    Completed(Report),
    Suspended(Box<Suspended>),
    Aborted(Report),
}

enum StepResult {
    Success,
    Conflict(RecoverableFailure),
    Fatal(gitflow_git::Error),
}

/// Plans and runs workflow actions against one repository.
#[derive(Debug)]
pub struct Engine<R: CommandRunner> {
    pub(crate) runner: R,
    pub(crate) workdir: PathBuf,
    pub(crate) remote: String,
}

impl<R: CommandRunner> Engine<R> {
    /// Create an engine for the repository at `workdir`, using `origin`.
    pub fn new(runner: R, workdir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            workdir: workdir.into(),
            remote: "origin".into(),
        }
    }

    /// Use a different remote.
    #[must_use]
    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    pub const fn runner(&self) -> &R {
        &self.runner
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn inspector(&self) -> Inspector<'_, R> {
        Inspector::new(&self.runner, &self.workdir)
    }

    /// Read the repository state.
    ///
    /// # Errors
    /// Returns error if a query fails.
    pub async fn state(&self) -> Result<RepositoryState> {
        RepositoryState::read(&self.inspector()).await
    }

    /// Validate, confirm, execute and recover `action` end to end.
    ///
    /// Suspensions are handed to `prompter`; declining every remediation
    /// (or the confirmation) ends the action as `Aborted`.
    ///
    /// # Errors
    /// Returns precondition errors before anything runs, and `StepFailed`
    /// when a step fails in a way that cannot be recovered.
    pub async fn run<P: Prompter>(&self, action: &WorkflowAction, prompter: &P) -> Result<Report> {
        let plan = self.plan(action).await?;

        if let Some(question) = &plan.confirmation {
            if !prompter.confirm(question, false) {
                let mut execution = Execution::new(plan);
                execution.notes.push("declined; nothing was changed".into());
                return Ok(execution.finish(ActionState::Aborted));
            }
        }

        let mut progress = self.start(plan).await?;
        loop {
            match progress {
                Progress::Completed(report) | Progress::Aborted(report) => return Ok(report),
                Progress::Suspended(suspended) => {
                    let failure = suspended.failure();
                    let choice = prompter.choose_remediation(&failure.message, &failure.options);
                    progress = self.resume(*suspended, choice).await?;
                }
            }
        }
    }

    /// Execute a plan from its first step.
    ///
    /// # Errors
    /// Returns `StepFailed` on an unrecoverable step failure.
    pub async fn start(&self, plan: Plan) -> Result<Progress> {
        self.drive(Execution::new(plan)).await
    }

    /// Continue a suspended action with the chosen remediation.
    ///
    /// `None` aborts the action without running anything else.
    ///
    /// # Errors
    /// Returns `InvalidRemediation` if `choice` was not offered for the
    /// suspended step, and `StepFailed` if the remediation itself fails.
    pub async fn resume(&self, suspended: Suspended, choice: Option<Remediation>) -> Result<Progress> {
        let Suspended {
            mut execution,
            failure,
        } = suspended;

        let Some(remediation) = choice else {
            execution.notes.push(format!(
                "stopped at step {}: {}",
                failure.step + 1,
                failure.step_description
            ));
            return Ok(Progress::Aborted(execution.finish(ActionState::Aborted)));
        };

        if remediation.step != execution.next || !failure.offers(remediation) {
            return Err(Error::InvalidRemediation {
                requested: remediation.step,
                suspended: execution.next,
            });
        }

        tracing::debug!(?remediation, "resuming");
        execution.enter(ActionState::Executing(execution.next));

        match remediation.kind {
            RemediationKind::AbortMerge | RemediationKind::AbortRebase => {
                let tool = if remediation.kind == RemediationKind::AbortMerge { "merge" } else { "rebase" };
                if let Err(e) = self.git(&[tool, "--abort"]).await {
                    return Err(execution.fail(e));
                }
                execution
                    .notes
                    .push(format!("{tool} aborted at: {}", failure.step_description));
                Ok(Progress::Aborted(execution.finish(ActionState::Aborted)))
            }
            RemediationKind::ContinueMerge => {
                if let Some(progress) = self.still_conflicted(&mut execution, &failure).await? {
                    return Ok(progress);
                }
                if self.inspector().merge_in_progress().await? {
                    if let Err(e) = self.git(&["commit", "--no-edit"]).await {
                        return Err(execution.fail(e));
                    }
                }
                execution.advance();
                self.drive(execution).await
            }
            RemediationKind::ContinueRebase => {
                if let Some(progress) = self.still_conflicted(&mut execution, &failure).await? {
                    return Ok(progress);
                }
                self.continue_rebase(execution, failure).await
            }
            RemediationKind::RetryPush => self.drive(execution).await,
            RemediationKind::SkipPush => {
                execution.skip();
                self.drive(execution).await
            }
        }
    }

    /// Suspend again when files are still unmerged.
    async fn still_conflicted(
        &self,
        execution: &mut Execution,
        failure: &RecoverableFailure,
    ) -> Result<Option<Progress>> {
        let files = self.inspector().unmerged_files().await?;
        if files.is_empty() {
            return Ok(None);
        }

        let Some(step) = execution.step().cloned() else {
            return Ok(None);
        };
        execution.enter(ActionState::AwaitingRecovery(execution.next));
        Ok(Some(Progress::Suspended(Box::new(Suspended {
            execution: execution.clone(),
            failure: failure.clone().with_files(&step, files),
        }))))
    }

    async fn continue_rebase(
        &self,
        mut execution: Execution,
        failure: RecoverableFailure,
    ) -> Result<Progress> {
        let args = ["-c", "core.editor=true", "rebase", "--continue"].map(String::from);
        let output = match self.runner.run(&args, &self.workdir).await {
            Ok(output) => output,
            Err(e) => return Err(execution.fail(e)),
        };

        if output.success() || output.combined().contains("No rebase in progress") {
            execution.advance();
            return self.drive(execution).await;
        }

        let Some(step) = execution.step().cloned() else {
            return self.drive(execution).await;
        };
        if recovery::is_recoverable(step.conflict, &output) {
            let files = self.inspector().unmerged_files().await?;
            let failure = RecoverableFailure {
                output: output.combined(),
                ..failure
            }
            .with_files(&step, files);
            execution.enter(ActionState::AwaitingRecovery(execution.next));
            return Ok(Progress::Suspended(Box::new(Suspended { execution, failure })));
        }

        match output.into_result(&args) {
            Ok(_) => {
                execution.advance();
                self.drive(execution).await
            }
            Err(e) => Err(execution.fail(e)),
        }
    }

    /// Run steps from `execution.next` until done, suspended or failed.
    async fn drive(&self, mut execution: Execution) -> Result<Progress> {
        while let Some(step) = execution.step().cloned() {
            let index = execution.next;
            execution.enter(ActionState::Executing(index));

            match self.execute_step(index, &step).await {
                StepResult::Success => execution.advance(),
                StepResult::Conflict(failure) => {
                    tracing::warn!(step = %step.description, "recoverable failure");
                    execution.enter(ActionState::AwaitingRecovery(index));
                    return Ok(Progress::Suspended(Box::new(Suspended { execution, failure })));
                }
                StepResult::Fatal(source) => return Err(execution.fail(source)),
            }
        }

        Ok(Progress::Completed(execution.finish(ActionState::Completed)))
    }

    async fn execute_step(&self, index: usize, step: &OperationStep) -> StepResult {
        tracing::debug!(index, step = %step.description, "executing step");
        let output = match self.runner.run(&step.args, &self.workdir).await {
            Ok(output) => output,
            Err(e) => return StepResult::Fatal(e),
        };

        if output.success() {
            return StepResult::Success;
        }

        if recovery::is_recoverable(step.conflict, &output) {
            let files = self.inspector().unmerged_files().await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "could not list unmerged files");
                Vec::new()
            });
            return StepResult::Conflict(RecoverableFailure::new(
                index,
                step,
                files,
                output.combined(),
            ));
        }

        match output.into_result(&step.args) {
            Ok(_) => StepResult::Success,
            Err(e) => StepResult::Fatal(e),
        }
    }

    /// Run an out-of-plan command, failing on nonzero exit.
    async fn git(&self, args: &[&str]) -> std::result::Result<CommandOutput, gitflow_git::Error> {
        let args: Vec<String> = args.iter().map(ToString::to_string).collect();
        self.runner
            .run(&args, &self.workdir)
            .await?
            .into_result(&args)
    }
}
