//! Recoverable step failures and the remediations offered for them.
//!
//! A step failure is recoverable only when its [`ConflictClass`] allows it
//! and git's output matches one of the known conflict signatures. Anything
//! else aborts the action.

use std::fmt;

use gitflow_git::CommandOutput;
use serde::Serialize;

use crate::plan::{ConflictClass, OperationStep};

const MERGE_SIGNATURES: &[&str] = &["CONFLICT", "Automatic merge failed"];
const REBASE_SIGNATURES: &[&str] = &["CONFLICT", "could not apply", "Resolve all conflicts"];
const PUSH_SIGNATURES: &[&str] = &["[rejected]", "non-fast-forward", "fetch first"];

/// A remediation for a suspended step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationKind {
    /// Conclude the merge once conflicts are resolved.
    ContinueMerge,
    /// Abort the merge and stop the action.
    AbortMerge,
    /// Continue the rebase once conflicts are resolved.
    ContinueRebase,
    /// Abort the rebase and stop the action.
    AbortRebase,
    /// Run the push again.
    RetryPush,
    /// Leave the remote as it is and carry on.
    SkipPush,
}

impl RemediationKind {
    /// Menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ContinueMerge => "I resolved the conflicts - continue the merge",
            Self::AbortMerge => "Abort the merge",
            Self::ContinueRebase => "I resolved the conflicts - continue the rebase",
            Self::AbortRebase => "Abort the rebase",
            Self::RetryPush => "Retry the push",
            Self::SkipPush => "Skip the push",
        }
    }
}

/// A remediation bound to the step it applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Remediation {
    pub kind: RemediationKind,
    /// Zero-based index of the suspended step.
    pub step: usize,
}

impl fmt::Display for Remediation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.label())
    }
}

/// A step failed in a way the user can repair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoverableFailure {
    /// What went wrong and what the user should do.
    pub message: String,
    /// Zero-based index of the failed step.
    pub step: usize,
    /// Description of the failed step.
    pub step_description: String,
    /// Files with unresolved conflicts.
    pub files: Vec<String>,
    /// Combined git output.
    pub output: String,
    /// Remediations in preference order.
    pub options: Vec<Remediation>,
}

impl RecoverableFailure {
    /// Build the failure for a recoverable step.
    #[must_use]
    pub fn new(index: usize, step: &OperationStep, files: Vec<String>, output: String) -> Self {
        let kinds: &[RemediationKind] = match step.conflict {
            ConflictClass::Merge => &[RemediationKind::ContinueMerge, RemediationKind::AbortMerge],
            ConflictClass::Rebase => {
                &[RemediationKind::ContinueRebase, RemediationKind::AbortRebase]
            }
            ConflictClass::Push => &[RemediationKind::RetryPush, RemediationKind::SkipPush],
            ConflictClass::None => &[],
        };

        Self {
            message: describe(step, &files),
            step: index,
            step_description: step.description.clone(),
            files,
            output,
            options: kinds
                .iter()
                .map(|&kind| Remediation { kind, step: index })
                .collect(),
        }
    }

    /// Same failure with a fresh list of conflicted files.
    #[must_use]
    pub fn with_files(self, step: &OperationStep, files: Vec<String>) -> Self {
        Self {
            message: describe(step, &files),
            files,
            ..self
        }
    }

    /// Whether `remediation` is one of the offered options.
    #[must_use]
    pub fn offers(&self, remediation: Remediation) -> bool {
        self.options.contains(&remediation)
    }
}

fn describe(step: &OperationStep, files: &[String]) -> String {
    let headline = match step.conflict {
        ConflictClass::Merge | ConflictClass::Rebase => {
            format!("Conflicts while trying to {}", step.description)
        }
        ConflictClass::Push => format!("The remote rejected the update ({})", step.description),
        ConflictClass::None => format!("Failed to {}", step.description),
    };

    if files.is_empty() {
        return headline;
    }

    let mut message = format!("{headline}\nResolve the conflicts in:");
    for file in files {
        message.push_str("\n  ");
        message.push_str(file);
    }
    message
}

/// Whether a failed step's output is a recoverable failure of its class.
#[must_use]
pub fn is_recoverable(conflict: ConflictClass, output: &CommandOutput) -> bool {
    let signatures = match conflict {
        ConflictClass::Merge => {
            if output.code != Some(1) {
                return false;
            }
            MERGE_SIGNATURES
        }
        ConflictClass::Rebase => REBASE_SIGNATURES,
        ConflictClass::Push => PUSH_SIGNATURES,
        ConflictClass::None => return false,
    };

    let text = output.combined();
    signatures.iter().any(|s| text.contains(s))
}
