//! # gitflow-core
//!
//! The git-flow workflow engine: branch policy, flow configuration,
//! validation, plan construction, and step execution with recoverable
//! conflict handling. Git itself is reached only through a
//! [`gitflow_git::CommandRunner`].

pub mod action;
pub mod branch_name;
pub mod config;
pub mod engine;
pub mod error;
pub mod flow_config;
pub mod plan;
mod planner;
pub mod policy;
pub mod recovery;
pub mod state;
pub mod traits;

#[cfg(test)]
mod test_mocks;

pub use action::{FinishOptions, InitOptions, WorkflowAction};
pub use branch_name::BranchName;
pub use config::Settings;
pub use engine::{ActionState, Engine, Progress, Report, Suspended};
pub use error::{Error, Result};
pub use flow_config::FlowConfig;
pub use plan::{ConflictClass, OperationStep, Plan, StepKind, StepRole};
pub use policy::{BranchKind, BranchPolicy, FinishTargets};
pub use recovery::{RecoverableFailure, Remediation, RemediationKind};
pub use state::RepositoryState;
pub use traits::{ConfigReader, Prompter};
