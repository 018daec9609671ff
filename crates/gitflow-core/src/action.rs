//! Workflow actions a user can request.

use serde::{Deserialize, Serialize};

use crate::flow_config::FlowConfig;
use crate::policy::BranchKind;

/// Options for initializing a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitOptions {
    /// Configuration to persist.
    pub config: FlowConfig,
    /// Overwrite an existing configuration.
    pub reinitialize: bool,
}

/// Options for finishing a release or hotfix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishOptions {
    /// Identifier to finish; the current branch when `None`.
    pub name: Option<String>,
    /// Tag annotation; defaults to `"<Kind> <identifier>"`.
    pub message: Option<String>,
    /// Push main, develop and tags when done.
    pub push: bool,
}

impl FinishOptions {
    /// Finish the named branch with default options.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// A git-flow action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    /// Persist a flow configuration and create the long-lived branches.
    Initialize(InitOptions),
    /// Branch `feature/<name>` off develop.
    FeatureStart(String),
    /// Rebase a feature branch onto develop.
    FeatureRebase(Option<String>),
    /// Merge a feature branch into develop and delete it.
    FeatureFinish(Option<String>),
    /// Branch `release/<version>` off develop.
    ReleaseStart(String),
    /// Merge a release into main and develop, tag it and delete it.
    ReleaseFinish(FinishOptions),
    /// Branch `hotfix/<version>` off main.
    HotfixStart(String),
    /// Merge a hotfix into main and develop, tag it and delete it.
    HotfixFinish(FinishOptions),
}

impl WorkflowAction {
    /// Short human-readable name, e.g. `release finish`.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Initialize(_) => "init",
            Self::FeatureStart(_) => "feature start",
            Self::FeatureRebase(_) => "feature rebase",
            Self::FeatureFinish(_) => "feature finish",
            Self::ReleaseStart(_) => "release start",
            Self::ReleaseFinish(_) => "release finish",
            Self::HotfixStart(_) => "hotfix start",
            Self::HotfixFinish(_) => "hotfix finish",
        }
    }

    /// Kind of branch the action operates on, `None` for `Initialize`.
    #[must_use]
    pub const fn kind(&self) -> Option<BranchKind> {
        match self {
            Self::Initialize(_) => None,
            Self::FeatureStart(_) | Self::FeatureRebase(_) | Self::FeatureFinish(_) => {
                Some(BranchKind::Feature)
            }
            Self::ReleaseStart(_) | Self::ReleaseFinish(_) => Some(BranchKind::Release),
            Self::HotfixStart(_) | Self::HotfixFinish(_) => Some(BranchKind::Hotfix),
        }
    }
}
