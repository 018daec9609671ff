//! Branch naming and merge topology.
//!
//! Pure functions of a [`FlowConfig`]: no git calls, no side effects.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::branch_name::{BranchName, validate_identifier};
use crate::error::Result;
use crate::flow_config::FlowConfig;

/// Kinds of short-lived flow branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchKind {
    /// `feature/<name>`, branched from and merged back into develop.
    Feature,
    /// `release/<version>`, branched from develop, merged into main and develop.
    Release,
    /// `hotfix/<version>`, branched from main, merged into main and develop.
    Hotfix,
    /// `support/<name>`; only its prefix is configured.
    Support,
}

impl BranchKind {
    /// Every kind, in configuration order.
    pub const ALL: [Self; 4] = [Self::Feature, Self::Release, Self::Hotfix, Self::Support];

    /// Lower-case name used in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Release => "release",
            Self::Hotfix => "hotfix",
            Self::Support => "support",
        }
    }
}

impl fmt::Display for BranchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a finished branch goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishTargets {
    /// Branches merged into, in merge order.
    pub merge_into: Vec<String>,
    /// Tag created on the first target after its merge.
    pub tag: Option<String>,
}

/// Naming and topology rules derived from a flow configuration.
#[derive(Debug, Clone, Copy)]
pub struct BranchPolicy<'a> {
    config: &'a FlowConfig,
}

impl<'a> BranchPolicy<'a> {
    /// Create a policy over `config`.
    #[must_use]
    pub const fn new(config: &'a FlowConfig) -> Self {
        Self { config }
    }

    /// Full branch name for `identifier`.
    ///
    /// # Errors
    /// Returns `InvalidName` if the identifier is empty, contains a path
    /// separator, or the resulting name is not a valid git branch.
    pub fn branch_name(&self, kind: BranchKind, identifier: &str) -> Result<BranchName> {
        validate_identifier(identifier)?;
        BranchName::new(format!("{}{identifier}", self.config.prefix(kind)))
    }

    /// Branch a new branch of `kind` starts from.
    #[must_use]
    pub fn required_source(&self, kind: BranchKind) -> &'a str {
        match kind {
            BranchKind::Feature | BranchKind::Release => &self.config.develop,
            BranchKind::Hotfix | BranchKind::Support => &self.config.main,
        }
    }

    /// Merge targets and tag for finishing `identifier`.
    ///
    /// # Errors
    /// Returns `InvalidName` if the tag for a release or hotfix is not a
    /// valid ref name.
    pub fn finish_targets(&self, kind: BranchKind, identifier: &str) -> Result<FinishTargets> {
        let targets = match kind {
            BranchKind::Feature => FinishTargets {
                merge_into: vec![self.config.develop.clone()],
                tag: None,
            },
            BranchKind::Release | BranchKind::Hotfix => FinishTargets {
                merge_into: vec![self.config.main.clone(), self.config.develop.clone()],
                tag: Some(self.tag_name(identifier)?),
            },
            BranchKind::Support => FinishTargets {
                merge_into: Vec::new(),
                tag: None,
            },
        };
        Ok(targets)
    }

    /// Tag name for a release or hotfix identifier.
    ///
    /// Tags follow the same ref rules as branches.
    ///
    /// # Errors
    /// Returns `InvalidName` if the identifier or the resulting tag is invalid.
    pub fn tag_name(&self, identifier: &str) -> Result<String> {
        validate_identifier(identifier)?;
        let tag = BranchName::new(format!("{}{identifier}", self.config.version_tag_prefix))?;
        Ok(tag.into())
    }

    /// Identifier of `branch` if it carries the `kind` prefix.
    #[must_use]
    pub fn identifier_of<'b>(&self, kind: BranchKind, branch: &'b str) -> Option<&'b str> {
        branch
            .strip_prefix(self.config.prefix(kind))
            .filter(|rest| !rest.is_empty())
    }
}
