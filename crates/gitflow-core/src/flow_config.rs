//! The persisted git-flow configuration.
//!
//! Stored in the repository's git config under the `gitflow.*` keys used by
//! the git-flow shell extension, so repositories initialized by either tool
//! are interchangeable.

use std::collections::HashSet;

use gitflow_git::{CommandRunner, Inspector};
use serde::{Deserialize, Serialize};

use crate::branch_name::BranchName;
use crate::error::{Error, Result};
use crate::policy::BranchKind;

/// Git config keys holding the flow configuration.
pub mod keys {
    /// Production branch name.
    pub const MAIN: &str = "gitflow.branch.master";
    /// Integration branch name.
    pub const DEVELOP: &str = "gitflow.branch.develop";
    /// Feature branch prefix.
    pub const FEATURE: &str = "gitflow.prefix.feature";
    /// Release branch prefix.
    pub const RELEASE: &str = "gitflow.prefix.release";
    /// Hotfix branch prefix.
    pub const HOTFIX: &str = "gitflow.prefix.hotfix";
    /// Support branch prefix.
    pub const SUPPORT: &str = "gitflow.prefix.support";
    /// Version tag prefix.
    pub const VERSION_TAG: &str = "gitflow.prefix.versiontag";
}

/// Branch names and prefixes of a git-flow repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Production branch.
    pub main: String,
    /// Integration branch.
    pub develop: String,
    /// Prefix of feature branches.
    pub feature_prefix: String,
    /// Prefix of release branches.
    pub release_prefix: String,
    /// Prefix of hotfix branches.
    pub hotfix_prefix: String,
    /// Prefix of support branches.
    pub support_prefix: String,
    /// Prefix prepended to release and hotfix identifiers to form tags.
    /// May be empty.
    pub version_tag_prefix: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            main: "master".into(),
            develop: "develop".into(),
            feature_prefix: "feature/".into(),
            release_prefix: "release/".into(),
            hotfix_prefix: "hotfix/".into(),
            support_prefix: "support/".into(),
            version_tag_prefix: "v".into(),
        }
    }
}

impl FlowConfig {
    /// The configured prefix for a kind of branch.
    #[must_use]
    pub fn prefix(&self, kind: BranchKind) -> &str {
        match kind {
            BranchKind::Feature => &self.feature_prefix,
            BranchKind::Release => &self.release_prefix,
            BranchKind::Hotfix => &self.hotfix_prefix,
            BranchKind::Support => &self.support_prefix,
        }
    }

    /// Check the configuration invariants.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when main and develop coincide, a prefix
    /// (the version-tag prefix included) is empty or shared, or a
    /// long-lived branch would itself look like a flow branch. Returns
    /// `InvalidName` for names git would reject.
    pub fn validate(&self) -> Result<()> {
        BranchName::new(self.main.as_str())?;
        BranchName::new(self.develop.as_str())?;

        if self.main == self.develop {
            return Err(Error::InvalidConfig(format!(
                "production and development branches must differ (both are '{}')",
                self.main
            )));
        }

        let mut seen = HashSet::new();
        for kind in BranchKind::ALL {
            let prefix = self.prefix(kind);
            if prefix.is_empty() {
                return Err(Error::InvalidConfig(format!("{kind} prefix cannot be empty")));
            }
            if !seen.insert(prefix) {
                return Err(Error::InvalidConfig(format!(
                    "prefix '{prefix}' is used by more than one branch kind"
                )));
            }
            for branch in [&self.main, &self.develop] {
                if branch.starts_with(prefix) {
                    return Err(Error::InvalidConfig(format!(
                        "branch '{branch}' cannot start with the {kind} prefix '{prefix}'"
                    )));
                }
            }
        }

        // Tags live outside refs/heads, so only emptiness and sharing matter.
        let tag_prefix = self.version_tag_prefix.as_str();
        if tag_prefix.is_empty() {
            return Err(Error::InvalidConfig("version tag prefix cannot be empty".into()));
        }
        if !seen.insert(tag_prefix) {
            return Err(Error::InvalidConfig(format!(
                "version tag prefix '{tag_prefix}' is also a branch prefix"
            )));
        }

        Ok(())
    }

    /// Config key/value pairs in the order they are written.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        vec![
            (keys::MAIN, self.main.as_str()),
            (keys::DEVELOP, self.develop.as_str()),
            (keys::FEATURE, self.feature_prefix.as_str()),
            (keys::RELEASE, self.release_prefix.as_str()),
            (keys::HOTFIX, self.hotfix_prefix.as_str()),
            (keys::SUPPORT, self.support_prefix.as_str()),
            (keys::VERSION_TAG, self.version_tag_prefix.as_str()),
        ]
    }

    /// Read the configuration from git config.
    ///
    /// Returns `None` unless both branch keys are set. Missing prefixes
    /// fall back to their defaults.
    ///
    /// # Errors
    /// Returns error if git config cannot be queried.
    pub async fn read<R: CommandRunner>(inspector: &Inspector<'_, R>) -> Result<Option<Self>> {
        let (Some(main), Some(develop)) = (
            inspector.config(keys::MAIN).await?,
            inspector.config(keys::DEVELOP).await?,
        ) else {
            return Ok(None);
        };

        let defaults = Self::default();
        let or_default = |value: Option<String>, fallback: String| {
            value.filter(|v| !v.is_empty()).unwrap_or(fallback)
        };

        Ok(Some(Self {
            main,
            develop,
            feature_prefix: or_default(inspector.config(keys::FEATURE).await?, defaults.feature_prefix),
            release_prefix: or_default(inspector.config(keys::RELEASE).await?, defaults.release_prefix),
            hotfix_prefix: or_default(inspector.config(keys::HOTFIX).await?, defaults.hotfix_prefix),
            support_prefix: or_default(inspector.config(keys::SUPPORT).await?, defaults.support_prefix),
            version_tag_prefix: or_default(
                inspector.config(keys::VERSION_TAG).await?,
                defaults.version_tag_prefix,
            ),
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FlowConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.main, "master");
        assert_eq!(config.develop, "develop");
        assert_eq!(config.version_tag_prefix, "v");
    }

    #[test]
    fn test_rejects_identical_main_and_develop() {
        let config = FlowConfig {
            develop: "master".into(),
            ..FlowConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn test_rejects_empty_and_shared_prefixes() {
        let empty = FlowConfig {
            hotfix_prefix: String::new(),
            ..FlowConfig::default()
        };
        assert!(matches!(empty.validate(), Err(Error::InvalidConfig(_))));

        let shared = FlowConfig {
            release_prefix: "feature/".into(),
            ..FlowConfig::default()
        };
        assert!(matches!(shared.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_version_tag_prefix_is_checked_with_the_others() {
        let empty = FlowConfig {
            version_tag_prefix: String::new(),
            ..FlowConfig::default()
        };
        let err = empty.validate().unwrap_err();
        assert!(err.to_string().contains("version tag prefix cannot be empty"));

        let shared = FlowConfig {
            version_tag_prefix: "release/".into(),
            ..FlowConfig::default()
        };
        let err = shared.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(err.to_string().contains("also a branch prefix"));

        let main_like_tag = FlowConfig {
            main: "v-main".into(),
            ..FlowConfig::default()
        };
        assert!(main_like_tag.validate().is_ok());
    }

    #[test]
    fn test_rejects_long_lived_branch_with_flow_prefix() {
        let config = FlowConfig {
            develop: "feature/develop".into(),
            ..FlowConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_unsafe_branch_names() {
        let config = FlowConfig {
            main: "main;rm".into(),
            ..FlowConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidName { .. })));
    }

    #[test]
    fn test_entries_cover_every_key() {
        let config = FlowConfig::default();
        let entries = config.entries();
        assert_eq!(entries.len(), 7);
        assert_eq!(entries[0], (keys::MAIN, "master"));
        assert_eq!(entries[6], (keys::VERSION_TAG, "v"));
    }
}
