//! Branch name and identifier validation.
//!
//! Flow branch names end up on git command lines, so besides git's own
//! ref rules we reject shell metacharacters and path traversal.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Characters git refuses in ref names.
const GIT_FORBIDDEN: &[char] = &[' ', '~', '^', ':', '?', '*', '['];

/// Characters with meaning to a shell.
const SHELL_META: &[char] = &[
    '$', ';', '|', '&', '>', '<', '`', '\\', '"', '\'', '(', ')', '{', '}', '!',
];

/// Substrings git refuses anywhere in a ref name.
const FORBIDDEN_SEQUENCES: &[&str] = &["..", "//", "@{", "/."];

/// A validated git branch name.
///
/// ```
/// use gitflow_core::BranchName;
///
/// assert!(BranchName::new("release/1.6.2").is_ok());
/// assert!(BranchName::new("feature/../../etc").is_err());
/// assert!(BranchName::new("hotfix/$(id)").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Validate `name` as a branch name.
    ///
    /// # Errors
    /// Returns [`Error::InvalidName`] naming the first rule `name` breaks.
    pub fn new(name: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        match violation(&name) {
            Some(reason) => Err(Error::InvalidName { name, reason }),
            None => Ok(Self(name)),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

}

impl Deref for BranchName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BranchName {
    type Error = Error;

    fn try_from(name: String) -> Result<Self, Error> {
        Self::new(name)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

/// Validate the identifier of a feature, release or hotfix.
///
/// The identifier becomes the last path component of the flow branch.
///
/// # Errors
/// Returns [`Error::InvalidName`] when the identifier is empty, has
/// surrounding whitespace, starts with `-`, or contains `/` or `\`.
pub fn validate_identifier(identifier: &str) -> Result<(), Error> {
    let reason = if identifier.is_empty() {
        Some("name cannot be empty".to_string())
    } else if identifier.trim() != identifier {
        Some("name cannot start or end with whitespace".to_string())
    } else if identifier.starts_with('-') {
        Some("name cannot start with '-'".to_string())
    } else {
        identifier
            .chars()
            .find(|c| matches!(c, '/' | '\\'))
            .map(|c| format!("name cannot contain path separator '{c}'"))
    };

    reason.map_or(Ok(()), |reason| {
        Err(Error::InvalidName {
            name: identifier.to_string(),
            reason,
        })
    })
}

/// The first rule `name` breaks, if any.
fn violation(name: &str) -> Option<String> {
    if name.is_empty() {
        return Some("branch name cannot be empty".into());
    }
    if name == "@" {
        return Some("branch name cannot be '@'".into());
    }
    if name.starts_with(['.', '/', '-']) {
        return Some(format!("branch name cannot start with '{}'", &name[..1]));
    }
    if name.ends_with(['.', '/']) {
        return Some(format!("branch name cannot end with '{}'", &name[name.len() - 1..]));
    }
    // Git compares the suffix case-sensitively.
    #[allow(clippy::case_sensitive_file_extension_comparisons)]
    if name.ends_with(".lock") {
        return Some("branch name cannot end with '.lock'".into());
    }

    if let Some(c) = name.chars().find(char::is_ascii_control) {
        return Some(format!("branch name cannot contain control character {c:?}"));
    }
    if let Some(c) = name.chars().find(|c| GIT_FORBIDDEN.contains(c)) {
        return Some(format!("branch name cannot contain '{c}'"));
    }
    if let Some(c) = name.chars().find(|c| SHELL_META.contains(c)) {
        return Some(format!("branch name cannot contain shell metacharacter '{c}'"));
    }
    FORBIDDEN_SEQUENCES
        .iter()
        .find(|seq| name.contains(**seq))
        .map(|seq| format!("branch name cannot contain '{seq}'"))
}
