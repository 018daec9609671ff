//! Trait abstractions for the collaborators the engine consumes.
//!
//! This module defines the `Prompter` and `ConfigReader` traits, which
//! abstract user interaction and settings lookup, enabling dependency
//! injection and testability.

use crate::recovery::Remediation;

/// Trait for asking the user for input.
///
/// This trait abstracts user interaction, allowing for:
/// - Interactive terminal prompts in the CLI
/// - Scripted answers in tests
/// - Non-interactive modes that decline every question
pub trait Prompter {
    /// Ask for a free-text value, `None` when the user cancels.
    fn input_text(&self, placeholder: &str, prompt: &str) -> Option<String>;

    /// Present a recoverable failure and its remediations.
    ///
    /// `options` are in preference order; the first is the default.
    /// Returns `None` when the user declines all of them.
    fn choose_remediation(&self, message: &str, options: &[Remediation]) -> Option<Remediation>;

    /// Ask a yes/no question.
    fn confirm(&self, message: &str, default: bool) -> bool;
}

/// Trait for reading user settings by dotted key (e.g. `git.path`).
pub trait ConfigReader {
    /// Look up a setting, `None` when unset.
    fn get(&self, key: &str) -> Option<String>;
}
