//! Terminal prompts for the workflow engine.

use std::fmt;

use colored::Colorize;
use gitflow_core::{Prompter, Remediation};
use inquire::{Confirm, Select, Text};

use crate::output;

/// How questions get answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Ask on the terminal.
    Interactive,
    /// `--yes`: accept confirmations, stop at conflicts.
    AssumeYes,
    /// No terminal: decline everything.
    Declining,
}

impl Mode {
    /// Pick a mode from `--yes` and whether a user is at the terminal.
    #[must_use]
    pub const fn detect(yes: bool, attended: bool) -> Self {
        if yes {
            Self::AssumeYes
        } else if attended {
            Self::Interactive
        } else {
            Self::Declining
        }
    }
}

/// [`Prompter`] backed by `inquire`.
#[derive(Debug, Clone, Copy)]
pub struct InquirePrompter {
    mode: Mode,
}

impl InquirePrompter {
    pub const fn new(mode: Mode) -> Self {
        Self { mode }
    }

    /// Detect the mode from the environment.
    pub fn from_env(yes: bool) -> Self {
        Self::new(Mode::detect(yes, console::user_attended_stderr()))
    }

    pub const fn is_interactive(&self) -> bool {
        matches!(self.mode, Mode::Interactive)
    }
}

enum Choice {
    Apply(Remediation),
    Stop,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apply(remediation) => fmt::Display::fmt(remediation, f),
            Self::Stop => f.write_str("Stop here and leave the repository as it is"),
        }
    }
}

impl Prompter for InquirePrompter {
    fn input_text(&self, placeholder: &str, prompt: &str) -> Option<String> {
        if self.mode != Mode::Interactive {
            return Some(placeholder.to_string());
        }

        match Text::new(prompt).with_default(placeholder).prompt() {
            Ok(value) => Some(value.trim().to_string()),
            Err(e) => {
                tracing::debug!(error = %e, "input cancelled");
                None
            }
        }
    }

    fn choose_remediation(&self, message: &str, options: &[Remediation]) -> Option<Remediation> {
        output::warn(message);

        if self.mode != Mode::Interactive {
            output::detail(&format!(
                "  {}",
                "Not running interactively; stopping here.".dimmed()
            ));
            return None;
        }

        let mut choices: Vec<Choice> = options.iter().copied().map(Choice::Apply).collect();
        choices.push(Choice::Stop);

        match Select::new("How do you want to continue?", choices).prompt() {
            Ok(Choice::Apply(remediation)) => Some(remediation),
            Ok(Choice::Stop) => None,
            Err(e) => {
                tracing::debug!(error = %e, "selection cancelled");
                None
            }
        }
    }

    fn confirm(&self, message: &str, default: bool) -> bool {
        match self.mode {
            Mode::AssumeYes => true,
            Mode::Declining => {
                output::warn(message);
                output::detail("  Not running interactively; pass --yes to proceed.");
                false
            }
            Mode::Interactive => Confirm::new(message)
                .with_default(default)
                .prompt()
                .unwrap_or_else(|e| {
                    tracing::debug!(error = %e, "confirmation cancelled");
                    false
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitflow_core::RemediationKind;

    #[test]
    fn test_mode_detection() {
        assert_eq!(Mode::detect(true, false), Mode::AssumeYes);
        assert_eq!(Mode::detect(true, true), Mode::AssumeYes);
        assert_eq!(Mode::detect(false, true), Mode::Interactive);
        assert_eq!(Mode::detect(false, false), Mode::Declining);
    }

    #[test]
    fn test_assume_yes_confirms_but_stops_at_conflicts() {
        let prompter = InquirePrompter::new(Mode::AssumeYes);
        let options = [Remediation {
            kind: RemediationKind::ContinueMerge,
            step: 3,
        }];

        assert!(prompter.confirm("Rebase anyway?", false));
        assert_eq!(prompter.choose_remediation("Conflicts", &options), None);
    }

    #[test]
    fn test_declining_mode() {
        let prompter = InquirePrompter::new(Mode::Declining);
        assert!(!prompter.confirm("Rebase anyway?", true));
        assert_eq!(
            prompter.input_text("develop", "Branch for next release").as_deref(),
            Some("develop")
        );
    }

    #[test]
    fn test_choice_labels() {
        let choice = Choice::Apply(Remediation {
            kind: RemediationKind::AbortRebase,
            step: 1,
        });
        assert_eq!(choice.to_string(), "Abort the rebase");
        assert!(Choice::Stop.to_string().starts_with("Stop"));
    }
}
