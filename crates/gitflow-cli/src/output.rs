//! Terminal output formatting utilities.

use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use gitflow_core::{OperationStep, Plan, Report};

static QUIET_MODE: AtomicBool = AtomicBool::new(false);

/// Set quiet mode globally. Call once at startup.
pub fn set_quiet(quiet: bool) {
    QUIET_MODE.store(quiet, Ordering::Relaxed);
}

fn is_quiet() -> bool {
    QUIET_MODE.load(Ordering::Relaxed)
}

/// Print a success message (suppressed in quiet mode).
pub fn success(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "✓".green(), msg);
    }
}

/// Print an error message (always prints to stderr).
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a warning message (always prints to stderr).
pub fn warn(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print an info message (suppressed in quiet mode).
pub fn info(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "→".blue(), msg);
    }
}

/// Print a detail line without prefix (suppressed in quiet mode).
///
/// Use for indented detail lines that accompany info or warn messages.
pub fn detail(msg: &str) {
    if !is_quiet() {
        println!("{msg}");
    }
}

/// One numbered plan line, e.g. `  2. merge 'release/1.2' into 'master'`.
#[must_use]
pub fn step_line(index: usize, step: &OperationStep) -> String {
    let number = format!("{:>3}.", index + 1);
    if step.is_mutation() {
        format!("{} {}", number.dimmed(), step.description)
    } else {
        format!("{} {}", number.dimmed(), step.description.dimmed())
    }
}

/// Print the steps of a plan (suppressed in quiet mode).
pub fn plan(plan: &Plan) {
    if plan.is_noop() {
        info(&format!("{}: nothing to do", plan.action));
    } else {
        info(&format!("{} would run:", plan.action));
        for (i, step) in plan.steps.iter().enumerate() {
            detail(&step_line(i, step));
        }
    }
    if let Some(question) = &plan.confirmation {
        detail(&format!("    {} {question}", "?".yellow()));
    }
    for note in &plan.notes {
        detail(&format!("    {note}"));
    }
}

/// Print the steps that already ran (to stderr, since it accompanies errors).
pub fn completed_steps(completed: &[String]) {
    if completed.is_empty() {
        eprintln!("  No changes were made.");
        return;
    }
    eprintln!("  These steps completed before the failure:");
    for step in completed {
        eprintln!("    {} {step}", "✓".green());
    }
}

/// Print what an action did (suppressed in quiet mode).
pub fn report(report: &Report) {
    for step in &report.completed {
        detail(&format!("  {} {step}", "·".dimmed()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_line_numbers_from_one() {
        colored::control::set_override(false);
        let line = step_line(1, &OperationStep::checkout("develop"));
        assert_eq!(line, "  2. checkout 'develop'");
    }

    #[test]
    fn test_step_line_keeps_description() {
        let line = step_line(9, &OperationStep::merge("release/1.2", "master"));
        assert!(line.contains("10."));
        assert!(line.contains("merge 'release/1.2' into 'master'"));
    }

    #[test]
    fn test_quiet_mode_default() {
        // Reset to default state
        set_quiet(false);
        assert!(!is_quiet());
    }

    #[test]
    fn test_quiet_mode_enabled() {
        set_quiet(true);
        assert!(is_quiet());
        // Reset
        set_quiet(false);
    }
}
