use colored::Colorize;
use convergence::{Outcome, Status, StatusLevel};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

// ============================================================================
// Status Display
// ============================================================================

/// Symbol for a status level
pub fn level_symbol(level: StatusLevel) -> colored::ColoredString {
    match level {
        StatusLevel::NoChange => "○".dimmed(),
        StatusLevel::WillChange => "~".yellow(),
        StatusLevel::CantChange => "⚠".yellow(),
        StatusLevel::Fatal => "✗".red(),
    }
}

/// Symbol for a batch outcome
pub fn outcome_symbol(outcome: &Outcome) -> colored::ColoredString {
    match outcome {
        Outcome::NoChange => "○".dimmed(),
        Outcome::Changed => "✓".green(),
        Outcome::Skipped { .. } => "⊘".yellow(),
        Outcome::Failed { .. } => "✗".red(),
    }
}

/// Print one resource's status: a headline, then changed attributes and messages
pub fn status(name: &str, status: &Status, verbose: bool) {
    println!("{} {} {}", level_symbol(status.level), name.bold(), status.level.label().dimmed());

    for (key, diff) in status.changes() {
        println!(
            "    {} {}: {} => {}",
            "~".yellow(),
            key,
            diff.from.red(),
            diff.to.green()
        );
    }
    if verbose {
        for (key, diff) in status.differences.iter().filter(|(_, d)| !d.has_changes()) {
            dim(&format!("  {key}: {}", diff.to));
        }
    }
    for message in &status.messages {
        dim(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols_cover_levels() {
        colored::control::set_override(false);
        assert_eq!(level_symbol(StatusLevel::NoChange).to_string(), "○");
        assert_eq!(level_symbol(StatusLevel::Fatal).to_string(), "✗");
        assert_eq!(
            outcome_symbol(&Outcome::Skipped {
                reason: "Dry run".into()
            })
            .to_string(),
            "⊘"
        );
    }
}
