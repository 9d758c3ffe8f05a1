//! Terminal output for the CLI.
//!
//! Colored scores, issue and rule tables, and a spinner shown while a check
//! runs in the background.

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use owo_colors::OwoColorize;
use is_terminal::IsTerminal;
use std::time::Duration;

use crate::models::{
    IntegrityCheck, IntegrityReport, QuickScore, RiskLevel, RuleCategory, Severity,
    ValidationIssue, ValidationResult,
};
use crate::rules::RuleInfo;

/// Get the current terminal width.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(100)
}

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
}

/// Status icons for different outcomes.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
    }
}

/// Print a styled status message.
pub fn print_status(status: Status, msg: &str) {
    let icon = status_icon(status);
    match status {
        Status::Success => println!("{} {}", icon.green().bold(), msg),
        Status::Error => println!("{} {}", icon.red().bold(), msg),
        Status::Warning => println!("{} {}", icon.yellow().bold(), msg),
        Status::Info => println!("{} {}", icon.cyan().bold(), msg),
    }
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

pub fn print_divider() {
    println!("{}", "─".repeat(terminal_width().min(80)).dimmed());
}

/// Truncate text to fit within the specified width using unicode-aware truncation.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width <= 3 {
        return "...".to_string();
    }

    let widths: Vec<(char, usize)> = text
        .chars()
        .map(|c| (c, unicode_width::UnicodeWidthChar::width(c).unwrap_or(1)))
        .collect();

    if widths.iter().map(|(_, w)| *w).sum::<usize>() <= max_width {
        return text.to_string();
    }

    let mut used = 0;
    let mut truncated = String::new();
    for (c, w) in widths {
        if used + w > max_width - 3 {
            break;
        }
        used += w;
        truncated.push(c);
    }
    format!("{}...", truncated)
}

/// Score colored by band: green from 80, yellow from 60, red below
pub fn colored_score(score: f64) -> String {
    let text = format!("{:.1}", score);
    if score >= 80.0 {
        text.green().bold().to_string()
    } else if score >= 60.0 {
        text.yellow().bold().to_string()
    } else {
        text.red().bold().to_string()
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Critical => Color::Red,
        Severity::Major => Color::DarkYellow,
        Severity::Minor => Color::Yellow,
        Severity::Warning => Color::Grey,
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(terminal_width() as u16);
    table
}

/// Table of issues, one row each
pub fn issues_table<'a>(issues: impl IntoIterator<Item = &'a ValidationIssue>) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Id", "Severity", "Code", "Description", "Fix"]);

    for issue in issues {
        table.add_row(vec![
            Cell::new(&issue.id),
            Cell::new(issue.severity.id())
                .fg(severity_color(issue.severity))
                .add_attribute(Attribute::Bold),
            Cell::new(issue.code.id()),
            Cell::new(truncate_with_ellipsis(&issue.description, 90)),
            Cell::new(
                issue
                    .suggested_fix
                    .as_deref()
                    .map(|f| truncate_with_ellipsis(f, 50))
                    .unwrap_or_default(),
            ),
        ]);
    }
    table
}

/// Table of rules with weight and state
pub fn rules_table(rules: &[RuleInfo]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Id", "Name", "Category", "Severity", "Weight", "Enabled", "Algorithm"]);

    for rule in rules {
        let enabled = if rule.enabled {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(&rule.id).add_attribute(Attribute::Bold),
            Cell::new(&rule.name),
            Cell::new(rule.category.id()),
            Cell::new(rule.severity.id()),
            Cell::new(format!("{:.2}", rule.weight)),
            enabled,
            Cell::new(&rule.algorithm),
        ]);
    }
    table
}

fn print_scores(report: &IntegrityReport) {
    let mut table = new_table();
    table.set_header(vec!["Category", "Score"]);
    for category in RuleCategory::ALL {
        table.add_row(vec![
            Cell::new(category.id()),
            Cell::new(format!("{:.1}", report.category_scores.get(category))),
        ]);
    }
    println!("{table}");
}

/// Print a finished check
pub fn print_check(check: &IntegrityCheck) {
    print_section(&format!("Integrity check {}", check.id));
    println!("Document: {}", check.document_id.bold());
    println!("Status:   {}", check.status);

    if let Some(report) = &check.report {
        println!("Overall:  {}", colored_score(report.overall_score));
        println!("Fabrication risk: {:?}", report.fabrication_risk);
        print_scores(report);

        if report.total_issues > 0 {
            print_section(&format!(
                "Issues ({} critical, {} major, {} minor, {} warning)",
                report.critical_issues, report.major_issues, report.minor_issues, report.warning_issues
            ));
            println!("{}", issues_table(report.issues()));
        }

        print_section("Recommendations");
        for rec in &report.recommendations {
            println!("  • {}", rec);
        }
        println!();

        if report.passed {
            print_status(Status::Success, "Document passed");
        } else {
            print_status(Status::Error, "Document did not pass");
        }
    }

    for issue in &check.issues {
        print_status(Status::Error, &issue.description);
    }
}

/// Print a single rule's result
pub fn print_result(result: &ValidationResult) {
    print_section(&format!("Rule {}", result.rule_id));
    println!(
        "Score: {}  Confidence: {:.0}",
        colored_score(result.score),
        result.confidence
    );
    if let Some(risk) = result.fabrication_risk {
        println!("Fabrication risk: {:?}", risk);
    }
    if result.metadata.inconclusive_lookups > 0 {
        print_status(
            Status::Warning,
            &format!("{} external lookups were inconclusive", result.metadata.inconclusive_lookups),
        );
    }

    if result.issues.is_empty() {
        print_status(Status::Success, "No issues found");
    } else {
        println!("{}", issues_table(&result.issues));
    }
    for suggestion in &result.suggestions {
        println!("  • {}", suggestion);
    }
}

/// Print a quick score
pub fn print_quick_score(quick: &QuickScore) {
    let risk = match quick.risk_level {
        RiskLevel::Low => "low".green().to_string(),
        RiskLevel::Medium => "medium".yellow().to_string(),
        RiskLevel::High => "high".red().to_string(),
    };
    println!("Quick score: {}  Risk: {}", colored_score(quick.score), risk);
    for issue in &quick.quick_issues {
        print_status(Status::Warning, issue);
    }
}

/// Spinner shown while waiting on a check.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// Set the message.
    pub fn set_message(&self, msg: &str) {
        self.pb.set_message(msg.to_string());
    }

    /// Finish with success message.
    pub fn finish_with_success(&self, msg: &str) {
        self.pb.finish_with_message(format!("{} {}", "✓".green(), msg));
    }

    /// Finish with error message.
    pub fn finish_with_error(&self, msg: &str) {
        self.pb.finish_with_message(format!("{} {}", "✗".red(), msg));
    }
}
