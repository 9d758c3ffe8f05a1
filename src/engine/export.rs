//! Rendering checks as JSON, HTML or a PDF placeholder.

use serde::Serialize;
use std::fmt::Write as _;
use std::str::FromStr;

use super::IntegrityError;
use crate::governor::sanitize_text;
use crate::models::{IntegrityCheck, RuleCategory};

/// Output format of an exported report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Html,
    Pdf,
}

impl ReportFormat {
    pub fn id(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Html => "html",
            ReportFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Json => "application/json",
            ReportFormat::Html => "text/html; charset=utf-8",
            ReportFormat::Pdf => "text/plain; charset=utf-8",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = IntegrityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "html" => Ok(ReportFormat::Html),
            "pdf" => Ok(ReportFormat::Pdf),
            other => Err(IntegrityError::Export(format!(
                "unknown report format '{}' (expected json, html or pdf)",
                other
            ))),
        }
    }
}

/// A rendered report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedReport {
    pub check_id: String,
    pub format: ReportFormat,
    pub content_type: String,
    pub content: String,
}

/// Render a check in `format`
pub fn export_check(check: &IntegrityCheck, format: ReportFormat) -> Result<ExportedReport, IntegrityError> {
    let content = match format {
        ReportFormat::Json => {
            serde_json::to_string_pretty(check).map_err(|e| IntegrityError::Export(e.to_string()))?
        }
        ReportFormat::Html => render_html(check),
        ReportFormat::Pdf => format!(
            "PDF rendering is delegated to an external renderer; plain-text report follows.\n\n{}",
            render_text(check)
        ),
    };

    Ok(ExportedReport {
        check_id: check.id.clone(),
        format,
        content_type: format.content_type().to_string(),
        content,
    })
}

fn esc(s: &str) -> String {
    sanitize_text(s, true)
}

/// Self-contained HTML page of scores and issues
pub fn render_html(check: &IntegrityCheck) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Integrity report {}</title>\n\
         <style>body{{font-family:sans-serif;margin:2em}}table{{border-collapse:collapse}}\
         td,th{{border:1px solid #ccc;padding:4px 8px;text-align:left}}\
         .critical{{color:#b00}}.major{{color:#c60}}</style>\n</head>\n<body>\n",
        esc(&check.id)
    );
    let _ = writeln!(html, "<h1>Integrity report</h1>");
    let _ = writeln!(
        html,
        "<p>Document <strong>{}</strong>, check {} ({})</p>",
        esc(&check.document_id),
        esc(&check.id),
        check.status
    );

    if let Some(report) = &check.report {
        let _ = writeln!(
            html,
            "<p>Overall score <strong>{:.1}</strong>: {}</p>",
            report.overall_score,
            if report.passed { "passed" } else { "not passed" }
        );

        html.push_str("<h2>Scores</h2>\n<table>\n<tr><th>Category</th><th>Score</th></tr>\n");
        for category in RuleCategory::ALL {
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{:.1}</td></tr>",
                category,
                report.category_scores.get(category)
            );
        }
        html.push_str("</table>\n");

        html.push_str("<h2>Issues</h2>\n");
        if report.total_issues == 0 {
            html.push_str("<p>No issues found.</p>\n");
        } else {
            html.push_str(
                "<table>\n<tr><th>Id</th><th>Severity</th><th>Code</th><th>Description</th><th>Suggested fix</th></tr>\n",
            );
            for issue in report.issues() {
                let severity = issue.severity.id();
                let _ = writeln!(
                    html,
                    "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    severity,
                    esc(&issue.id),
                    severity,
                    issue.code.id(),
                    esc(&issue.description),
                    esc(issue.suggested_fix.as_deref().unwrap_or(""))
                );
            }
            html.push_str("</table>\n");
        }

        html.push_str("<h2>Recommendations</h2>\n<ul>\n");
        for rec in &report.recommendations {
            let _ = writeln!(html, "<li>{}</li>", esc(rec));
        }
        html.push_str("</ul>\n");
    }

    for issue in &check.issues {
        let _ = writeln!(html, "<p class=\"critical\">{}</p>", esc(&issue.description));
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Plain-text summary of a check
pub fn render_text(check: &IntegrityCheck) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Integrity report for {} (check {})", check.document_id, check.id);
    let _ = writeln!(out, "Status: {}", check.status);

    if let Some(report) = &check.report {
        let _ = writeln!(
            out,
            "Overall score: {:.1} ({})",
            report.overall_score,
            if report.passed { "passed" } else { "not passed" }
        );
        for category in RuleCategory::ALL {
            let _ = writeln!(out, "  {:<12} {:>6.1}", category, report.category_scores.get(category));
        }
        let _ = writeln!(
            out,
            "Issues: {} ({} critical, {} major, {} minor, {} warning)",
            report.total_issues,
            report.critical_issues,
            report.major_issues,
            report.minor_issues,
            report.warning_issues
        );
        for issue in report.issues() {
            let _ = writeln!(out, "  [{}] {}: {}", issue.severity, issue.id, issue.description);
        }
        let _ = writeln!(out, "Recommendations:");
        for rec in &report.recommendations {
            let _ = writeln!(out, "  - {}", rec);
        }
    }

    for issue in &check.issues {
        let _ = writeln!(out, "Failure: {}", issue.description);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::aggregator::{ReportAggregator, WeightedResult};
    use crate::models::{
        CheckStatus, CheckType, IssueCode, IssueType, Severity, ValidationContext, ValidationIssue,
        ValidationResult,
    };

    fn completed_check() -> IntegrityCheck {
        let issue = ValidationIssue::new(
            IssueType::CitationError,
            IssueCode::CitationMissing,
            Severity::Major,
            "Reference <script>alert(1)</script> lacks authors",
        );
        let result = ValidationResult::new("citations", RuleCategory::Citation, 85.0, 100.0, vec![issue]);
        let report = ReportAggregator::default().aggregate(
            vec![WeightedResult { result, weight: 1.0 }],
            &ValidationContext::default(),
            5,
        );

        let mut check = IntegrityCheck::new("c1", "doc & co", CheckType::Full);
        check.status = CheckStatus::Completed;
        check.report = Some(report);
        check
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert_eq!("pdf".parse::<ReportFormat>().unwrap(), ReportFormat::Pdf);
        assert!(matches!("docx".parse::<ReportFormat>(), Err(IntegrityError::Export(_))));
    }

    #[test]
    fn test_json_export_round_trips() {
        let exported = export_check(&completed_check(), ReportFormat::Json).unwrap();
        let parsed: IntegrityCheck = serde_json::from_str(&exported.content).unwrap();
        assert_eq!(parsed.id, "c1");
        assert_eq!(exported.content_type, "application/json");
    }

    #[test]
    fn test_html_export_escapes() {
        let exported = export_check(&completed_check(), ReportFormat::Html).unwrap();
        let html = &exported.content;

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("doc &amp; co"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("citation_missing"));
    }

    #[test]
    fn test_pdf_stub_contains_text_report() {
        let exported = export_check(&completed_check(), ReportFormat::Pdf).unwrap();
        assert!(exported.content.starts_with("PDF rendering is delegated"));
        assert!(exported.content.contains("Overall score: 85.0"));
    }
}
