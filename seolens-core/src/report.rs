// Report rendering for a finished audit

use crate::audit::AuditResult;
use crate::export::{IssueRow, issue_rows, overall_priority, team_exports};
use crate::model::Severity;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const DIVIDER: &str =
    "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";
const THIN_DIVIDER: &str =
    "────────────────────────────────────────────────────────────────────────────────\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            _ => None,
        }
    }
}

/// Letter grade and status label for a health score.
pub fn grade(score: f64) -> (&'static str, &'static str) {
    if score >= 90.0 {
        ("A+", "EXCELLENT")
    } else if score >= 80.0 {
        ("A", "GOOD")
    } else if score >= 70.0 {
        ("B", "FAIR")
    } else if score >= 60.0 {
        ("C", "POOR")
    } else {
        ("D", "CRITICAL")
    }
}

pub fn render(result: &AuditResult, format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(result)),
        ReportFormat::Json => generate_json_report(result),
        ReportFormat::Csv => Ok(generate_csv_report(result)),
    }
}

fn section(report: &mut String, title: &str) {
    report.push_str(DIVIDER);
    report.push_str(title);
    report.push('\n');
    report.push_str(DIVIDER);
    report.push('\n');
}

pub fn generate_text_report(result: &AuditResult) -> String {
    let summary = &result.summary;
    let insights = &summary.strategic_insights;
    let mut report = String::new();

    // Header
    report.push_str(DIVIDER);
    report.push_str("                       SEOLENS STRATEGIC SEO AUDIT REPORT\n");
    report.push_str(DIVIDER);
    report.push('\n');

    report.push_str(&format!("Site:         {}\n", result.site));
    report.push_str(&format!(
        "Audit Date:   {}\n",
        result.audit_timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    report.push_str(&format!("URLs Audited: {}\n", result.urls_audited));
    report.push_str(&format!("Pages Crawled: {}\n\n", summary.pages_crawled));

    let (letter, status) = grade(summary.seo_score);
    section(&mut report, "SEO HEALTH");
    report.push_str(&format!(
        "Overall SEO Health: {:.1}/100 (Grade: {})\n",
        summary.seo_score, letter
    ));
    report.push_str(&format!("Status:             {}\n", status));
    report.push_str(&format!(
        "Ticket Priority:    {}\n\n",
        overall_priority(summary)
    ));

    section(&mut report, "ISSUE BREAKDOWN");
    report.push_str(&format!("Total Issues: {}\n\n", summary.total_issues));
    for severity in Severity::ALL {
        let count = summary.count(severity);
        if count > 0 {
            let label = format!("[{}]", severity.as_str().to_uppercase());
            report.push_str(&format!("  {:<10} {}\n", label, count));
        }
    }
    if !summary.issue_categories.is_empty() {
        report.push_str("\nBy Category:\n");
        for (category, count) in &summary.issue_categories {
            report.push_str(&format!("  {:<16} {}\n", category.as_str(), count));
        }
    }
    report.push('\n');

    section(&mut report, "PERFORMANCE");
    report.push_str(&format!(
        "Average Response Time: {:.2}s\n",
        summary.avg_response_time
    ));
    report.push_str(&format!("Pages with Errors:     {}\n\n", summary.error_pages));

    section(&mut report, "STRATEGIC INSIGHTS");
    report.push_str(&format!(
        "High-Priority Pages with Issues: {}\n",
        insights.high_priority_pages_with_issues
    ));
    if !insights.critical_business_impact.is_empty() {
        report.push_str("\nCritical Business Impact Pages:\n");
        for page in &insights.critical_business_impact {
            report.push_str(&format!(
                "  {} ({}, weight {:.1}): {} critical issues\n",
                page.url, page.page_type, page.business_importance, page.critical_issues
            ));
        }
    }
    if !insights.page_type_breakdown.is_empty() {
        let mut breakdown: Vec<_> = insights.page_type_breakdown.iter().collect();
        breakdown.sort_by(|a, b| b.1.issues.cmp(&a.1.issues));

        report.push_str("\nIssues by Page Type:\n");
        for (page_type, stats) in breakdown {
            report.push_str(&format!(
                "  {:<10} {} issues across {} pages\n",
                page_type.as_str(),
                stats.issues,
                stats.pages
            ));
        }
    }
    report.push('\n');

    let teams: Vec<_> = summary
        .teams_by_priority()
        .into_iter()
        .filter(|(_, bucket)| bucket.total_issues > 0)
        .collect();

    if !teams.is_empty() {
        section(&mut report, "TEAM ASSIGNMENTS");

        for (_, bucket) in teams {
            report.push_str(&format!("{}\n", bucket.name));
            report.push_str(&format!("{}\n", bucket.description));
            report.push_str(&format!(
                "Issues: {} total | Critical: {} | High: {}\n",
                bucket.total_issues, bucket.critical_issues, bucket.high_issues
            ));
            report.push_str(&format!(
                "Priority Score: {} | Avg Impact: {:.1}\n\n",
                bucket.priority_score, bucket.avg_impact
            ));

            let mut issues: Vec<_> = bucket.issues.iter().collect();
            issues.sort_by(|a, b| b.impact_score.cmp(&a.impact_score));

            for (idx, issue) in issues.iter().enumerate() {
                report.push_str(&format!(
                    "[{}] {} ({}, {})\n",
                    idx + 1,
                    issue.issue_type,
                    issue.severity,
                    issue.status.as_str()
                ));
                report.push_str(&format!("URL:          {}\n", issue.url));
                report.push_str(&format!("Impact Score: {}\n", issue.impact_score));
                report.push_str("Issue:\n");
                report.push_str(&wrap_text(&issue.description, 80, "  "));
                report.push_str("Fix:\n");
                report.push_str(&wrap_text(&issue.recommendation, 80, "  "));
                report.push('\n');
            }

            report.push_str(THIN_DIVIDER);
            report.push('\n');
        }
    }

    if !result.fixed.is_empty() {
        section(&mut report, "FIXED SINCE LAST AUDIT");
        for key in &result.fixed {
            report.push_str(&format!("  ✓ {} - {}\n", key.issue_type, key.url));
        }
        report.push('\n');
    }

    // Footer
    report.push_str(DIVIDER);
    report.push_str("                                 End of Report\n");
    report.push_str(DIVIDER);
    report.push_str("\nGenerated by SeoLens\n\n");

    report
}

pub fn generate_json_report(result: &AuditResult) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "SeoLens",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "audit": {
                "site": result.site,
                "audit_timestamp": result.audit_timestamp.to_rfc3339(),
                "urls_audited": result.urls_audited,
                "ticket_priority": overall_priority(&result.summary),
            },
            "summary": result.summary,
            "issues": result.issues,
            "fixed": result.fixed,
            "team_exports": team_exports(&result.summary),
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_csv_report(result: &AuditResult) -> String {
    let mut csv = String::new();
    csv.push_str(&IssueRow::CSV_HEADER.join(","));
    csv.push('\n');

    for row in issue_rows(result) {
        let fields: Vec<String> = row.csv_fields().iter().map(|f| csv_field(f)).collect();
        csv.push_str(&fields.join(","));
        csv.push('\n');
    }

    csv
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn wrap_text(text: &str, width: usize, indent: &str) -> String {
    let mut result = String::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.len() + word.len() + 1 > width - indent.len() && !current_line.is_empty() {
            result.push_str(indent);
            result.push_str(&current_line);
            result.push('\n');
            current_line.clear();
        }

        if !current_line.is_empty() {
            current_line.push(' ');
        }
        current_line.push_str(word);
    }

    if !current_line.is_empty() {
        result.push_str(indent);
        result.push_str(&current_line);
        result.push('\n');
    }

    result
}
