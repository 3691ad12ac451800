// Tests for report generation functionality

use chrono::{TimeZone, Utc};
use seolens_core::export::{IssueRow, issue_rows};
use seolens_core::report::{self, ReportFormat};
use seolens_core::{AuditInput, AuditResult, Auditor, IssueKey, IssueType, ScoringConfig};
use seolens_scanner::CrawlRecord;
use tempfile::TempDir;

fn sample_result() -> AuditResult {
    let mut home = CrawlRecord::new("https://acme.example/".to_string());
    home.status_code = 500;
    home.response_time = 1.25;
    home.title = "Acme Photo Gifts and Canvas Prints".to_string();
    home.h1_tags = vec!["Gifts, prints and \"more\"".to_string()];
    home.canonical_url = Some("https://acme.example/".to_string());
    home.internal_links = 8;

    let mut blog = CrawlRecord::new("https://acme.example/blog/tips".to_string());
    blog.status_code = 200;
    blog.response_time = 0.75;
    blog.title = "Welcome, friends of Acme Photo Gifts".to_string();
    blog.meta_description = "x".repeat(130);
    blog.h1_tags = vec!["y".repeat(100)];
    blog.canonical_url = Some("https://acme.example/blog/tips".to_string());
    blog.internal_links = 8;

    let auditor = Auditor::new(ScoringConfig::default()).unwrap();
    let mut result = auditor.run(
        &AuditInput::from_crawl("acme", vec![home, blog]),
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
    );
    result.fixed = vec![IssueKey::new(
        "https://acme.example/checkout",
        IssueType::HttpError,
    )];
    result
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert_eq!(ReportFormat::from_str("text"), Some(ReportFormat::Text));
    assert_eq!(ReportFormat::from_str("TXT"), Some(ReportFormat::Text));
    assert_eq!(ReportFormat::from_str("json"), Some(ReportFormat::Json));
    assert_eq!(ReportFormat::from_str("csv"), Some(ReportFormat::Csv));
    assert_eq!(ReportFormat::from_str("html"), None);
}

// ============================================================================
// Text Report Tests
// ============================================================================

#[test]
fn test_text_report_sections() {
    let result = sample_result();
    let text = report::generate_text_report(&result);

    assert!(text.contains("SEOLENS STRATEGIC SEO AUDIT REPORT"));
    assert!(text.contains("Site:         acme"));
    assert!(text.contains("Audit Date:   2024-05-01 09:00:00 UTC"));
    assert!(text.contains("SEO HEALTH"));
    assert!(text.contains("ISSUE BREAKDOWN"));
    assert!(text.contains("[CRITICAL]"));
    assert!(text.contains("Average Response Time: 1.00s"));
    assert!(text.contains("Pages with Errors:     1"));
    assert!(text.contains("STRATEGIC INSIGHTS"));
    assert!(text.contains("Critical Business Impact Pages:"));
    assert!(text.contains("TEAM ASSIGNMENTS"));
    assert!(text.contains("TECH/DEV TEAM"));
    assert!(text.contains("MARKETING TEAM"));
    assert!(text.contains("FIXED SINCE LAST AUDIT"));
    assert!(text.contains("✓ HTTP Error - https://acme.example/checkout"));
    assert!(text.contains("Generated by SeoLens"));
}

#[test]
fn test_text_report_orders_teams_by_priority() {
    let text = report::generate_text_report(&sample_result());
    let tech = text.find("TECH/DEV TEAM").unwrap();
    let marketing = text.find("MARKETING TEAM").unwrap();

    // Two high issues outrank a single critical one
    assert!(marketing < tech);
    assert!(text.contains("Priority Score: 13"));
    assert!(text.contains("Priority Score: 11"));
    assert!(!text.contains("DESIGN/UX TEAM"));
}

#[test]
fn test_text_report_without_issues() {
    let auditor = Auditor::new(ScoringConfig::default()).unwrap();
    let result = auditor.run(
        &AuditInput::new("acme", Vec::new()),
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
    );

    let text = report::generate_text_report(&result);
    assert!(text.contains("Overall SEO Health: 100.0/100 (Grade: A+)"));
    assert!(!text.contains("TEAM ASSIGNMENTS"));
    assert!(!text.contains("FIXED SINCE LAST AUDIT"));
}

// ============================================================================
// JSON Report Tests
// ============================================================================

#[test]
fn test_json_report_structure() {
    let result = sample_result();
    let json = report::generate_json_report(&result).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let root = &value["report"];
    assert_eq!(root["metadata"]["generator"], "SeoLens");
    assert_eq!(root["metadata"]["format"], "json");
    assert_eq!(root["audit"]["site"], "acme");
    assert_eq!(root["audit"]["urls_audited"], 2);
    assert_eq!(root["audit"]["ticket_priority"], "High");

    assert_eq!(
        root["issues"].as_array().unwrap().len(),
        result.issues.len()
    );
    assert_eq!(root["issues"][0]["issue_type"], "HTTP Error");
    assert_eq!(root["issues"][0]["severity"], "Critical");
    assert_eq!(root["issues"][0]["status"], "New");
    assert_eq!(root["summary"]["total_issues"], result.summary.total_issues);
    assert_eq!(root["fixed"][0]["issue_type"], "HTTP Error");

    let exports = root["team_exports"].as_object().unwrap();
    assert!(exports.contains_key("tech_team"));
    assert!(exports.contains_key("marketing_team"));
    assert!(!exports.contains_key("design_team"));
    assert_eq!(exports["tech_team"]["ticket_priority"], "Highest");
    let ticket = &exports["tech_team"]["detailed_issues"][0];
    assert_eq!(ticket["issue_type"], "HTTP Error");
    assert_eq!(ticket["ticket_priority"], "Highest");
}

// ============================================================================
// CSV Report Tests
// ============================================================================

#[test]
fn test_csv_report() {
    let result = sample_result();
    let csv = report::generate_csv_report(&result);
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], IssueRow::CSV_HEADER.join(","));
    assert_eq!(lines.len(), result.issues.len() + 1);
    assert!(lines[1].starts_with("2024-05-01T09:00:00+00:00,acme,https://acme.example/,HTTP Error,Critical,Crawlability,"));
    assert!(lines[1].ends_with(",New,2024-05-01T09:00:00+00:00"));
}

#[test]
fn test_csv_quotes_fields_with_commas() {
    let result = sample_result();
    let csv = report::generate_csv_report(&result);

    let rows = issue_rows(&result);
    let with_comma = rows
        .iter()
        .find(|r| r.description.contains(','))
        .expect("a description containing a comma");
    assert!(csv.contains(&format!("\"{}\"", with_comma.description.replace('"', "\"\""))));
}

// ============================================================================
// Rendering and saving
// ============================================================================

#[test]
fn test_render_and_save() {
    let result = sample_result();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("audit.json");

    let content = report::render(&result, ReportFormat::Json).unwrap();
    report::save_report(&content, &path).unwrap();

    let saved = std::fs::read_to_string(&path).unwrap();
    assert_eq!(saved, content);
    assert_eq!(
        report::render(&result, ReportFormat::Text).unwrap(),
        report::generate_text_report(&result)
    );
}
