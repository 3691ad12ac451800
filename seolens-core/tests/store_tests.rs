// Tests for audit history storage and issue lifecycle tracking

use chrono::{DateTime, Duration, TimeZone, Utc};
use seolens_core::lifecycle::{self, IssueKey, Observed, Source};
use seolens_core::{
    AuditInput, AuditStore, Auditor, Issue, IssueStatus, IssueType, ScoringConfig, Severity,
};
use seolens_scanner::{CrawlRecord, StructuredDataRecord};
use tempfile::TempDir;

const HOME: &str = "https://acme.example/";
const CHECKOUT: &str = "https://acme.example/checkout";
const BLOG: &str = "https://acme.example/blog/canvas-care";

fn create_test_store() -> (TempDir, AuditStore) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("seolens.db");
    let store = AuditStore::open(&db_path).unwrap();
    (temp_dir, store)
}

fn first_audit() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

fn issue(url: &str, issue_type: IssueType) -> Issue {
    Issue {
        url: url.to_string(),
        issue_type,
        severity: Severity::Medium,
        category: issue_type.category(),
        description: String::new(),
        recommendation: String::new(),
        date_detected: first_audit(),
        status: IssueStatus::New,
        impact_score: 40,
    }
}

fn page(url: &str, title: &str, status_code: u16) -> CrawlRecord {
    let mut record = CrawlRecord::new(url.to_string());
    record.status_code = status_code;
    record.response_time = 0.3;
    record.title = title.to_string();
    record.meta_description = format!(
        "Shop {} from Acme. Personalised photo gifts printed in the UK, delivered fast, with free returns on every order.",
        title
    );
    record.h1_tags = vec!["Personalised gifts for every occasion".to_string()];
    record.canonical_url = Some(url.to_string());
    record.internal_links = 10;
    record.page_size = 40_000;
    record
}

fn crawled(urls: &[&str]) -> Observed {
    let mut observed = Observed::default();
    for url in urls {
        observed.insert(Source::Crawl, url);
    }
    observed
}

fn organization(url: &str) -> StructuredDataRecord {
    let mut record = StructuredDataRecord::new(url.to_string());
    record.json_ld_count = 1;
    record.schema_types.insert("Organization".to_string());
    record
}

fn site_input(checkout_status: u16, blog_images_without_alt: usize) -> AuditInput {
    let mut blog = page(BLOG, "Acme Journal: Printing Tips Weekly", 200);
    blog.images_without_alt = blog_images_without_alt;

    AuditInput::from_crawl(
        "acme",
        vec![
            page(HOME, "Acme Photo Gifts and Canvas Prints", 200),
            page(CHECKOUT, "Checkout securely with Acme Gifts", checkout_status),
            blog,
        ],
    )
    .with_structured_data(vec![
        organization(HOME),
        organization(CHECKOUT),
        organization(BLOG),
    ])
}

// ============================================================================
// Lifecycle diff
// ============================================================================

#[test]
fn test_diff_marks_new_and_existing() {
    let previous = vec![IssueKey::new(HOME, IssueType::MissingH1Tag)];
    let current = vec![
        issue(HOME, IssueType::MissingH1Tag),
        issue(HOME, IssueType::ThinContent),
    ];

    let diff = lifecycle::diff(&previous, current, &crawled(&[HOME]));
    assert_eq!(diff.issues[0].status, IssueStatus::Existing);
    assert_eq!(diff.issues[1].status, IssueStatus::New);
    assert!(diff.fixed.is_empty());
}

#[test]
fn test_diff_reports_fixed_keys_sorted_and_unique() {
    let previous = vec![
        IssueKey::new(HOME, IssueType::ThinContent),
        IssueKey::new(BLOG, IssueType::MissingH1Tag),
        IssueKey::new(BLOG, IssueType::MissingH1Tag),
        IssueKey::new(CHECKOUT, IssueType::HttpError),
    ];
    let current = vec![issue(CHECKOUT, IssueType::HttpError)];

    let diff = lifecycle::diff(&previous, current, &crawled(&[HOME, BLOG, CHECKOUT]));
    assert_eq!(
        diff.fixed,
        vec![
            IssueKey::new(HOME, IssueType::ThinContent),
            IssueKey::new(BLOG, IssueType::MissingH1Tag),
        ]
    );
}

#[test]
fn test_diff_only_fixes_keys_whose_signal_was_observed() {
    let previous = vec![
        IssueKey::new(HOME, IssueType::ThinContent),
        IssueKey::new(BLOG, IssueType::MissingH1Tag),
        IssueKey::new(HOME, IssueType::HighImpressionsLowCtr),
        IssueKey::new(HOME, IssueType::MissingOrganizationSchema),
    ];

    // Only the homepage was crawled, with no search or structured data
    let diff = lifecycle::diff(&previous, Vec::new(), &crawled(&[HOME]));
    assert_eq!(diff.fixed, vec![IssueKey::new(HOME, IssueType::ThinContent)]);

    let mut observed = crawled(&[HOME]);
    observed.insert(Source::Search, HOME);
    observed.insert(Source::StructuredData, HOME);
    let diff = lifecycle::diff(&previous, Vec::new(), &observed);
    assert_eq!(diff.fixed.len(), 3);
    assert!(!diff.fixed.contains(&IssueKey::new(BLOG, IssueType::MissingH1Tag)));

    // Search data alone cannot clear a cross-reference on an unfetched page
    let previous = vec![IssueKey::new(BLOG, IssueType::HighTrafficTechnicalIssues)];
    let mut observed = Observed::default();
    observed.insert(Source::Search, BLOG);
    assert!(lifecycle::diff(&previous, Vec::new(), &observed).fixed.is_empty());
    observed.insert(Source::Crawl, BLOG);
    assert_eq!(lifecycle::diff(&previous, Vec::new(), &observed).fixed, previous);
}

#[test]
fn test_source_of_issue_types() {
    assert_eq!(Source::of(IssueType::DuplicateTitleTags), Source::Crawl);
    assert_eq!(Source::of(IssueType::MissingProductSchema), Source::StructuredData);
    assert_eq!(Source::of(IssueType::LowPerformanceScore), Source::PageSpeed);
    assert_eq!(Source::of(IssueType::HighTrafficTechnicalIssues), Source::Search);
}

#[test]
fn test_diff_without_history_is_all_new() {
    let diff = lifecycle::diff(
        &[],
        vec![issue(HOME, IssueType::ThinContent)],
        &crawled(&[HOME]),
    );
    assert_eq!(diff.issues[0].status, IssueStatus::New);
    assert!(diff.fixed.is_empty());
}

// ============================================================================
// Store
// ============================================================================

#[test]
fn test_store_creation() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("seolens.db");

    assert!(!AuditStore::exists(&db_path));
    let _store = AuditStore::open(&db_path).unwrap();
    assert!(AuditStore::exists(&db_path));

    AuditStore::remove(&db_path).unwrap();
    assert!(!AuditStore::exists(&db_path));
}

#[test]
fn test_empty_store_has_no_runs() {
    let (_dir, store) = create_test_store();
    assert!(store.latest_run("acme").unwrap().is_none());
    assert!(store.latest_run_any().unwrap().is_none());
    assert!(store.load_result("missing").unwrap().is_none());
    assert!(store.run_issue_keys("missing").unwrap().is_empty());
}

#[test]
fn test_record_and_load_run() {
    let (_dir, store) = create_test_store();
    let auditor = Auditor::new(ScoringConfig::default()).unwrap();
    let result = auditor.run(&site_input(503, 2), first_audit());

    let run_id = store.record_run(&result).unwrap();

    let latest = store.latest_run("acme").unwrap().unwrap();
    assert_eq!(latest.id, run_id);
    assert_eq!(latest.site, "acme");
    assert_eq!(latest.audit_timestamp, first_audit());
    assert_eq!(latest.total_issues, result.issues.len());
    assert!((latest.seo_score - result.summary.seo_score).abs() < 1e-9);

    let loaded = store.load_result(&run_id).unwrap().unwrap();
    assert_eq!(loaded.site, result.site);
    assert_eq!(loaded.audit_timestamp, result.audit_timestamp);
    assert_eq!(loaded.issues, result.issues);
    assert_eq!(loaded.summary.total_issues, result.summary.total_issues);
    assert_eq!(loaded.summary.team_breakdown.len(), 3);

    let keys = store.run_issue_keys(&run_id).unwrap();
    let expected: Vec<IssueKey> = result.issues.iter().map(IssueKey::of).collect();
    assert_eq!(keys, expected);
}

#[test]
fn test_issue_rows_ordered_by_severity() {
    let (_dir, store) = create_test_store();
    let auditor = Auditor::new(ScoringConfig::default()).unwrap();
    let result = auditor.run(&site_input(503, 2), first_audit());
    let run_id = store.record_run(&result).unwrap();

    let rows = store.issues_for_run(&run_id).unwrap();
    assert_eq!(rows.len(), result.issues.len());
    assert_eq!(rows[0].severity, "Critical");
    assert_eq!(rows[0].url, CHECKOUT);
    assert_eq!(rows[0].issue_type, "HTTP Error");
    assert_eq!(rows[0].site, "acme");
    assert_eq!(rows[0].status, "New");
    assert_eq!(rows.last().unwrap().severity, "Medium");
}

#[test]
fn test_latest_run_picks_newest_per_site() {
    let (_dir, store) = create_test_store();
    let auditor = Auditor::new(ScoringConfig::default()).unwrap();

    let older = auditor.run(&site_input(200, 0), first_audit());
    let newer = auditor.run(&site_input(503, 0), first_audit() + Duration::days(7));
    let mut other_site = site_input(200, 0);
    other_site.site = "other".to_string();
    let other = auditor.run(&other_site, first_audit() + Duration::days(1));

    // Insertion order differs from audit order
    let newer_id = store.record_run(&newer).unwrap();
    store.record_run(&older).unwrap();
    let other_id = store.record_run(&other).unwrap();

    assert_eq!(store.latest_run("acme").unwrap().unwrap().id, newer_id);
    assert_eq!(store.latest_run("other").unwrap().unwrap().id, other_id);
    assert_eq!(store.latest_run_any().unwrap().unwrap().id, newer_id);
}

// ============================================================================
// Audits with history
// ============================================================================

#[test]
fn test_run_with_history_tracks_status_and_fixes() {
    let (_dir, store) = create_test_store();
    let auditor = Auditor::new(ScoringConfig::default()).unwrap();

    let first = auditor.run_with_history(&store, &site_input(503, 2), first_audit());
    assert!(!first.issues.is_empty());
    assert!(first.issues.iter().all(|i| i.status == IssueStatus::New));
    assert!(first.fixed.is_empty());

    // Checkout recovered, blog images still missing alt text, a new slow page
    let mut input = site_input(200, 2);
    input.crawl[0].response_time = 4.0;
    let second = auditor.run_with_history(&store, &input, first_audit() + Duration::days(7));

    let status_of = |url: &str, issue_type: IssueType| {
        second
            .issues
            .iter()
            .find(|i| i.url == url && i.issue_type == issue_type)
            .map(|i| i.status)
    };
    assert_eq!(
        status_of(BLOG, IssueType::ImagesWithoutAltText),
        Some(IssueStatus::Existing)
    );
    assert_eq!(
        status_of(HOME, IssueType::SlowResponseTime),
        Some(IssueStatus::New)
    );
    assert_eq!(status_of(CHECKOUT, IssueType::HttpError), None);
    assert_eq!(
        second.fixed,
        vec![IssueKey::new(CHECKOUT, IssueType::HttpError)]
    );

    let latest = store.latest_run("acme").unwrap().unwrap();
    assert_eq!(latest.audit_timestamp, first_audit() + Duration::days(7));
    let stored = store.load_result(&latest.id).unwrap().unwrap();
    assert_eq!(stored.fixed, second.fixed);
}

#[test]
fn test_run_with_history_ignores_pages_not_fetched() {
    let (_dir, store) = create_test_store();
    let auditor = Auditor::new(ScoringConfig::default()).unwrap();

    let first = auditor.run_with_history(&store, &site_input(200, 2), first_audit());
    assert!(
        first
            .issues
            .iter()
            .any(|i| i.url == BLOG && i.issue_type == IssueType::ImagesWithoutAltText)
    );

    // Same audit set, but the blog fetch failed
    let mut input = site_input(200, 2);
    input.crawl.retain(|r| r.url != BLOG);
    input.structured_data.retain(|r| r.url != BLOG);
    let second = auditor.run_with_history(&store, &input, first_audit() + Duration::days(7));

    assert!(second.issues.iter().all(|i| i.url != BLOG));
    assert!(second.fixed.is_empty());
}

#[test]
fn test_run_with_history_is_per_site() {
    let (_dir, store) = create_test_store();
    let auditor = Auditor::new(ScoringConfig::default()).unwrap();

    auditor.run_with_history(&store, &site_input(503, 2), first_audit());

    let mut other = site_input(503, 2);
    other.site = "acme-staging".to_string();
    let result = auditor.run_with_history(&store, &other, first_audit() + Duration::hours(1));

    assert!(result.issues.iter().all(|i| i.status == IssueStatus::New));
    assert!(result.fixed.is_empty());
}
