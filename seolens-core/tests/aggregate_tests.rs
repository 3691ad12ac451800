// Tests for audit aggregation, team routing and ticket exports

use chrono::{TimeZone, Utc};
use seolens_core::classify::PageType;
use seolens_core::export::{self, TicketPriority};
use seolens_core::teams::{self, TeamKey};
use seolens_core::{
    Aggregator, Category, Issue, IssueStatus, IssueType, ScoringConfig, Scorer, Severity,
};
use seolens_scanner::CrawlRecord;

const HOME: &str = "https://acme.example/";
const BLOG: &str = "https://acme.example/blog/canvas-care";
const ABOUT: &str = "https://acme.example/about";

fn issue(url: &str, issue_type: IssueType, severity: Severity, impact_score: u8) -> Issue {
    Issue {
        url: url.to_string(),
        issue_type,
        severity,
        category: issue_type.category(),
        description: format!("{} on {}", issue_type, url),
        recommendation: "Fix it".to_string(),
        date_detected: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        status: IssueStatus::New,
        impact_score,
    }
}

fn crawled(url: &str, status_code: u16, response_time: f64) -> CrawlRecord {
    let mut record = CrawlRecord::new(url.to_string());
    record.status_code = status_code;
    record.response_time = response_time;
    record
}

fn sample_issues() -> Vec<Issue> {
    vec![
        issue(HOME, IssueType::HttpError, Severity::Critical, 100),
        issue(HOME, IssueType::MissingMetaDescription, Severity::Medium, 50),
        issue(BLOG, IssueType::ThinContent, Severity::High, 68),
        issue(BLOG, IssueType::ImagesWithoutAltText, Severity::Medium, 32),
        issue(BLOG, IssueType::MultipleH1Tags, Severity::Low, 24),
    ]
}

fn sample_crawl() -> Vec<CrawlRecord> {
    vec![
        crawled(HOME, 503, 0.5),
        crawled(BLOG, 200, 1.5),
        crawled(ABOUT, 200, 1.0),
        // Recrawled page counts once in the score
        crawled(ABOUT, 200, 1.0),
    ]
}

fn scorer() -> Scorer {
    Scorer::new(ScoringConfig::default()).unwrap()
}

// ============================================================================
// Summary counts
// ============================================================================

#[test]
fn test_severity_and_category_counts() {
    let scorer = scorer();
    let summary = Aggregator::new(&scorer).aggregate(&sample_issues(), &sample_crawl());

    assert_eq!(summary.total_issues, 5);
    assert_eq!(summary.critical_issues, 1);
    assert_eq!(summary.high_issues, 1);
    assert_eq!(summary.medium_issues, 2);
    assert_eq!(summary.low_issues, 1);
    assert_eq!(summary.count(Severity::Medium), 2);

    assert_eq!(summary.issue_categories.get(&Category::Crawlability), Some(&1));
    assert_eq!(summary.issue_categories.get(&Category::Content), Some(&4));
    assert_eq!(summary.issue_categories.get(&Category::Performance), None);
}

#[test]
fn test_crawl_statistics() {
    let scorer = scorer();
    let summary = Aggregator::new(&scorer).aggregate(&sample_issues(), &sample_crawl());

    assert_eq!(summary.pages_crawled, 4);
    assert!((summary.avg_response_time - 1.0).abs() < 1e-9);
    assert_eq!(summary.error_pages, 1);
}

// ============================================================================
// SEO score
// ============================================================================

#[test]
fn test_seo_score_weights_pages_by_business_value() {
    let scorer = scorer();
    let summary = Aggregator::new(&scorer).aggregate(&sample_issues(), &sample_crawl());

    // home: (100 + 50) * 5.0, blog: (68 + 32 + 24) * 2.0, about adds weight 2.5 once
    let expected = 100.0 - ((150.0 * 5.0 + 124.0 * 2.0) / (5.0 + 2.0 + 2.5)) / 50.0;
    assert!((summary.seo_score - expected).abs() < 1e-9);
}

#[test]
fn test_aggregate_is_deterministic() {
    let scorer = scorer();
    let aggregator = Aggregator::new(&scorer);
    let issues = sample_issues();
    let crawl = sample_crawl();

    let first = serde_json::to_string(&aggregator.aggregate(&issues, &crawl)).unwrap();
    let second = serde_json::to_string(&aggregator.aggregate(&issues, &crawl)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_seo_score_is_100_without_pages() {
    let scorer = scorer();
    let summary = Aggregator::new(&scorer).aggregate(&[], &[]);

    assert_eq!(summary.seo_score, 100.0);
    assert_eq!(summary.avg_response_time, 0.0);
    assert_eq!(summary.pages_crawled, 0);
}

#[test]
fn test_seo_score_is_100_for_clean_crawl() {
    let scorer = scorer();
    let summary = Aggregator::new(&scorer).aggregate(&[], &sample_crawl());
    assert_eq!(summary.seo_score, 100.0);
}

#[test]
fn test_seo_score_never_negative() {
    let config = ScoringConfig {
        impact_scale: 0.5,
        ..ScoringConfig::default()
    };
    let scorer = Scorer::new(config).unwrap();
    let issues = vec![issue(HOME, IssueType::HttpError, Severity::Critical, 100)];

    let summary = Aggregator::new(&scorer).aggregate(&issues, &[]);
    assert_eq!(summary.seo_score, 0.0);
}

// ============================================================================
// Strategic insights
// ============================================================================

#[test]
fn test_strategic_insights() {
    let scorer = scorer();
    let summary = Aggregator::new(&scorer).aggregate(&sample_issues(), &sample_crawl());
    let insights = &summary.strategic_insights;

    assert_eq!(insights.high_priority_pages_with_issues, 1);
    assert_eq!(insights.critical_business_impact.len(), 1);

    let home = &insights.critical_business_impact[0];
    assert_eq!(home.url, HOME);
    assert_eq!(home.page_type, PageType::Homepage);
    assert_eq!(home.critical_issues, 1);
    assert_eq!(home.business_importance, 5.0);

    let homepage = &insights.page_type_breakdown[&PageType::Homepage];
    assert_eq!((homepage.pages, homepage.issues), (1, 2));
    let blog = &insights.page_type_breakdown[&PageType::Blog];
    assert_eq!((blog.pages, blog.issues), (1, 3));
    assert!(!insights.page_type_breakdown.contains_key(&PageType::About));
}

#[test]
fn test_high_priority_page_without_critical_issues() {
    let scorer = scorer();
    let product = "https://acme.example/product/canvas";
    let issues = vec![issue(product, IssueType::MissingH1Tag, Severity::Medium, 100)];

    let summary = Aggregator::new(&scorer).aggregate(&issues, &[]);
    let insights = &summary.strategic_insights;
    assert_eq!(insights.high_priority_pages_with_issues, 1);
    assert!(insights.critical_business_impact.is_empty());
}

// ============================================================================
// Team routing
// ============================================================================

#[test]
fn test_route_always_returns_every_team() {
    let buckets = teams::route(&[]);
    assert_eq!(buckets.len(), 3);
    for bucket in buckets.values() {
        assert_eq!(bucket.total_issues, 0);
        assert_eq!(bucket.priority_score, 0);
        assert_eq!(bucket.avg_impact, 0.0);
    }
    assert_eq!(buckets[&TeamKey::TechTeam].name, "TECH/DEV TEAM");
}

#[test]
fn test_team_metrics_and_priority() {
    let scorer = scorer();
    let summary = Aggregator::new(&scorer).aggregate(&sample_issues(), &sample_crawl());

    let tech = &summary.team_breakdown[&TeamKey::TechTeam];
    assert_eq!(tech.total_issues, 1);
    assert_eq!(tech.critical_issues, 1);
    assert_eq!(tech.priority_score, 11);
    assert_eq!(tech.avg_impact, 100.0);

    let marketing = &summary.team_breakdown[&TeamKey::MarketingTeam];
    assert_eq!(marketing.total_issues, 3);
    assert_eq!(marketing.high_issues, 1);
    assert_eq!(marketing.priority_score, 5 + 3);
    assert!((marketing.avg_impact - (50.0 + 68.0 + 24.0) / 3.0).abs() < 1e-9);

    let design = &summary.team_breakdown[&TeamKey::DesignTeam];
    assert_eq!(design.total_issues, 1);
    assert_eq!(design.issues[0].issue_type, IssueType::ImagesWithoutAltText);

    let order: Vec<TeamKey> = summary.teams_by_priority().iter().map(|(k, _)| *k).collect();
    assert_eq!(
        order,
        vec![TeamKey::TechTeam, TeamKey::MarketingTeam, TeamKey::DesignTeam]
    );
}

#[test]
fn test_every_issue_type_is_routed_to_one_team() {
    let issues: Vec<Issue> = IssueType::ALL
        .iter()
        .map(|t| issue(HOME, *t, Severity::Low, 10))
        .collect();

    let buckets = teams::route(&issues);
    let routed: usize = buckets.values().map(|b| b.total_issues).sum();
    assert_eq!(routed, IssueType::ALL.len());
    assert_eq!(
        teams::team_for(IssueType::PoorCoreWebVitals.as_str()),
        TeamKey::TechTeam
    );
    assert_eq!(
        teams::team_for(IssueType::HighImpressionsLowCtr.as_str()),
        TeamKey::MarketingTeam
    );
}

// ============================================================================
// Exports
// ============================================================================

#[test]
fn test_team_exports_skip_empty_teams() {
    let scorer = scorer();
    let issues = vec![issue(BLOG, IssueType::ThinContent, Severity::High, 68)];
    let summary = Aggregator::new(&scorer).aggregate(&issues, &[]);

    let exports = export::team_exports(&summary);
    assert_eq!(exports.len(), 1);

    let marketing = &exports[&TeamKey::MarketingTeam];
    assert_eq!(marketing.team_name, "MARKETING TEAM");
    assert_eq!(marketing.ticket_priority, TicketPriority::High);
    assert_eq!(marketing.labels, vec!["marketing-team", "seo-content", "content"]);
    assert_eq!(marketing.summary.priority_score, 6);
    assert_eq!(marketing.detailed_issues.len(), 1);
    assert_eq!(marketing.detailed_issues[0].ticket_priority, TicketPriority::High);
    assert_eq!(marketing.detailed_issues[0].issue.issue_type, IssueType::ThinContent);
}

#[test]
fn test_overall_ticket_priority() {
    let scorer = scorer();
    let aggregate = |issues: &[Issue]| Aggregator::new(&scorer).aggregate(issues, &[]);

    let low = aggregate(&[issue(BLOG, IssueType::MultipleH1Tags, Severity::Low, 24)]);
    assert_eq!(export::overall_priority(&low), TicketPriority::Low);

    let medium = aggregate(&[issue(BLOG, IssueType::ThinContent, Severity::High, 68)]);
    assert_eq!(export::overall_priority(&medium), TicketPriority::Medium);

    let high = aggregate(&sample_issues());
    assert_eq!(export::overall_priority(&high), TicketPriority::High);

    let outage: Vec<Issue> = (0..6)
        .map(|n| {
            issue(
                &format!("https://acme.example/product/{}", n),
                IssueType::HttpError,
                Severity::Critical,
                100,
            )
        })
        .collect();
    assert_eq!(export::overall_priority(&aggregate(&outage)), TicketPriority::Highest);
}
