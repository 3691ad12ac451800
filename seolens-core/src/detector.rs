use crate::audit::AuditInput;
use crate::model::{Category, Issue, IssueStatus, IssueType, Severity};
use crate::rules::{
    self, CRAWL_RULES, Detection, PERFORMANCE_RULES, Rule, SEARCH_RULES, STRUCTURED_DATA_RULES,
    Signals,
};
use crate::scoring::Scorer;
use chrono::{DateTime, Utc};
use seolens_scanner::CrawlRecord;
use std::collections::HashMap;

/// Number of technical issue types quoted in a cross-reference description.
const CROSS_REFERENCE_LISTED: usize = 3;

/// Runs the rule tables over an audit's signals in a fixed phase order:
/// per-page crawl rules, cross-page duplicates, structured data, Core Web
/// Vitals, search performance, then the traffic cross-reference.
pub struct Detector<'a> {
    scorer: &'a Scorer,
}

impl<'a> Detector<'a> {
    pub fn new(scorer: &'a Scorer) -> Self {
        Self { scorer }
    }

    pub fn detect(&self, input: &AuditInput, detected_at: DateTime<Utc>) -> Vec<Issue> {
        let signals = input.signals();
        let mut issues = Vec::new();

        for record in &signals.crawl {
            self.apply(CRAWL_RULES, *record, &record.url, detected_at, &mut issues);
        }

        self.detect_duplicates(&signals.crawl, detected_at, &mut issues);

        for record in &signals.structured_data {
            self.apply(STRUCTURED_DATA_RULES, *record, &record.url, detected_at, &mut issues);
        }

        for record in &signals.performance {
            self.apply(PERFORMANCE_RULES, *record, &record.url, detected_at, &mut issues);
        }

        for record in &signals.search {
            self.apply(SEARCH_RULES, *record, &record.url, detected_at, &mut issues);
        }

        // Reads every issue emitted so far, so it must stay last
        let thresholds = &self.scorer.config().thresholds;
        let mut cross_referenced = Vec::new();
        for record in &signals.search {
            if record.impressions <= thresholds.cross_reference_impressions {
                continue;
            }
            let technical: Vec<&str> = issues
                .iter()
                .filter(|i| i.url == record.url && i.category != Category::SearchPerformance)
                .take(CROSS_REFERENCE_LISTED)
                .map(|i| i.issue_type.as_str())
                .collect();
            if technical.is_empty() {
                continue;
            }

            let detection = Detection::new(
                Severity::Critical,
                format!(
                    "High-impression page ({}) has technical issues: {} in {}",
                    rules::thousands(record.impressions),
                    technical.join(", "),
                    record.domain
                ),
            );
            cross_referenced.push(self.build(
                &record.url,
                IssueType::HighTrafficTechnicalIssues,
                detection,
                rules::CROSS_REFERENCE_RECOMMENDATION,
                detected_at,
            ));
        }
        issues.extend(cross_referenced);

        issues
    }

    fn apply<R>(
        &self,
        table: &[Rule<R>],
        record: &R,
        url: &str,
        detected_at: DateTime<Utc>,
        issues: &mut Vec<Issue>,
    ) {
        let signals = Signals {
            record,
            page_type: self.scorer.classify(url),
            thresholds: &self.scorer.config().thresholds,
        };

        for rule in table {
            if let Some(detection) = (rule.check)(&signals) {
                issues.push(self.build(
                    url,
                    rule.issue_type,
                    detection,
                    rule.recommendation,
                    detected_at,
                ));
            }
        }
    }

    /// One issue per page for every title or description text shared by two
    /// or more distinct pages.
    fn detect_duplicates(
        &self,
        crawl: &[&CrawlRecord],
        detected_at: DateTime<Utc>,
        issues: &mut Vec<Issue>,
    ) {
        let thresholds = &self.scorer.config().thresholds;

        let titles = group_by_text(crawl, |r| &r.title, thresholds.duplicate_title_min_chars);
        for (title, urls) in titles {
            for url in urls {
                let detection = Detection::new(
                    Severity::High,
                    format!("Duplicate title tag: '{}' (also found on other pages)", title),
                );
                issues.push(self.build(
                    url,
                    IssueType::DuplicateTitleTags,
                    detection,
                    "Create unique title tags for each page",
                    detected_at,
                ));
            }
        }

        let metas = group_by_text(
            crawl,
            |r| &r.meta_description,
            thresholds.duplicate_meta_min_chars,
        );
        for (_, urls) in metas {
            for url in urls {
                let detection = Detection::new(
                    Severity::Medium,
                    "Duplicate meta description (also found on other pages)",
                );
                issues.push(self.build(
                    url,
                    IssueType::DuplicateMetaDescriptions,
                    detection,
                    "Create unique meta descriptions for each page",
                    detected_at,
                ));
            }
        }
    }

    fn build(
        &self,
        url: &str,
        issue_type: IssueType,
        detection: Detection,
        recommendation: &str,
        detected_at: DateTime<Utc>,
    ) -> Issue {
        Issue {
            url: url.to_string(),
            issue_type,
            severity: detection.severity,
            category: issue_type.category(),
            description: detection.description,
            recommendation: detection
                .recommendation
                .unwrap_or_else(|| recommendation.to_string()),
            date_detected: detected_at,
            status: IssueStatus::New,
            impact_score: self.scorer.score(issue_type, url),
        }
    }
}

/// Groups pages by trimmed text longer than `min_chars`, keeping first-seen
/// order of texts and pages. Only texts shared by 2+ distinct URLs are kept.
fn group_by_text<'r>(
    crawl: &[&'r CrawlRecord],
    text: impl Fn(&'r CrawlRecord) -> &'r String,
    min_chars: usize,
) -> Vec<(&'r str, Vec<&'r str>)> {
    let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for &record in crawl {
        let value = text(record).trim();
        if value.chars().count() <= min_chars {
            continue;
        }
        match index.get(value) {
            Some(&i) => {
                let urls = &mut groups[i].1;
                if !urls.contains(&record.url.as_str()) {
                    urls.push(&record.url);
                }
            }
            None => {
                index.insert(value, groups.len());
                groups.push((value, vec![record.url.as_str()]));
            }
        }
    }

    groups.retain(|(_, urls)| urls.len() > 1);
    groups
}
