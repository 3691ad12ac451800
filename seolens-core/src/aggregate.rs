use crate::classify::PageType;
use crate::model::{Category, Issue, Severity};
use crate::scoring::Scorer;
use crate::teams::{self, TeamBucket, TeamKey};
use seolens_scanner::CrawlRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessImpact {
    pub url: String,
    pub page_type: PageType,
    pub critical_issues: usize,
    pub business_importance: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTypeStats {
    pub pages: usize,
    pub issues: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategicInsights {
    pub high_priority_pages_with_issues: usize,
    pub critical_business_impact: Vec<BusinessImpact>,
    pub page_type_breakdown: BTreeMap<PageType, PageTypeStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total_issues: usize,
    pub critical_issues: usize,
    pub high_issues: usize,
    pub medium_issues: usize,
    pub low_issues: usize,
    pub issue_categories: BTreeMap<Category, usize>,
    pub pages_crawled: usize,
    /// Seconds, mean over every crawl record.
    pub avg_response_time: f64,
    pub error_pages: usize,
    /// 0..=100, higher is healthier.
    pub seo_score: f64,
    pub strategic_insights: StrategicInsights,
    pub team_breakdown: BTreeMap<TeamKey, TeamBucket>,
}

impl AuditSummary {
    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical_issues,
            Severity::High => self.high_issues,
            Severity::Medium => self.medium_issues,
            Severity::Low => self.low_issues,
        }
    }

    /// Team buckets ordered by priority score, highest first.
    pub fn teams_by_priority(&self) -> Vec<(TeamKey, &TeamBucket)> {
        let mut teams: Vec<_> = self.team_breakdown.iter().map(|(k, b)| (*k, b)).collect();
        teams.sort_by(|a, b| b.1.priority_score.cmp(&a.1.priority_score));
        teams
    }
}

pub struct Aggregator<'a> {
    scorer: &'a Scorer,
}

impl<'a> Aggregator<'a> {
    pub fn new(scorer: &'a Scorer) -> Self {
        Self { scorer }
    }

    pub fn aggregate(&self, issues: &[Issue], crawl: &[CrawlRecord]) -> AuditSummary {
        let count = |severity: Severity| issues.iter().filter(|i| i.severity == severity).count();

        let mut issue_categories = BTreeMap::new();
        for issue in issues {
            *issue_categories.entry(issue.category).or_insert(0) += 1;
        }

        let avg_response_time = if crawl.is_empty() {
            0.0
        } else {
            crawl.iter().map(|c| c.response_time).sum::<f64>() / crawl.len() as f64
        };
        let error_pages = crawl.iter().filter(|c| c.status_code >= 400).count();

        let pages = group_by_page(issues);

        AuditSummary {
            total_issues: issues.len(),
            critical_issues: count(Severity::Critical),
            high_issues: count(Severity::High),
            medium_issues: count(Severity::Medium),
            low_issues: count(Severity::Low),
            issue_categories,
            pages_crawled: crawl.len(),
            avg_response_time,
            error_pages,
            seo_score: self.seo_score(&pages, crawl),
            strategic_insights: self.insights(&pages),
            team_breakdown: teams::route(issues),
        }
    }

    /// `max(0, 100 - avg_weighted_impact / impact_scale)` where pages without
    /// issues contribute weight but no impact.
    fn seo_score(&self, pages: &[(&str, Vec<&Issue>)], crawl: &[CrawlRecord]) -> f64 {
        let mut total_weighted_impact = 0.0;
        let mut total_weight = 0.0;

        for (url, page_issues) in pages {
            let weight = self.scorer.page_weight(url);
            let impact: f64 = page_issues.iter().map(|i| f64::from(i.impact_score)).sum();
            total_weighted_impact += impact * weight;
            total_weight += weight;
        }

        let with_issues: HashSet<&str> = pages.iter().map(|(url, _)| *url).collect();
        let mut counted = HashSet::new();
        for record in crawl {
            let url = record.url.as_str();
            if !with_issues.contains(url) && counted.insert(url) {
                total_weight += self.scorer.page_weight(url);
            }
        }

        if total_weight <= 0.0 {
            return 100.0;
        }
        let avg_weighted_impact = total_weighted_impact / total_weight;
        (100.0 - avg_weighted_impact / self.scorer.config().impact_scale).max(0.0)
    }

    fn insights(&self, pages: &[(&str, Vec<&Issue>)]) -> StrategicInsights {
        let mut insights = StrategicInsights::default();

        for (url, page_issues) in pages {
            let page_type = self.scorer.classify(url);
            let weight = self.scorer.weight_for(page_type);

            if weight >= self.scorer.config().high_priority_weight {
                insights.high_priority_pages_with_issues += 1;

                let critical = page_issues
                    .iter()
                    .filter(|i| i.severity == Severity::Critical)
                    .count();
                if critical > 0 {
                    insights.critical_business_impact.push(BusinessImpact {
                        url: url.to_string(),
                        page_type,
                        critical_issues: critical,
                        business_importance: weight,
                    });
                }
            }

            let stats = insights.page_type_breakdown.entry(page_type).or_default();
            stats.pages += 1;
            stats.issues += page_issues.len();
        }

        insights
    }
}

/// Issues grouped per URL, in order of first appearance.
fn group_by_page(issues: &[Issue]) -> Vec<(&str, Vec<&Issue>)> {
    let mut pages: Vec<(&str, Vec<&Issue>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for issue in issues {
        match index.get(issue.url.as_str()) {
            Some(&i) => pages[i].1.push(issue),
            None => {
                index.insert(issue.url.as_str(), pages.len());
                pages.push((issue.url.as_str(), vec![issue]));
            }
        }
    }

    pages
}
