use crate::aggregate::{AuditSummary, Aggregator};
use crate::config::ScoringConfig;
use crate::detector::Detector;
use crate::error::Result;
use crate::lifecycle::{self, IssueKey, Observed, Source};
use crate::model::Issue;
use crate::scoring::Scorer;
use crate::store::AuditStore;
use chrono::{DateTime, Utc};
use seolens_scanner::{
    CrawlRecord, PerformanceRecord, SearchPerformanceRecord, StructuredDataRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;
use tracing::{debug, error, info, warn};

/// Everything one audit run looks at. `urls` is the audit set: signals for
/// any other URL are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditInput {
    pub site: String,
    pub urls: Vec<String>,
    pub crawl: Vec<CrawlRecord>,
    pub structured_data: Vec<StructuredDataRecord>,
    pub performance: Vec<PerformanceRecord>,
    pub search: Vec<SearchPerformanceRecord>,
}

impl AuditInput {
    pub fn new(site: impl Into<String>, urls: Vec<String>) -> Self {
        Self {
            site: site.into(),
            urls,
            ..Default::default()
        }
    }

    /// Audit set taken from the crawl records themselves.
    pub fn from_crawl(site: impl Into<String>, crawl: Vec<CrawlRecord>) -> Self {
        let urls = crawl.iter().map(|r| r.url.clone()).collect();
        Self {
            site: site.into(),
            urls,
            crawl,
            ..Default::default()
        }
    }

    pub fn with_crawl(mut self, crawl: Vec<CrawlRecord>) -> Self {
        self.crawl = crawl;
        self
    }

    pub fn with_structured_data(mut self, records: Vec<StructuredDataRecord>) -> Self {
        self.structured_data = records;
        self
    }

    pub fn with_performance(mut self, records: Vec<PerformanceRecord>) -> Self {
        self.performance = records;
        self
    }

    pub fn with_search(mut self, records: Vec<SearchPerformanceRecord>) -> Self {
        self.search = records;
        self
    }

    /// The records this run audits. Records outside the audit set and
    /// structured data carrying an error marker are dropped. Repeated URLs
    /// keep their first record (first per URL and strategy for PageSpeed).
    pub fn signals(&self) -> AuditSignals<'_> {
        let urls = first_per_key(self.urls.iter(), |u| u.as_str());
        let audit_set: HashSet<&str> = urls.iter().copied().map(String::as_str).collect();
        let in_scope = |url: &str, source: &str| {
            let keep = audit_set.contains(url);
            if !keep {
                debug!("Skipping {} record for {} outside the audit set", source, url);
            }
            keep
        };

        AuditSignals {
            crawl: first_per_key(
                self.crawl.iter().filter(|r| in_scope(&r.url, "crawl")),
                |r| r.url.as_str(),
            ),
            structured_data: first_per_key(
                self.structured_data
                    .iter()
                    .filter(|r| r.error.is_none() && in_scope(&r.url, "structured data")),
                |r| r.url.as_str(),
            ),
            performance: first_per_key(
                self.performance
                    .iter()
                    .filter(|r| in_scope(&r.url, "performance")),
                |r| (r.url.as_str(), r.strategy),
            ),
            search: first_per_key(
                self.search
                    .iter()
                    .filter(|r| in_scope(&r.url, "search performance")),
                |r| r.url.as_str(),
            ),
            urls,
        }
    }
}

/// Borrowed, de-duplicated view of an [`AuditInput`].
#[derive(Debug, Clone)]
pub struct AuditSignals<'a> {
    pub urls: Vec<&'a String>,
    pub crawl: Vec<&'a CrawlRecord>,
    pub structured_data: Vec<&'a StructuredDataRecord>,
    pub performance: Vec<&'a PerformanceRecord>,
    pub search: Vec<&'a SearchPerformanceRecord>,
}

impl AuditSignals<'_> {
    /// Pages each signal source reported on in this run.
    pub fn observed(&self) -> Observed {
        let mut observed = Observed::default();
        for r in &self.crawl {
            observed.insert(Source::Crawl, &r.url);
        }
        for r in &self.structured_data {
            observed.insert(Source::StructuredData, &r.url);
        }
        for r in &self.performance {
            observed.insert(Source::PageSpeed, &r.url);
        }
        for r in &self.search {
            observed.insert(Source::Search, &r.url);
        }
        observed
    }
}

fn first_per_key<'a, R: 'a, K: Eq + Hash>(
    records: impl Iterator<Item = &'a R>,
    key: impl Fn(&'a R) -> K,
) -> Vec<&'a R> {
    let mut seen = HashSet::new();
    records.filter(|r| seen.insert(key(*r))).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    pub site: String,
    pub audit_timestamp: DateTime<Utc>,
    pub urls_audited: usize,
    pub issues: Vec<Issue>,
    pub summary: AuditSummary,
    /// Issues from the previous run of this site that no longer occur.
    #[serde(default)]
    pub fixed: Vec<IssueKey>,
}

pub struct Auditor {
    scorer: Scorer,
}

impl Auditor {
    pub fn new(config: ScoringConfig) -> Result<Self> {
        Ok(Self {
            scorer: Scorer::new(config)?,
        })
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn detect(&self, input: &AuditInput, audit_timestamp: DateTime<Utc>) -> Vec<Issue> {
        Detector::new(&self.scorer).detect(input, audit_timestamp)
    }

    /// Detect and aggregate. No I/O.
    pub fn run(&self, input: &AuditInput, audit_timestamp: DateTime<Utc>) -> AuditResult {
        let issues = self.detect(input, audit_timestamp);
        self.finish(input, audit_timestamp, issues, Vec::new())
    }

    /// Like `run`, with issue statuses resolved against the site's previous
    /// stored run and this run recorded afterwards. Store failures are
    /// logged and never fail the audit.
    pub fn run_with_history(
        &self,
        store: &AuditStore,
        input: &AuditInput,
        audit_timestamp: DateTime<Utc>,
    ) -> AuditResult {
        let previous = match store.latest_run(&input.site) {
            Ok(Some(run)) => match store.run_issue_keys(&run.id) {
                Ok(keys) => {
                    info!("Comparing against run {} ({} issues)", run.id, keys.len());
                    keys
                }
                Err(e) => {
                    warn!("Could not load issues of run {}: {}", run.id, e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Could not read audit history for {}: {}", input.site, e);
                Vec::new()
            }
        };

        let detected = self.detect(input, audit_timestamp);
        let diff = lifecycle::diff(&previous, detected, &input.signals().observed());
        let result = self.finish(input, audit_timestamp, diff.issues, diff.fixed);

        match store.record_run(&result) {
            Ok(run_id) => info!("Recorded audit run {}", run_id),
            Err(e) => error!("Failed to store audit results for {}: {}", result.site, e),
        }

        result
    }

    fn finish(
        &self,
        input: &AuditInput,
        audit_timestamp: DateTime<Utc>,
        issues: Vec<Issue>,
        fixed: Vec<IssueKey>,
    ) -> AuditResult {
        let signals = input.signals();
        let crawl: Vec<CrawlRecord> = signals.crawl.iter().map(|r| (*r).clone()).collect();
        let summary = Aggregator::new(&self.scorer).aggregate(&issues, &crawl);

        AuditResult {
            site: input.site.clone(),
            audit_timestamp,
            urls_audited: signals.urls.len(),
            issues,
            summary,
            fixed,
        }
    }
}
