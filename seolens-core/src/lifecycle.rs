// Issue status tracking across consecutive runs of the same site

use crate::model::{Category, Issue, IssueStatus, IssueType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// Identity of an issue across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IssueKey {
    pub url: String,
    pub issue_type: IssueType,
}

impl IssueKey {
    pub fn new(url: impl Into<String>, issue_type: IssueType) -> Self {
        Self {
            url: url.into(),
            issue_type,
        }
    }

    pub fn of(issue: &Issue) -> Self {
        Self::new(issue.url.clone(), issue.issue_type)
    }
}

/// Signal source an issue type is detected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Crawl,
    StructuredData,
    PageSpeed,
    Search,
}

impl Source {
    pub fn of(issue_type: IssueType) -> Self {
        match issue_type {
            IssueType::MissingStructuredData
            | IssueType::MissingProductSchema
            | IssueType::MissingOrganizationSchema => Source::StructuredData,
            IssueType::PoorCoreWebVitals | IssueType::LowPerformanceScore => Source::PageSpeed,
            t if t.category() == Category::SearchPerformance => Source::Search,
            _ => Source::Crawl,
        }
    }
}

/// Pages each source produced a record for in the current run.
#[derive(Debug, Clone, Default)]
pub struct Observed {
    seen: HashSet<(Source, String)>,
}

impl Observed {
    pub fn insert(&mut self, source: Source, url: &str) {
        self.seen.insert((source, url.to_string()));
    }

    /// Whether this run looked at the signal that would raise `key`.
    pub fn covers(&self, key: &IssueKey) -> bool {
        let seen = |source: Source| self.seen.contains(&(source, key.url.clone()));
        match key.issue_type {
            // Also reads the page's technical issues
            IssueType::HighTrafficTechnicalIssues => seen(Source::Search) && seen(Source::Crawl),
            issue_type => seen(Source::of(issue_type)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleDiff {
    pub issues: Vec<Issue>,
    /// Present in the previous run, absent now although its signal was
    /// observed. Sorted.
    pub fixed: Vec<IssueKey>,
}

/// Mark current issues `Existing` or `New` against the previous run's keys.
/// A previous key only counts as fixed when `observed` covers it; pages
/// that failed to fetch or fell outside this run are not reported.
pub fn diff(
    previous: &[IssueKey],
    mut issues: Vec<Issue>,
    observed: &Observed,
) -> LifecycleDiff {
    let before: HashSet<&IssueKey> = previous.iter().collect();

    let mut current = HashSet::new();
    for issue in &mut issues {
        let key = IssueKey::of(issue);
        issue.status = if before.contains(&key) {
            IssueStatus::Existing
        } else {
            IssueStatus::New
        };
        current.insert(key);
    }

    let (fixed, unobserved): (BTreeSet<IssueKey>, BTreeSet<IssueKey>) = previous
        .iter()
        .filter(|key| !current.contains(*key))
        .cloned()
        .partition(|key| observed.covers(key));
    if !unobserved.is_empty() {
        debug!(
            "{} previous issues were not re-checked this run",
            unobserved.len()
        );
    }

    LifecycleDiff {
        issues,
        fixed: fixed.into_iter().collect(),
    }
}
