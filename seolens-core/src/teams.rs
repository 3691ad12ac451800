// Routing of issues to the team responsible for fixing them

use crate::model::{Issue, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamKey {
    TechTeam,
    MarketingTeam,
    DesignTeam,
}

impl TeamKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamKey::TechTeam => "tech_team",
            TeamKey::MarketingTeam => "marketing_team",
            TeamKey::DesignTeam => "design_team",
        }
    }

    pub fn definition(&self) -> &'static TeamDefinition {
        match self {
            TeamKey::TechTeam => &TEAMS[0],
            TeamKey::MarketingTeam => &TEAMS[1],
            TeamKey::DesignTeam => &TEAMS[2],
        }
    }
}

impl fmt::Display for TeamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct TeamDefinition {
    pub key: TeamKey,
    pub name: &'static str,
    pub description: &'static str,
    /// Exact issue type names, plus snake_case keywords matched as
    /// substrings of the issue type.
    pub issue_types: &'static [&'static str],
}

/// Checked in order; an issue goes to the first team that claims it.
pub static TEAMS: [TeamDefinition; 3] = [
    TeamDefinition {
        key: TeamKey::TechTeam,
        name: "TECH/DEV TEAM",
        description: "Server, infrastructure, and technical implementation issues",
        issue_types: &[
            "HTTP Error",
            "Slow Response Time",
            "Large Page Size",
            "Missing Canonical Tag",
            "Invalid Canonical URL",
            "Blocked by Robots Meta",
            "Missing Structured Data",
            "Missing Product Schema",
            "Missing Organization Schema",
            "Insufficient Internal Links",
            "Excessive External Links",
            "High Impressions Zero Clicks",
            "High Traffic Page with Technical Issues",
            "Poor Core Web Vitals",
            "Low Performance Score",
            "missing_canonical",
            "crawlability",
            "https_issues",
            "server_errors",
            "redirect_chains",
            "broken_links",
        ],
    },
    TeamDefinition {
        key: TeamKey::MarketingTeam,
        name: "MARKETING TEAM",
        description: "Content optimization, meta tags, and SEO strategy",
        issue_types: &[
            "Missing Title Tag",
            "Short Title Tag",
            "Long Title Tag",
            "Generic Title Tag",
            "Duplicate Title Tags",
            "Missing Meta Description",
            "Short Meta Description",
            "Long Meta Description",
            "Duplicate Meta Descriptions",
            "Missing H1 Tag",
            "Multiple H1 Tags",
            "Thin Content",
            "High Impressions Low CTR",
            "High Impressions Poor Position",
            "High Value Page Opportunity",
            "duplicate_content",
            "keyword_optimization",
            "thin_content",
            "missing_schema",
        ],
    },
    TeamDefinition {
        key: TeamKey::DesignTeam,
        name: "DESIGN/UX TEAM",
        description: "User experience, mobile design, and visual optimization",
        issue_types: &[
            "Images Without Alt Text",
            "not_mobile_friendly",
            "poor_ux",
            "mobile_usability",
            "touch_targets",
            "viewport_issues",
            "image_optimization",
            "layout_issues",
        ],
    },
];

impl TeamDefinition {
    fn claims(&self, issue_type: &str) -> bool {
        let normalized = normalize(issue_type);
        self.issue_types
            .iter()
            .any(|t| *t == issue_type || normalized.contains(&normalize(t)))
    }
}

fn normalize(s: &str) -> String {
    s.to_lowercase().replace('_', " ")
}

/// Team responsible for an issue type. Unclaimed types go to the tech team.
pub fn team_for(issue_type: &str) -> TeamKey {
    TEAMS
        .iter()
        .find(|team| team.claims(issue_type))
        .map(|team| team.key)
        .unwrap_or(TeamKey::TechTeam)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamBucket {
    pub name: String,
    pub description: String,
    pub issue_types: Vec<String>,
    pub issues: Vec<Issue>,
    pub total_issues: usize,
    pub critical_issues: usize,
    pub high_issues: usize,
    pub avg_impact: f64,
    /// `critical * 10 + high * 5 + total`
    pub priority_score: usize,
}

impl TeamBucket {
    fn new(definition: &TeamDefinition) -> Self {
        Self {
            name: definition.name.to_string(),
            description: definition.description.to_string(),
            issue_types: definition.issue_types.iter().map(|t| t.to_string()).collect(),
            issues: Vec::new(),
            total_issues: 0,
            critical_issues: 0,
            high_issues: 0,
            avg_impact: 0.0,
            priority_score: 0,
        }
    }

    fn compute_metrics(&mut self) {
        let count = |severity: Severity| self.issues.iter().filter(|i| i.severity == severity).count();

        self.total_issues = self.issues.len();
        self.critical_issues = count(Severity::Critical);
        self.high_issues = count(Severity::High);
        self.avg_impact = if self.issues.is_empty() {
            0.0
        } else {
            self.issues
                .iter()
                .map(|i| f64::from(i.impact_score))
                .sum::<f64>()
                / self.issues.len() as f64
        };
        self.priority_score = self.critical_issues * 10 + self.high_issues * 5 + self.total_issues;
    }
}

/// Partition issues into the three team buckets, always returning all three.
pub fn route(issues: &[Issue]) -> BTreeMap<TeamKey, TeamBucket> {
    let mut buckets: BTreeMap<TeamKey, TeamBucket> = TEAMS
        .iter()
        .map(|team| (team.key, TeamBucket::new(team)))
        .collect();

    for issue in issues {
        let key = team_for(issue.issue_type.as_str());
        if let Some(bucket) = buckets.get_mut(&key) {
            bucket.issues.push(issue.clone());
        }
    }

    for bucket in buckets.values_mut() {
        bucket.compute_metrics();
    }

    buckets
}
