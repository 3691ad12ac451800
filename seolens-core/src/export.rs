// Per-team ticket exports and flat issue rows

use crate::aggregate::AuditSummary;
use crate::audit::AuditResult;
use crate::model::{Issue, Severity};
use crate::teams::{TeamBucket, TeamKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TicketPriority {
    Highest,
    High,
    Medium,
    Low,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Highest => "Highest",
            TicketPriority::High => "High",
            TicketPriority::Medium => "Medium",
            TicketPriority::Low => "Low",
        }
    }
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn severity_priority(severity: Severity) -> TicketPriority {
    match severity {
        Severity::Critical => TicketPriority::Highest,
        Severity::High => TicketPriority::High,
        Severity::Medium => TicketPriority::Medium,
        Severity::Low => TicketPriority::Low,
    }
}

pub fn team_priority(bucket: &TeamBucket) -> TicketPriority {
    if bucket.critical_issues > 0 {
        TicketPriority::Highest
    } else if bucket.high_issues > 0 {
        TicketPriority::High
    } else {
        TicketPriority::Medium
    }
}

pub fn overall_priority(summary: &AuditSummary) -> TicketPriority {
    if summary.critical_issues > 5 {
        TicketPriority::Highest
    } else if summary.critical_issues > 0 || summary.high_issues > 10 {
        TicketPriority::High
    } else if summary.high_issues > 0 {
        TicketPriority::Medium
    } else {
        TicketPriority::Low
    }
}

pub fn team_labels(team: TeamKey) -> &'static [&'static str] {
    match team {
        TeamKey::TechTeam => &["tech-team", "seo-tech", "backend"],
        TeamKey::MarketingTeam => &["marketing-team", "seo-content", "content"],
        TeamKey::DesignTeam => &["design-team", "ux-team", "frontend"],
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamExportSummary {
    pub total_issues: usize,
    pub critical_issues: usize,
    pub high_issues: usize,
    pub priority_score: usize,
    pub avg_impact: f64,
}

/// An issue as a ticket, prioritised by its own severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueTicket {
    pub ticket_priority: TicketPriority,
    #[serde(flatten)]
    pub issue: Issue,
}

impl IssueTicket {
    pub fn new(issue: &Issue) -> Self {
        Self {
            ticket_priority: severity_priority(issue.severity),
            issue: issue.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamExport {
    pub team_name: String,
    pub description: String,
    pub ticket_priority: TicketPriority,
    pub labels: Vec<String>,
    pub summary: TeamExportSummary,
    pub detailed_issues: Vec<IssueTicket>,
}

/// One export per team that has at least one issue.
pub fn team_exports(summary: &AuditSummary) -> BTreeMap<TeamKey, TeamExport> {
    summary
        .team_breakdown
        .iter()
        .filter(|(_, bucket)| bucket.total_issues > 0)
        .map(|(key, bucket)| {
            let export = TeamExport {
                team_name: bucket.name.clone(),
                description: bucket.description.clone(),
                ticket_priority: team_priority(bucket),
                labels: team_labels(*key).iter().map(|l| l.to_string()).collect(),
                summary: TeamExportSummary {
                    total_issues: bucket.total_issues,
                    critical_issues: bucket.critical_issues,
                    high_issues: bucket.high_issues,
                    priority_score: bucket.priority_score,
                    avg_impact: bucket.avg_impact,
                },
                detailed_issues: bucket.issues.iter().map(IssueTicket::new).collect(),
            };
            (*key, export)
        })
        .collect()
}

/// Flat, storage-friendly view of one issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRow {
    pub audit_timestamp: DateTime<Utc>,
    pub site: String,
    pub url: String,
    pub issue_type: String,
    pub severity: String,
    pub category: String,
    pub description: String,
    pub recommendation: String,
    pub impact_score: u8,
    pub status: String,
    pub date_detected: DateTime<Utc>,
}

impl IssueRow {
    pub fn new(audit_timestamp: DateTime<Utc>, site: &str, issue: &Issue) -> Self {
        Self {
            audit_timestamp,
            site: site.to_string(),
            url: issue.url.clone(),
            issue_type: issue.issue_type.as_str().to_string(),
            severity: issue.severity.as_str().to_string(),
            category: issue.category.as_str().to_string(),
            description: issue.description.clone(),
            recommendation: issue.recommendation.clone(),
            impact_score: issue.impact_score,
            status: issue.status.as_str().to_string(),
            date_detected: issue.date_detected,
        }
    }

    pub const CSV_HEADER: [&'static str; 11] = [
        "audit_timestamp",
        "site",
        "url",
        "issue_type",
        "severity",
        "category",
        "description",
        "recommendation",
        "impact_score",
        "status",
        "date_detected",
    ];

    pub fn csv_fields(&self) -> [String; 11] {
        [
            self.audit_timestamp.to_rfc3339(),
            self.site.clone(),
            self.url.clone(),
            self.issue_type.clone(),
            self.severity.clone(),
            self.category.clone(),
            self.description.clone(),
            self.recommendation.clone(),
            self.impact_score.to_string(),
            self.status.clone(),
            self.date_detected.to_rfc3339(),
        ]
    }
}

pub fn issue_rows(result: &AuditResult) -> Vec<IssueRow> {
    result
        .issues
        .iter()
        .map(|issue| IssueRow::new(result.audit_timestamp, &result.site, issue))
        .collect()
}
