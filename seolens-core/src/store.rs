use crate::audit::AuditResult;
use crate::error::Result;
use crate::export::{IssueRow, issue_rows};
use crate::lifecycle::IssueKey;
use crate::model::IssueType;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// SQLite history of audit runs and their issues.
pub struct AuditStore {
    conn: Connection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredRun {
    pub id: String,
    pub site: String,
    pub audit_timestamp: DateTime<Utc>,
    pub seo_score: f64,
    pub total_issues: usize,
}

// Fixed-width so timestamps sort lexicographically
fn timestamp_text(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(idx: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl AuditStore {
    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn remove(path: &Path) -> Result<()> {
        fs::remove_file(path)?;
        Ok(())
    }

    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let store = AuditStore { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let store = AuditStore { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
CREATE TABLE IF NOT EXISTS audit_runs (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT UNIQUE NOT NULL,
    site TEXT NOT NULL,
    audit_timestamp TEXT NOT NULL,
    seo_score REAL NOT NULL,
    total_issues INTEGER NOT NULL,
    result_json TEXT NOT NULL      -- full AuditResult
);

CREATE INDEX IF NOT EXISTS idx_audit_runs_site ON audit_runs(site, audit_timestamp);

CREATE TABLE IF NOT EXISTS issues (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id TEXT NOT NULL,
    audit_timestamp TEXT NOT NULL,
    site TEXT NOT NULL,
    url TEXT NOT NULL,
    issue_type TEXT NOT NULL,
    severity TEXT NOT NULL CHECK(severity IN ('Critical', 'High', 'Medium', 'Low')),
    category TEXT NOT NULL,
    description TEXT NOT NULL,
    recommendation TEXT NOT NULL,
    impact_score INTEGER NOT NULL CHECK(impact_score BETWEEN 0 AND 100),
    status TEXT NOT NULL CHECK(status IN ('New', 'Existing', 'Fixed')),
    date_detected TEXT NOT NULL,

    FOREIGN KEY(run_id) REFERENCES audit_runs(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_issues_run ON issues(run_id);
CREATE INDEX IF NOT EXISTS idx_issues_url ON issues(site, url);
            ",
        )?;
        Ok(())
    }

    /// Store a run and all of its issues atomically. Returns the run id.
    pub fn record_run(&self, result: &AuditResult) -> Result<String> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let audit_timestamp = timestamp_text(&result.audit_timestamp);
        let result_json = serde_json::to_string(result)?;

        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO audit_runs (id, site, audit_timestamp, seo_score, total_issues, result_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &run_id,
                &result.site,
                &audit_timestamp,
                result.summary.seo_score,
                result.summary.total_issues as i64,
                &result_json,
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO issues (
                    run_id, audit_timestamp, site, url, issue_type, severity, category,
                    description, recommendation, impact_score, status, date_detected
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;

            for row in issue_rows(result) {
                stmt.execute(params![
                    &run_id,
                    &audit_timestamp,
                    &row.site,
                    &row.url,
                    &row.issue_type,
                    &row.severity,
                    &row.category,
                    &row.description,
                    &row.recommendation,
                    row.impact_score,
                    &row.status,
                    timestamp_text(&row.date_detected),
                ])?;
            }
        }

        tx.commit()?;
        debug!(
            "Stored run {} for {} with {} issues",
            run_id,
            result.site,
            result.issues.len()
        );
        Ok(run_id)
    }

    /// Most recent run of `site`, by audit timestamp.
    pub fn latest_run(&self, site: &str) -> Result<Option<StoredRun>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, site, audit_timestamp, seo_score, total_issues FROM audit_runs
             WHERE site = ?1 ORDER BY audit_timestamp DESC, seq DESC LIMIT 1",
        )?;

        let run = stmt
            .query_row(params![site], |row| {
                let ts: String = row.get(2)?;
                Ok(StoredRun {
                    id: row.get(0)?,
                    site: row.get(1)?,
                    audit_timestamp: parse_timestamp(2, &ts)?,
                    seo_score: row.get(3)?,
                    total_issues: row.get::<_, i64>(4)? as usize,
                })
            })
            .optional()?;
        Ok(run)
    }

    /// Most recent run of any site.
    pub fn latest_run_any(&self) -> Result<Option<StoredRun>> {
        let site: Option<String> = self
            .conn
            .query_row(
                "SELECT site FROM audit_runs ORDER BY audit_timestamp DESC, seq DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match site {
            Some(site) => self.latest_run(&site),
            None => Ok(None),
        }
    }

    pub fn run_issue_keys(&self, run_id: &str) -> Result<Vec<IssueKey>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, issue_type FROM issues WHERE run_id = ?1 ORDER BY id")?;

        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut keys = Vec::with_capacity(rows.len());
        for (url, issue_type) in rows {
            match issue_type.parse::<IssueType>() {
                Ok(issue_type) => keys.push(IssueKey::new(url, issue_type)),
                Err(e) => warn!("Ignoring stored issue for {}: {}", url, e),
            }
        }
        Ok(keys)
    }

    pub fn issues_for_run(&self, run_id: &str) -> Result<Vec<IssueRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT audit_timestamp, site, url, issue_type, severity, category, description,
                    recommendation, impact_score, status, date_detected
             FROM issues WHERE run_id = ?1
             ORDER BY CASE severity
                WHEN 'Critical' THEN 1
                WHEN 'High' THEN 2
                WHEN 'Medium' THEN 3
                WHEN 'Low' THEN 4
             END, impact_score DESC, id",
        )?;

        let rows = stmt
            .query_map(params![run_id], |row| {
                let audit_ts: String = row.get(0)?;
                let detected_ts: String = row.get(10)?;
                Ok(IssueRow {
                    audit_timestamp: parse_timestamp(0, &audit_ts)?,
                    site: row.get(1)?,
                    url: row.get(2)?,
                    issue_type: row.get(3)?,
                    severity: row.get(4)?,
                    category: row.get(5)?,
                    description: row.get(6)?,
                    recommendation: row.get(7)?,
                    impact_score: row.get(8)?,
                    status: row.get(9)?,
                    date_detected: parse_timestamp(10, &detected_ts)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    /// Full result of a stored run, as it was reported.
    pub fn load_result(&self, run_id: &str) -> Result<Option<AuditResult>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT result_json FROM audit_runs WHERE id = ?1",
                params![run_id],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}
