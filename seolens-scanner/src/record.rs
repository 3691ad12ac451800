use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// On-page signals for one URL, produced once per audit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlRecord {
    pub url: String,
    pub status_code: u16,
    /// Seconds from request start to the full body being read.
    pub response_time: f64,
    pub title: String,
    pub meta_description: String,
    pub h1_tags: Vec<String>,
    pub canonical_url: Option<String>,
    pub robots_meta: String,
    pub internal_links: usize,
    pub external_links: usize,
    pub images_without_alt: usize,
    pub page_size: u64,
}

impl CrawlRecord {
    pub fn new(url: String) -> Self {
        Self {
            url,
            status_code: 0,
            response_time: 0.0,
            title: String::new(),
            meta_description: String::new(),
            h1_tags: Vec::new(),
            canonical_url: None,
            robots_meta: String::new(),
            internal_links: 0,
            external_links: 0,
            images_without_alt: 0,
            page_size: 0,
        }
    }
}

/// JSON-LD inventory for one URL. A record with `error` set means the
/// inspection itself failed and carries no usable signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredDataRecord {
    pub url: String,
    pub json_ld_count: usize,
    pub schema_types: BTreeSet<String>,
    pub validation_notes: Vec<String>,
    pub error: Option<String>,
}

impl StructuredDataRecord {
    pub fn new(url: String) -> Self {
        Self {
            url,
            json_ld_count: 0,
            schema_types: BTreeSet::new(),
            validation_notes: Vec::new(),
            error: None,
        }
    }

    pub fn with_error(url: String, error: String) -> Self {
        Self {
            url,
            json_ld_count: 0,
            schema_types: BTreeSet::new(),
            validation_notes: Vec::new(),
            error: Some(error),
        }
    }

    pub fn has_type(&self, schema_type: &str) -> bool {
        self.schema_types.contains(schema_type)
    }
}

/// Search-performance statistics for one (url, domain) pair over the audit window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPerformanceRecord {
    pub url: String,
    #[serde(default)]
    pub date: String,
    pub clicks: u64,
    pub impressions: u64,
    pub ctr: f64,
    pub position: f64,
    #[serde(default)]
    pub domain: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Mobile,
    Desktop,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Mobile => "mobile",
            Strategy::Desktop => "desktop",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub audit: String,
    pub title: String,
    pub savings_ms: f64,
}

/// Lab performance data (Core Web Vitals) for one URL and strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub url: String,
    pub strategy: Strategy,
    pub performance_score: Option<u8>,
    /// Largest Contentful Paint, seconds.
    pub lcp: Option<f64>,
    pub cls: Option<f64>,
    /// Max potential First Input Delay, seconds.
    pub fid: Option<f64>,
    #[serde(default)]
    pub opportunities: Vec<Opportunity>,
}

impl PerformanceRecord {
    pub fn new(url: String, strategy: Strategy) -> Self {
        Self {
            url,
            strategy,
            performance_score: None,
            lcp: None,
            cls: None,
            fid: None,
            opportunities: Vec::new(),
        }
    }
}
