use crate::classify::PageType;
use crate::error::{AuditError, Result};
use crate::model::IssueType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Base severity for an issue type missing from a configuration. Only
/// reachable through an unvalidated config.
pub const DEFAULT_BASE_SEVERITY: u8 = 50;

/// Numeric cut-offs used by the detector rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorThresholds {
    pub server_error_status: u16,
    pub client_error_status: u16,
    /// Seconds.
    pub slow_response: f64,
    pub very_slow_response: f64,
    pub max_page_size_bytes: u64,
    pub thin_content_chars: usize,
    pub title_min_chars: usize,
    pub title_max_chars: usize,
    pub meta_min_chars: usize,
    pub meta_max_chars: usize,
    pub generic_title_patterns: Vec<String>,
    pub min_internal_links: usize,
    pub max_external_links: usize,
    pub duplicate_title_min_chars: usize,
    pub duplicate_meta_min_chars: usize,
    pub low_ctr_impressions: u64,
    pub low_ctr: f64,
    pub poor_position_impressions: u64,
    pub poor_position: f64,
    pub zero_clicks_impressions: u64,
    pub high_value_impressions: u64,
    pub cross_reference_impressions: u64,
    /// Seconds.
    pub max_lcp: f64,
    pub max_cls: f64,
    /// Seconds.
    pub max_fid: f64,
    pub min_performance_score: u8,
}

impl Default for DetectorThresholds {
    fn default() -> Self {
        Self {
            server_error_status: 500,
            client_error_status: 400,
            slow_response: 3.0,
            very_slow_response: 5.0,
            max_page_size_bytes: 1024 * 1024,
            thin_content_chars: 200,
            title_min_chars: 30,
            title_max_chars: 70,
            meta_min_chars: 120,
            meta_max_chars: 170,
            generic_title_patterns: ["untitled", "new page", "home page", "welcome", "default", "page"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            min_internal_links: 3,
            max_external_links: 50,
            duplicate_title_min_chars: 10,
            duplicate_meta_min_chars: 20,
            low_ctr_impressions: 1000,
            low_ctr: 0.02,
            poor_position_impressions: 500,
            poor_position: 10.0,
            zero_clicks_impressions: 1000,
            high_value_impressions: 10_000,
            cross_reference_impressions: 1000,
            max_lcp: 2.5,
            max_cls: 0.1,
            max_fid: 0.1,
            min_performance_score: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub severity: BTreeMap<IssueType, u8>,
    pub page_weights: BTreeMap<PageType, f64>,
    /// Extra lower-case path substrings appended to the built-in page rules.
    pub page_patterns: BTreeMap<PageType, Vec<String>>,
    /// Assumed average page weight; an average page scores its base severity.
    pub weight_normalizer: f64,
    /// Divisor turning the weighted average impact into score points.
    pub impact_scale: f64,
    /// Page weight at or above which a page counts as high priority.
    pub high_priority_weight: f64,
    pub thresholds: DetectorThresholds,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            severity: default_severity_table(),
            page_weights: PageType::ALL
                .iter()
                .map(|t| (*t, t.default_weight()))
                .collect(),
            page_patterns: BTreeMap::new(),
            weight_normalizer: 2.5,
            impact_scale: 50.0,
            high_priority_weight: 4.0,
            thresholds: DetectorThresholds::default(),
        }
    }
}

fn default_severity_table() -> BTreeMap<IssueType, u8> {
    use IssueType::*;

    [
        (BlockedByRobotsMeta, 100),
        (MissingTitleTag, 95),
        (HighImpressionsZeroClicks, 95),
        (PoorCoreWebVitals, 95),
        (HttpError, 90),
        (HighTrafficTechnicalIssues, 90),
        (ThinContent, 85),
        (DuplicateTitleTags, 80),
        (SlowResponseTime, 80),
        (GenericTitleTag, 75),
        (MissingCanonicalTag, 75),
        (InvalidCanonicalUrl, 75),
        (MissingProductSchema, 70),
        (HighImpressionsLowCtr, 70),
        (MissingH1Tag, 65),
        (HighImpressionsPoorPosition, 60),
        (LowPerformanceScore, 60),
        (ShortTitleTag, 55),
        (LargePageSize, 55),
        (DuplicateMetaDescriptions, 50),
        (LongTitleTag, 50),
        (MissingStructuredData, 50),
        (HighValuePageOpportunity, 50),
        (InsufficientInternalLinks, 45),
        (MissingOrganizationSchema, 45),
        (MissingMetaDescription, 45),
        (ImagesWithoutAltText, 40),
        (ExcessiveExternalLinks, 30),
        (MultipleH1Tags, 30),
        (ShortMetaDescription, 25),
        (LongMetaDescription, 25),
    ]
    .into_iter()
    .collect()
}

/// Partial configuration as written in `scoring.json`. Table entries and
/// scalars present here replace the defaults, everything else is kept.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ScoringOverrides {
    severity: BTreeMap<IssueType, u8>,
    page_weights: BTreeMap<PageType, f64>,
    page_patterns: BTreeMap<PageType, Vec<String>>,
    weight_normalizer: Option<f64>,
    impact_scale: Option<f64>,
    high_priority_weight: Option<f64>,
    thresholds: Option<DetectorThresholds>,
}

impl ScoringConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let overrides: ScoringOverrides = serde_json::from_str(json)?;
        let mut config = ScoringConfig::default();

        config.severity.extend(overrides.severity);
        config.page_weights.extend(overrides.page_weights);
        config.page_patterns.extend(overrides.page_patterns);
        if let Some(v) = overrides.weight_normalizer {
            config.weight_normalizer = v;
        }
        if let Some(v) = overrides.impact_scale {
            config.impact_scale = v;
        }
        if let Some(v) = overrides.high_priority_weight {
            config.high_priority_weight = v;
        }
        if let Some(thresholds) = overrides.thresholds {
            config.thresholds = thresholds;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Every issue type the detector can emit must have a base severity.
    pub fn validate(&self) -> Result<()> {
        for issue_type in IssueType::ALL {
            match self.severity.get(issue_type) {
                None => return Err(AuditError::MissingSeverity(*issue_type)),
                Some(value) if *value > 100 => {
                    return Err(AuditError::InvalidSeverity {
                        issue_type: *issue_type,
                        value: *value,
                    });
                }
                Some(_) => {}
            }
        }

        for (page_type, value) in &self.page_weights {
            if !value.is_finite() || *value <= 0.0 {
                return Err(AuditError::InvalidWeight {
                    page_type: *page_type,
                    value: *value,
                });
            }
        }

        for (name, value) in [
            ("weight_normalizer", self.weight_normalizer),
            ("impact_scale", self.impact_scale),
            ("high_priority_weight", self.high_priority_weight),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(AuditError::InvalidConstant { name, value });
            }
        }

        let t = &self.thresholds;
        if t.slow_response > t.very_slow_response {
            return Err(AuditError::Config(
                "thresholds.slow_response must not exceed thresholds.very_slow_response".into(),
            ));
        }
        if t.title_min_chars > t.title_max_chars || t.meta_min_chars > t.meta_max_chars {
            return Err(AuditError::Config(
                "length thresholds must have min <= max".into(),
            ));
        }

        Ok(())
    }
}
