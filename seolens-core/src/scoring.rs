use crate::classify::{PageClassifier, PageType};
use crate::config::{DEFAULT_BASE_SEVERITY, ScoringConfig};
use crate::error::Result;
use crate::model::IssueType;

/// Weight for a page type absent from the configured table.
pub const DEFAULT_PAGE_WEIGHT: f64 = 2.0;

/// Strategic impact scoring: base severity of the issue type, scaled by the
/// business weight of the page it was found on.
#[derive(Debug, Clone)]
pub struct Scorer {
    config: ScoringConfig,
    classifier: PageClassifier,
}

impl Scorer {
    pub fn new(config: ScoringConfig) -> Result<Self> {
        config.validate()?;
        let classifier = PageClassifier::with_patterns(&config.page_patterns);
        Ok(Self { config, classifier })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn classify(&self, url: &str) -> PageType {
        self.classifier.classify(url)
    }

    pub fn weight_for(&self, page_type: PageType) -> f64 {
        self.config
            .page_weights
            .get(&page_type)
            .copied()
            .unwrap_or(DEFAULT_PAGE_WEIGHT)
    }

    pub fn page_weight(&self, url: &str) -> f64 {
        self.weight_for(self.classify(url))
    }

    pub fn base_severity(&self, issue_type: IssueType) -> u8 {
        self.config
            .severity
            .get(&issue_type)
            .copied()
            .unwrap_or(DEFAULT_BASE_SEVERITY)
    }

    pub fn is_high_priority(&self, url: &str) -> bool {
        self.page_weight(url) >= self.config.high_priority_weight
    }

    /// `min(100, round(base * weight / normalizer))`
    pub fn score(&self, issue_type: IssueType, url: &str) -> u8 {
        let base = f64::from(self.base_severity(issue_type));
        let raw = base * self.page_weight(url) / self.config.weight_normalizer;
        raw.round().clamp(0.0, 100.0) as u8
    }
}
