use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|sev| sev.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown severity '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Crawlability,
    Performance,
    Content,
    #[serde(rename = "Technical SEO")]
    TechnicalSeo,
    #[serde(rename = "GSC Performance")]
    SearchPerformance,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Crawlability => "Crawlability",
            Category::Performance => "Performance",
            Category::Content => "Content",
            Category::TechnicalSeo => "Technical SEO",
            Category::SearchPerformance => "GSC Performance",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IssueStatus {
    #[default]
    New,
    Existing,
    Fixed,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::New => "New",
            IssueStatus::Existing => "Existing",
            IssueStatus::Fixed => "Fixed",
        }
    }
}

macro_rules! issue_types {
    ($($variant:ident => $name:literal, $category:ident;)+) => {
        /// Closed set of issue kinds. The display name doubles as the
        /// serialized form and the key in severity tables.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum IssueType {
            $(
                #[serde(rename = $name)]
                $variant,
            )+
        }

        impl IssueType {
            pub const ALL: &'static [IssueType] = &[$(IssueType::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(IssueType::$variant => $name,)+
                }
            }

            /// Every issue type belongs to exactly one category.
            pub fn category(&self) -> Category {
                match self {
                    $(IssueType::$variant => Category::$category,)+
                }
            }
        }
    };
}

issue_types! {
    HttpError => "HTTP Error", Crawlability;
    SlowResponseTime => "Slow Response Time", Performance;
    LargePageSize => "Large Page Size", Performance;
    MissingTitleTag => "Missing Title Tag", Content;
    ShortTitleTag => "Short Title Tag", Content;
    LongTitleTag => "Long Title Tag", Content;
    GenericTitleTag => "Generic Title Tag", Content;
    MissingMetaDescription => "Missing Meta Description", Content;
    ShortMetaDescription => "Short Meta Description", Content;
    LongMetaDescription => "Long Meta Description", Content;
    MissingH1Tag => "Missing H1 Tag", Content;
    MultipleH1Tags => "Multiple H1 Tags", Content;
    ImagesWithoutAltText => "Images Without Alt Text", Content;
    ThinContent => "Thin Content", Content;
    DuplicateTitleTags => "Duplicate Title Tags", Content;
    DuplicateMetaDescriptions => "Duplicate Meta Descriptions", Content;
    MissingCanonicalTag => "Missing Canonical Tag", TechnicalSeo;
    InvalidCanonicalUrl => "Invalid Canonical URL", TechnicalSeo;
    InsufficientInternalLinks => "Insufficient Internal Links", TechnicalSeo;
    ExcessiveExternalLinks => "Excessive External Links", TechnicalSeo;
    BlockedByRobotsMeta => "Blocked by Robots Meta", Crawlability;
    MissingStructuredData => "Missing Structured Data", TechnicalSeo;
    MissingProductSchema => "Missing Product Schema", TechnicalSeo;
    MissingOrganizationSchema => "Missing Organization Schema", TechnicalSeo;
    PoorCoreWebVitals => "Poor Core Web Vitals", Performance;
    LowPerformanceScore => "Low Performance Score", Performance;
    HighImpressionsLowCtr => "High Impressions Low CTR", SearchPerformance;
    HighImpressionsPoorPosition => "High Impressions Poor Position", SearchPerformance;
    HighImpressionsZeroClicks => "High Impressions Zero Clicks", SearchPerformance;
    HighValuePageOpportunity => "High Value Page Opportunity", SearchPerformance;
    HighTrafficTechnicalIssues => "High Traffic Page with Technical Issues", SearchPerformance;
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IssueType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown issue type '{}'", s))
    }
}

/// One detected problem on one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub url: String,
    pub issue_type: IssueType,
    pub severity: Severity,
    pub category: Category,
    pub description: String,
    pub recommendation: String,
    pub date_detected: DateTime<Utc>,
    pub status: IssueStatus,
    /// 0..=100, derived from the base severity and the page's business weight.
    pub impact_score: u8,
}
