// Declarative detection rules, one table per signal source.
//
// Each rule names the issue type it emits and a predicate over one record.
// The detector owns evaluation order, scoring and issue construction.

use crate::classify::PageType;
use crate::config::DetectorThresholds;
use crate::model::{IssueType, Severity};
use seolens_scanner::{CrawlRecord, PerformanceRecord, SearchPerformanceRecord, StructuredDataRecord};

/// What a rule reports when its predicate holds.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub severity: Severity,
    pub description: String,
    /// Replaces the rule's static recommendation when set.
    pub recommendation: Option<String>,
}

impl Detection {
    pub fn new(severity: Severity, description: impl Into<String>) -> Self {
        Self {
            severity,
            description: description.into(),
            recommendation: None,
        }
    }

    pub fn recommend(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }
}

/// A record together with what the rule needs to know about its page.
pub struct Signals<'a, R> {
    pub record: &'a R,
    pub page_type: PageType,
    pub thresholds: &'a DetectorThresholds,
}

pub struct Rule<R> {
    pub issue_type: IssueType,
    pub recommendation: &'static str,
    pub check: fn(&Signals<'_, R>) -> Option<Detection>,
}

pub static CRAWL_RULES: &[Rule<CrawlRecord>] = &[
    Rule {
        issue_type: IssueType::HttpError,
        recommendation: "Fix the HTTP error to ensure page is accessible",
        check: http_error,
    },
    Rule {
        issue_type: IssueType::SlowResponseTime,
        recommendation: "Optimize server response time to under 2 seconds",
        check: slow_response,
    },
    Rule {
        issue_type: IssueType::MissingTitleTag,
        recommendation: "Add descriptive title tag (50-60 characters)",
        check: missing_title,
    },
    Rule {
        issue_type: IssueType::MissingMetaDescription,
        recommendation: "Add compelling meta description (150-160 characters)",
        check: missing_meta_description,
    },
    Rule {
        issue_type: IssueType::MissingH1Tag,
        recommendation: "Add descriptive H1 tag for page hierarchy",
        check: missing_h1,
    },
    Rule {
        issue_type: IssueType::MultipleH1Tags,
        recommendation: "Use only one H1 tag per page",
        check: multiple_h1,
    },
    Rule {
        issue_type: IssueType::ImagesWithoutAltText,
        recommendation: "Add descriptive alt text to all images",
        check: images_without_alt,
    },
    Rule {
        issue_type: IssueType::LargePageSize,
        recommendation: "Optimize images and resources to reduce page size",
        check: large_page,
    },
    Rule {
        issue_type: IssueType::ThinContent,
        recommendation: "Add substantial, valuable content with at least 300+ words",
        check: thin_content,
    },
    Rule {
        issue_type: IssueType::ShortTitleTag,
        recommendation: "Expand title to 50-60 characters with descriptive keywords",
        check: short_title,
    },
    Rule {
        issue_type: IssueType::LongTitleTag,
        recommendation: "Shorten title to 50-60 characters to avoid truncation",
        check: long_title,
    },
    Rule {
        issue_type: IssueType::GenericTitleTag,
        recommendation: "Create unique, descriptive title with target keywords",
        check: generic_title,
    },
    Rule {
        issue_type: IssueType::ShortMetaDescription,
        recommendation: "Expand meta description to 150-160 characters",
        check: short_meta_description,
    },
    Rule {
        issue_type: IssueType::LongMetaDescription,
        recommendation: "Shorten meta description to 150-160 characters",
        check: long_meta_description,
    },
    Rule {
        issue_type: IssueType::MissingCanonicalTag,
        recommendation: "Add rel='canonical' tag to prevent duplicate content issues",
        check: missing_canonical,
    },
    Rule {
        issue_type: IssueType::InvalidCanonicalUrl,
        recommendation: "Fix canonical URL to be absolute and valid",
        check: invalid_canonical,
    },
    Rule {
        issue_type: IssueType::InsufficientInternalLinks,
        recommendation: "Add more contextual internal links to improve site navigation and SEO",
        check: insufficient_internal_links,
    },
    Rule {
        issue_type: IssueType::ExcessiveExternalLinks,
        recommendation: "Review external links and consider nofollow for non-essential links",
        check: excessive_external_links,
    },
    Rule {
        issue_type: IssueType::BlockedByRobotsMeta,
        recommendation: "Remove noindex/nofollow if page should be indexed",
        check: blocked_by_robots,
    },
];

pub static STRUCTURED_DATA_RULES: &[Rule<StructuredDataRecord>] = &[
    Rule {
        issue_type: IssueType::MissingStructuredData,
        recommendation: "Add relevant schema markup (Organization, Product, etc.)",
        check: missing_structured_data,
    },
    Rule {
        issue_type: IssueType::MissingProductSchema,
        recommendation: "Add Product schema with price, availability, and reviews",
        check: missing_product_schema,
    },
    Rule {
        issue_type: IssueType::MissingOrganizationSchema,
        recommendation: "Add Organization schema with company information",
        check: missing_organization_schema,
    },
];

pub static PERFORMANCE_RULES: &[Rule<PerformanceRecord>] = &[
    Rule {
        issue_type: IssueType::PoorCoreWebVitals,
        recommendation: "Improve LCP, CLS and input delay: defer render-blocking resources, reserve layout space, split long tasks",
        check: poor_core_web_vitals,
    },
    Rule {
        issue_type: IssueType::LowPerformanceScore,
        recommendation: "Address the PageSpeed opportunities listed for this page",
        check: low_performance_score,
    },
];

pub static SEARCH_RULES: &[Rule<SearchPerformanceRecord>] = &[
    Rule {
        issue_type: IssueType::HighImpressionsLowCtr,
        recommendation: "Improve title tag and meta description to increase click-through rate",
        check: high_impressions_low_ctr,
    },
    Rule {
        issue_type: IssueType::HighImpressionsPoorPosition,
        recommendation: "Optimize content and technical SEO to improve ranking position",
        check: high_impressions_poor_position,
    },
    Rule {
        issue_type: IssueType::HighImpressionsZeroClicks,
        recommendation: "Urgent: Review title/meta tags - page visible but not clickable",
        check: high_impressions_zero_clicks,
    },
    Rule {
        issue_type: IssueType::HighValuePageOpportunity,
        recommendation: "Prioritize optimization - this page has significant traffic potential",
        check: high_value_page,
    },
];

pub const CROSS_REFERENCE_RECOMMENDATION: &str =
    "URGENT: Fix technical issues on high-traffic page to prevent ranking loss";

/// `12345` -> `12,345`
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

// Crawl rules

fn http_error(s: &Signals<'_, CrawlRecord>) -> Option<Detection> {
    let code = s.record.status_code;
    if code < s.thresholds.client_error_status {
        return None;
    }
    let severity = if code >= s.thresholds.server_error_status {
        Severity::Critical
    } else {
        Severity::High
    };
    Some(
        Detection::new(severity, format!("HTTP {} error", code))
            .recommend(format!("Fix HTTP {} error to ensure page is accessible", code)),
    )
}

fn slow_response(s: &Signals<'_, CrawlRecord>) -> Option<Detection> {
    let secs = s.record.response_time;
    if secs <= s.thresholds.slow_response {
        return None;
    }
    let severity = if secs > s.thresholds.very_slow_response {
        Severity::High
    } else {
        Severity::Medium
    };
    Some(Detection::new(severity, format!("Response time: {:.2}s", secs)))
}

fn missing_title(s: &Signals<'_, CrawlRecord>) -> Option<Detection> {
    s.record
        .title
        .trim()
        .is_empty()
        .then(|| Detection::new(Severity::High, "Page is missing title tag"))
}

fn missing_meta_description(s: &Signals<'_, CrawlRecord>) -> Option<Detection> {
    s.record
        .meta_description
        .trim()
        .is_empty()
        .then(|| Detection::new(Severity::Medium, "Page is missing meta description"))
}

fn missing_h1(s: &Signals<'_, CrawlRecord>) -> Option<Detection> {
    s.record
        .h1_tags
        .is_empty()
        .then(|| Detection::new(Severity::Medium, "Page is missing H1 tag"))
}

fn multiple_h1(s: &Signals<'_, CrawlRecord>) -> Option<Detection> {
    let count = s.record.h1_tags.len();
    (count > 1).then(|| Detection::new(Severity::Low, format!("Page has {} H1 tags", count)))
}

fn images_without_alt(s: &Signals<'_, CrawlRecord>) -> Option<Detection> {
    let count = s.record.images_without_alt;
    (count > 0).then(|| {
        Detection::new(Severity::Medium, format!("{} images without alt text", count))
    })
}

fn large_page(s: &Signals<'_, CrawlRecord>) -> Option<Detection> {
    let size = s.record.page_size;
    (size > s.thresholds.max_page_size_bytes).then(|| {
        let mb = size as f64 / 1024.0 / 1024.0;
        Detection::new(Severity::Medium, format!("Page size: {:.2}MB", mb))
    })
}

fn thin_content(s: &Signals<'_, CrawlRecord>) -> Option<Detection> {
    let r = s.record;
    let length =
        char_len(&r.title) + char_len(&r.meta_description) + char_len(&r.h1_tags.join(" "));
    (length < s.thresholds.thin_content_chars).then(|| {
        Detection::new(
            Severity::High,
            format!("Insufficient content detected (estimated {} characters)", length),
        )
    })
}

fn short_title(s: &Signals<'_, CrawlRecord>) -> Option<Detection> {
    let len = char_len(s.record.title.trim());
    (len > 0 && len < s.thresholds.title_min_chars).then(|| {
        Detection::new(
            Severity::Medium,
            format!("Title tag too short ({} characters)", len),
        )
    })
}

fn long_title(s: &Signals<'_, CrawlRecord>) -> Option<Detection> {
    let len = char_len(s.record.title.trim());
    (len > s.thresholds.title_max_chars).then(|| {
        Detection::new(
            Severity::Medium,
            format!("Title tag too long ({} characters)", len),
        )
    })
}

fn generic_title(s: &Signals<'_, CrawlRecord>) -> Option<Detection> {
    let title = s.record.title.trim();
    if title.is_empty() {
        return None;
    }
    let lower = title.to_lowercase();
    s.thresholds
        .generic_title_patterns
        .iter()
        .any(|p| lower.contains(p.as_str()))
        .then(|| {
            Detection::new(
                Severity::High,
                format!("Generic/non-descriptive title: '{}'", title),
            )
        })
}

fn short_meta_description(s: &Signals<'_, CrawlRecord>) -> Option<Detection> {
    let len = char_len(s.record.meta_description.trim());
    (len > 0 && len < s.thresholds.meta_min_chars).then(|| {
        Detection::new(
            Severity::Low,
            format!("Meta description too short ({} characters)", len),
        )
    })
}

fn long_meta_description(s: &Signals<'_, CrawlRecord>) -> Option<Detection> {
    let len = char_len(s.record.meta_description.trim());
    (len > s.thresholds.meta_max_chars).then(|| {
        Detection::new(
            Severity::Low,
            format!("Meta description too long ({} characters)", len),
        )
    })
}

fn missing_canonical(s: &Signals<'_, CrawlRecord>) -> Option<Detection> {
    let missing = s
        .record
        .canonical_url
        .as_deref()
        .is_none_or(|c| c.trim().is_empty());
    missing.then(|| Detection::new(Severity::High, "Page missing canonical URL tag"))
}

fn invalid_canonical(s: &Signals<'_, CrawlRecord>) -> Option<Detection> {
    let canonical = s.record.canonical_url.as_deref()?.trim();
    if canonical.is_empty() || canonical == s.record.url || canonical.starts_with("http") {
        return None;
    }
    Some(Detection::new(
        Severity::High,
        format!("Invalid canonical URL: {}", canonical),
    ))
}

fn insufficient_internal_links(s: &Signals<'_, CrawlRecord>) -> Option<Detection> {
    let count = s.record.internal_links;
    (count < s.thresholds.min_internal_links).then(|| {
        Detection::new(
            Severity::Medium,
            format!("Only {} internal links found", count),
        )
    })
}

fn excessive_external_links(s: &Signals<'_, CrawlRecord>) -> Option<Detection> {
    let count = s.record.external_links;
    (count > s.thresholds.max_external_links).then(|| {
        Detection::new(Severity::Low, format!("{} external links found", count))
    })
}

fn blocked_by_robots(s: &Signals<'_, CrawlRecord>) -> Option<Detection> {
    let robots = s.record.robots_meta.to_lowercase();
    (robots.contains("noindex") && robots.contains("nofollow")).then(|| {
        Detection::new(
            Severity::Critical,
            format!("Page blocked by robots meta: {}", s.record.robots_meta),
        )
    })
}

// Structured data rules

fn missing_structured_data(s: &Signals<'_, StructuredDataRecord>) -> Option<Detection> {
    (s.record.json_ld_count == 0)
        .then(|| Detection::new(Severity::Medium, "No JSON-LD structured data found"))
}

fn missing_product_schema(s: &Signals<'_, StructuredDataRecord>) -> Option<Detection> {
    (s.page_type == PageType::Product && !s.record.has_type("Product")).then(|| {
        Detection::new(Severity::High, "Product page missing Product schema markup")
    })
}

fn missing_organization_schema(s: &Signals<'_, StructuredDataRecord>) -> Option<Detection> {
    (s.page_type == PageType::Homepage && !s.record.has_type("Organization")).then(|| {
        Detection::new(Severity::Medium, "Homepage missing Organization schema markup")
    })
}

// Core Web Vitals rules

fn poor_core_web_vitals(s: &Signals<'_, PerformanceRecord>) -> Option<Detection> {
    let r = s.record;
    let t = s.thresholds;
    let mut failing = Vec::new();

    if let Some(lcp) = r.lcp
        && lcp > t.max_lcp
    {
        failing.push(format!("LCP {:.2}s", lcp));
    }
    if let Some(cls) = r.cls
        && cls > t.max_cls
    {
        failing.push(format!("CLS {:.2}", cls));
    }
    if let Some(fid) = r.fid
        && fid > t.max_fid
    {
        failing.push(format!("FID {:.0}ms", fid * 1000.0));
    }

    if failing.is_empty() {
        return None;
    }
    Some(Detection::new(
        Severity::High,
        format!(
            "Core Web Vitals failing ({}): {}",
            r.strategy.as_str(),
            failing.join(", ")
        ),
    ))
}

fn low_performance_score(s: &Signals<'_, PerformanceRecord>) -> Option<Detection> {
    let score = s.record.performance_score?;
    if score >= s.thresholds.min_performance_score {
        return None;
    }

    let mut detection = Detection::new(
        Severity::Medium,
        format!(
            "PageSpeed performance score {}/100 ({})",
            score,
            s.record.strategy.as_str()
        ),
    );
    if !s.record.opportunities.is_empty() {
        let titles: Vec<&str> = s
            .record
            .opportunities
            .iter()
            .map(|o| o.title.as_str())
            .collect();
        detection = detection.recommend(format!("Address: {}", titles.join("; ")));
    }
    Some(detection)
}

// Search performance rules

fn high_impressions_low_ctr(s: &Signals<'_, SearchPerformanceRecord>) -> Option<Detection> {
    let r = s.record;
    (r.impressions > s.thresholds.low_ctr_impressions && r.ctr < s.thresholds.low_ctr).then(|| {
        Detection::new(
            Severity::High,
            format!(
                "Top page ({} impressions) has low CTR ({:.2}%) in {}",
                thousands(r.impressions),
                r.ctr * 100.0,
                r.domain
            ),
        )
    })
}

fn high_impressions_poor_position(s: &Signals<'_, SearchPerformanceRecord>) -> Option<Detection> {
    let r = s.record;
    (r.impressions > s.thresholds.poor_position_impressions
        && r.position > s.thresholds.poor_position)
        .then(|| {
            Detection::new(
                Severity::Medium,
                format!(
                    "Page with {} impressions ranking at position {:.1} in {}",
                    thousands(r.impressions),
                    r.position,
                    r.domain
                ),
            )
        })
}

fn high_impressions_zero_clicks(s: &Signals<'_, SearchPerformanceRecord>) -> Option<Detection> {
    let r = s.record;
    (r.impressions > s.thresholds.zero_clicks_impressions && r.clicks == 0).then(|| {
        Detection::new(
            Severity::Critical,
            format!(
                "Top visibility page ({} impressions) getting zero clicks in {}",
                thousands(r.impressions),
                r.domain
            ),
        )
    })
}

fn high_value_page(s: &Signals<'_, SearchPerformanceRecord>) -> Option<Detection> {
    let r = s.record;
    (r.impressions > s.thresholds.high_value_impressions).then(|| {
        Detection::new(
            Severity::Medium,
            format!(
                "High-value page ({} impressions, {} clicks) in {}",
                thousands(r.impressions),
                r.clicks,
                r.domain
            ),
        )
    })
}
