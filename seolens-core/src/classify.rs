// URL-based page classification

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    Homepage,
    Product,
    Category,
    Checkout,
    Pricing,
    Contact,
    About,
    Blog,
    Other,
}

impl PageType {
    pub const ALL: [PageType; 9] = [
        PageType::Homepage,
        PageType::Product,
        PageType::Category,
        PageType::Checkout,
        PageType::Pricing,
        PageType::Contact,
        PageType::About,
        PageType::Blog,
        PageType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Homepage => "homepage",
            PageType::Product => "product",
            PageType::Category => "category",
            PageType::Checkout => "checkout",
            PageType::Pricing => "pricing",
            PageType::Contact => "contact",
            PageType::About => "about",
            PageType::Blog => "blog",
            PageType::Other => "other",
        }
    }

    /// Business weight used when a configuration does not override it.
    pub fn default_weight(&self) -> f64 {
        match self {
            PageType::Homepage => 5.0,
            PageType::Checkout => 4.8,
            PageType::Product => 4.5,
            PageType::Pricing => 4.5,
            PageType::Category => 4.0,
            PageType::Contact => 3.0,
            PageType::About => 2.5,
            PageType::Blog => 2.0,
            PageType::Other => 2.0,
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const HOMEPAGE_SEGMENTS: [&str; 6] = [
    "home",
    "index",
    "index.html",
    "index.htm",
    "index.php",
    "default.aspx",
];

// Evaluated in order, first match wins.
const DEFAULT_RULES: [(PageType, &[&str]); 7] = [
    (PageType::Product, &["/product", "/p/"]),
    (PageType::Category, &["/category", "/c/"]),
    (PageType::Checkout, &["/checkout", "/cart", "/basket"]),
    (PageType::Pricing, &["/pricing", "/plans"]),
    (PageType::About, &["/about", "/company"]),
    (PageType::Contact, &["/contact", "/support"]),
    (PageType::Blog, &["/blog", "/news"]),
];

/// Ordered substring rules over the lower-cased URL path.
#[derive(Debug, Clone)]
pub struct PageClassifier {
    rules: Vec<(PageType, Vec<String>)>,
}

impl Default for PageClassifier {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES
                .iter()
                .map(|(page_type, patterns)| {
                    (*page_type, patterns.iter().map(|p| p.to_string()).collect())
                })
                .collect(),
        }
    }
}

impl PageClassifier {
    /// Default rules plus site-specific patterns appended to each type's list.
    pub fn with_patterns(extra: &BTreeMap<PageType, Vec<String>>) -> Self {
        let mut classifier = Self::default();
        for (page_type, patterns) in extra {
            let patterns = patterns.iter().map(|p| p.to_lowercase());
            match classifier.rules.iter().position(|(t, _)| t == page_type) {
                Some(index) => classifier.rules[index].1.extend(patterns),
                None if *page_type != PageType::Homepage && *page_type != PageType::Other => {
                    classifier.rules.push((*page_type, patterns.collect()))
                }
                None => {}
            }
        }
        classifier
    }

    pub fn classify(&self, url: &str) -> PageType {
        let path = url_path(url);

        if is_homepage_path(&path) {
            return PageType::Homepage;
        }

        self.rules
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|p| path.contains(p.as_str())))
            .map(|(page_type, _)| *page_type)
            .unwrap_or(PageType::Other)
    }
}

/// Classify with the built-in rules.
pub fn classify(url: &str) -> PageType {
    PageClassifier::default().classify(url)
}

fn url_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_lowercase(),
        // Not an absolute URL, treat the whole string as a path
        Err(_) => url.to_lowercase(),
    }
}

fn is_homepage_path(path: &str) -> bool {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [] => true,
        [only] => HOMEPAGE_SEGMENTS.contains(only),
        _ => false,
    }
}
