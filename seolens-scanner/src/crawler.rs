use crate::error::Result;
use crate::record::{CrawlRecord, StructuredDataRecord};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Called with (pages finished so far, url) every time a fetch completes.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Everything collected for one bounded URL list.
#[derive(Debug, Clone, Default)]
pub struct CrawlBatch {
    /// One record per URL that was fetched, in input order.
    pub records: Vec<CrawlRecord>,
    /// One entry per input URL; failed fetches carry an error marker.
    pub structured_data: Vec<StructuredDataRecord>,
    /// (url, error) for every fetch that failed.
    pub failures: Vec<(String, String)>,
}

pub struct Crawler {
    client: Client,
    timeout_secs: u64,
    progress_callback: Option<ProgressCallback>,
}

impl Crawler {
    pub fn new() -> Result<Self> {
        Self::with_timeout(30)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent("SeoLens-Audit-Bot/0.3 (https://github.com/trapdoorsec/seolens)")
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs((timeout_secs / 2).max(1)))
            .pool_max_idle_per_host(20)
            .pool_idle_timeout(Duration::from_secs(90))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            timeout_secs,
            progress_callback: None,
        })
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Fetch every URL with at most `workers` requests in flight.
    ///
    /// Individual failures never abort the batch: the URL is logged, left out
    /// of `records`, and its structured-data slot gets an error marker.
    pub async fn fetch_all(&self, urls: &[String], workers: usize) -> CrawlBatch {
        let workers = workers.max(1);
        info!("Fetching {} URLs with {} workers", urls.len(), workers);

        let client = &self.client;
        let progress = self.progress_callback.as_ref();
        let finished = AtomicUsize::new(0);
        let finished = &finished;

        let mut outcomes: Vec<(usize, String, Result<(CrawlRecord, StructuredDataRecord)>)> =
            stream::iter(urls.iter().enumerate())
                .map(|(idx, url)| async move {
                    let outcome = Self::fetch_page(client, url).await;
                    let count = finished.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(callback) = progress {
                        callback(count, url.clone());
                    }
                    (idx, url.clone(), outcome)
                })
                .buffer_unordered(workers)
                .collect()
                .await;

        // Completion order is arbitrary; restore input order.
        outcomes.sort_by_key(|(idx, _, _)| *idx);

        let mut batch = CrawlBatch::default();
        for (_, url, outcome) in outcomes {
            match outcome {
                Ok((record, structured)) => {
                    batch.records.push(record);
                    batch.structured_data.push(structured);
                }
                Err(e) => {
                    warn!("Crawl error for {}: {}", url, e);
                    batch
                        .structured_data
                        .push(StructuredDataRecord::with_error(url.clone(), e.to_string()));
                    batch.failures.push((url, e.to_string()));
                }
            }
        }

        info!(
            "Fetch complete. {} pages collected, {} failed",
            batch.records.len(),
            batch.failures.len()
        );
        batch
    }

    async fn fetch_page(client: &Client, url: &str) -> Result<(CrawlRecord, StructuredDataRecord)> {
        debug!("Fetching {}", url);

        let start = Instant::now();
        let response = client.get(url).send().await?;
        let status_code = response.status().as_u16();
        let body = response.bytes().await?;
        let response_time = start.elapsed().as_secs_f64();

        let html = String::from_utf8_lossy(&body);
        let (mut record, structured) = parse_page(url, &html);
        record.status_code = status_code;
        record.response_time = response_time;
        record.page_size = body.len() as u64;

        Ok((record, structured))
    }
}

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static CSS selector")
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Extract on-page SEO fields and the JSON-LD inventory from an HTML body.
///
/// Status, timing and size are transport facts and are left at their defaults.
pub fn parse_page(url: &str, html: &str) -> (CrawlRecord, StructuredDataRecord) {
    let document = Html::parse_document(html);
    let mut record = CrawlRecord::new(url.to_string());

    record.title = document
        .select(&selector("title"))
        .next()
        .map(element_text)
        .unwrap_or_default();

    record.meta_description = document
        .select(&selector(r#"meta[name="description"]"#))
        .next()
        .and_then(|e| e.value().attr("content"))
        .map(|c| c.trim().to_string())
        .unwrap_or_default();

    record.h1_tags = document.select(&selector("h1")).map(element_text).collect();

    record.canonical_url = document
        .select(&selector(r#"link[rel="canonical"]"#))
        .next()
        .and_then(|e| e.value().attr("href"))
        .map(String::from);

    record.robots_meta = document
        .select(&selector(r#"meta[name="robots"]"#))
        .next()
        .and_then(|e| e.value().attr("content"))
        .map(String::from)
        .unwrap_or_default();

    let base_host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(String::from));
    for anchor in document.select(&selector("a[href]")) {
        let href = anchor.value().attr("href").unwrap_or_default();
        if is_internal_link(href, base_host.as_deref()) {
            record.internal_links += 1;
        } else {
            record.external_links += 1;
        }
    }

    record.images_without_alt = document
        .select(&selector("img"))
        .filter(|img| {
            img.value()
                .attr("alt")
                .map(|alt| alt.trim().is_empty())
                .unwrap_or(true)
        })
        .count();

    let structured = extract_structured_data(url, &document);
    (record, structured)
}

/// Relative links are internal; absolute http(s) links are internal when the
/// host matches the page host.
fn is_internal_link(href: &str, base_host: Option<&str>) -> bool {
    if href.starts_with("http") {
        return Url::parse(href)
            .ok()
            .and_then(|u| u.host_str().map(String::from))
            .as_deref()
            == base_host;
    }
    true
}

fn extract_structured_data(url: &str, document: &Html) -> StructuredDataRecord {
    let mut structured = StructuredDataRecord::new(url.to_string());

    for (idx, script) in document
        .select(&selector(r#"script[type="application/ld+json"]"#))
        .enumerate()
    {
        structured.json_ld_count += 1;
        let raw = script.text().collect::<String>();
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => collect_schema_types(&value, &mut structured.schema_types),
            Err(e) => structured
                .validation_notes
                .push(format!("JSON-LD block {} is not valid JSON: {}", idx + 1, e)),
        }
    }

    structured
}

fn collect_schema_types(value: &Value, types: &mut std::collections::BTreeSet<String>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_schema_types(item, types);
            }
        }
        Value::Object(map) => {
            match map.get("@type") {
                Some(Value::String(t)) => {
                    types.insert(t.clone());
                }
                Some(Value::Array(ts)) => {
                    types.extend(ts.iter().filter_map(|t| t.as_str().map(String::from)));
                }
                _ => {}
            }
            if let Some(graph) = map.get("@graph") {
                collect_schema_types(graph, types);
            }
        }
        _ => {}
    }
}
