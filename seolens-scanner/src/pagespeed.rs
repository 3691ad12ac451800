// PageSpeed Insights collector (lab Core Web Vitals)

use crate::error::{Result, ScanError};
use crate::record::{Opportunity, PerformanceRecord, Strategy};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub const PAGESPEED_ENDPOINT: &str =
    "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

const OPPORTUNITY_AUDITS: [&str; 5] = [
    "render-blocking-resources",
    "unused-css-rules",
    "unused-javascript",
    "modern-image-formats",
    "offscreen-images",
];

pub struct PageSpeedClient {
    client: Client,
    api_key: String,
    endpoint: String,
    delay: Duration,
}

impl PageSpeedClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: PAGESPEED_ENDPOINT.to_string(),
            delay: Duration::from_secs(1),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Pause between consecutive requests in `fetch_batch` (API quota).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub async fn fetch(&self, url: &str, strategy: Strategy) -> Result<PerformanceRecord> {
        debug!("Fetching PageSpeed data for {} ({})", url, strategy.as_str());

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("url", url),
                ("key", self.api_key.as_str()),
                ("strategy", strategy.as_str()),
                ("category", "performance"),
                ("locale", "en"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ScanError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await?;
        Ok(parse_pagespeed_response(url, strategy, &body))
    }

    /// Fetch every (url, strategy) pair sequentially. Failures are logged and
    /// skipped.
    pub async fn fetch_batch(&self, urls: &[String], strategies: &[Strategy]) -> Vec<PerformanceRecord> {
        let mut records = Vec::new();
        let mut first = true;

        for url in urls {
            for strategy in strategies {
                if !first && !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                first = false;

                match self.fetch(url, *strategy).await {
                    Ok(record) => records.push(record),
                    Err(e) => warn!("PageSpeed error for {} ({}): {}", url, strategy.as_str(), e),
                }
            }
        }

        records
    }
}

fn numeric_value(audits: &Value, key: &str) -> Option<f64> {
    audits.get(key)?.get("numericValue")?.as_f64()
}

pub fn parse_pagespeed_response(url: &str, strategy: Strategy, body: &Value) -> PerformanceRecord {
    let lighthouse = &body["lighthouseResult"];
    let audits = &lighthouse["audits"];

    let mut record = PerformanceRecord::new(url.to_string(), strategy);

    record.performance_score = lighthouse["categories"]["performance"]["score"]
        .as_f64()
        .map(|s| (s * 100.0).round().clamp(0.0, 100.0) as u8);

    // Lighthouse reports timings in milliseconds
    record.lcp = numeric_value(audits, "largest-contentful-paint").map(|ms| ms / 1000.0);
    record.fid = numeric_value(audits, "max-potential-fid").map(|ms| ms / 1000.0);
    record.cls = numeric_value(audits, "cumulative-layout-shift");

    for key in OPPORTUNITY_AUDITS {
        let audit = &audits[key];
        if audit.is_null() {
            continue;
        }
        if audit["score"].as_f64().unwrap_or(1.0) < 1.0 {
            record.opportunities.push(Opportunity {
                audit: key.to_string(),
                title: audit["title"].as_str().unwrap_or_default().to_string(),
                savings_ms: audit["details"]["overallSavingsMs"].as_f64().unwrap_or(0.0),
            });
        }
    }

    record
}
