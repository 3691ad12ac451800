// XML sitemap discovery

use crate::error::Result;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, warn};

/// Upper bound on sitemap documents fetched for one audit, index included.
const MAX_SITEMAPS: usize = 50;

/// Entries of one sitemap document. A plain sitemap lists pages under
/// `<url>`, a sitemap index lists child sitemaps under `<sitemap>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sitemap {
    pub pages: Vec<String>,
    pub sitemaps: Vec<String>,
}

fn locs(document: &Html, selector: &str) -> Vec<String> {
    let selector = Selector::parse(selector).expect("static CSS selector");
    document
        .select(&selector)
        .map(|e| e.text().collect::<String>().trim().to_string())
        .filter(|u| !u.is_empty())
        .collect()
}

pub fn parse_sitemap(xml: &str) -> Sitemap {
    let document = Html::parse_document(xml);
    Sitemap {
        pages: locs(&document, "url > loc"),
        sitemaps: locs(&document, "sitemap > loc"),
    }
}

async fn fetch_document(client: &Client, url: &str) -> Result<Sitemap> {
    debug!("Fetching sitemap {}", url);
    let response = client.get(url).send().await?.error_for_status()?;
    let body = response.text().await?;
    Ok(parse_sitemap(&body))
}

/// Page URLs of a sitemap in document order, following sitemap indexes.
/// Only a failure to fetch `sitemap_url` itself is an error; unreachable
/// child sitemaps are skipped.
pub async fn fetch_sitemap(client: &Client, sitemap_url: &str) -> Result<Vec<String>> {
    let root = fetch_document(client, sitemap_url).await?;

    let mut visited: HashSet<String> = HashSet::from([sitemap_url.to_string()]);
    let mut pending: VecDeque<String> = root.sitemaps.into_iter().collect();
    let mut pages = root.pages;

    while let Some(child) = pending.pop_front() {
        if !visited.insert(child.clone()) {
            continue;
        }
        if visited.len() > MAX_SITEMAPS {
            warn!("Stopping after {} sitemaps, {} not fetched", MAX_SITEMAPS, pending.len() + 1);
            break;
        }
        match fetch_document(client, &child).await {
            Ok(sitemap) => {
                pages.extend(sitemap.pages);
                pending.extend(sitemap.sitemaps);
            }
            Err(e) => warn!("Skipping sitemap {}: {}", child, e),
        }
    }

    info!("Sitemap {} listed {} URLs", sitemap_url, pages.len());
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    const SITEMAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://www.example.com/</loc><lastmod>2024-01-01</lastmod></url>
  <url><loc> https://www.example.com/photo-books/ </loc></url>
  <url><loc></loc></url>
</urlset>"#;

    fn index(children: &[String]) -> String {
        let entries: String = children
            .iter()
            .map(|c| format!("<sitemap><loc>{}</loc><lastmod>2024-01-01</lastmod></sitemap>", c))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</sitemapindex>"#,
            entries
        )
    }

    #[test]
    fn test_parse_sitemap() {
        let sitemap = parse_sitemap(SITEMAP);
        assert_eq!(
            sitemap.pages,
            vec![
                "https://www.example.com/".to_string(),
                "https://www.example.com/photo-books/".to_string(),
            ]
        );
        assert!(sitemap.sitemaps.is_empty());
    }

    #[test]
    fn test_parse_sitemap_index() {
        let xml = index(&["https://www.example.com/products.xml".to_string()]);
        let sitemap = parse_sitemap(&xml);
        assert!(sitemap.pages.is_empty());
        assert_eq!(sitemap.sitemaps, vec!["https://www.example.com/products.xml"]);
    }

    #[tokio::test]
    async fn test_fetch_sitemap() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SITEMAP))
            .mount(&mock_server)
            .await;

        let client = Client::new();
        let urls = fetch_sitemap(&client, &format!("{}/sitemap.xml", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(urls.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_sitemap_follows_index() {
        let mock_server = MockServer::start().await;
        let root = format!("{}/sitemap.xml", mock_server.uri());
        let pages = format!("{}/pages.xml", mock_server.uri());
        let missing = format!("{}/missing.xml", mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(index(&[
                    pages.clone(),
                    missing,
                    root.clone(),
                    pages,
                ])),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pages.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SITEMAP))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing.xml"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = Client::new();
        let urls = fetch_sitemap(&client, &root).await.unwrap();
        assert_eq!(
            urls,
            vec![
                "https://www.example.com/".to_string(),
                "https://www.example.com/photo-books/".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_sitemap_http_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = Client::new();
        let result = fetch_sitemap(&client, &format!("{}/sitemap.xml", mock_server.uri())).await;
        assert!(result.is_err());
    }
}
