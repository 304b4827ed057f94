//! OpenGraph-based metadata fetcher.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::{MediaDescriptor, MetadataConfig, MetadataError, MetadataFetcher};
use crate::metrics;
use crate::urls::UrlPolicy;

static OG_TITLE: Lazy<Selector> = Lazy::new(|| meta_selector("og:title"));
static OG_DURATION: Lazy<Selector> = Lazy::new(|| meta_selector("og:video:duration"));
static OG_IMAGE: Lazy<Selector> = Lazy::new(|| meta_selector("og:image"));
static OG_DESCRIPTION: Lazy<Selector> = Lazy::new(|| meta_selector("og:description"));
static TITLE_TAG: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static VIEW_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?[KMB]?)\s*views?").unwrap());

fn meta_selector(property: &str) -> Selector {
    Selector::parse(&format!(r#"meta[property="{}"]"#, property)).unwrap()
}

/// Fetches the video page and reads its OpenGraph tags.
pub struct PageMetadataFetcher {
    client: Client,
    policy: UrlPolicy,
}

impl PageMetadataFetcher {
    pub fn new(config: &MetadataConfig, policy: UrlPolicy) -> Result<Self, MetadataError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.5"),
        );
        headers.insert(
            header::UPGRADE_INSECURE_REQUESTS,
            HeaderValue::from_static("1"),
        );
        headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("document"));
        headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("navigate"));
        headers.insert("Sec-Fetch-Site", HeaderValue::from_static("none"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self { client, policy })
    }

    /// Mobile variant first, then the original. The first 200 response wins.
    async fn fetch_page(&self, url: &str) -> Result<String, MetadataError> {
        let mobile = self.policy.to_mobile_variant(url);
        let mut attempts = vec![mobile];
        if attempts[0] != url {
            attempts.push(url.to_string());
        }

        for attempt in &attempts {
            match self.get(attempt).await {
                Ok(body) => return Ok(body),
                Err(e) => debug!("Metadata attempt for {} failed: {}", attempt, e),
            }
        }
        Err(MetadataError::Exhausted)
    }

    async fn get(&self, url: &str) -> Result<String, MetadataError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(MetadataError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl MetadataFetcher for PageMetadataFetcher {
    async fn fetch(&self, url: &str) -> MediaDescriptor {
        match self.fetch_page(url).await {
            Ok(body) => parse_page(&body),
            Err(e) => {
                warn!("Metadata prefetch failed for {}: {}", url, e);
                metrics::METADATA_FALLBACKS.inc();
                MediaDescriptor::default()
            }
        }
    }
}

/// Extract a [`MediaDescriptor`] from raw page HTML.
pub fn parse_page(html: &str) -> MediaDescriptor {
    let document = Html::parse_document(html);
    let mut descriptor = MediaDescriptor::default();

    if let Some(title) = meta_content(&document, &OG_TITLE) {
        descriptor.title = title;
    } else if let Some(tag) = document.select(&TITLE_TAG).next() {
        let page_title = tag.text().collect::<String>().trim().to_string();
        if !page_title.is_empty() && !page_title.contains("Facebook") {
            descriptor.title = page_title;
        }
    }

    descriptor.duration = meta_content(&document, &OG_DURATION)
        .and_then(|d| d.trim().parse().ok())
        .unwrap_or(0);
    descriptor.thumbnail = meta_content(&document, &OG_IMAGE);
    descriptor.description = meta_content(&document, &OG_DESCRIPTION);

    if descriptor.title.to_lowercase().contains("view") {
        descriptor.view_count = VIEW_COUNT
            .captures(&descriptor.title)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());
    }

    descriptor
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}
