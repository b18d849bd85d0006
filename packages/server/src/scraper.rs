//! Website research via local HTTP + HTML parsing.
//!
//! Uses reqwest for fetching, the scraper crate for CSS-selector extraction,
//! and htmd for the markdown excerpt. No JavaScript rendering; static HTML
//! only. Heuristics are deliberately coarse: the controller only depends on
//! the shape of `CompanyFacts`, so a better extractor can swap in behind the
//! same trait.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::error::JobError;
use crate::pipeline::research::{CompanyFacts, CompanyResearcher};

/// Cap on the markdown excerpt carried into prompts.
const EXCERPT_CHARS: usize = 1500;

/// Maximum key points extracted from headings.
const MAX_KEY_POINTS: usize = 6;

pub struct SiteScraper {
    client: reqwest::Client,
}

impl SiteScraper {
    pub fn new() -> Result<Self> {
        // Browser-like User-Agent to avoid trivial bot blocks
        let user_agent = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {} for {}", status, url);
        }

        response.text().await.context("Failed to read response body")
    }

    /// Parse the input as an absolute http(s) URL, prepending https:// for
    /// bare domains.
    fn normalize_url(raw: &str) -> String {
        let raw = raw.trim();
        match Url::parse(raw) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => parsed.into(),
            _ => format!("https://{}", raw),
        }
    }

    fn select_texts(document: &Html, selector: &str, limit: usize) -> Vec<String> {
        let Ok(selector) = Selector::parse(selector) else {
            return Vec::new();
        };
        document
            .select(&selector)
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty())
            .take(limit)
            .collect()
    }

    fn extract_company_name(document: &Html) -> Option<String> {
        // og:site_name is usually the cleanest source; fall back to <title>
        let meta = Selector::parse(r#"meta[property="og:site_name"]"#).ok()?;
        if let Some(name) = document
            .select(&meta)
            .filter_map(|el| el.value().attr("content"))
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty())
        {
            return Some(name);
        }

        Self::select_texts(document, "title", 1)
            .into_iter()
            .next()
            .map(|title| {
                // Strip common "Name | tagline" and "Name - tagline" suffixes
                title
                    .split(&['|', '-', '\u{2013}'][..])
                    .next()
                    .unwrap_or(&title)
                    .trim()
                    .to_string()
            })
            .filter(|s| !s.is_empty())
    }

    fn extract_description(document: &Html) -> String {
        for selector in [
            r#"meta[name="description"]"#,
            r#"meta[property="og:description"]"#,
        ] {
            if let Ok(sel) = Selector::parse(selector) {
                if let Some(content) = document
                    .select(&sel)
                    .filter_map(|el| el.value().attr("content"))
                    .map(|s| s.trim().to_string())
                    .find(|s| !s.is_empty())
                {
                    return content;
                }
            }
        }

        // Fallback: first substantial paragraph
        Self::select_texts(document, "p", 10)
            .into_iter()
            .find(|p| p.len() > 80)
            .unwrap_or_default()
    }

    fn extract_testimonials(document: &Html) -> Vec<String> {
        let mut quotes = Self::select_texts(document, "blockquote", 5);
        quotes.extend(Self::select_texts(
            document,
            "[class*='testimonial'] p, [class*='review'] p",
            5,
        ));
        quotes.retain(|q| q.len() > 30 && q.len() < 500);
        quotes.truncate(5);
        quotes
    }

    fn extract_case_studies(document: &Html) -> Vec<String> {
        let Ok(selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };
        document
            .select(&selector)
            .filter(|el| {
                let href = el.value().attr("href").unwrap_or_default().to_lowercase();
                href.contains("case-stud") || href.contains("case_stud") || href.contains("customers/")
            })
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|t| t.len() > 10)
            .take(5)
            .collect()
    }

    fn guess_business_type(text: &str) -> String {
        let lower = text.to_lowercase();
        let guesses = [
            ("saas", "SaaS"),
            ("software", "Software"),
            ("agency", "Agency"),
            ("consulting", "Consulting"),
            ("e-commerce", "E-commerce"),
            ("ecommerce", "E-commerce"),
            ("manufactur", "Manufacturing"),
            ("nonprofit", "Nonprofit"),
            ("clinic", "Healthcare"),
            ("health", "Healthcare"),
            ("law firm", "Legal"),
            ("legal", "Legal"),
            ("real estate", "Real estate"),
        ];
        for (needle, label) in guesses {
            if lower.contains(needle) {
                return label.to_string();
            }
        }
        String::new()
    }

    fn markdown_excerpt(html: &str) -> String {
        let markdown = htmd::convert(html).unwrap_or_else(|_| {
            let document = Html::parse_document(html);
            document.root_element().text().collect::<String>()
        });
        let collapsed = collapse_whitespace(&markdown);
        truncate_chars(&collapsed, EXCERPT_CHARS)
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

#[async_trait]
impl CompanyResearcher for SiteScraper {
    async fn research(&self, url: &str) -> Result<CompanyFacts, JobError> {
        let url = Self::normalize_url(url);
        debug!(url = %url, "researching website");

        let html = self
            .fetch_html(&url)
            .await
            .map_err(|e| JobError::Research(format!("{}: {:#}", url, e)))?;
        let document = Html::parse_document(&html);

        let description = Self::extract_description(&document);
        let raw_excerpt = Self::markdown_excerpt(&html);
        let facts = CompanyFacts {
            company_name: Self::extract_company_name(&document).unwrap_or_else(|| url.clone()),
            business_type: Self::guess_business_type(&format!("{} {}", description, raw_excerpt)),
            key_points: Self::select_texts(&document, "h1, h2", MAX_KEY_POINTS),
            case_studies: Self::extract_case_studies(&document),
            testimonials: Self::extract_testimonials(&document),
            description,
            raw_excerpt,
        };

        debug!(
            url = %url,
            company = %facts.company_name,
            key_points = facts.key_points.len(),
            testimonials = facts.testimonials.len(),
            "research complete"
        );
        Ok(facts)
    }
}
