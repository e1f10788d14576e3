//! Brave search backend

use super::traits::*;
use crate::query::{Category, TimeRange};
use crate::results::{BackendError, SearchHit};
use anyhow::Result;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

const BASE_URL: &str = "https://search.brave.com";

static SNIPPET: Lazy<Selector> = Lazy::new(|| Selector::parse("div.snippet").expect("selector"));
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("selector"));
static TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".title, .snippet-title").expect("selector"));
static DESCRIPTION: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".snippet-description, .snippet-content, .generic-snippet .content")
        .expect("selector")
});
static AGE: Lazy<Selector> = Lazy::new(|| Selector::parse(".snippet-age, .age").expect("selector"));

/// Brave web, news, image and video search, scraped over HTTP
pub struct Brave {
    base_url: String,
}

impl Brave {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Point the backend at another host (used for mirrors and tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for Brave {
    fn default() -> Self {
        Self::new()
    }
}

/// Brave's `tf` value for a time range
pub(crate) fn time_filter(range: TimeRange) -> &'static str {
    match range {
        TimeRange::Day => "pd",
        TimeRange::Week => "pw",
        TimeRange::Month => "pm",
        TimeRange::Year => "py",
    }
}

/// Parse a Brave result page; shared with the browser backend
pub(crate) fn parse_results(html: &str, backend: &str) -> Vec<SearchHit> {
    let document = Html::parse_document(html);
    let mut hits = Vec::new();

    for element in document.select(&SNIPPET) {
        let Some(link) = element.select(&LINK).next() else {
            continue;
        };

        let url = link.value().attr("href").unwrap_or_default().trim().to_string();
        if url.is_empty() || url.starts_with('/') {
            continue;
        }

        let title = element
            .select(&TITLE)
            .next()
            .map(|t| t.text().collect::<String>())
            .unwrap_or_else(|| link.text().collect::<String>());
        let title = collapse(&title);
        if title.is_empty() {
            continue;
        }

        let mut hit = SearchHit::new(url, title, backend);
        if let Some(desc) = element.select(&DESCRIPTION).next() {
            hit = hit.with_description(collapse(&desc.text().collect::<String>()));
        }
        if let Some(age) = element.select(&AGE).next() {
            let age = collapse(&age.text().collect::<String>());
            if !age.is_empty() {
                hit = hit.with_published(age.trim_end_matches(" -").to_string());
            }
        }

        hits.push(hit);
    }

    hits
}

pub(crate) fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl Backend for Brave {
    fn name(&self) -> &str {
        "brave"
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::new()
            .language()
            .time_range()
            .categories(&[Category::News, Category::Images, Category::Videos])
    }

    fn request(&self, params: &RequestParams) -> Result<EngineRequest> {
        let path = match params.category {
            Category::Web => "search",
            Category::News => "news",
            Category::Images => "images",
            Category::Videos => "videos",
        };

        let mut request = EngineRequest::get(format!("{}/{}", self.base_url, path))
            .param("q", &params.query)
            .param("source", "web")
            .cookie("safesearch", "moderate")
            .cookie("useLocation", "0");

        if let Some(range) = params.time_range {
            request = request.param("tf", time_filter(range));
        }
        if let Some(ref lang) = params.language {
            request = request
                .cookie("search_lang", lang)
                .cookie("ui_lang", lang)
                .header("Accept-Language", lang);
        }

        Ok(request)
    }

    fn response(&self, response: EngineResponse) -> Result<Vec<SearchHit>> {
        let hits = parse_results(&response.text, self.name());
        if hits.is_empty() && response.text.contains("captcha") {
            return Err(BackendError::Captcha.into());
        }
        Ok(hits)
    }
}
