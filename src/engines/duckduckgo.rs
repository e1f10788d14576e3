//! DuckDuckGo search backend (HTML endpoint)

use super::brave::collapse;
use super::traits::*;
use crate::query::TimeRange;
use crate::results::{BackendError, SearchHit};
use anyhow::Result;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashMap;

const HTML_URL: &str = "https://html.duckduckgo.com/html/";

static RESULT: Lazy<Selector> = Lazy::new(|| Selector::parse("div.result").expect("selector"));
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("a.result__a").expect("selector"));
static SNIPPET: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".result__snippet").expect("selector"));
static TIMESTAMP: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".result__timestamp").expect("selector"));

/// DuckDuckGo web search
pub struct DuckDuckGo {
    html_url: String,
}

impl DuckDuckGo {
    pub fn new() -> Self {
        Self::with_base_url(HTML_URL)
    }

    pub fn with_base_url(html_url: impl Into<String>) -> Self {
        Self {
            html_url: html_url.into(),
        }
    }

    /// Region code, `fr-fr` style; `wt-wt` means no region
    fn region(params: &RequestParams) -> String {
        match (&params.country, &params.language) {
            (Some(country), Some(lang)) => format!("{}-{}", country.to_lowercase(), lang),
            (Some(country), None) => format!("{}-en", country.to_lowercase()),
            _ => "wt-wt".to_string(),
        }
    }

    fn parse_results(&self, html: &str) -> Vec<SearchHit> {
        let document = Html::parse_document(html);
        let mut hits = Vec::new();

        for element in document.select(&RESULT) {
            // Sponsored entries
            if element.value().classes().any(|c| c == "result--ad") {
                continue;
            }

            let Some(title_elem) = element.select(&TITLE).next() else {
                continue;
            };

            let title = collapse(&title_elem.text().collect::<String>());
            if title.is_empty() {
                continue;
            }

            let raw_url = title_elem.value().attr("href").unwrap_or_default();
            let url = unwrap_redirect(raw_url);
            if url.is_empty() || url.contains("duckduckgo.com/y.js") {
                continue;
            }

            let mut hit = SearchHit::new(url, title, self.name());
            if let Some(snippet) = element.select(&SNIPPET).next() {
                hit = hit.with_description(collapse(&snippet.text().collect::<String>()));
            }
            if let Some(ts) = element.select(&TIMESTAMP).next() {
                hit = hit.with_published(collapse(&ts.text().collect::<String>()));
            }

            hits.push(hit);
        }

        hits
    }
}

impl Default for DuckDuckGo {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve `//duckduckgo.com/l/?uddg=<target>` redirect links
fn unwrap_redirect(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };

    if absolute.contains("duckduckgo.com/l/") {
        if let Ok(parsed) = url::Url::parse(&absolute) {
            if let Some((_, target)) = parsed.query_pairs().find(|(k, _)| k == "uddg") {
                return target.into_owned();
            }
        }
    }

    absolute
}

impl Backend for DuckDuckGo {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::new().language().country().time_range()
    }

    fn request(&self, params: &RequestParams) -> Result<EngineRequest> {
        let mut form_data = HashMap::new();
        form_data.insert("q".to_string(), params.query.clone());
        form_data.insert("b".to_string(), String::new());
        form_data.insert("kl".to_string(), Self::region(params));

        if let Some(range) = params.time_range {
            let df = match range {
                TimeRange::Day => "d",
                TimeRange::Week => "w",
                TimeRange::Month => "m",
                TimeRange::Year => "y",
            };
            form_data.insert("df".to_string(), df.to_string());
        }

        let mut request = EngineRequest::post(&self.html_url).form(form_data);
        if let Some(ref lang) = params.language {
            request = request.header("Accept-Language", lang);
        }

        Ok(request)
    }

    fn response(&self, response: EngineResponse) -> Result<Vec<SearchHit>> {
        if response.text.contains("anomaly-modal") || response.is_captcha() {
            return Err(BackendError::Captcha.into());
        }
        Ok(self.parse_results(&response.text))
    }
}
