//! Bing search backend

use super::brave::collapse;
use super::traits::*;
use crate::query::{Category, TimeRange};
use crate::results::{BackendError, SearchHit};
use anyhow::Result;
use base64::Engine as _;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

const BASE_URL: &str = "https://www.bing.com";

static WEB_RESULT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("#b_results li.b_algo").expect("selector"));
static WEB_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h2 a").expect("selector"));
static WEB_SNIPPET: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".b_caption p, p").expect("selector"));
static NEWS_CARD: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.news-card").expect("selector"));
static NEWS_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("a.title").expect("selector"));
static NEWS_SNIPPET: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.snippet").expect("selector"));
static NEWS_AGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.source span[aria-label]").expect("selector"));

/// Bing web and news search
pub struct Bing {
    base_url: String,
}

impl Bing {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn parse_web(&self, document: &Html) -> Vec<SearchHit> {
        let mut hits = Vec::new();

        for element in document.select(&WEB_RESULT) {
            let Some(title_elem) = element.select(&WEB_TITLE).next() else {
                continue;
            };

            let title = collapse(&title_elem.text().collect::<String>());
            let raw_url = title_elem.value().attr("href").unwrap_or_default();
            if title.is_empty() || raw_url.is_empty() || raw_url.starts_with('/') {
                continue;
            }

            let mut hit = SearchHit::new(decode_url(raw_url), title, self.name());
            if let Some(snippet) = element.select(&WEB_SNIPPET).next() {
                hit = hit.with_description(collapse(&snippet.text().collect::<String>()));
            }
            hits.push(hit);
        }

        hits
    }

    fn parse_news(&self, document: &Html) -> Vec<SearchHit> {
        let mut hits = Vec::new();

        for card in document.select(&NEWS_CARD) {
            let Some(title_elem) = card.select(&NEWS_TITLE).next() else {
                continue;
            };

            let title = collapse(&title_elem.text().collect::<String>());
            let url = card
                .value()
                .attr("url")
                .or_else(|| title_elem.value().attr("href"))
                .unwrap_or_default();
            if title.is_empty() || url.is_empty() {
                continue;
            }

            let mut hit = SearchHit::new(decode_url(url), title, self.name());
            if let Some(snippet) = card.select(&NEWS_SNIPPET).next() {
                hit = hit.with_description(collapse(&snippet.text().collect::<String>()));
            }
            if let Some(age) = card
                .select(&NEWS_AGE)
                .next()
                .and_then(|a| a.value().attr("aria-label"))
            {
                hit = hit.with_published(age.to_string());
            }
            hits.push(hit);
        }

        hits
    }
}

impl Default for Bing {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode `https://www.bing.com/ck/a?...&u=a1<base64>` tracking links
fn decode_url(url: &str) -> String {
    if !url.starts_with("https://www.bing.com/ck/a?") {
        return url.to_string();
    }

    let Ok(parsed) = url::Url::parse(url) else {
        return url.to_string();
    };
    let Some((_, encoded)) = parsed.query_pairs().find(|(k, _)| k == "u") else {
        return url.to_string();
    };

    let payload = encoded.strip_prefix("a1").unwrap_or(&*encoded);
    let payload = payload.trim_end_matches('=');
    base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| url.to_string())
}

impl Backend for Bing {
    fn name(&self) -> &str {
        "bing"
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::new()
            .language()
            .country()
            .time_range()
            .categories(&[Category::News])
    }

    fn request(&self, params: &RequestParams) -> Result<EngineRequest> {
        let path = match params.category {
            Category::News => "news/search",
            _ => "search",
        };

        let mut request =
            EngineRequest::get(format!("{}/{}", self.base_url, path)).param("q", &params.query);

        if let Some(ref lang) = params.language {
            request = request.param("setlang", lang);
        }
        if let Some(ref country) = params.country {
            request = request.param("cc", country);
            let lang = params.language.as_deref().unwrap_or("en");
            request = request.param("mkt", format!("{}-{}", lang, country));
        }

        if let Some(range) = params.time_range {
            request = match params.category {
                Category::News => {
                    let interval = match range {
                        TimeRange::Day => "7",
                        TimeRange::Week => "8",
                        TimeRange::Month | TimeRange::Year => "9",
                    };
                    request.param("qft", format!("interval=\"{interval}\""))
                }
                _ => {
                    let filter = match range {
                        TimeRange::Day => "ex1:\"ez1\"",
                        TimeRange::Week => "ex1:\"ez2\"",
                        TimeRange::Month => "ex1:\"ez3\"",
                        TimeRange::Year => "ex1:\"ez5\"",
                    };
                    request.param("filters", filter)
                }
            };
        }

        Ok(request.cookie("SRCHHPGUSR", "ADLT=MODERATE"))
    }

    fn response(&self, response: EngineResponse) -> Result<Vec<SearchHit>> {
        let document = Html::parse_document(&response.text);
        let mut hits = self.parse_web(&document);
        if hits.is_empty() {
            hits = self.parse_news(&document);
        }
        if hits.is_empty() && response.is_captcha() {
            return Err(BackendError::Captcha.into());
        }
        Ok(hits)
    }
}
