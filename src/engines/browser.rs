//! Browser-rendered Brave search, the last-resort backend

use super::brave::{parse_results, time_filter};
use super::traits::*;
use crate::results::{BackendError, SearchHit};
use anyhow::Result;

const BASE_URL: &str = "https://search.brave.com";

/// Brave's result page loaded in the headless browser.
///
/// Always scheduled after every HTTP backend. Supports the country filter
/// through the URL, which plain HTTP scraping cannot use.
pub struct BrowserSearch {
    base_url: String,
}

impl BrowserSearch {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for BrowserSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for BrowserSearch {
    fn name(&self) -> &str {
        "browser"
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::new().language().country().time_range()
    }

    fn transport(&self) -> Transport {
        Transport::Browser
    }

    fn timeout(&self) -> f64 {
        30.0
    }

    fn request(&self, params: &RequestParams) -> Result<EngineRequest> {
        let mut request = EngineRequest::get(format!("{}/search", self.base_url))
            .param("q", &params.query)
            .param("spellcheck", "1");

        if let Some(ref country) = params.country {
            request = request.param("country", country);
        }
        if let Some(ref lang) = params.language {
            request = request.param("lang", lang);
        }
        if let Some(range) = params.time_range {
            request = request.param("tf", time_filter(range));
        }

        Ok(request)
    }

    fn response(&self, response: EngineResponse) -> Result<Vec<SearchHit>> {
        let hits = parse_results(&response.text, self.name());
        if hits.is_empty() && response.is_captcha() {
            return Err(BackendError::Captcha.into());
        }
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::TimeRange;

    #[test]
    fn test_browser_url_carries_all_filters() {
        let mut params = RequestParams::new("climate policy");
        params.country = Some("FR".into());
        params.language = Some("fr".into());
        params.time_range = Some(TimeRange::Month);

        let backend = BrowserSearch::new();
        assert_eq!(backend.transport(), Transport::Browser);

        let url = backend.request(&params).unwrap().full_url().unwrap();
        assert_eq!(
            url,
            "https://search.brave.com/search?country=FR&lang=fr&q=climate+policy&spellcheck=1&tf=pm"
        );
    }
}
