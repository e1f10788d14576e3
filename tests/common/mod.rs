//! Shared fixtures: a wiremock server standing in for every backend and
//! result page

#![allow(dead_code)]

use mixsearch::config::{BackendConfig, Settings};
use mixsearch::engines::BackendLoader;
use mixsearch::metrics::Metrics;
use mixsearch::network::HttpClient;
use mixsearch::WebSearchService;
use std::sync::Arc;
use wiremock::MockServer;

/// Settings pointing every backend at `server`, browser disabled
pub fn settings(server: &MockServer) -> Settings {
    let uri = server.uri();
    let mut settings = Settings::default();
    settings.browser.enabled = false;
    settings.search.backend_timeout = 2.0;
    settings.extraction.http_timeout = 2.0;
    settings.backends = vec![
        backend("brave", format!("{uri}/brave")),
        backend("duckduckgo", format!("{uri}/ddg/html/")),
        backend("bing", format!("{uri}/bing")),
    ];
    settings
}

fn backend(name: &str, base_url: String) -> BackendConfig {
    BackendConfig {
        name: name.to_string(),
        base_url: Some(base_url),
        ..Default::default()
    }
}

pub fn service(settings: &Settings) -> Arc<WebSearchService> {
    let registry = BackendLoader::load(settings).expect("registry");
    let client = HttpClient::with_settings(&settings.outgoing).expect("client");
    Arc::new(WebSearchService::from_settings(
        settings,
        registry,
        client,
        None,
        Arc::new(Metrics::new()),
    ))
}

/// `(url, title)` pairs as a Brave result page
pub fn brave_page(links: &[(String, String)]) -> String {
    let snippets: String = links
        .iter()
        .map(|(url, title)| {
            format!(
                r#"<div class="snippet"><a href="{url}"><div class="title">{title}</div></a>
                   <div class="snippet-description">About {title}</div></div>"#
            )
        })
        .collect();
    format!(r#"<html><body><div id="results">{snippets}</div></body></html>"#)
}

pub fn ddg_page(links: &[(String, String)]) -> String {
    let results: String = links
        .iter()
        .map(|(url, title)| {
            format!(
                r#"<div class="result results_links"><a class="result__a" href="{url}">{title}</a>
                   <a class="result__snippet">About {title}</a></div>"#
            )
        })
        .collect();
    format!("<html><body>{results}</body></html>")
}

pub fn bing_news_page(links: &[(String, String)]) -> String {
    let cards: String = links
        .iter()
        .map(|(url, title)| {
            format!(
                r#"<div class="news-card" url="{url}"><a class="title" href="{url}">{title}</a>
                   <div class="snippet">About {title}</div></div>"#
            )
        })
        .collect();
    format!("<html><body>{cards}</body></html>")
}

/// `n` result links on `site`, under `/page/<i>`
pub fn links(site: &str, n: usize) -> Vec<(String, String)> {
    (0..n)
        .map(|i| (format!("{site}/page/{i}"), format!("Result {i}")))
        .collect()
}

/// An article long enough to count as meaningful content
pub fn article(marker: &str, words: usize) -> String {
    format!(
        "<html><head><title>{marker}</title></head><body><nav>menu</nav><article><h1>{marker}</h1><p>{}</p></article></body></html>",
        vec!["content"; words].join(" ")
    )
}
