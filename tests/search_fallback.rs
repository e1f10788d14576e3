mod common;

use common::{bing_news_page, brave_page, ddg_page, links, service, settings};
use mixsearch::query::SearchArgs;
use mixsearch::results::BackendError;
use mixsearch::SearchError;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn args(query: &str) -> SearchArgs {
    SearchArgs {
        query: Some(query.to_string()),
        ..Default::default()
    }
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

#[tokio::test]
async fn falls_back_when_first_backend_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/brave/search"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ddg/html/"))
        .respond_with(html(ddg_page(&links("https://ddg.example", 4))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/bing/search"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let service = service(&settings(&server));
    let response = service
        .summaries(args("rust async"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.backend, "duckduckgo");
    assert_eq!(response.total_results, 4);
    assert!(response
        .results
        .iter()
        .all(|r| r.hit.backend == "duckduckgo" && r.hit.url.starts_with("https://ddg.example/")));
    assert_eq!(response.attempts.len(), 2);
    assert_eq!(response.attempts[0].backend, "brave");
    assert_eq!(response.attempts[0].error, Some(BackendError::HttpStatus(503)));
    assert!(response.attempts[1].succeeded());
}

#[tokio::test]
async fn all_backends_failing_is_one_error() {
    let server = MockServer::start().await;
    Mock::given(path("/brave/search"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    Mock::given(path("/ddg/html/"))
        .respond_with(html(
            r#"<html><body><div class="anomaly-modal">Please verify</div></body></html>"#.into(),
        ))
        .mount(&server)
        .await;
    Mock::given(path("/bing/search"))
        .respond_with(html("<html><body><ol id=\"b_results\"></ol></body></html>".into()))
        .mount(&server)
        .await;

    let service = service(&settings(&server));
    let err = service
        .full_search(args("rust async"), &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        SearchError::SearchUnavailable(reason) => {
            assert!(reason.contains("brave: HTTP error: 429"), "{reason}");
            assert!(reason.contains("duckduckgo: CAPTCHA required"), "{reason}");
            assert!(reason.contains("bing: no results"), "{reason}");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let stats = service.metrics().snapshot();
    assert_eq!(stats.failed_searches, 1);
    assert_eq!(stats.backends.len(), 3);
}

#[tokio::test]
async fn best_filter_coverage_is_tried_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bing/news/search"))
        .and(query_param("q", "climate policy"))
        .and(query_param("setlang", "fr"))
        .and(query_param("cc", "FR"))
        .and(query_param("qft", "interval=\"9\""))
        .respond_with(html(bing_news_page(&links("https://news.example", 6))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/brave/news"))
        .respond_with(html(brave_page(&links("https://brave.example", 6))))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(path("/ddg/html/"))
        .respond_with(html(ddg_page(&links("https://ddg.example", 6))))
        .expect(0)
        .mount(&server)
        .await;

    let service = service(&settings(&server));
    let response = service
        .summaries(
            SearchArgs {
                query: Some("climate policy".into()),
                country: Some("FR".into()),
                language: Some("fr".into()),
                recency_days: Some(30),
                source: Some("news".into()),
                limit: Some(3),
                ..Default::default()
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(response.backend, "bing");
    assert_eq!(response.total_results, 3);
    assert_eq!(response.attempts.len(), 1);
}

#[tokio::test]
async fn limit_and_top_n_bound_the_hits() {
    let server = MockServer::start().await;
    Mock::given(path("/brave/search"))
        .respond_with(html(brave_page(&links("https://brave.example", 8))))
        .mount(&server)
        .await;

    let service = service(&settings(&server));
    let cancel = CancellationToken::new();

    let mut a = args("rust");
    a.limit = Some(3);
    assert_eq!(service.summaries(a, &cancel).await.unwrap().total_results, 3);

    let mut a = args("rust");
    a.top_n = Some(2);
    assert_eq!(service.summaries(a, &cancel).await.unwrap().total_results, 2);

    let mut a = args("rust");
    a.limit = Some(4);
    a.top_n = Some(2);
    assert_eq!(service.summaries(a, &cancel).await.unwrap().total_results, 4);

    // clamped to the configured maximum
    let mut a = args("rust");
    a.limit = Some(50);
    assert_eq!(service.summaries(a, &cancel).await.unwrap().total_results, 8);
}

#[tokio::test]
async fn explicit_backend_is_honoured() {
    let server = MockServer::start().await;
    Mock::given(path("/brave/search"))
        .respond_with(html(brave_page(&links("https://brave.example", 3))))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(path("/bing/search"))
        .respond_with(html(
            r#"<html><body><ol id="b_results"><li class="b_algo"><h2><a href="https://bing.example/a">Bing A</a></h2><p>About A</p></li></ol></body></html>"#
                .to_string(),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let service = service(&settings(&server));
    let mut a = args("rust");
    a.backend = Some("Bing".into());
    let response = service.summaries(a, &CancellationToken::new()).await.unwrap();
    assert_eq!(response.backend, "bing");
    assert_eq!(response.results[0].hit.url, "https://bing.example/a");

    let mut a = args("rust");
    a.backend = Some("yahoo".into());
    let err = service.summaries(a, &CancellationToken::new()).await.unwrap_err();
    assert!(err.is_client_error());
}

#[tokio::test]
async fn slow_backend_times_out_and_falls_back() {
    let server = MockServer::start().await;
    Mock::given(path("/brave/search"))
        .respond_with(
            html(brave_page(&links("https://brave.example", 3))).set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    Mock::given(path("/ddg/html/"))
        .respond_with(html(ddg_page(&links("https://ddg.example", 3))))
        .mount(&server)
        .await;

    let mut settings = settings(&server);
    settings.search.backend_timeout = 0.5;
    let service = service(&settings);

    let started = Instant::now();
    let response = service
        .summaries(args("rust"), &CancellationToken::new())
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(response.backend, "duckduckgo");
    assert_eq!(response.attempts[0].backend, "brave");
    assert!(matches!(response.attempts[0].error, Some(BackendError::Timeout(_))));

    let stats = service.metrics().snapshot();
    assert_eq!(stats.backends["brave"].failures, 1);
    assert_eq!(stats.backends["duckduckgo"].successes, 1);
}
