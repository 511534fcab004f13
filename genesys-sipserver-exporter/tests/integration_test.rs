//! Integration tests for the SIP Server exporter.
//!
//! These tests run the exporter against fake SIP Server status pages served
//! on ephemeral ports and scrape it over HTTP, the way Prometheus would.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tokio::sync::watch;

use genesys_sipserver_exporter::config::UpstreamConfig;
use genesys_sipserver_exporter::{HttpServer, Scraper, StatusFetcher};

const FIXTURE: &str = include_str!("fixtures/serverx.xml");

/// A running exporter. Dropping it stops the server.
struct Exporter {
    addr: SocketAddr,
    _shutdown: watch::Sender<bool>,
}

impl Exporter {
    async fn start(upstream: UpstreamConfig) -> Self {
        let fetcher = StatusFetcher::new(&upstream).unwrap();
        let scraper = Arc::new(Scraper::new(fetcher));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let server = HttpServer::new(scraper, addr, "/metrics".to_string());
        tokio::spawn(async move {
            let _ = server.serve(listener, shutdown_rx).await;
        });

        Self {
            addr,
            _shutdown: shutdown_tx,
        }
    }

    async fn scrape(&self, query: &str) -> (StatusCode, String, String) {
        self.scrape_with_accept(query, None).await
    }

    async fn scrape_with_accept(
        &self,
        query: &str,
        accept: Option<&str>,
    ) -> (StatusCode, String, String) {
        let url = format!("http://{}/metrics{}", self.addr, query);
        let mut request = reqwest::Client::new().get(url);
        if let Some(accept) = accept {
            request = request.header("accept", accept);
        }

        let response = request.send().await.unwrap();
        let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await.unwrap();
        (status, content_type, body)
    }
}

/// Serve a fake `/serverx` page and return its `host:port`.
async fn fake_sip_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr.to_string()
}

async fn serving(body: String) -> String {
    fake_sip_server(Router::new().route(
        "/serverx",
        get(move || {
            let body = body.clone();
            async move { body }
        }),
    ))
    .await
}

/// A `host:port` with nothing listening.
async fn closed_port() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let target = listener.local_addr().unwrap().to_string();
    drop(listener);
    target
}

/// Sample lines (not comments) of the exposition body.
fn sample_lines(body: &str) -> Vec<&str> {
    body.lines()
        .filter(|l| !l.starts_with('#') && !l.trim().is_empty())
        .collect()
}

/// Sample lines carrying SIP Server application labels.
fn target_lines(body: &str) -> Vec<&str> {
    sample_lines(body)
        .into_iter()
        .filter(|l| l.contains("app_name="))
        .collect()
}

#[tokio::test]
async fn test_scrape_primary_server() {
    let target = serving(FIXTURE.to_string()).await;
    let exporter = Exporter::start(UpstreamConfig::default()).await;

    let (status, content_type, body) = exporter.scrape(&format!("?target={}", target)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/plain; version=0.0.4"));

    let labels = r#"app_name="SIPS_PRIMARY",app_version="8.1.103.95",app_ha_role="primary""#;
    assert!(body.contains(&format!("genesys_sipserver_cpu_usage{{{}}} 3.75\n", labels)));
    assert!(body.contains(&format!(
        "genesys_sipserver_ha_role{{{},genesys_sipserver_ha_role=\"primary\"}} 1\n",
        labels
    )));
    assert!(body.contains(&format!(
        "genesys_sipserver_ha_role{{{},genesys_sipserver_ha_role=\"backup\"}} 0\n",
        labels
    )));
    assert!(body.contains("# TYPE genesys_sipserver_calls_created_total counter\n"));
    assert!(body.contains(&format!(
        "genesys_sipserver_calls_created_total{{{}}} 15230\n",
        labels
    )));
    assert!(body.contains("# HELP genesys_sipserver_thread_count Number of core threads\n"));
    assert!(body.contains("genesys_sipserver_up 1\n"));
}

#[tokio::test]
async fn test_scrape_trunk_series() {
    let target = serving(FIXTURE.to_string()).await;
    let exporter = Exporter::start(UpstreamConfig::default()).await;

    let (_, _, body) = exporter.scrape(&format!("?target={}", target)).await;

    let trunk_lines: Vec<&str> = sample_lines(&body)
        .into_iter()
        .filter(|l| l.starts_with("genesys_sipserver_trunk_"))
        .map(|l| l.rsplit_once(',').map(|(_, rest)| rest).unwrap_or(l))
        .collect();

    let names: Vec<&str> = sample_lines(&body)
        .into_iter()
        .filter(|l| l.starts_with("genesys_sipserver_trunk_"))
        .map(|l| l.split('{').next().unwrap())
        .collect();

    assert_eq!(
        names,
        vec![
            "genesys_sipserver_trunk_calls",
            "genesys_sipserver_trunk_calls",
            "genesys_sipserver_trunk_capacity",
            "genesys_sipserver_trunk_capacity",
            "genesys_sipserver_trunk_in_service",
            "genesys_sipserver_trunk_in_service",
        ]
    );
    assert_eq!(
        trunk_lines,
        vec![
            "trunk_name=\"T1\"} 3",
            "trunk_name=\"T2\"} 0",
            "trunk_name=\"T1\"} 10",
            "trunk_name=\"T2\"} 5",
            "trunk_name=\"T1\"} 1",
            "trunk_name=\"T2\"} 0",
        ]
    );
    assert!(body.contains("# HELP genesys_sipserver_trunk_in_service In Service\n"));
}

#[tokio::test]
async fn test_scrape_shares_label_set() {
    let target = serving(FIXTURE.replace("Primary (Active)", "Backup (Passive)")).await;
    let exporter = Exporter::start(UpstreamConfig::default()).await;

    let (_, _, body) = exporter.scrape(&format!("?target={}", target)).await;

    let lines = target_lines(&body);
    assert!(!lines.is_empty());
    for line in lines {
        assert!(
            line.contains(
                r#"{app_name="SIPS_PRIMARY",app_version="8.1.103.95",app_ha_role="backup""#
            ),
            "unexpected labels: {}",
            line
        );
    }
    assert!(body.contains("genesys_sipserver_ha_role=\"primary\"} 0\n"));
    assert!(body.contains("genesys_sipserver_ha_role=\"backup\"} 1\n"));
}

#[tokio::test]
async fn test_scrape_without_target() {
    let exporter = Exporter::start(UpstreamConfig::default()).await;

    let (status, _, body) = exporter.scrape("").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "");
}

#[tokio::test]
async fn test_scrape_connection_refused_fails_open() {
    let target = closed_port().await;
    let exporter = Exporter::start(UpstreamConfig::default()).await;

    let (status, _, body) = exporter.scrape(&format!("?target={}", target)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(target_lines(&body).is_empty());
    assert!(body.contains("genesys_sipserver_up 0\n"));
    assert!(body.contains("genesys_sipserver_scrape_duration_seconds "));
}

#[tokio::test]
async fn test_scrape_timeout_fails_open() {
    let target = fake_sip_server(Router::new().route(
        "/serverx",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            FIXTURE
        }),
    ))
    .await;
    let exporter = Exporter::start(UpstreamConfig {
        timeout_secs: 1,
        ..Default::default()
    })
    .await;

    let (status, _, body) = exporter.scrape(&format!("?target={}", target)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(target_lines(&body).is_empty());
    assert!(body.contains("genesys_sipserver_up 0\n"));
}

#[tokio::test]
async fn test_scrape_error_status_fails_open() {
    let target = fake_sip_server(Router::new().route(
        "/serverx",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "oops") }),
    ))
    .await;
    let exporter = Exporter::start(UpstreamConfig::default()).await;

    let (status, _, body) = exporter.scrape(&format!("?target={}", target)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(target_lines(&body).is_empty());
    assert!(body.contains("genesys_sipserver_up 0\n"));
}

#[tokio::test]
async fn test_scrape_malformed_document_fails_open() {
    let target = serving(FIXTURE.replace("</sipServer>", "")).await;
    let exporter = Exporter::start(UpstreamConfig::default()).await;

    let (status, _, body) = exporter.scrape(&format!("?target={}", target)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(target_lines(&body).is_empty());
    assert!(body.contains("genesys_sipserver_up 0\n"));
}

#[tokio::test]
async fn test_scrape_missing_node_emits_nothing_from_target() {
    let target = serving(FIXTURE.replace(
        r#"<NUM_SIPPS rem="Number of SIP Proxies available">2</NUM_SIPPS>"#,
        "",
    ))
    .await;
    let exporter = Exporter::start(UpstreamConfig::default()).await;

    let (status, _, body) = exporter.scrape(&format!("?target={}", target)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(
        target_lines(&body).is_empty(),
        "partial output leaked: {}",
        body
    );
    assert!(body.contains("genesys_sipserver_up 0\n"));
}

#[tokio::test]
async fn test_scrape_openmetrics() {
    let target = serving(FIXTURE.to_string()).await;
    let exporter = Exporter::start(UpstreamConfig::default()).await;

    let (status, content_type, body) = exporter
        .scrape_with_accept(
            &format!("?target={}", target),
            Some("application/openmetrics-text; version=1.0.0; charset=utf-8"),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("application/openmetrics-text"));
    assert!(body.contains("# TYPE genesys_sipserver_ha_role stateset\n"));
    assert!(body.contains("# TYPE genesys_sipserver_calls_abandoned counter\n"));
    assert!(body.contains("genesys_sipserver_calls_abandoned_total{"));
    assert!(body.ends_with("# EOF\n"));
}

#[tokio::test]
async fn test_scrape_restricted_by_name() {
    let target = serving(FIXTURE.to_string()).await;
    let exporter = Exporter::start(UpstreamConfig::default()).await;

    let (status, _, body) = exporter
        .scrape(&format!(
            "?target={}&name%5B%5D=genesys_sipserver_calls&name%5B%5D=genesys_sipserver_calls_created_total",
            target
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    let types: Vec<_> = body.lines().filter(|l| l.starts_with("# TYPE")).collect();
    assert_eq!(
        types,
        vec![
            "# TYPE genesys_sipserver_calls_created_total counter",
            "# TYPE genesys_sipserver_calls gauge",
        ]
    );
    assert_eq!(target_lines(&body).len(), 2);
    assert!(!body.contains("genesys_sipserver_up"));
}

#[tokio::test]
async fn test_favicon() {
    let exporter = Exporter::start(UpstreamConfig::default()).await;

    let response = reqwest::get(format!("http://{}/favicon.ico", exporter.addr))
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "");
}

#[tokio::test]
async fn test_concurrent_scrapes_keep_targets_apart() {
    let primary = serving(FIXTURE.to_string()).await;
    let backup = serving(
        FIXTURE
            .replace("Primary (Active)", "Backup (Passive)")
            .replace("SIPS_PRIMARY", "SIPS_BACKUP"),
    )
    .await;
    let exporter = Arc::new(Exporter::start(UpstreamConfig::default()).await);

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let exporter = exporter.clone();
            let (target, name) = if i % 2 == 0 {
                (primary.clone(), "SIPS_PRIMARY")
            } else {
                (backup.clone(), "SIPS_BACKUP")
            };
            tokio::spawn(async move {
                let (_, _, body) = exporter.scrape(&format!("?target={}", target)).await;
                let lines = target_lines(&body);
                assert!(!lines.is_empty());
                assert!(
                    lines
                        .iter()
                        .all(|l| l.contains(&format!("app_name=\"{}\"", name)))
                );
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }
}
