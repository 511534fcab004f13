//! Status page fetcher.

use tracing::trace;

use crate::config::UpstreamConfig;
use crate::document::StatusDocument;
use crate::error::FetchError;

/// Fetches and parses `/serverx` pages. One instance serves every target;
/// the target is passed to each call.
#[derive(Debug, Clone)]
pub struct StatusFetcher {
    client: reqwest::Client,
    status_path: String,
}

impl StatusFetcher {
    /// Create a fetcher with the configured request timeout.
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            status_path: config.status_path.clone(),
        })
    }

    /// Status page URL for a `host[:port]` target.
    pub fn url(&self, target: &str) -> String {
        format!("http://{}{}", target, self.status_path)
    }

    /// GET the target's status page body.
    pub async fn fetch(&self, target: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.url(target);
        trace!(url = %url, "Fetching status page");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(&url, e))?;

        Ok(body.to_vec())
    }

    /// Fetch and parse the target's status document.
    pub async fn fetch_document(&self, target: &str) -> Result<StatusDocument, FetchError> {
        let body = self.fetch(target).await?;
        Ok(StatusDocument::parse(&body)?)
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr.to_string()
    }

    fn fetcher(timeout_secs: u64) -> StatusFetcher {
        StatusFetcher::new(&UpstreamConfig {
            timeout_secs,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_url() {
        let fetcher = fetcher(10);
        assert_eq!(fetcher.url("sips01:8080"), "http://sips01:8080/serverx");
    }

    #[tokio::test]
    async fn test_fetch_document() {
        let target = serve(Router::new().route(
            "/serverx",
            get(|| async { "<serverx><version>8.1</version></serverx>" }),
        ))
        .await;

        let doc = fetcher(5).fetch_document(&target).await.unwrap();
        assert_eq!(doc.root().name(), "serverx");
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let target = serve(Router::new().route(
            "/serverx",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
        ))
        .await;

        let err = fetcher(5).fetch(&target).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let target = serve(Router::new()).await;

        let err = fetcher(5).fetch(&target).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_fetch_malformed_document() {
        let target = serve(Router::new().route("/serverx", get(|| async { "<serverx>" }))).await;

        let err = fetcher(5).fetch_document(&target).await.unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let target = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = fetcher(5).fetch(&target).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let target = serve(Router::new().route(
            "/serverx",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "<serverx/>"
            }),
        ))
        .await;

        let err = fetcher(1).fetch(&target).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }));
    }
}
