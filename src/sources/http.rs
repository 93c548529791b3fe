//! HTTP page client shared by all status sources.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use super::FetchError;

/// Mobile Safari agent; the advisory source rejects default client agents
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
pub const DEFAULT_REFERER: &str = "https://www.google.com/";
/// The advisory source is slow to respond
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Request settings applied to every page fetch
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub user_agent: String,
    pub referer: String,
    pub timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Fetches HTML pages as UTF-8 text
#[derive(Clone)]
pub struct PageClient {
    client: Client,
}

impl PageClient {
    pub fn new(settings: &HttpSettings) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        let referer = HeaderValue::from_str(&settings.referer).map_err(|e| {
            FetchError::Client(format!("invalid referer '{}': {}", settings.referer, e))
        })?;
        headers.insert(REFERER, referer);

        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    /// Single GET; non-2xx statuses and non-UTF-8 bodies are errors
    pub async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        let body = response.bytes().await.map_err(FetchError::Transport)?;

        if !status.is_success() {
            let snippet: String = String::from_utf8_lossy(&body).chars().take(100).collect();
            warn!("{} returned status {}", url, status);
            return Err(FetchError::Status {
                status: status.as_u16(),
                snippet,
            });
        }

        String::from_utf8(body.to_vec()).map_err(FetchError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve;
    use axum::{http::HeaderMap as RequestHeaders, http::StatusCode, routing::get, Router};

    fn client() -> PageClient {
        PageClient::new(&HttpSettings {
            user_agent: "burnwatch-test/1.0".to_string(),
            referer: "https://referer.test/".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_sends_agent_and_referer() {
        let router = Router::new().route(
            "/echo",
            get(|headers: RequestHeaders| async move {
                let agent = headers
                    .get("user-agent")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let referer = headers
                    .get("referer")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                format!("{agent}|{referer}")
            }),
        );
        let base = serve(router).await;

        let body = client().fetch(&base.join("/echo").unwrap()).await.unwrap();
        assert_eq!(body, "burnwatch-test/1.0|https://referer.test/");
    }

    #[tokio::test]
    async fn test_non_success_status_is_reported() {
        let router = Router::new().route(
            "/down",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance window") }),
        );
        let base = serve(router).await;

        match client().fetch(&base.join("/down").unwrap()).await {
            Err(FetchError::Status { status, snippet }) => {
                assert_eq!(status, 503);
                assert_eq!(snippet, "maintenance window");
            }
            other => panic!("expected status error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_a_decode_error() {
        let router = Router::new().route("/latin1", get(|| async { vec![0x66u8, 0xff, 0xfe] }));
        let base = serve(router).await;

        let result = client().fetch(&base.join("/latin1").unwrap()).await;
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_transport_error() {
        // Bind then drop to get a port with nothing listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{addr}/")).unwrap();
        let result = client().fetch(&url).await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
    }

    #[test]
    fn test_invalid_referer_is_rejected() {
        let settings = HttpSettings {
            referer: "bad\nvalue".to_string(),
            ..HttpSettings::default()
        };
        assert!(matches!(
            PageClient::new(&settings),
            Err(FetchError::Client(_))
        ));
    }
}
