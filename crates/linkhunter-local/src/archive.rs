use linkhunter_core::{ArchiveBackend, ArchiveRequest, ArchiveResponse, Error, Result};
use std::time::Duration;

/// POSTs a link selection as JSON (`{"urls":[{"url":..,"count":..}]}`) to a remote
/// archive endpoint. The endpoint answers `{"status":"success"}` or
/// `{"status":"error","message":..}`.
#[derive(Debug, Clone)]
pub struct HttpArchiver {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpArchiver {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        url::Url::parse(&endpoint)
            .map_err(|e| Error::InvalidUrl(format!("archive endpoint {endpoint}: {e}")))?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("linkhunter-local/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Archive(e.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl ArchiveBackend for HttpArchiver {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn archive(&self, req: &ArchiveRequest) -> Result<ArchiveResponse> {
        if req.urls.is_empty() {
            return Err(Error::Archive("no URLs selected".to_string()));
        }

        let mut rb = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(req);
        if let Some(key) = &self.api_key {
            rb = rb.header("X-API-Key", key);
        }
        let resp = rb.send().await.map_err(|e| Error::Archive(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Archive(format!("archive HTTP {status}")));
        }

        let parsed: ArchiveResponse = resp
            .json()
            .await
            .map_err(|e| Error::Archive(format!("unexpected archive response: {e}")))?;
        if parsed.status != "success" {
            return Err(Error::Archive(
                parsed
                    .message
                    .unwrap_or_else(|| format!("status={}", parsed.status)),
            ));
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use linkhunter_core::UrlCount;
    use std::net::SocketAddr;

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn selection() -> ArchiveRequest {
        ArchiveRequest {
            urls: vec![
                UrlCount {
                    url: "https://a.io/x".into(),
                    count: 2,
                },
                UrlCount {
                    url: "https://b.io/y".into(),
                    count: 1,
                },
            ],
        }
    }

    /// Fails closed unless the key and body look right.
    async fn addurl(
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some("k123") {
            return (
                StatusCode::OK,
                Json(serde_json::json!({"status": "error", "message": "bad api key"})),
            );
        }
        let n = body["urls"].as_array().map(|a| a.len()).unwrap_or(0);
        let first_count = body["urls"][0]["count"].as_u64();
        if n != 2 || first_count != Some(2) {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"status": "error", "message": "bad body"})),
            );
        }
        (StatusCode::OK, Json(serde_json::json!({"status": "success"})))
    }

    #[tokio::test]
    async fn archives_selection_with_api_key() {
        let addr = serve(Router::new().route("/addurl/", post(addurl))).await;
        let a = HttpArchiver::new(format!("http://{addr}/addurl/"), Some("k123".into())).unwrap();
        let resp = a.archive(&selection()).await.unwrap();
        assert_eq!(resp.status, "success");
        assert_eq!(a.name(), "http");
    }

    #[tokio::test]
    async fn error_status_surfaces_the_server_message() {
        let addr = serve(Router::new().route("/addurl/", post(addurl))).await;
        let a = HttpArchiver::new(format!("http://{addr}/addurl/"), Some("wrong".into())).unwrap();
        let err = a.archive(&selection()).await.unwrap_err();
        match err {
            Error::Archive(msg) => assert_eq!(msg, "bad api key"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn http_failure_is_an_archive_error() {
        let addr = serve(Router::new().route("/addurl/", post(addurl))).await;
        let a = HttpArchiver::new(format!("http://{addr}/addurl/"), Some("k123".into())).unwrap();
        let err = a
            .archive(&ArchiveRequest {
                urls: vec![UrlCount {
                    url: "https://a.io/".into(),
                    count: 1,
                }],
            })
            .await
            .unwrap_err();
        match err {
            Error::Archive(msg) => assert!(msg.contains("400"), "msg={msg}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_selection_is_rejected_without_a_request() {
        // Nothing listens here; an attempted request would fail differently.
        let a = HttpArchiver::new("http://127.0.0.1:9/addurl/", None).unwrap();
        let err = a.archive(&ArchiveRequest { urls: Vec::new() }).await.unwrap_err();
        match err {
            Error::Archive(msg) => assert_eq!(msg, "no URLs selected"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        assert!(matches!(
            HttpArchiver::new("not a url", None),
            Err(Error::InvalidUrl(_))
        ));
        let a = HttpArchiver::new("https://archive.example/addurl/", Some("  ".into())).unwrap();
        assert!(a.api_key.is_none());
    }
}
