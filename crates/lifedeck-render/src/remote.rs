//! Remote rendering service: `GET /` for health, `POST /generate-pdf` to render.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::RenderError;
use crate::backend::{RenderBackend, RenderStrategy, Rendered};
use crate::document::Document;

const URL_HEADER: &str = "x-pdf-url";
const ID_HEADER: &str = "x-pdf-id";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub render_timeout_secs: u64,
    pub health_timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            render_timeout_secs: 30,
            health_timeout_secs: 5,
        }
    }
}

pub struct RemoteBackend {
    client: reqwest::Client,
    base_url: String,
    render_timeout: Duration,
    health_timeout: Duration,
}

#[derive(Serialize)]
struct RenderPayload<'a> {
    html: &'a str,
    css: &'a str,
    filename: &'a str,
}

#[derive(Deserialize)]
struct Health {
    status: String,
}

impl RemoteBackend {
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            render_timeout: Duration::from_secs(config.render_timeout_secs),
            health_timeout: Duration::from_secs(config.health_timeout_secs),
        }
    }

    async fn fetch_health(&self) -> Result<bool, RenderError> {
        let url = format!("{}/", self.base_url);
        let resp = self.client.get(&url).timeout(self.health_timeout).send().await?;
        if !resp.status().is_success() {
            return Ok(false);
        }
        let health: Health = resp.json().await?;
        Ok(is_healthy(&health))
    }

    /// Where the service says the document lives, if it kept it.
    fn retrieval_url(&self, headers: &reqwest::header::HeaderMap) -> Option<String> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };
        if let Some(url) = header(URL_HEADER) {
            return Some(url.to_string());
        }
        header(ID_HEADER).map(|id| format!("{}/pdf/{}", self.base_url, id))
    }
}

fn is_healthy(health: &Health) -> bool {
    health.status.eq_ignore_ascii_case("healthy")
}

#[async_trait::async_trait]
impl RenderBackend for RemoteBackend {
    fn strategy(&self) -> RenderStrategy {
        RenderStrategy::Remote
    }

    async fn health_check(&self) -> bool {
        match self.fetch_health().await {
            Ok(healthy) => {
                info!(url = %self.base_url, healthy, "remote renderer health");
                healthy
            }
            Err(e) => {
                warn!(url = %self.base_url, error = %e, "remote renderer unreachable");
                false
            }
        }
    }

    async fn render(&self, document: &Document, filename: &str) -> Result<Rendered, RenderError> {
        let url = format!("{}/generate-pdf", self.base_url);
        let payload = RenderPayload {
            html: &document.markup,
            css: &document.stylesheet,
            filename,
        };

        info!(url = %url, filename, "rendering remotely");
        let resp = self
            .client
            .post(&url)
            .timeout(self.render_timeout)
            .json(&payload)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RenderError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let retrieval = self.retrieval_url(resp.headers());
        let bytes = resp.bytes().await?.to_vec();
        match retrieval {
            Some(url) => {
                info!(url = %url, bytes = bytes.len(), "remote renderer kept the document");
                Ok(Rendered::Remote { url, cache: bytes })
            }
            None if bytes.is_empty() => Err(RenderError::EmptyDocument),
            None => Ok(Rendered::Document(bytes)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};

    fn backend() -> RemoteBackend {
        RemoteBackend::new(RemoteConfig {
            base_url: "https://render.example/".into(),
            ..Default::default()
        })
    }

    #[test]
    fn trims_trailing_slash_and_applies_timeouts() {
        let b = backend();
        assert_eq!(b.base_url, "https://render.example");
        assert_eq!(b.render_timeout, Duration::from_secs(30));
        assert_eq!(b.health_timeout, Duration::from_secs(5));
    }

    #[test]
    fn health_status_must_be_healthy() {
        let ok: Health = serde_json::from_str(r#"{"status": "healthy", "version": "62"}"#).unwrap();
        let bad: Health = serde_json::from_str(r#"{"status": "degraded"}"#).unwrap();
        assert!(is_healthy(&ok));
        assert!(!is_healthy(&bad));
    }

    #[test]
    fn retrieval_url_prefers_explicit_url_then_id() {
        let b = backend();
        let mut headers = HeaderMap::new();
        assert_eq!(b.retrieval_url(&headers), None);

        headers.insert(ID_HEADER, HeaderValue::from_static("abc123"));
        assert_eq!(
            b.retrieval_url(&headers).as_deref(),
            Some("https://render.example/pdf/abc123")
        );

        headers.insert(URL_HEADER, HeaderValue::from_static("https://cdn.example/r.pdf"));
        assert_eq!(b.retrieval_url(&headers).as_deref(), Some("https://cdn.example/r.pdf"));
    }

    #[test]
    fn payload_shape() {
        let doc = Document::from_markdown("T", "body");
        let payload = RenderPayload {
            html: &doc.markup,
            css: &doc.stylesheet,
            filename: "Jane_Life_Report_1.pdf",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["filename"], "Jane_Life_Report_1.pdf");
        assert!(json["html"].as_str().unwrap().contains("<body>"));
        assert!(json["css"].as_str().unwrap().contains("@page"));
    }

    #[tokio::test]
    async fn unreachable_service_is_unhealthy() {
        let b = RemoteBackend::new(RemoteConfig {
            base_url: "http://127.0.0.1:1".into(),
            health_timeout_secs: 1,
            ..Default::default()
        });
        assert!(!b.health_check().await);
    }
}
