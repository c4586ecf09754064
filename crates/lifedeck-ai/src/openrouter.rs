//! OpenRouter-compatible chat-completions client.

use std::fmt;

use serde::Deserialize;
use tracing::info;

use crate::generation::{Generation, GenerationBackend, GenerationError, GenerationRequest};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_COST_PER_TOKEN: f64 = 0.00002;

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct OpenRouterConfig {
    pub base_url: String,
    pub api_key: String,
    /// Sent as `HTTP-Referer`.
    pub referer: String,
    /// Sent as `X-Title`.
    pub title: String,
    pub cost_per_token: f64,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            referer: "https://lifedeck.local".to_string(),
            title: "Lifedeck".to_string(),
            cost_per_token: DEFAULT_COST_PER_TOKEN,
        }
    }
}

impl fmt::Debug for OpenRouterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRouterConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("referer", &self.referer)
            .field("title", &self.title)
            .field("cost_per_token", &self.cost_per_token)
            .finish()
    }
}

/// HTTP client for `{base_url}/chat/completions`.
pub struct OpenRouterClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    referer: String,
    title: String,
    cost_per_token: f64,
}

#[derive(Deserialize)]
struct Completion {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl OpenRouterClient {
    pub fn new(config: OpenRouterConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            referer: config.referer,
            title: config.title,
            cost_per_token: config.cost_per_token,
        }
    }
}

#[async_trait::async_trait]
impl GenerationBackend for OpenRouterClient {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerationError> {
        if self.api_key.is_empty() {
            return Err(GenerationError::Unavailable("no API key configured".into()));
        }
        let url = format!("{}/chat/completions", self.base_url);

        info!(url = %url, model = %request.model, max_tokens = request.max_tokens, "requesting completion");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(request)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Server {
                status: status.as_u16(),
                body: server_message(&body),
            });
        }

        let body = resp.text().await?;
        let generation = parse_completion(&body, self.cost_per_token)?;
        info!(tokens = generation.tokens_used, cost = generation.cost, "completion received");
        Ok(generation)
    }
}

/// Extract content and usage from a chat-completions body.
fn parse_completion(body: &str, cost_per_token: f64) -> Result<Generation, GenerationError> {
    let completion: Completion = serde_json::from_str(body)?;
    let content = completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or_else(|| GenerationError::MalformedResponse("no message in first choice".into()))?;
    let tokens_used = completion.usage.and_then(|u| u.total_tokens).unwrap_or(0);
    Ok(Generation {
        content,
        tokens_used,
        cost: tokens_used as f64 * cost_per_token,
    })
}

/// The `error.message` of an error body when there is one, else the raw body.
fn server_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GenerationSettings;

    #[test]
    fn parses_content_and_usage() {
        let body = r###"{
            "id": "gen-1",
            "choices": [{"message": {"role": "assistant", "content": "## Sun\nA bright year."}}],
            "usage": {"prompt_tokens": 400, "completion_tokens": 600, "total_tokens": 1000}
        }"###;
        let g = parse_completion(body, DEFAULT_COST_PER_TOKEN).unwrap();
        assert_eq!(g.content, "## Sun\nA bright year.");
        assert_eq!(g.tokens_used, 1000);
        assert!((g.cost - 0.02).abs() < 1e-9);
    }

    #[test]
    fn missing_usage_counts_zero_tokens() {
        let body = r#"{"choices": [{"message": {"content": "text"}}]}"#;
        let g = parse_completion(body, DEFAULT_COST_PER_TOKEN).unwrap();
        assert_eq!(g.tokens_used, 0);
        assert_eq!(g.cost, 0.0);
    }

    #[test]
    fn missing_choices_is_malformed() {
        for body in [
            r#"{"choices": []}"#,
            r#"{"usage": {"total_tokens": 5}}"#,
            r#"{"choices": [{"finish_reason": "length"}]}"#,
            r#"{"choices": [{"message": {"role": "assistant"}}]}"#,
        ] {
            assert!(
                matches!(parse_completion(body, 0.0), Err(GenerationError::MalformedResponse(_))),
                "{body} should be malformed"
            );
        }
    }

    #[test]
    fn non_json_body_is_json_error() {
        assert!(matches!(
            parse_completion("<html>bad gateway</html>", 0.0),
            Err(GenerationError::Json(_))
        ));
    }

    #[test]
    fn server_message_prefers_error_field() {
        assert_eq!(
            server_message(r#"{"error": {"message": "Rate limit exceeded", "code": 429}}"#),
            "Rate limit exceeded"
        );
        assert_eq!(server_message("upstream timeout"), "upstream timeout");
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = OpenRouterClient::new(OpenRouterConfig {
            base_url: "http://localhost:8080/api/v1/".into(),
            ..Default::default()
        });
        assert_eq!(client.base_url, "http://localhost:8080/api/v1");
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = OpenRouterConfig {
            api_key: "sk-or-secret".into(),
            ..Default::default()
        };
        let shown = format!("{config:?}");
        assert!(!shown.contains("sk-or-secret"));
        assert!(shown.contains("<redacted>"));
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let client = OpenRouterClient::new(OpenRouterConfig::default());
        let req = GenerationSettings::default().request("hi", 10);
        assert!(matches!(
            client.generate(&req).await,
            Err(GenerationError::Unavailable(_))
        ));
    }
}
