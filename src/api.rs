//! Chat-completion API interaction.
//!
//! This module provides the single structured-completion call every analysis
//! and the generative trend fallback goes through: a system prompt and a user
//! prompt are sent to an OpenAI-compatible `/chat/completions` endpoint in
//! JSON mode, and the message content comes back as a string together with
//! the optional usage counters.
//!
//! # Architecture
//!
//! - [`ChatCompletion`]: Core trait defining the async completion call
//! - [`ChatClient`]: `reqwest`-backed implementation
//!
//! No retries and no client-side timeout: callers decide how to degrade on
//! failure.

use crate::error::{Error, Result};
use crate::models::TokenUsage;
use crate::utils::truncate_for_log;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Instant;
use tracing::{debug, instrument, warn};
use url::Url;

/// The content of a completion together with its usage counters.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub usage: Option<TokenUsage>,
}

/// Trait for async structured completion.
///
/// Implementors send a system prompt and a user prompt and return the raw
/// message content, which the caller parses as JSON.
pub trait ChatCompletion {
    /// Send one system/user prompt pair.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingCredential`] when no API key is configured
    /// - [`Error::Transport`] on network or non-2xx failures
    /// - [`Error::MalformedResponse`] when the body has no message content
    fn complete(
        &self,
        system: &str,
        user: &str,
    ) -> impl Future<Output = Result<Completion>> + Send;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// `reqwest`-backed client for an OpenAI-compatible completion service.
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: Url,
    model: String,
    temperature: f32,
    api_key: Option<String>,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl ChatClient {
    /// Build a client for `{base_url}/chat/completions`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `base_url` is not a valid URL.
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        model: &str,
        temperature: f32,
        api_key: Option<String>,
    ) -> Result<Self> {
        let base = format!("{}/", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&base)
            .and_then(|u| u.join("chat/completions"))
            .map_err(|e| Error::Config(format!("invalid llm base_url {base_url:?}: {e}")))?;
        Ok(Self {
            http,
            endpoint,
            model: model.to_string(),
            temperature,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn headers(&self, api_key: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|e| Error::Config(format!("API key is not a valid header value: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

impl ChatCompletion for ChatClient {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn complete(&self, system: &str, user: &str) -> Result<Completion> {
        let api_key = self.api_key.as_deref().ok_or(Error::MissingCredential)?;
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature: self.temperature,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let t0 = Instant::now();
        let response = self
            .http
            .post(self.endpoint.clone())
            .headers(self.headers(api_key)?)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                %status,
                elapsed_ms = t0.elapsed().as_millis() as u64,
                body = %truncate_for_log(&body, 300),
                "Completion request rejected"
            );
            return Err(Error::Transport(format!("completion service returned {status}")));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::MalformedResponse(e.to_string()))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::MalformedResponse("no message content in completion".into()))?;

        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            bytes = content.len(),
            usage = ?body.usage,
            "Completion received"
        );
        Ok(Completion {
            content,
            usage: body.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str, key: Option<&str>) -> ChatClient {
        ChatClient::new(
            reqwest::Client::new(),
            base,
            "deepseek-chat",
            0.7,
            key.map(String::from),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_chat_completions() {
        assert_eq!(
            client("https://api.deepseek.com", None).endpoint.as_str(),
            "https://api.deepseek.com/chat/completions"
        );
        assert_eq!(
            client("https://example.org/v1/", None).endpoint.as_str(),
            "https://example.org/v1/chat/completions"
        );
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let err = ChatClient::new(reqwest::Client::new(), "not a url", "m", 0.5, None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        assert!(!client("https://example.org", Some("   ")).has_credential());
        assert!(client("https://example.org", Some("sk-1")).has_credential());
    }

    #[tokio::test]
    async fn test_missing_credential_short_circuits() {
        // unroutable host: the call must fail before any network I/O
        let c = client("http://127.0.0.1:9", None);
        let err = c.complete("sys", "user").await.unwrap_err();
        assert!(err.is_missing_credential());
    }

    #[test]
    fn test_request_body_shape() {
        let req = ChatRequest {
            model: "m",
            messages: vec![ChatMessage { role: "system", content: "s" }],
            temperature: 0.5,
            response_format: ResponseFormat { kind: "json_object" },
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["response_format"]["type"], "json_object");
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["temperature"], 0.5);
    }

    #[test]
    fn test_response_parses_usage() {
        let raw = r#"{
            "choices": [{"message": {"role": "assistant", "content": "{}"}}],
            "usage": {"total_tokens": 30, "prompt_tokens": 20, "completion_tokens": 10}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.usage.unwrap().total_tokens, 30);
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("{}"));
    }
}
