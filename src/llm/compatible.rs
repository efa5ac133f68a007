//! Generative backend speaking the OpenAI-compatible chat completions API.
//! Most hosted and local LLM servers expose `/chat/completions` in this shape,
//! so one implementation covers them.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http_client::build_backend_client;
use super::scrub::sanitize_api_error;
use super::traits::{GenerationRequest, GenerativeBackend};
use crate::error::GenerationError;

const BACKEND_NAME: &str = "compatible";

pub struct CompatibleBackend {
    model: String,
    api_key: Option<String>,
    /// Pre-computed chat completions URL (avoids `format!` per request).
    chat_url: String,
    client: Client,
}

impl CompatibleBackend {
    pub fn new(base_url: &str, api_key: Option<&str>, model: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        let chat_url = if base_url.ends_with("chat/completions") {
            base_url.to_string()
        } else {
            format!("{base_url}/chat/completions")
        };

        Self {
            model: model.to_string(),
            api_key: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(ToString::to_string),
            chat_url,
            client: build_backend_client(),
        }
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    fn apply_auth_header(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    fn build_body(&self, request: &GenerationRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system_prompt {
            messages.push(Message {
                role: "system",
                content: system.clone(),
            });
        }
        messages.push(Message {
            role: "user",
            content: request.prompt.clone(),
        });

        ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        }
    }

    async fn call(
        &self,
        request: &GenerationRequest,
        deadline: Duration,
    ) -> Result<String, GenerationError> {
        let body = self.build_body(request);

        let response = self
            .apply_auth_header(self.client.post(&self.chat_url).json(&body))
            .timeout(deadline)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout {
                        backend: BACKEND_NAME.into(),
                        deadline,
                    }
                } else {
                    GenerationError::Request {
                        backend: BACKEND_NAME.into(),
                        message: sanitize_api_error(&e.to_string()),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read error body>".to_string());
            return Err(GenerationError::Status {
                backend: BACKEND_NAME.into(),
                status: status.as_u16(),
                body: sanitize_api_error(&body),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| GenerationError::Request {
            backend: BACKEND_NAME.into(),
            message: format!("response decode failed: {e}"),
        })?;

        extract_chat_text(&parsed).ok_or_else(|| GenerationError::EmptyReply {
            backend: BACKEND_NAME.into(),
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f64,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

fn extract_chat_text(response: &ChatResponse) -> Option<String> {
    response
        .choices
        .first()
        .and_then(|choice| choice.message.content.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToString::to_string)
}

impl GenerativeBackend for CompatibleBackend {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn generate_structured<'a>(
        &'a self,
        request: &'a GenerationRequest,
        deadline: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>> {
        Box::pin(async move { self.call(request, deadline).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_url_appends_path_once() {
        let b = CompatibleBackend::new("https://api.example.com/v1/", None, "m");
        assert_eq!(b.chat_url(), "https://api.example.com/v1/chat/completions");

        let b = CompatibleBackend::new("https://api.example.com/v1/chat/completions", None, "m");
        assert_eq!(b.chat_url(), "https://api.example.com/v1/chat/completions");
    }

    #[test]
    fn blank_api_key_is_ignored() {
        let b = CompatibleBackend::new("http://localhost", Some("   "), "m");
        assert!(b.api_key.is_none());
    }

    #[test]
    fn body_requests_json_and_keeps_prompt_verbatim() {
        let b = CompatibleBackend::new("http://localhost", None, "small-model");
        let prompt = "- id=task-1 | Fix desk lamp\n- id=risk-2 | Review";
        let request = GenerationRequest::new(prompt, 0.2, 64).with_system("sys");
        let body = serde_json::to_value(b.build_body(&request)).unwrap();

        assert_eq!(body["model"], "small-model");
        assert_eq!(body["max_tokens"], 64);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], prompt);
    }

    #[test]
    fn extract_skips_empty_content() {
        let empty: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"   "}}]}"#).unwrap();
        assert!(extract_chat_text(&empty).is_none());

        let none: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(extract_chat_text(&none).is_none());

        let ok: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":" {\"a\":1} "}}]}"#)
                .unwrap();
        assert_eq!(extract_chat_text(&ok).as_deref(), Some("{\"a\":1}"));
    }
}
