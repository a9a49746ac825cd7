//! llama.cpp server client
//!
//! One engine talks to one server slot. `reset` erases the slot's KV cache
//! (`POST /slots/{id}?action=erase`); `infer` calls `/completion` with
//! `cache_prompt` disabled so no context leaks between runs.

use async_trait::async_trait;
use ragloop_application::ports::inference::{
    Completion, InferenceEngine, InferenceError, InferenceParams,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    n_predict: u32,
    temperature: f64,
    top_p: f64,
    repeat_penalty: f64,
    stop: &'a [String],
    cache_prompt: bool,
    id_slot: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    content: String,
    #[serde(default)]
    stopped_limit: bool,
}

/// Inference engine backed by a llama.cpp HTTP server
pub struct LlamaServerEngine {
    client: reqwest::Client,
    base_url: String,
    slot_id: u32,
    model_name: String,
    /// Set once the server reports that slot management is disabled
    slot_erase_unsupported: bool,
}

impl LlamaServerEngine {
    pub fn new(base_url: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            slot_id: 0,
            model_name: model_name.into(),
            slot_erase_unsupported: false,
        }
    }

    pub fn with_slot_id(mut self, slot_id: u32) -> Self {
        self.slot_id = slot_id;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn request_error(e: reqwest::Error) -> InferenceError {
    if e.is_timeout() {
        InferenceError::Timeout
    } else if e.is_connect() {
        InferenceError::Unavailable(e.to_string())
    } else {
        InferenceError::RequestFailed(e.to_string())
    }
}

#[async_trait]
impl InferenceEngine for LlamaServerEngine {
    async fn reset(&mut self) -> Result<(), InferenceError> {
        if self.slot_erase_unsupported {
            return Ok(());
        }

        let url = format!("{}/slots/{}?action=erase", self.base_url, self.slot_id);
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        match status.as_u16() {
            200..=299 => {
                debug!("Erased llama.cpp slot {}", self.slot_id);
                Ok(())
            }
            // server started without --slots
            404 | 501 => {
                warn!(
                    "llama.cpp server does not support slot erase ({}); continuing without reset",
                    status.as_u16()
                );
                self.slot_erase_unsupported = true;
                Ok(())
            }
            code => Err(InferenceError::RequestFailed(format!(
                "slot erase failed: HTTP {}",
                code
            ))),
        }
    }

    async fn infer(
        &mut self,
        prompt: &str,
        params: &InferenceParams,
    ) -> Result<Completion, InferenceError> {
        let request = CompletionRequest {
            prompt,
            n_predict: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            repeat_penalty: params.repeat_penalty,
            stop: &params.stop,
            cache_prompt: false,
            id_slot: self.slot_id,
        };

        let response = self
            .client
            .post(format!("{}/completion", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(InferenceError::RequestFailed(format!(
                "HTTP error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body = response
            .json::<CompletionResponse>()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;
        if body.stopped_limit {
            debug!("Completion hit n_predict={}", params.max_tokens);
            return Ok(Completion::token_limited(body.content));
        }
        Ok(Completion::new(body.content))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve;

    fn params() -> InferenceParams {
        InferenceParams {
            max_tokens: 128,
            temperature: 0.7,
            top_p: 0.9,
            repeat_penalty: 1.1,
            stop: vec!["<|im_end|>".to_string()],
        }
    }

    #[tokio::test]
    async fn test_reset_then_complete() {
        let (url, captured) = serve(vec![
            (200, r#"{"id_slot": 1, "n_erased": 12}"#.to_string()),
            (200, r#"{"content": "일정은 3월입니다.", "stopped_limit": false}"#.to_string()),
        ])
        .await;

        let mut engine = LlamaServerEngine::new(format!("{}/", url), "gemma-3.gguf").with_slot_id(1);
        engine.reset().await.unwrap();
        let reply = engine.infer("prompt", &params()).await.unwrap();
        assert_eq!(reply.text, "일정은 3월입니다.");
        assert!(!reply.hit_token_limit);

        let requests = captured.lock().unwrap();
        assert_eq!(requests[0].request_line, "POST /slots/1?action=erase HTTP/1.1");
        assert_eq!(requests[1].request_line, "POST /completion HTTP/1.1");
        let sent: serde_json::Value = serde_json::from_str(&requests[1].body).unwrap();
        assert_eq!(sent["n_predict"], 128);
        assert_eq!(sent["cache_prompt"], false);
        assert_eq!(sent["id_slot"], 1);
        assert_eq!(sent["stop"][0], "<|im_end|>");
    }

    #[tokio::test]
    async fn test_stopped_limit_marks_completion() {
        let (url, _) = serve(vec![(
            200,
            r#"{"content": "일정은 3월 15일에 최종 확", "stopped_limit": true}"#.to_string(),
        )])
        .await;
        let mut engine = LlamaServerEngine::new(url, "m");
        let reply = engine.infer("p", &params()).await.unwrap();
        assert_eq!(reply, Completion::token_limited("일정은 3월 15일에 최종 확"));
    }

    #[tokio::test]
    async fn test_unsupported_slot_erase_is_remembered() {
        let (url, captured) = serve(vec![(501, "{}".to_string())]).await;
        let mut engine = LlamaServerEngine::new(url, "m");
        engine.reset().await.unwrap();
        // second reset makes no request
        engine.reset().await.unwrap();
        assert_eq!(captured.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_completion_error_status() {
        let (url, _) = serve(vec![(503, r#"{"error": "loading model"}"#.to_string())]).await;
        let mut engine = LlamaServerEngine::new(url, "m");
        let result = engine.infer("p", &params()).await;
        assert!(matches!(result, Err(InferenceError::RequestFailed(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let mut engine = LlamaServerEngine::new(url, "m");
        assert!(matches!(
            engine.reset().await,
            Err(InferenceError::Unavailable(_))
        ));
    }
}
