//! Offline engine for demos and smoke tests

use async_trait::async_trait;
use ragloop_application::ports::inference::{
    Completion, InferenceEngine, InferenceError, InferenceParams,
};

const FALLBACK: &str = "관련 문서를 찾지 못했습니다.";
const CHUNK_HEADER: &str = "관련 문서";

/// Replies with the first numbered chunk after the prompt's chunk header.
///
/// Needs no model, so the whole workflow can run without a server.
#[derive(Debug, Default)]
pub struct EchoEngine {
    calls: usize,
}

impl EchoEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls
    }

    fn first_chunk(prompt: &str) -> Option<&str> {
        prompt
            .lines()
            .map(str::trim)
            .skip_while(|line| !line.starts_with(CHUNK_HEADER))
            .find_map(|line| line.strip_prefix("1. "))
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }
}

#[async_trait]
impl InferenceEngine for EchoEngine {
    async fn reset(&mut self) -> Result<(), InferenceError> {
        Ok(())
    }

    async fn infer(
        &mut self,
        prompt: &str,
        _params: &InferenceParams,
    ) -> Result<Completion, InferenceError> {
        self.calls += 1;
        let reply = match Self::first_chunk(prompt) {
            // validation treats a reply without a closing mark as truncated
            Some(chunk) => format!(
                "참고 문서에 따르면 다음과 같습니다. {}.",
                chunk.trim_end_matches(['.', '。'])
            ),
            None => FALLBACK.to_string(),
        };
        Ok(Completion::new(reply))
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> InferenceParams {
        InferenceParams {
            max_tokens: 16,
            temperature: 0.0,
            top_p: 1.0,
            repeat_penalty: 1.0,
            stop: vec![],
        }
    }

    #[tokio::test]
    async fn test_echoes_first_chunk() {
        let mut engine = EchoEngine::new();
        let prompt = "<|im_start|>user\n질문\n1. 무시\n\n관련 문서:\n1. 일정은 3월입니다.\n2. 예산\n<|im_end|>";
        let reply = engine.infer(prompt, &params()).await.unwrap();
        assert!(reply.text.ends_with("일정은 3월입니다."));
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn test_fallback_without_chunks() {
        let mut engine = EchoEngine::new();
        assert_eq!(engine.infer("질문만", &params()).await.unwrap().text, FALLBACK);
    }

    #[tokio::test]
    async fn test_unterminated_chunk_gets_full_stop() {
        let mut engine = EchoEngine::new();
        let prompt = "관련 문서:\n1. 전체 오픈 6월 말 예정\n";
        let reply = engine.infer(prompt, &params()).await.unwrap();
        assert!(reply.text.ends_with("6월 말 예정."));
    }
}
