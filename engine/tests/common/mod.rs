//! Shared test doubles for the tutor integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tutor_engine::llm::{GenerationParams, LLMError, LLMProvider, Message};

/// A recorded model call: the last message's text and the sampling params
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub params: GenerationParams,
}

/// Provider that replays a fixed script of replies and records every call
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, LLMError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, LLMError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn generate(
        &self,
        messages: &[Message],
        params: GenerationParams,
    ) -> Result<String, LLMError> {
        let prompt = messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.calls.lock().unwrap().push(RecordedCall { prompt, params });

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LLMError::ProviderUnavailable("script exhausted".into())))
    }
}

pub fn classification_reply(subject: &str, difficulty: &str, concepts: &[&str]) -> String {
    serde_json::json!({
        "subject": subject,
        "difficulty": difficulty,
        "concepts": concepts,
        "formulas": ["F = ma"],
    })
    .to_string()
}
