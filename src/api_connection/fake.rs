//! In-process providers for tests.
//!
//! Each fake answers from a table of registered replies and records every
//! call, so tests can assert which provider was consulted and in what order.

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;

use super::{ApiConnectionError, ChatCompletion, ImageGeneration, ImageSearch, ImageSearchHit};

#[derive(Debug, Clone)]
enum FakeReply {
    Text(String),
    Failure(String),
}

impl FakeReply {
    fn into_result(self) -> Result<String, ApiConnectionError> {
        match self {
            FakeReply::Text(text) => Ok(text),
            FakeReply::Failure(message) => Err(ApiConnectionError::ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error_body: message,
            }),
        }
    }
}

/// One recorded `complete` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCompletion {
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Chat provider answering by case-insensitive substring match on the user
/// prompt. Patterns are tried in registration order.
#[derive(Debug, Default)]
pub struct FakeChatProvider {
    replies: Vec<(String, FakeReply)>,
    default_reply: Option<FakeReply>,
    calls: Mutex<Vec<RecordedCompletion>>,
}

impl FakeChatProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(mut self, prompt_contains: &str, reply: &str) -> Self {
        self.replies
            .push((prompt_contains.to_lowercase(), FakeReply::Text(reply.to_string())));
        self
    }

    pub fn with_failure(mut self, prompt_contains: &str) -> Self {
        self.replies.push((
            prompt_contains.to_lowercase(),
            FakeReply::Failure(format!("fake failure for prompts containing '{}'", prompt_contains)),
        ));
        self
    }

    pub fn with_default_reply(mut self, reply: &str) -> Self {
        self.default_reply = Some(FakeReply::Text(reply.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCompletion> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ChatCompletion for FakeChatProvider {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ApiConnectionError> {
        self.calls.lock().push(RecordedCompletion {
            system_prompt: system_prompt.to_string(),
            user_prompt: user_prompt.to_string(),
            max_tokens,
            temperature,
        });

        let prompt_lower = user_prompt.to_lowercase();
        let reply = self
            .replies
            .iter()
            .find(|(pattern, _)| prompt_lower.contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone())
            .or_else(|| self.default_reply.clone());

        match reply {
            Some(reply) => reply.into_result(),
            None => Err(ApiConnectionError::EmptyResponse(format!(
                "FakeChatProvider: no reply configured for prompt (first 100 chars): {}",
                user_prompt.chars().take(100).collect::<String>()
            ))),
        }
    }
}

#[derive(Debug, Clone)]
enum FakeSearchReply {
    Hits(Vec<String>),
    Failure,
}

/// Image search answering by exact (case-insensitive) query. Unknown
/// queries return an empty result set.
#[derive(Debug, Default)]
pub struct FakeImageSearch {
    replies: Vec<(String, FakeSearchReply)>,
    queries: Mutex<Vec<String>>,
}

impl FakeImageSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hit(mut self, query: &str, image_url: &str) -> Self {
        self.replies.push((
            query.to_lowercase(),
            FakeSearchReply::Hits(vec![image_url.to_string()]),
        ));
        self
    }

    pub fn with_failure(mut self, query: &str) -> Self {
        self.replies
            .push((query.to_lowercase(), FakeSearchReply::Failure));
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl ImageSearch for FakeImageSearch {
    async fn search(&self, query: &str) -> Result<Vec<ImageSearchHit>, ApiConnectionError> {
        self.queries.lock().push(query.to_string());

        let query_lower = query.to_lowercase();
        let reply = self
            .replies
            .iter()
            .find(|(known, _)| *known == query_lower)
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(FakeSearchReply::Hits(urls)) => Ok(urls
                .into_iter()
                .map(|image_url| ImageSearchHit {
                    title: query.to_string(),
                    image_url,
                })
                .collect()),
            Some(FakeSearchReply::Failure) => Err(ApiConnectionError::ApiError {
                status: StatusCode::PAYMENT_REQUIRED,
                error_body: "daily points limit reached".to_string(),
            }),
            None => Ok(Vec::new()),
        }
    }
}

/// One recorded `generate_image` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedGeneration {
    pub prompt: String,
    pub size: String,
}

/// Generative-image provider that always succeeds with one URL or always fails.
#[derive(Debug)]
pub struct FakeImageGenerator {
    reply: FakeReply,
    calls: Mutex<Vec<RecordedGeneration>>,
}

impl FakeImageGenerator {
    pub fn succeeding(image_url: &str) -> Self {
        Self {
            reply: FakeReply::Text(image_url.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: FakeReply::Failure("fake image generation failure".to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedGeneration> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ImageGeneration for FakeImageGenerator {
    async fn generate_image(&self, prompt: &str, size: &str) -> Result<String, ApiConnectionError> {
        self.calls.lock().push(RecordedGeneration {
            prompt: prompt.to_string(),
            size: size.to_string(),
        });
        self.reply.clone().into_result()
    }
}
