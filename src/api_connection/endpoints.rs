use serde::{Deserialize, Serialize};

pub const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const SPOONACULAR_DEFAULT_BASE_URL: &str = "https://api.spoonacular.com";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
pub const IMAGE_GENERATIONS_PATH: &str = "/v1/images/generations";
pub const COMPLEX_SEARCH_PATH: &str = "/recipes/complexSearch";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionResponseMessage {
    pub role: String,
    // Some providers send `null` content on refusals.
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionChoice {
    pub message: ChatCompletionResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
    pub index: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: Option<u32>,
    pub total_tokens: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    pub usage: Option<ChatCompletionUsage>,
}

impl ChatCompletionResponse {
    /// Text of the first choice, if the provider sent any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}

/// Body of `/v1/images/generations`.
#[derive(Debug, Serialize, Clone)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    pub n: u8,
    pub size: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneratedImage {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub revised_prompt: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImageGenerationResponse {
    #[serde(default)]
    pub created: Option<u64>,
    pub data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ComplexSearchResult {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ComplexSearchResponse {
    pub results: Vec<ComplexSearchResult>,
    #[serde(default, rename = "totalResults")]
    pub total_results: Option<u64>,
}

/// One usable hit from an image search, as handed to the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSearchHit {
    pub title: String,
    pub image_url: String,
}

impl ComplexSearchResult {
    /// A result without an image URL is not a hit.
    pub fn into_hit(self) -> Option<ImageSearchHit> {
        let image_url = self.image?.trim().to_string();
        if image_url.is_empty() {
            return None;
        }
        Some(ImageSearchHit {
            title: self.title,
            image_url,
        })
    }
}
