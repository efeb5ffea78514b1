use async_trait::async_trait;
use dotenv::dotenv;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::env;
use thiserror::Error;
use tracing::debug;

use super::endpoints::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ComplexSearchResponse,
    ImageGenerationRequest, ImageGenerationResponse, ImageSearchHit, CHAT_COMPLETIONS_PATH,
    COMPLEX_SEARCH_PATH, DEFAULT_CHAT_MODEL, IMAGE_GENERATIONS_PATH, OPENAI_DEFAULT_BASE_URL,
    SPOONACULAR_DEFAULT_BASE_URL,
};
use super::{ChatCompletion, ImageGeneration, ImageSearch};

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
    #[error("Empty response: {0}")]
    EmptyResponse(String),
}

fn read_api_key(api_key_env_var_name: &str) -> Result<String, ApiConnectionError> {
    dotenv().ok();
    env::var(api_key_env_var_name)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| ApiConnectionError::MissingApiKey(api_key_env_var_name.to_string()))
}

fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Non-2xx becomes `ApiError` with the body; a 2xx body that does not match
/// `T` becomes `SerializationError`.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiConnectionError> {
    let status = response.status();
    if !status.is_success() {
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        return Err(ApiConnectionError::ApiError { status, error_body });
    }
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// OpenAI-compatible provider: chat completions and image generations.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    model: String,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(api_key: String, base_url: String, model: String, client: Client) -> Self {
        Self {
            api_key,
            base_url,
            model,
            client,
        }
    }

    /// Reads the key from `api_key_env_var_name` (after loading `.env`) and
    /// uses the public endpoint with the default chat model.
    pub fn from_env(api_key_env_var_name: &str) -> Result<Self, ApiConnectionError> {
        let api_key = read_api_key(api_key_env_var_name)?;
        Ok(Self::new(
            api_key,
            OPENAI_DEFAULT_BASE_URL.to_string(),
            DEFAULT_CHAT_MODEL.to_string(),
            Client::new(),
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        let response = self
            .client
            .post(join_url(&self.base_url, CHAT_COMPLETIONS_PATH))
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;
        read_json(response).await
    }
}

#[async_trait]
impl ChatCompletion for OpenAiProvider {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ApiConnectionError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(user_prompt)],
            temperature: Some(temperature),
            max_tokens: Some(max_tokens),
        };

        let response = self.call_chat_completion(request).await?;
        let content = response
            .first_content()
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                ApiConnectionError::EmptyResponse("No response choices received from API".to_string())
            })?;
        debug!(model = %self.model, "chat completion reply: {}", content);
        Ok(content.to_string())
    }
}

#[async_trait]
impl ImageGeneration for OpenAiProvider {
    async fn generate_image(&self, prompt: &str, size: &str) -> Result<String, ApiConnectionError> {
        let request = ImageGenerationRequest {
            prompt: prompt.to_string(),
            n: 1,
            size: size.to_string(),
        };

        let response = self
            .client
            .post(join_url(&self.base_url, IMAGE_GENERATIONS_PATH))
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;
        let generated: ImageGenerationResponse = read_json(response).await?;

        generated
            .data
            .into_iter()
            .filter_map(|image| image.url)
            .map(|url| url.trim().to_string())
            .find(|url| !url.is_empty())
            .ok_or_else(|| {
                ApiConnectionError::EmptyResponse("Image generation returned no URL".to_string())
            })
    }
}

/// Spoonacular `complexSearch`, used only for its recipe photos.
#[derive(Debug, Clone)]
pub struct SpoonacularProvider {
    api_key: String,
    base_url: String,
    client: Client,
}

impl SpoonacularProvider {
    pub fn new(api_key: String, base_url: String, client: Client) -> Self {
        Self {
            api_key,
            base_url,
            client,
        }
    }

    pub fn from_env(api_key_env_var_name: &str) -> Result<Self, ApiConnectionError> {
        let api_key = read_api_key(api_key_env_var_name)?;
        Ok(Self::new(
            api_key,
            SPOONACULAR_DEFAULT_BASE_URL.to_string(),
            Client::new(),
        ))
    }
}

#[async_trait]
impl ImageSearch for SpoonacularProvider {
    async fn search(&self, query: &str) -> Result<Vec<ImageSearchHit>, ApiConnectionError> {
        let response = self
            .client
            .get(join_url(&self.base_url, COMPLEX_SEARCH_PATH))
            .query(&[("query", query), ("number", "1"), ("apiKey", self.api_key.as_str())])
            .send()
            .await?;
        let found: ComplexSearchResponse = read_json(response).await?;
        Ok(found
            .results
            .into_iter()
            .filter_map(|result| result.into_hit())
            .collect())
    }
}
