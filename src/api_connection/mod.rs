//! Provider plumbing: wire types, the reqwest-backed clients and the three
//! collaborator traits the recipe pipeline is written against.

pub mod connection;
pub mod endpoints;
pub mod fake;

use async_trait::async_trait;

pub use connection::{ApiConnectionError, OpenAiProvider, SpoonacularProvider};
pub use endpoints::ImageSearchHit;
pub use fake::{FakeChatProvider, FakeImageGenerator, FakeImageSearch};

/// A chat-completion endpoint returning the text of the first choice.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ApiConnectionError>;
}

/// An image index queried by free text. An empty list is a valid answer.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<ImageSearchHit>, ApiConnectionError>;
}

/// A generative-image endpoint returning the URL of a single image.
#[async_trait]
pub trait ImageGeneration: Send + Sync {
    async fn generate_image(&self, prompt: &str, size: &str) -> Result<String, ApiConnectionError>;
}
