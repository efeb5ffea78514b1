//! Attaches an image URL to a recipe name.
//!
//! Resolution walks three states strictly in order:
//!
//! 1. `DirectSearch`: image search on the exact name.
//! 2. `SimplifiedSearch`: the chat model strips the name down to its core
//!    dish type and the search is repeated once.
//! 3. `GenerativeFallback`: a generated image of the original name.
//!
//! A miss or provider error in states 1 and 2 only advances the machine.
//! A failure in state 3 is terminal and surfaces as [`ResolutionError`].

use std::fmt;
use tracing::{info, warn};

use crate::api_connection::{
    ApiConnectionError, ChatCompletion, ImageGeneration, ImageSearch, ImageSearchHit,
};
use crate::error::ResolutionError;
use crate::name_simplifier;

pub const GENERATED_IMAGE_SIZE: &str = "512x512";

pub fn build_image_prompt(recipe_name: &str) -> String {
    format!("A delicious and appetizing image of {}", recipe_name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    DirectSearch,
    SimplifiedSearch,
    GenerativeFallback,
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolutionState::DirectSearch => "direct search",
            ResolutionState::SimplifiedSearch => "simplified search",
            ResolutionState::GenerativeFallback => "generative fallback",
        };
        f.write_str(name)
    }
}

/// The winning image and the state that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub url: String,
    pub source: ResolutionState,
    /// The search query or generation prompt that produced `url`.
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Resolved(ResolvedImage),
    Advance(ResolutionState),
}

pub struct ImageResolver<'a> {
    search: &'a dyn ImageSearch,
    chat: &'a dyn ChatCompletion,
    generator: &'a dyn ImageGeneration,
}

impl<'a> ImageResolver<'a> {
    pub fn new(
        search: &'a dyn ImageSearch,
        chat: &'a dyn ChatCompletion,
        generator: &'a dyn ImageGeneration,
    ) -> Self {
        Self {
            search,
            chat,
            generator,
        }
    }

    pub async fn resolve(&self, recipe_name: &str) -> Result<String, ResolutionError> {
        self.resolve_image(recipe_name).await.map(|image| image.url)
    }

    pub async fn resolve_image(&self, recipe_name: &str) -> Result<ResolvedImage, ResolutionError> {
        let mut state = ResolutionState::DirectSearch;
        loop {
            match self.step(state, recipe_name).await? {
                Transition::Resolved(image) => {
                    info!(recipe = recipe_name, source = %image.source, url = %image.url, "image resolved");
                    return Ok(image);
                }
                Transition::Advance(next) => {
                    info!(recipe = recipe_name, from = %state, to = %next, "no image, advancing");
                    state = next;
                }
            }
        }
    }

    /// Runs one state. Only `GenerativeFallback` can return `Err`.
    pub async fn step(
        &self,
        state: ResolutionState,
        recipe_name: &str,
    ) -> Result<Transition, ResolutionError> {
        match state {
            ResolutionState::DirectSearch => Ok(self
                .search_step(
                    state,
                    recipe_name.to_string(),
                    ResolutionState::SimplifiedSearch,
                )
                .await),
            ResolutionState::SimplifiedSearch => {
                let simplified = name_simplifier::simplify(self.chat, recipe_name).await;
                Ok(self
                    .search_step(state, simplified, ResolutionState::GenerativeFallback)
                    .await)
            }
            ResolutionState::GenerativeFallback => {
                self.generate_step(recipe_name).await.map(Transition::Resolved)
            }
        }
    }

    async fn search_step(
        &self,
        state: ResolutionState,
        query: String,
        on_miss: ResolutionState,
    ) -> Transition {
        match self.first_hit(&query).await {
            Some(hit) => Transition::Resolved(ResolvedImage {
                url: hit.image_url,
                source: state,
                query,
            }),
            None => Transition::Advance(on_miss),
        }
    }

    async fn first_hit(&self, query: &str) -> Option<ImageSearchHit> {
        match self.search.search(query).await {
            Ok(hits) => hits.into_iter().find(|hit| !hit.image_url.trim().is_empty()),
            Err(e) => {
                warn!(query, "image search failed: {}", e);
                None
            }
        }
    }

    async fn generate_step(&self, recipe_name: &str) -> Result<ResolvedImage, ResolutionError> {
        let prompt = build_image_prompt(recipe_name);
        let failed = |source| ResolutionError::GenerationFailed {
            recipe_name: recipe_name.to_string(),
            source,
        };

        let url = self
            .generator
            .generate_image(&prompt, GENERATED_IMAGE_SIZE)
            .await
            .map_err(failed)?;
        let url = url.trim();
        if url.is_empty() {
            return Err(failed(ApiConnectionError::EmptyResponse(
                "Image generation returned an empty URL".to_string(),
            )));
        }

        Ok(ResolvedImage {
            url: url.to_string(),
            source: ResolutionState::GenerativeFallback,
            query: prompt,
        })
    }
}
