use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api_connection::{ChatCompletion, ImageGeneration, ImageSearch};
use crate::error::RecipeError;
use crate::filters::SelectionFilters;
use crate::image_resolver::ImageResolver;
use crate::recipe_generator::{RecipeDraft, RecipeGenerator};

/// A recipe with a resolved image, ready to display or save.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RecipeRecord {
    pub name: String,
    pub description: String,
    pub ingredients: String,
    pub image: String,
}

impl RecipeRecord {
    pub fn from_draft(draft: RecipeDraft, image: String) -> Self {
        Self {
            name: draft.name,
            description: draft.description,
            ingredients: draft.ingredients,
            image,
        }
    }

    /// Ingredient list split on commas, trimmed, blanks dropped.
    pub fn ingredient_list(&self) -> Vec<String> {
        self.ingredients
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Copy suitable for the store. Only `.jpg` URLs are kept; generated
    /// images are short-lived links and get `default_image` instead.
    pub fn for_saving(&self, default_image: &str) -> RecipeRecord {
        let image = if self.image.to_ascii_lowercase().ends_with(".jpg") {
            self.image.clone()
        } else {
            default_image.to_string()
        };
        RecipeRecord {
            image,
            ..self.clone()
        }
    }
}

/// Generates a recipe for a filter set and attaches an image to it.
pub struct RecipeRecommender<'a> {
    chat: &'a dyn ChatCompletion,
    search: &'a dyn ImageSearch,
    generator: &'a dyn ImageGeneration,
}

impl<'a> RecipeRecommender<'a> {
    pub fn new(
        chat: &'a dyn ChatCompletion,
        search: &'a dyn ImageSearch,
        generator: &'a dyn ImageGeneration,
    ) -> Self {
        Self {
            chat,
            search,
            generator,
        }
    }

    /// Text generation, then image resolution on the generated name.
    /// Either failure fails the whole call and the draft is dropped.
    pub async fn get_recipe(&self, filters: &SelectionFilters) -> Result<RecipeRecord, RecipeError> {
        let draft = RecipeGenerator::new(self.chat)
            .generate(filters)
            .await
            .inspect_err(|e| warn!("recipe generation failed: {}", e))?;

        let image = ImageResolver::new(self.search, self.chat, self.generator)
            .resolve(&draft.name)
            .await
            .inspect_err(|e| warn!(recipe = %draft.name, "image resolution failed: {}", e))?;

        info!(recipe = %draft.name, image = %image, "recipe ready");
        Ok(RecipeRecord::from_draft(draft, image))
    }
}
