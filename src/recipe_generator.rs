use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api_connection::ChatCompletion;
use crate::error::GenerationError;
use crate::filters::SelectionFilters;

pub const RECIPE_SYSTEM_PROMPT: &str = "You are an expert on recipes and cooking.";
pub const RECIPE_MAX_TOKENS: u32 = 300;
pub const RECIPE_TEMPERATURE: f32 = 0.7;

const NAME_LABEL: &str = "Recipe Name:";
const DESCRIPTION_LABEL: &str = "Description:";
const INGREDIENTS_LABEL: &str = "Ingredients:";

/// Generated recipe text before an image has been attached.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RecipeDraft {
    pub name: String,
    pub description: String,
    /// Comma-separated free text.
    pub ingredients: String,
}

pub fn build_recipe_prompt(filters: &SelectionFilters) -> String {
    format!(
        "Please provide a recipe from {} cuisine with {} restriction using {} as protein with the following structure: \"{} [Name] | {} [Description] | {} [Ingredients List]\"",
        filters.cuisine_phrase(),
        filters.dietary_phrase(),
        filters.protein_phrase(),
        NAME_LABEL,
        DESCRIPTION_LABEL,
        INGREDIENTS_LABEL,
    )
}

fn strip_label<'a>(segment: &'a str, label: &str) -> &'a str {
    let head = segment.get(..label.len());
    match head {
        Some(head) if head.eq_ignore_ascii_case(label) => segment[label.len()..].trim(),
        _ => segment,
    }
}

// Models sometimes wrap labels or values in quotes or bold markers.
fn clean(text: &str) -> &str {
    text.trim_matches(|c| c == '"' || c == '*').trim()
}

/// `**Recipe Name:** "X"` and `Recipe Name: X` both give `X`.
fn field<'a>(segment: &'a str, label: &str) -> &'a str {
    clean(strip_label(clean(segment), label))
}

/// Splits a `Recipe Name: .. | Description: .. | Ingredients: ..` reply.
/// Segments past the third are ignored.
pub fn parse_recipe_reply(reply: &str) -> Result<RecipeDraft, GenerationError> {
    let segments: Vec<&str> = reply.split('|').map(str::trim).collect();
    if segments.len() < 3 {
        return Err(GenerationError::MalformedReply {
            segments: segments.len(),
            reply: reply.to_string(),
        });
    }

    let name = field(segments[0], NAME_LABEL);
    let description = field(segments[1], DESCRIPTION_LABEL);
    let ingredients = field(segments[2], INGREDIENTS_LABEL);

    if name.is_empty() {
        return Err(GenerationError::MissingName);
    }

    Ok(RecipeDraft {
        name: name.to_string(),
        description: description.to_string(),
        ingredients: ingredients.to_string(),
    })
}

pub struct RecipeGenerator<'a> {
    chat: &'a dyn ChatCompletion,
}

impl<'a> RecipeGenerator<'a> {
    pub fn new(chat: &'a dyn ChatCompletion) -> Self {
        Self { chat }
    }

    /// One completion call, no retry: a malformed reply fails the request.
    pub async fn generate(&self, filters: &SelectionFilters) -> Result<RecipeDraft, GenerationError> {
        let prompt = build_recipe_prompt(filters);
        info!(%filters, "requesting recipe");

        let reply = self
            .chat
            .complete(RECIPE_SYSTEM_PROMPT, &prompt, RECIPE_MAX_TOKENS, RECIPE_TEMPERATURE)
            .await?;
        debug!("raw recipe reply: {}", reply);

        if reply.trim().is_empty() {
            return Err(GenerationError::EmptyReply);
        }

        let draft = parse_recipe_reply(&reply)?;
        info!(name = %draft.name, "recipe generated");
        Ok(draft)
    }
}
