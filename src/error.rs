use thiserror::Error;

use crate::api_connection::ApiConnectionError;

/// Recipe text generation produced nothing usable.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Recipe request failed: {0}")]
    Provider(#[from] ApiConnectionError),

    #[error("No response received from the recipe model")]
    EmptyReply,

    #[error("Unexpected reply format: expected 3 '|' segments, got {segments}")]
    MalformedReply { segments: usize, reply: String },

    #[error("Reply did not contain a recipe name")]
    MissingName,
}

/// Every image path for a recipe was exhausted.
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("Image generation failed for '{recipe_name}': {source}")]
    GenerationFailed {
        recipe_name: String,
        #[source]
        source: ApiConnectionError,
    },
}

/// `get_recipe` failed; no partial record is returned.
#[derive(Error, Debug)]
pub enum RecipeError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

/// The recipe store collaborator failed.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Recipe ID is required")]
    MissingId,

    #[error("Recipe store request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Recipe store returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Invalid recipe store response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("No recipe with id {0}")]
    NotFound(u64),
}

#[derive(Error, Debug)]
pub enum ShoppingListError {
    #[error("Please select at least one recipe")]
    NothingSelected,

    #[error("Number of people must be between {min} and {max}, got {got}")]
    InvalidPeopleCount { got: u32, min: u32, max: u32 },

    #[error("Shopping list request failed: {0}")]
    Provider(#[from] ApiConnectionError),

    #[error("No shopping list received from the model")]
    EmptyReply,
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Shopping list is empty")]
    EmptyList,

    #[error("Failed to write document: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(&'static str),

    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
