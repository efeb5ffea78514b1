//! The saved-recipe collection, served by a small REST backend.

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::recommender::RecipeRecord;

pub const DEFAULT_STORE_URL: &str = "https://my-secret-recipes-db.onrender.com";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StoredRecipe {
    pub id: u64,
    #[serde(flatten)]
    pub record: RecipeRecord,
}

#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// All saved recipes, newest first.
    async fn list(&self) -> Result<Vec<StoredRecipe>, StoreError>;

    /// Saves `record` and returns its id when the store can tell it.
    /// Once the store has accepted the write this never returns `Err`.
    async fn create(&self, record: &RecipeRecord) -> Result<Option<u64>, StoreError>;

    async fn delete(&self, id: u64) -> Result<(), StoreError>;
}

/// Name, description and ingredients are required; the image is not.
pub fn validate_record(record: &RecipeRecord) -> Result<(), StoreError> {
    if record.name.trim().is_empty() {
        return Err(StoreError::MissingField("name"));
    }
    if record.description.trim().is_empty() {
        return Err(StoreError::MissingField("description"));
    }
    if record.ingredients.trim().is_empty() {
        return Err(StoreError::MissingField("ingredients"));
    }
    Ok(())
}

fn newest_first(mut recipes: Vec<StoredRecipe>) -> Vec<StoredRecipe> {
    recipes.sort_by(|a, b| b.id.cmp(&a.id));
    recipes
}

#[derive(Debug, Clone)]
pub struct HttpRecipeStore {
    base_url: String,
    client: Client,
}

impl HttpRecipeStore {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// The backend reports failures as `{"error": "..."}`.
    async fn error_from(response: Response) -> StoreError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|value| value.get("error").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(body);
        StoreError::Api {
            status,
            body: message,
        }
    }

    /// Newest listed row equal to `record`.
    async fn find_saved(&self, record: &RecipeRecord) -> Option<u64> {
        match self.list().await {
            Ok(recipes) => recipes
                .into_iter()
                .find(|recipe| recipe.record == *record)
                .map(|recipe| recipe.id),
            Err(e) => {
                warn!("could not list recipes to find the saved id: {}", e);
                None
            }
        }
    }
}

/// Some backends echo the inserted row, others only a message.
fn id_from_body(body: &str) -> Option<u64> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("id")
        .and_then(Value::as_u64)
}

#[async_trait]
impl RecipeStore for HttpRecipeStore {
    async fn list(&self) -> Result<Vec<StoredRecipe>, StoreError> {
        let response = self.client.get(self.url("/recipes")).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        let body = response.text().await?;
        let recipes: Vec<StoredRecipe> = serde_json::from_str(&body)?;
        debug!(count = recipes.len(), "listed recipes");
        Ok(newest_first(recipes))
    }

    async fn create(&self, record: &RecipeRecord) -> Result<Option<u64>, StoreError> {
        validate_record(record)?;

        let response = self
            .client
            .post(self.url("/addRecipe"))
            .json(record)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        // The row is written at this point; everything below is best-effort.
        let body = response.text().await.unwrap_or_default();
        let id = match id_from_body(&body) {
            Some(id) => Some(id),
            None => self.find_saved(record).await,
        };
        match id {
            Some(id) => info!(id, name = %record.name, "recipe saved"),
            None => warn!(name = %record.name, "recipe saved, but its id could not be determined"),
        }
        Ok(id)
    }

    async fn delete(&self, id: u64) -> Result<(), StoreError> {
        if id == 0 {
            return Err(StoreError::MissingId);
        }

        let response = self
            .client
            .delete(self.url(&format!("/deleteRecipe/{}", id)))
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            info!(id, "recipe deleted");
            Ok(())
        } else if status == StatusCode::NOT_FOUND {
            Err(StoreError::NotFound(id))
        } else {
            Err(Self::error_from(response).await)
        }
    }
}

/// In-process store backing the pipeline tests.
#[derive(Debug, Default)]
pub struct MemoryRecipeStore {
    recipes: Mutex<Vec<StoredRecipe>>,
}

impl MemoryRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recipes(recipes: Vec<StoredRecipe>) -> Self {
        Self {
            recipes: Mutex::new(recipes),
        }
    }
}

#[async_trait]
impl RecipeStore for MemoryRecipeStore {
    async fn list(&self) -> Result<Vec<StoredRecipe>, StoreError> {
        Ok(newest_first(self.recipes.lock().clone()))
    }

    async fn create(&self, record: &RecipeRecord) -> Result<Option<u64>, StoreError> {
        validate_record(record)?;
        let mut recipes = self.recipes.lock();
        let id = recipes.iter().map(|recipe| recipe.id).max().unwrap_or(0) + 1;
        recipes.push(StoredRecipe {
            id,
            record: record.clone(),
        });
        Ok(Some(id))
    }

    async fn delete(&self, id: u64) -> Result<(), StoreError> {
        if id == 0 {
            return Err(StoreError::MissingId);
        }
        let mut recipes = self.recipes.lock();
        let before = recipes.len();
        recipes.retain(|recipe| recipe.id != id);
        if recipes.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}
