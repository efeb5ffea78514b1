use dotenv::dotenv;
use reqwest::Client;
use std::env;
use std::time::Duration;

use crate::api_connection::endpoints::{
    DEFAULT_CHAT_MODEL, OPENAI_DEFAULT_BASE_URL, SPOONACULAR_DEFAULT_BASE_URL,
};
use crate::api_connection::{
    ChatCompletion, ImageGeneration, ImageSearch, OpenAiProvider, SpoonacularProvider,
};
use crate::error::ConfigError;
use crate::recipe_store::{HttpRecipeStore, RecipeStore, DEFAULT_STORE_URL};

pub const OPENAI_API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";
pub const SPOONACULAR_API_KEY_ENV_VAR: &str = "SPOONACULAR_API_KEY";
pub const OPENAI_BASE_URL_ENV_VAR: &str = "OPENAI_BASE_URL";
pub const SPOONACULAR_BASE_URL_ENV_VAR: &str = "SPOONACULAR_BASE_URL";
pub const OPENAI_MODEL_ENV_VAR: &str = "OPENAI_MODEL";
pub const RECIPE_STORE_URL_ENV_VAR: &str = "RECIPE_STORE_URL";
pub const DEFAULT_IMAGE_ENV_VAR: &str = "RECIPE_DEFAULT_IMAGE";
pub const HTTP_TIMEOUT_ENV_VAR: &str = "HTTP_TIMEOUT_SECS";

pub const DEFAULT_IMAGE: &str = "default_img.jpg";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub spoonacular_api_key: String,
    pub openai_base_url: String,
    pub spoonacular_base_url: String,
    pub chat_model: String,
    pub store_url: String,
    pub default_image: String,
    pub http_timeout: Duration,
}

impl AppConfig {
    /// Loads `.env`, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let or_default = |name: &str, default: &str| read(name).unwrap_or_else(|| default.to_string());

        let required =
            |name: &'static str| read(name).ok_or(ConfigError::MissingApiKey(name));
        let openai_api_key = required(OPENAI_API_KEY_ENV_VAR)?;
        let spoonacular_api_key = required(SPOONACULAR_API_KEY_ENV_VAR)?;

        let http_timeout = match read(HTTP_TIMEOUT_ENV_VAR) {
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            Some(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidValue {
                    name: HTTP_TIMEOUT_ENV_VAR,
                    value,
                })?,
        };

        Ok(Self {
            openai_api_key,
            spoonacular_api_key,
            openai_base_url: or_default(OPENAI_BASE_URL_ENV_VAR, OPENAI_DEFAULT_BASE_URL),
            spoonacular_base_url: or_default(
                SPOONACULAR_BASE_URL_ENV_VAR,
                SPOONACULAR_DEFAULT_BASE_URL,
            ),
            chat_model: or_default(OPENAI_MODEL_ENV_VAR, DEFAULT_CHAT_MODEL),
            store_url: or_default(RECIPE_STORE_URL_ENV_VAR, DEFAULT_STORE_URL),
            default_image: or_default(DEFAULT_IMAGE_ENV_VAR, DEFAULT_IMAGE),
            http_timeout,
        })
    }
}

/// The providers and store one CLI invocation works with.
pub struct Services {
    pub chat: Box<dyn ChatCompletion>,
    pub search: Box<dyn ImageSearch>,
    pub generator: Box<dyn ImageGeneration>,
    pub store: Box<dyn RecipeStore>,
}

impl Services {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let client = Client::builder().timeout(config.http_timeout).build()?;
        let openai = OpenAiProvider::new(
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
            config.chat_model.clone(),
            client.clone(),
        );
        let spoonacular = SpoonacularProvider::new(
            config.spoonacular_api_key.clone(),
            config.spoonacular_base_url.clone(),
            client.clone(),
        );
        Ok(Self {
            chat: Box::new(openai.clone()),
            search: Box::new(spoonacular),
            generator: Box::new(openai),
            store: Box::new(HttpRecipeStore::new(config.store_url.clone(), client)),
        })
    }
}
