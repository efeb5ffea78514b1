pub mod api_connection;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod filters;
pub mod image_resolver;
pub mod name_simplifier;
pub mod recipe_generator;
pub mod recipe_store;
pub mod recommender;
pub mod shopping_list;
