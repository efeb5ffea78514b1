use tracing::{debug, warn};

use crate::api_connection::ChatCompletion;

pub const SIMPLIFIER_SYSTEM_PROMPT: &str =
    "You are an assistant that simplifies recipe names for search purposes.";
pub const SIMPLIFIER_MAX_TOKENS: u32 = 20;
pub const SIMPLIFIER_TEMPERATURE: f32 = 0.5;

pub fn build_simplify_prompt(original_name: &str) -> String {
    format!(
        "Please simplify the recipe name \"{}\" by removing any adjectives, descriptors, or regional terms.\n\
         Focus only on the main ingredient and the basic type of dish, such as \"Stir-Fry\" or \"Soup.\"\n\
         Make sure that the new name is different from the original name.\n\
         Provide only the simplified name in response.",
        original_name
    )
}

/// Rewrites an over-specific recipe name into its core dish type for image
/// search. Never fails: any provider error or blank reply yields the input.
///
/// The prompt asks for a name different from the input, but nothing checks
/// that the model complied.
pub async fn simplify(chat: &dyn ChatCompletion, original_name: &str) -> String {
    let prompt = build_simplify_prompt(original_name);
    let reply = match chat
        .complete(
            SIMPLIFIER_SYSTEM_PROMPT,
            &prompt,
            SIMPLIFIER_MAX_TOKENS,
            SIMPLIFIER_TEMPERATURE,
        )
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            warn!(name = original_name, "name simplification failed, keeping original: {}", e);
            return original_name.to_string();
        }
    };

    let simplified = reply
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    if simplified.is_empty() {
        warn!(name = original_name, "name simplification returned nothing, keeping original");
        return original_name.to_string();
    }

    debug!(original = original_name, simplified, "simplified recipe name");
    simplified.to_string()
}
