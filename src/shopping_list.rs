use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::api_connection::ChatCompletion;
use crate::error::ShoppingListError;
use crate::recipe_store::StoredRecipe;

pub const MIN_PEOPLE: u32 = 1;
pub const MAX_PEOPLE: u32 = 20;

pub const SHOPPING_SYSTEM_PROMPT: &str =
    "You are an assistant that provides structured shopping lists based on provided ingredients.";
pub const SHOPPING_MAX_TOKENS: u32 = 300;
pub const SHOPPING_TEMPERATURE: f32 = 0.7;

const UNCATEGORIZED: &str = "Other";

/// Number of people a list is scaled for, 1 to 20.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeopleCount(u32);

impl PeopleCount {
    pub fn new(people: u32) -> Result<Self, ShoppingListError> {
        if !(MIN_PEOPLE..=MAX_PEOPLE).contains(&people) {
            return Err(ShoppingListError::InvalidPeopleCount {
                got: people,
                min: MIN_PEOPLE,
                max: MAX_PEOPLE,
            });
        }
        Ok(Self(people))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for PeopleCount {
    fn default() -> Self {
        Self(2)
    }
}

impl fmt::Display for PeopleCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ingredients of the selected recipes, one inner list per recipe, in
/// listing order.
pub fn selected_ingredients(
    recipes: &[StoredRecipe],
    selected_ids: &[u64],
) -> Result<Vec<Vec<String>>, ShoppingListError> {
    let selected: Vec<Vec<String>> = recipes
        .iter()
        .filter(|recipe| selected_ids.contains(&recipe.id))
        .map(|recipe| recipe.record.ingredient_list())
        .filter(|ingredients| !ingredients.is_empty())
        .collect();

    if selected.is_empty() {
        return Err(ShoppingListError::NothingSelected);
    }
    Ok(selected)
}

pub fn build_prompt(ingredients: &[Vec<String>], people: PeopleCount) -> String {
    let scaled: Vec<String> = ingredients
        .iter()
        .map(|recipe| format!("{} for {} people", recipe.join(", "), people))
        .collect();

    format!(
        "Create a shopping list based on the following ingredients and scale the quantities appropriately for {people} people.\n\
         If the ingredients do not specify quantities, assume the default amount is sufficient for one person and scale accordingly.\n\
         Structure the list clearly by category (e.g., Produce, Dairy, Pantry).\n\
         Ingredients: {}.\n\
         Only return the scaled list.",
        scaled.join(", "),
        people = people,
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingCategory {
    pub name: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub people: PeopleCount,
    /// The model's reply, verbatim.
    pub raw: String,
    pub categories: Vec<ShoppingCategory>,
}

impl ShoppingList {
    pub fn from_reply(raw: String, people: PeopleCount) -> Self {
        let categories = parse_categories(&raw);
        Self {
            people,
            raw,
            categories,
        }
    }

    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|category| category.items.len()).sum()
    }
}

fn strip_bullet(line: &str) -> Option<&str> {
    for marker in ["- ", "* ", "• ", "– "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Some(rest.trim());
        }
    }

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        // "1. eggs" is a bullet, "1.5 lb beef" is not.
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            if rest.starts_with(char::is_whitespace) {
                return Some(rest.trim());
            }
        }
    }
    None
}

fn as_heading(line: &str) -> Option<String> {
    let markdown_heading = line.starts_with('#');
    let cleaned = line.trim_start_matches('#').trim().trim_matches('*').trim();
    if let Some(name) = cleaned.strip_suffix(':') {
        let name = name.trim().trim_matches('*').trim();
        return (!name.is_empty()).then(|| name.to_string());
    }
    if markdown_heading && !cleaned.is_empty() {
        return Some(cleaned.to_string());
    }
    None
}

/// Best-effort grouping of a free-text list. Headings (`Produce:`,
/// `**Dairy:**`, `## Pantry`) open a category; bullet or numbered lines add
/// items. Plain lines count as items only inside a category.
pub fn parse_categories(raw: &str) -> Vec<ShoppingCategory> {
    let mut categories: Vec<ShoppingCategory> = Vec::new();

    for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if let Some(item) = strip_bullet(line) {
            let item = item.trim_matches('*').trim();
            if item.is_empty() {
                continue;
            }
            if categories.is_empty() {
                categories.push(ShoppingCategory {
                    name: UNCATEGORIZED.to_string(),
                    items: Vec::new(),
                });
            }
            if let Some(current) = categories.last_mut() {
                current.items.push(item.to_string());
            }
        } else if let Some(name) = as_heading(line) {
            categories.push(ShoppingCategory {
                name,
                items: Vec::new(),
            });
        } else if let Some(current) = categories.last_mut() {
            current.items.push(line.to_string());
        }
    }

    categories.retain(|category| !category.items.is_empty());
    categories
}

pub struct ShoppingListGenerator<'a> {
    chat: &'a dyn ChatCompletion,
}

impl<'a> ShoppingListGenerator<'a> {
    pub fn new(chat: &'a dyn ChatCompletion) -> Self {
        Self { chat }
    }

    pub async fn generate(
        &self,
        ingredients: &[Vec<String>],
        people: PeopleCount,
    ) -> Result<ShoppingList, ShoppingListError> {
        if ingredients.iter().all(|recipe| recipe.is_empty()) {
            return Err(ShoppingListError::NothingSelected);
        }

        let prompt = build_prompt(ingredients, people);
        info!(recipes = ingredients.len(), %people, "requesting shopping list");

        let reply = self
            .chat
            .complete(
                SHOPPING_SYSTEM_PROMPT,
                &prompt,
                SHOPPING_MAX_TOKENS,
                SHOPPING_TEMPERATURE,
            )
            .await?;
        debug!("raw shopping list reply: {}", reply);

        let reply = reply.trim();
        if reply.is_empty() {
            return Err(ShoppingListError::EmptyReply);
        }
        Ok(ShoppingList::from_reply(reply.to_string(), people))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_connection::FakeChatProvider;
    use crate::recommender::RecipeRecord;

    fn stored(id: u64, ingredients: &str) -> StoredRecipe {
        StoredRecipe {
            id,
            record: RecipeRecord {
                name: format!("Recipe {}", id),
                description: "desc".to_string(),
                ingredients: ingredients.to_string(),
                image: "default.jpg".to_string(),
            },
        }
    }

    #[test]
    fn test_people_count_range() {
        assert!(PeopleCount::new(1).is_ok());
        assert!(PeopleCount::new(20).is_ok());
        assert!(matches!(
            PeopleCount::new(0),
            Err(ShoppingListError::InvalidPeopleCount { got: 0, .. })
        ));
        assert!(PeopleCount::new(21).is_err());
    }

    #[test]
    fn test_selected_ingredients_keeps_listing_order() {
        let recipes = vec![
            stored(3, "rice, beans"),
            stored(2, "pasta"),
            stored(1, "chicken, lemon, capers"),
        ];
        let selected = selected_ingredients(&recipes, &[1, 3]).unwrap();
        assert_eq!(
            selected,
            vec![
                vec!["rice".to_string(), "beans".to_string()],
                vec!["chicken".to_string(), "lemon".to_string(), "capers".to_string()],
            ]
        );
    }

    #[test]
    fn test_selected_ingredients_requires_a_match() {
        let recipes = vec![stored(1, "rice")];
        assert!(matches!(
            selected_ingredients(&recipes, &[]),
            Err(ShoppingListError::NothingSelected)
        ));
        assert!(matches!(
            selected_ingredients(&recipes, &[42]),
            Err(ShoppingListError::NothingSelected)
        ));
    }

    #[test]
    fn test_prompt_scales_each_recipe() {
        let people = PeopleCount::new(4).unwrap();
        let prompt = build_prompt(
            &[
                vec!["rice".to_string(), "beans".to_string()],
                vec!["pasta".to_string()],
            ],
            people,
        );
        assert!(prompt.contains("appropriately for 4 people"));
        assert!(prompt.contains("Ingredients: rice, beans for 4 people, pasta for 4 people."));
        assert!(prompt.contains("Produce, Dairy, Pantry"));
    }

    #[test]
    fn test_parse_categories_plain_headings() {
        let raw = "Produce:\n- 4 lemons\n- 1 bunch parsley\n\nDairy:\n- 1 stick butter\n";
        let categories = parse_categories(raw);
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].name, "Produce");
        assert_eq!(categories[0].items, vec!["4 lemons", "1 bunch parsley"]);
        assert_eq!(categories[1].name, "Dairy");
    }

    #[test]
    fn test_parse_categories_markdown_and_numbers() {
        let raw = "## Meat\n1. 2 lb chicken\n2) 1 lb beef\n**Pantry:**\n* **capers**\nsalt\n";
        let categories = parse_categories(raw);
        assert_eq!(categories[0].name, "Meat");
        assert_eq!(categories[0].items, vec!["2 lb chicken", "1 lb beef"]);
        assert_eq!(categories[1].name, "Pantry");
        assert_eq!(categories[1].items, vec!["capers", "salt"]);
    }

    #[test]
    fn test_parse_categories_bullets_before_heading() {
        let categories = parse_categories("Here you go\n- eggs\n- milk");
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, UNCATEGORIZED);
        assert_eq!(categories[0].items, vec!["eggs", "milk"]);
    }

    #[tokio::test]
    async fn test_generate_builds_list() {
        let chat = FakeChatProvider::new()
            .with_reply("shopping list", "Produce:\n- 8 lemons\nPantry:\n- 2 jars capers");
        let people = PeopleCount::new(4).unwrap();
        let list = ShoppingListGenerator::new(&chat)
            .generate(&[vec!["lemon".to_string(), "capers".to_string()]], people)
            .await
            .unwrap();

        assert_eq!(list.people, people);
        assert_eq!(list.item_count(), 2);
        assert!(list.raw.starts_with("Produce:"));

        let calls = chat.calls();
        assert_eq!(calls[0].system_prompt, SHOPPING_SYSTEM_PROMPT);
        assert_eq!(calls[0].max_tokens, SHOPPING_MAX_TOKENS);
    }

    #[tokio::test]
    async fn test_generate_surfaces_provider_failure() {
        let chat = FakeChatProvider::new().with_failure("shopping list");
        let result = ShoppingListGenerator::new(&chat)
            .generate(&[vec!["rice".to_string()]], PeopleCount::default())
            .await;
        assert!(matches!(result, Err(ShoppingListError::Provider(_))));
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_selection() {
        let chat = FakeChatProvider::new();
        let result = ShoppingListGenerator::new(&chat)
            .generate(&[], PeopleCount::default())
            .await;
        assert!(matches!(result, Err(ShoppingListError::NothingSelected)));
        assert_eq!(chat.call_count(), 0);
    }
}
