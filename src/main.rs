use anyhow::{Context, Result};
use meal_planner::cli::{parse_args, Command};
use meal_planner::config::{AppConfig, Services};
use meal_planner::export::export_to_file;
use meal_planner::filters::SelectionFilters;
use meal_planner::recommender::{RecipeRecommender, RecipeRecord};
use meal_planner::recipe_store::StoredRecipe;
use meal_planner::shopping_list::{selected_ingredients, PeopleCount, ShoppingListGenerator};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("meal_planner=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_recipe(record: &RecipeRecord) {
    println!("{}", record.name);
    println!("{}", record.description);
    println!("\nIngredients:");
    for ingredient in record.ingredient_list() {
        println!("  - {}", ingredient);
    }
    println!("\nImage: {}", record.image);
}

fn print_saved(recipe: &StoredRecipe) {
    println!("[{}] {}", recipe.id, recipe.record.name);
    println!("    {}", recipe.record.description);
    println!("    Ingredients: {}", recipe.record.ingredients);
}

fn print_saved_id(action: &str, id: Option<u64>) {
    match id {
        Some(id) => println!("Recipe {} with id {}.", action, id),
        None => println!("Recipe {}.", action),
    }
}

async fn run(command: Command, config: &AppConfig, services: &Services) -> Result<()> {
    match command {
        Command::Generate {
            protein,
            cuisine,
            dietary,
            save,
        } => {
            let filters = SelectionFilters::new(protein, cuisine, dietary);
            let recommender = RecipeRecommender::new(
                services.chat.as_ref(),
                services.search.as_ref(),
                services.generator.as_ref(),
            );

            // Partial records are never shown.
            let record = match recommender.get_recipe(&filters).await {
                Ok(record) => record,
                Err(e) => {
                    error!("{}", e);
                    anyhow::bail!("Failed to fetch a recipe or retrieve its image.");
                }
            };
            print_recipe(&record);

            if save {
                let id = services
                    .store
                    .create(&record.for_saving(&config.default_image))
                    .await
                    .context("Failed to save recipe.")?;
                println!();
                print_saved_id("saved", id);
            }
        }
        Command::List => {
            let recipes = services
                .store
                .list()
                .await
                .context("Failed to fetch recipes from the database.")?;
            if recipes.is_empty() {
                println!("No saved recipes.");
            }
            for recipe in &recipes {
                print_saved(recipe);
            }
        }
        Command::Add {
            name,
            description,
            ingredients,
            image,
        } => {
            let record = RecipeRecord {
                name,
                description,
                ingredients,
                image: image.unwrap_or_else(|| config.default_image.clone()),
            };
            let id = services
                .store
                .create(&record)
                .await
                .context("Failed to add recipe. Please check the details and try again.")?;
            print_saved_id("added", id);
        }
        Command::Delete { id } => {
            services
                .store
                .delete(id)
                .await
                .with_context(|| format!("Failed to delete recipe {}", id))?;
            println!("Recipe {} deleted.", id);
        }
        Command::ShoppingList {
            recipes,
            people,
            output,
        } => {
            let people = PeopleCount::new(people)?;
            let saved = services
                .store
                .list()
                .await
                .context("Failed to fetch recipes from the database.")?;
            let ingredients = selected_ingredients(&saved, &recipes)?;

            let list = ShoppingListGenerator::new(services.chat.as_ref())
                .generate(&ingredients, people)
                .await
                .context("An error occurred while generating the shopping list.")?;

            println!("Your Shopping List for {} People\n", people);
            println!("{}", list.raw);

            let target = output.unwrap_or_else(|| PathBuf::from("."));
            let path = export_to_file(&list, &target)
                .await
                .with_context(|| format!("Failed to export shopping list to {}", target.display()))?;
            println!("\nSaved to {}", path.display());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli_args = parse_args();
    let config = AppConfig::from_env().context("Invalid configuration")?;
    let services = Services::from_config(&config).context("Failed to set up providers")?;

    run(cli_args.command, &config, &services).await
}
