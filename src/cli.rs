use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::filters::{Cuisine, DietaryOption, Protein};
use crate::shopping_list::{MAX_PEOPLE, MIN_PEOPLE};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ask the model for a recipe matching the filters
    Generate {
        #[arg(short, long, value_enum, default_value_t = Protein::Anything)]
        protein: Protein,
        #[arg(short, long, value_enum, default_value_t = Cuisine::Any)]
        cuisine: Cuisine,
        #[arg(short, long, value_enum, default_value_t = DietaryOption::Any)]
        dietary: DietaryOption,
        /// Save the recipe to the collection
        #[arg(long)]
        save: bool,
    },
    /// List saved recipes, newest first
    List,
    /// Add a recipe by hand
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        /// Comma-separated ingredients
        #[arg(long)]
        ingredients: String,
        /// Image URL; the default image is used when omitted
        #[arg(long)]
        image: Option<String>,
    },
    /// Delete a saved recipe
    Delete { id: u64 },
    /// Build a scaled shopping list from saved recipes
    ShoppingList {
        /// Saved recipe id, repeatable
        #[arg(short, long = "recipe", required = true)]
        recipes: Vec<u64>,
        #[arg(short = 'n', long, default_value_t = 2,
              value_parser = clap::value_parser!(u32).range(MIN_PEOPLE as i64..=MAX_PEOPLE as i64))]
        people: u32,
        /// File or directory for the exported document
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
