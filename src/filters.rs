use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
pub enum Protein {
    #[default]
    Anything,
    Beef,
    Chicken,
    Fish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
pub enum Cuisine {
    #[default]
    Any,
    Chinese,
    Greek,
    Indian,
    Italian,
    Japanese,
    Mexican,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
pub enum DietaryOption {
    #[default]
    Any,
    Vegetarian,
    Vegan,
    #[value(name = "gluten-free")]
    #[serde(rename = "Gluten-Free")]
    GlutenFree,
    Healthy,
    /// Shown as "Cheap".
    #[value(name = "cheap", alias = "very-little-cost")]
    #[serde(rename = "Very Little Cost")]
    VeryLittleCost,
}

impl Protein {
    pub fn label(self) -> &'static str {
        match self {
            Protein::Anything => "Anything",
            Protein::Beef => "Beef",
            Protein::Chicken => "Chicken",
            Protein::Fish => "Fish",
        }
    }

    pub fn is_unconstrained(self) -> bool {
        self == Protein::Anything
    }
}

impl Cuisine {
    pub fn label(self) -> &'static str {
        match self {
            Cuisine::Any => "Any",
            Cuisine::Chinese => "Chinese",
            Cuisine::Greek => "Greek",
            Cuisine::Indian => "Indian",
            Cuisine::Italian => "Italian",
            Cuisine::Japanese => "Japanese",
            Cuisine::Mexican => "Mexican",
        }
    }

    pub fn is_unconstrained(self) -> bool {
        self == Cuisine::Any
    }
}

impl DietaryOption {
    /// The value sent to the model. `VeryLittleCost` keeps its long form
    /// because "Cheap restriction" reads poorly in the prompt.
    pub fn label(self) -> &'static str {
        match self {
            DietaryOption::Any => "Any",
            DietaryOption::Vegetarian => "Vegetarian",
            DietaryOption::Vegan => "Vegan",
            DietaryOption::GlutenFree => "Gluten-Free",
            DietaryOption::Healthy => "Healthy",
            DietaryOption::VeryLittleCost => "Very Little Cost",
        }
    }

    pub fn is_unconstrained(self) -> bool {
        self == DietaryOption::Any
    }
}

macro_rules! display_via_label {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        })*
    };
}

display_via_label!(Protein, Cuisine, DietaryOption);

/// Constraints the user picked for one generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionFilters {
    pub protein: Protein,
    pub cuisine: Cuisine,
    pub dietary_option: DietaryOption,
}

impl SelectionFilters {
    pub fn new(protein: Protein, cuisine: Cuisine, dietary_option: DietaryOption) -> Self {
        Self {
            protein,
            cuisine,
            dietary_option,
        }
    }

    /// Phrase for the cuisine slot of "a recipe from {} cuisine".
    pub fn cuisine_phrase(&self) -> &'static str {
        if self.cuisine.is_unconstrained() {
            "any"
        } else {
            self.cuisine.label()
        }
    }

    /// Phrase for the slot of "with {} restriction".
    pub fn dietary_phrase(&self) -> &'static str {
        if self.dietary_option.is_unconstrained() {
            "no particular"
        } else {
            self.dietary_option.label()
        }
    }

    /// Phrase for the slot of "using {} as protein".
    pub fn protein_phrase(&self) -> &'static str {
        if self.protein.is_unconstrained() {
            "any"
        } else {
            self.protein.label()
        }
    }
}

impl fmt::Display for SelectionFilters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "protein={}, cuisine={}, dietary={}",
            self.protein, self.cuisine, self.dietary_option
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_render_as_unconstrained() {
        let filters = SelectionFilters::default();
        assert_eq!(filters.protein_phrase(), "any");
        assert_eq!(filters.cuisine_phrase(), "any");
        assert_eq!(filters.dietary_phrase(), "no particular");
    }

    #[test]
    fn test_concrete_values_render_their_label() {
        let filters =
            SelectionFilters::new(Protein::Fish, Cuisine::Japanese, DietaryOption::GlutenFree);
        assert_eq!(filters.protein_phrase(), "Fish");
        assert_eq!(filters.cuisine_phrase(), "Japanese");
        assert_eq!(filters.dietary_phrase(), "Gluten-Free");
    }

    #[test]
    fn test_cli_value_names() {
        assert_eq!(
            DietaryOption::from_str("cheap", true).unwrap(),
            DietaryOption::VeryLittleCost
        );
        assert_eq!(
            DietaryOption::from_str("gluten-free", true).unwrap(),
            DietaryOption::GlutenFree
        );
        assert_eq!(Cuisine::from_str("Italian", true).unwrap(), Cuisine::Italian);
    }

    #[test]
    fn test_filters_serialize_with_original_labels() {
        let filters = SelectionFilters::new(
            Protein::Chicken,
            Cuisine::Italian,
            DietaryOption::VeryLittleCost,
        );
        let value = serde_json::to_value(filters).unwrap();
        assert_eq!(value["dietaryOption"], "Very Little Cost");
        assert_eq!(value["protein"], "Chicken");
    }
}
