//! Data models
//!
//! Rust structs representing database entities.

mod ingredient;
mod menu_plan;
mod menu_plan_item;
mod nutrient_profile;
mod nutrition;
mod nutrition_standard;
mod recipe;
mod recipe_component;
mod unit_conversion;

#[cfg(test)]
pub(crate) mod fixtures;

pub use ingredient::{
    Ingredient, IngredientCategory, IngredientCreate, IngredientFilter, IngredientUpdate,
};
pub use menu_plan::{MenuPlan, MenuPlanCreate, MenuPlanFilter, MenuPlanUpdate};
pub use menu_plan_item::{calculate_plan_nutrition, MenuPlanItem, MenuPlanItemDetail};
pub use nutrient_profile::{NutrientProfile, NutrientProfileSet};
pub use nutrition::Nutrition;
pub use nutrition_standard::{
    MealSlot, NutrientRange, NutritionStandard, NutritionStandardCreate, NutritionStandardUpdate,
    RangeStatus, StandardEvaluation,
};
pub use recipe::{Recipe, RecipeCategory, RecipeCreate, RecipeUpdate};
pub use recipe_component::{
    calculate_recipe_nutrition, RecipeComponent, RecipeComponentCreate, RecipeComponentDetail,
    RecipeComponentUpdate,
};
pub use unit_conversion::{UnitConversion, UnitConversionCreate, UnitConversionUpdate};

/// Read a TEXT column holding one of a fixed set of choice strings
pub(crate) fn choice_from_row<T>(
    row: &rusqlite::Row,
    column: &str,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(column)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("unknown {} value: {}", column, raw).into(),
        )
    })
}
