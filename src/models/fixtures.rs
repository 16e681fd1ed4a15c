//! Shared test fixtures for model tests

use rusqlite::Connection;

use crate::nutrition::BaseUnit;
use super::*;

pub fn ingredient(conn: &Connection, code: &str, name: &str) -> Ingredient {
    Ingredient::create(
        conn,
        &IngredientCreate {
            code: code.to_string(),
            name: name.to_string(),
            category: IngredientCategory::Carbohydrate,
            base_unit: BaseUnit::G,
            price_estimate: 0.0,
            shelf_life_days: 0,
        },
    )
    .unwrap()
}

/// Profile with the given energy per 100 g and zero macros
pub fn profile(conn: &Connection, ingredient_id: i64, energy: f64) -> NutrientProfile {
    NutrientProfile::set(
        conn,
        ingredient_id,
        &NutrientProfileSet { energy, edible_portion_pct: 100.0, ..Default::default() },
    )
    .unwrap()
}

pub fn conversion(conn: &Connection, ingredient_id: i64, unit_name: &str, grams_per_unit: f64) -> UnitConversion {
    UnitConversion::create(
        conn,
        &UnitConversionCreate {
            ingredient_id,
            unit_name: unit_name.to_string(),
            grams_per_unit,
        },
    )
    .unwrap()
}

pub fn standard_data(target_group: &str, meal_slot: MealSlot) -> NutritionStandardCreate {
    NutritionStandardCreate {
        target_group: target_group.to_string(),
        meal_slot,
        budget_per_portion: 15000.0,
        reference_pct: "30% AKG".to_string(),
        energy: NutrientRange::new(300.0, 400.0),
        protein: NutrientRange::new(10.0, 20.0),
        fat: NutrientRange::new(10.0, 20.0),
        carbohydrate: NutrientRange::new(50.0, 70.0),
    }
}

pub fn standard(conn: &Connection, target_group: &str, meal_slot: MealSlot) -> NutritionStandard {
    NutritionStandard::create(conn, &standard_data(target_group, meal_slot)).unwrap()
}

pub fn recipe(conn: &Connection, name: &str, category: RecipeCategory) -> Recipe {
    Recipe::create(conn, &RecipeCreate { name: name.to_string(), category }).unwrap()
}

/// Component with a direct gram weight
pub fn component(conn: &Connection, recipe_id: i64, ingredient_id: i64, grams: f64) -> RecipeComponent {
    RecipeComponent::create(
        conn,
        &RecipeComponentCreate {
            recipe_id,
            ingredient_id,
            weight_grams: Some(grams),
            ..Default::default()
        },
    )
    .unwrap()
}

pub fn plan(conn: &Connection, date: &str, standard_id: i64) -> MenuPlan {
    MenuPlan::create(
        conn,
        &MenuPlanCreate { date: date.to_string(), standard_id, notes: None },
    )
    .unwrap()
}
