//! Recipe tools
//!
//! Recipes and their ingredient components. Totals are computed from the
//! current components on every read.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::db::Database;
use crate::models::{
    calculate_recipe_nutrition, Ingredient, Nutrition, Recipe, RecipeCategory, RecipeComponent,
    RecipeComponentCreate, RecipeComponentDetail, RecipeComponentUpdate, RecipeCreate,
    RecipeUpdate, UnitConversion,
};
use crate::nutrition::{component_contribution, display::MASS_UNIT, format_quantity, NutritionDisplay};
use super::{require_non_negative, require_text, write_error};

/// Recipe row for list results, with computed nutrient columns
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub name: String,
    pub category: RecipeCategory,
    pub category_label: &'static str,
    pub component_count: usize,
    pub energy: String,
    pub protein: String,
    pub fat: String,
    pub carbohydrate: String,
}

#[derive(Debug, Serialize)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// A component line with its resolved weight and contribution
#[derive(Debug, Serialize)]
pub struct ComponentLine {
    #[serde(flatten)]
    pub detail: RecipeComponentDetail,
    pub weight: String,
    pub contribution: Nutrition,
}

impl From<RecipeComponentDetail> for ComponentLine {
    fn from(detail: RecipeComponentDetail) -> Self {
        let contribution = component_contribution(
            detail.resolved_weight_grams,
            detail.per_100g.as_ref(),
        );
        Self {
            weight: format_quantity(detail.resolved_weight_grams, MASS_UNIT),
            contribution,
            detail,
        }
    }
}

/// Full recipe detail
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub id: i64,
    pub name: String,
    pub label: String,
    pub category: RecipeCategory,
    pub components: Vec<ComponentLine>,
    pub totals: Nutrition,
    pub totals_display: NutritionDisplay,
    /// Number of menu plan items serving this recipe
    pub plan_usage_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct CreateRecipeResponse {
    pub id: i64,
    pub name: String,
    pub label: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateRecipeResponse {
    pub success: bool,
    pub label: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteRecipeResponse {
    pub success: bool,
    pub deleted_id: i64,
    pub plan_items_removed: i64,
}

/// Response for component writes: the saved row plus the recipe's new totals
#[derive(Debug, Serialize)]
pub struct ComponentResponse {
    pub component: RecipeComponent,
    pub recipe_totals: NutritionDisplay,
}

#[derive(Debug, Serialize)]
pub struct BatchComponentsResponse {
    pub recipe_id: i64,
    pub added: Vec<RecipeComponent>,
    pub recipe_totals: NutritionDisplay,
}

#[derive(Debug, Serialize)]
pub struct RemoveComponentResponse {
    pub success: bool,
    pub deleted_id: i64,
    pub recipe_totals: NutritionDisplay,
}

/// One component in a batch add
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentInput {
    pub ingredient_id: i64,
    pub weight_grams: Option<f64>,
    pub conversion_id: Option<i64>,
    pub unit_count: Option<f64>,
}

fn recipe_summary(conn: &Connection, recipe: &Recipe) -> Result<RecipeSummary, String> {
    let component_count = RecipeComponent::get_for_recipe(conn, recipe.id)
        .map_err(|e| format!("Failed to get components: {}", e))?
        .len();
    let totals = calculate_recipe_nutrition(conn, recipe.id)
        .map_err(|e| format!("Failed to calculate nutrition: {}", e))?;
    let display = NutritionDisplay::from(&totals);

    Ok(RecipeSummary {
        id: recipe.id,
        name: recipe.name.clone(),
        category: recipe.category,
        category_label: recipe.category.label(),
        component_count,
        energy: display.energy,
        protein: display.protein,
        fat: display.fat,
        carbohydrate: display.carbohydrate,
    })
}

fn recipe_totals_display(conn: &Connection, recipe_id: i64) -> Result<NutritionDisplay, String> {
    let totals = calculate_recipe_nutrition(conn, recipe_id)
        .map_err(|e| format!("Failed to calculate nutrition: {}", e))?;
    Ok(NutritionDisplay::from(&totals))
}

/// Check amounts and that a conversion, if given, belongs to the ingredient
fn validate_component(
    conn: &Connection,
    ingredient_id: i64,
    weight_grams: Option<f64>,
    conversion_id: Option<i64>,
    unit_count: Option<f64>,
) -> Result<(), String> {
    if let Some(grams) = weight_grams {
        require_non_negative("weight_grams", grams)?;
    }
    if let Some(count) = unit_count {
        require_non_negative("unit_count", count)?;
    }

    if Ingredient::get_by_id(conn, ingredient_id)
        .map_err(|e| format!("Failed to get ingredient: {}", e))?
        .is_none()
    {
        return Err(format!("Ingredient {} not found", ingredient_id));
    }

    if let Some(conversion_id) = conversion_id {
        let conversion = UnitConversion::get_by_id(conn, conversion_id)
            .map_err(|e| format!("Failed to get unit conversion: {}", e))?
            .ok_or_else(|| format!("Unit conversion {} not found", conversion_id))?;
        if conversion.ingredient_id != ingredient_id {
            return Err(format!(
                "Unit conversion {} belongs to ingredient {}, not {}",
                conversion_id, conversion.ingredient_id, ingredient_id
            ));
        }
    }

    Ok(())
}

fn require_recipe(conn: &Connection, recipe_id: i64) -> Result<Recipe, String> {
    Recipe::get_by_id(conn, recipe_id)
        .map_err(|e| format!("Failed to get recipe: {}", e))?
        .ok_or_else(|| format!("Recipe {} not found", recipe_id))
}

// ============================================================================
// Recipe Tools
// ============================================================================

pub fn create_recipe(db: &Database, mut data: RecipeCreate) -> Result<CreateRecipeResponse, String> {
    data.name = require_text("Recipe name", &data.name)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::create(&conn, &data)
        .map_err(|e| write_error("create recipe", e))?;

    info!("Created recipe {}", recipe.label());

    Ok(CreateRecipeResponse {
        label: recipe.label(),
        id: recipe.id,
        name: recipe.name,
        created_at: recipe.created_at,
    })
}

/// Get a recipe with its components and computed totals
pub fn get_recipe(db: &Database, id: i64) -> Result<Option<RecipeDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = match Recipe::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get recipe: {}", e))?
    {
        Some(r) => r,
        None => return Ok(None),
    };

    let details = RecipeComponent::get_details_for_recipe(&conn, id)
        .map_err(|e| format!("Failed to get components: {}", e))?;
    let components: Vec<ComponentLine> = details.into_iter().map(ComponentLine::from).collect();
    let totals: Nutrition = components.iter().map(|c| c.contribution).sum();

    let plan_usage_count = Recipe::get_plan_usage_count(&conn, id)
        .map_err(|e| format!("Failed to get plan usage: {}", e))?;

    Ok(Some(RecipeDetail {
        label: recipe.label(),
        id: recipe.id,
        name: recipe.name,
        category: recipe.category,
        components,
        totals_display: NutritionDisplay::from(&totals),
        totals,
        plan_usage_count,
        created_at: recipe.created_at,
        updated_at: recipe.updated_at,
    }))
}

/// List recipes with computed nutrient columns
pub fn list_recipes(
    db: &Database,
    query: Option<&str>,
    category: Option<RecipeCategory>,
    sort_order: &str,
    limit: i64,
    offset: i64,
) -> Result<ListRecipesResponse, String> {
    let limit = limit.min(200).max(1);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipes = Recipe::list(&conn, query, category, sort_order, limit, offset)
        .map_err(|e| format!("Failed to list recipes: {}", e))?;
    let total = Recipe::count(&conn, query, category)
        .map_err(|e| format!("Failed to count recipes: {}", e))?;

    let summaries = recipes
        .iter()
        .map(|r| recipe_summary(&conn, r))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ListRecipesResponse { recipes: summaries, total, limit, offset })
}

pub fn update_recipe(db: &Database, id: i64, mut data: RecipeUpdate) -> Result<Option<UpdateRecipeResponse>, String> {
    if let Some(ref name) = data.name {
        data.name = Some(require_text("Recipe name", name)?);
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let updated = Recipe::update(&conn, id, &data)
        .map_err(|e| write_error("update recipe", e))?;

    Ok(updated.map(|r| UpdateRecipeResponse {
        success: true,
        label: r.label(),
        updated_at: r.updated_at,
    }))
}

/// Delete a recipe. Its components and any plan items serving it go too.
pub fn delete_recipe(db: &Database, id: i64) -> Result<Option<DeleteRecipeResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let plan_items_removed = Recipe::get_plan_usage_count(&conn, id)
        .map_err(|e| format!("Failed to get plan usage: {}", e))?;

    let deleted = Recipe::delete(&conn, id)
        .map_err(|e| format!("Failed to delete recipe: {}", e))?;

    if !deleted {
        return Ok(None);
    }

    info!("Deleted recipe {} ({} plan items removed)", id, plan_items_removed);

    Ok(Some(DeleteRecipeResponse { success: true, deleted_id: id, plan_items_removed }))
}

// ============================================================================
// Recipe Component Tools
// ============================================================================

/// Add one component to a recipe
pub fn add_recipe_component(db: &Database, data: RecipeComponentCreate) -> Result<ComponentResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    require_recipe(&conn, data.recipe_id)?;
    validate_component(&conn, data.ingredient_id, data.weight_grams, data.conversion_id, data.unit_count)?;

    let component = RecipeComponent::create(&conn, &data)
        .map_err(|e| write_error("add recipe component", e))?;

    debug!(
        "Recipe {} component {} stored with {:?} g",
        data.recipe_id, component.id, component.weight_grams
    );

    Ok(ComponentResponse {
        recipe_totals: recipe_totals_display(&conn, data.recipe_id)?,
        component,
    })
}

/// Add several components in one transaction; nothing is saved if any fails
pub fn add_recipe_components_batch(
    db: &Database,
    recipe_id: i64,
    components: Vec<ComponentInput>,
) -> Result<BatchComponentsResponse, String> {
    if components.is_empty() {
        return Err("No components given".to_string());
    }

    let mut conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let tx = conn.transaction().map_err(|e| format!("Database error: {}", e))?;

    require_recipe(&tx, recipe_id)?;

    let mut added = Vec::with_capacity(components.len());
    for (i, input) in components.into_iter().enumerate() {
        validate_component(&tx, input.ingredient_id, input.weight_grams, input.conversion_id, input.unit_count)
            .map_err(|e| format!("Component {}: {}", i + 1, e))?;

        let component = RecipeComponent::create(
            &tx,
            &RecipeComponentCreate {
                recipe_id,
                ingredient_id: input.ingredient_id,
                weight_grams: input.weight_grams,
                conversion_id: input.conversion_id,
                unit_count: input.unit_count,
            },
        )
        .map_err(|e| write_error("add recipe component", e))?;
        added.push(component);
    }

    tx.commit().map_err(|e| format!("Failed to commit components: {}", e))?;

    info!("Added {} components to recipe {}", added.len(), recipe_id);

    Ok(BatchComponentsResponse {
        recipe_id,
        recipe_totals: recipe_totals_display(&conn, recipe_id)?,
        added,
    })
}

/// Update a component's amount or conversion
pub fn update_recipe_component(
    db: &Database,
    id: i64,
    data: RecipeComponentUpdate,
) -> Result<Option<ComponentResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let current = match RecipeComponent::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get component: {}", e))?
    {
        Some(c) => c,
        None => return Ok(None),
    };

    let conversion_id = if data.clear_conversion { None } else { data.conversion_id };
    validate_component(&conn, current.ingredient_id, data.weight_grams, conversion_id, data.unit_count)?;

    let component = match RecipeComponent::update(&conn, id, &data)
        .map_err(|e| write_error("update recipe component", e))?
    {
        Some(c) => c,
        None => return Ok(None),
    };

    Ok(Some(ComponentResponse {
        recipe_totals: recipe_totals_display(&conn, component.recipe_id)?,
        component,
    }))
}

pub fn remove_recipe_component(db: &Database, id: i64) -> Result<Option<RemoveComponentResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let component = match RecipeComponent::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get component: {}", e))?
    {
        Some(c) => c,
        None => return Ok(None),
    };

    RecipeComponent::delete(&conn, id)
        .map_err(|e| format!("Failed to remove component: {}", e))?;

    Ok(Some(RemoveComponentResponse {
        success: true,
        deleted_id: id,
        recipe_totals: recipe_totals_display(&conn, component.recipe_id)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IngredientCategory, IngredientCreate, NutrientProfileSet, UnitConversionCreate};
    use crate::nutrition::BaseUnit;
    use crate::tools::ingredients;
    use crate::tools::test_support::temp_database;

    fn ingredient(db: &Database, code: &str, name: &str, energy: Option<f64>) -> i64 {
        let id = ingredients::add_ingredient(
            db,
            IngredientCreate {
                code: code.to_string(),
                name: name.to_string(),
                category: IngredientCategory::Vegetable,
                base_unit: BaseUnit::G,
                price_estimate: 0.0,
                shelf_life_days: 0,
            },
        )
        .unwrap()
        .id;
        if let Some(energy) = energy {
            ingredients::set_nutrient_profile(db, id, NutrientProfileSet { energy, ..Default::default() })
                .unwrap();
        }
        id
    }

    fn recipe(db: &Database, name: &str) -> i64 {
        create_recipe(db, RecipeCreate { name: name.to_string(), category: RecipeCategory::Vegetable })
            .unwrap()
            .id
    }

    #[test]
    fn test_component_by_conversion_and_list_columns() {
        let (_dir, db) = temp_database();
        let spinach = ingredient(&db, "V001", "Spinach", Some(23.0));
        let bunch = ingredients::add_unit_conversion(
            &db,
            UnitConversionCreate { ingredient_id: spinach, unit_name: "bunch".to_string(), grams_per_unit: 50.0 },
        )
        .unwrap()
        .unwrap();
        let soup = recipe(&db, "Spinach Soup");

        let added = add_recipe_component(
            &db,
            RecipeComponentCreate {
                recipe_id: soup,
                ingredient_id: spinach,
                conversion_id: Some(bunch.id),
                unit_count: Some(3.0),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(added.component.weight_grams, Some(150.0));
        assert_eq!(added.recipe_totals.energy, "34.50 kcal");

        let listed = list_recipes(&db, Some("soup"), None, "asc", 50, 0).unwrap();
        assert_eq!(listed.total, 1);
        assert_eq!(listed.recipes[0].energy, "34.50 kcal");
        assert_eq!(listed.recipes[0].protein, "0.00 g");

        let detail = get_recipe(&db, soup).unwrap().unwrap();
        assert_eq!(detail.components[0].weight, "150.00 g");
        assert_eq!(detail.components[0].detail.conversion_unit.as_deref(), Some("bunch"));
    }

    #[test]
    fn test_zero_unit_count_keeps_entered_grams() {
        let (_dir, db) = temp_database();
        let spinach = ingredient(&db, "V001", "Spinach", Some(23.0));
        let bunch = ingredients::add_unit_conversion(
            &db,
            UnitConversionCreate { ingredient_id: spinach, unit_name: "bunch".to_string(), grams_per_unit: 50.0 },
        )
        .unwrap()
        .unwrap();
        let soup = recipe(&db, "Spinach Soup");

        let added = add_recipe_component(
            &db,
            RecipeComponentCreate {
                recipe_id: soup,
                ingredient_id: spinach,
                weight_grams: Some(120.0),
                conversion_id: Some(bunch.id),
                unit_count: Some(0.0),
            },
        )
        .unwrap();
        assert_eq!(added.component.weight_grams, Some(120.0));
        assert_eq!(added.recipe_totals.energy, "27.60 kcal");

        // A positive count still takes over
        let updated = update_recipe_component(
            &db,
            added.component.id,
            RecipeComponentUpdate { unit_count: Some(2.0), ..Default::default() },
        )
        .unwrap()
        .unwrap();
        assert_eq!(updated.component.weight_grams, Some(100.0));
        assert_eq!(updated.recipe_totals.energy, "23.00 kcal");
    }

    #[test]
    fn test_infinite_weight_rejected() {
        let (_dir, db) = temp_database();
        let spinach = ingredient(&db, "V001", "Spinach", Some(23.0));
        let soup = recipe(&db, "Spinach Soup");

        let err = add_recipe_component(
            &db,
            RecipeComponentCreate {
                recipe_id: soup,
                ingredient_id: spinach,
                weight_grams: Some(f64::INFINITY),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(err.contains("finite"), "{}", err);
    }

    #[test]
    fn test_foreign_conversion_rejected() {
        let (_dir, db) = temp_database();
        let spinach = ingredient(&db, "V001", "Spinach", None);
        let banana = ingredient(&db, "F001", "Banana", None);
        let hand = ingredients::add_unit_conversion(
            &db,
            UnitConversionCreate { ingredient_id: banana, unit_name: "hand".to_string(), grams_per_unit: 900.0 },
        )
        .unwrap()
        .unwrap();
        let soup = recipe(&db, "Spinach Soup");

        let err = add_recipe_component(
            &db,
            RecipeComponentCreate {
                recipe_id: soup,
                ingredient_id: spinach,
                conversion_id: Some(hand.id),
                unit_count: Some(1.0),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(err.contains("belongs to ingredient"), "{}", err);
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let (_dir, db) = temp_database();
        let rice = ingredient(&db, "B001", "Rice", Some(130.0));
        let bowl = recipe(&db, "Rice Bowl");

        let err = add_recipe_components_batch(
            &db,
            bowl,
            vec![
                ComponentInput { ingredient_id: rice, weight_grams: Some(150.0), conversion_id: None, unit_count: None },
                ComponentInput { ingredient_id: 999, weight_grams: Some(10.0), conversion_id: None, unit_count: None },
            ],
        )
        .unwrap_err();
        assert!(err.starts_with("Component 2"), "{}", err);
        assert_eq!(get_recipe(&db, bowl).unwrap().unwrap().components.len(), 0);

        let ok = add_recipe_components_batch(
            &db,
            bowl,
            vec![ComponentInput { ingredient_id: rice, weight_grams: Some(150.0), conversion_id: None, unit_count: None }],
        )
        .unwrap();
        assert_eq!(ok.recipe_totals.energy, "195.00 kcal");
    }

    #[test]
    fn test_remove_component_updates_totals() {
        let (_dir, db) = temp_database();
        let rice = ingredient(&db, "B001", "Rice", Some(130.0));
        let bowl = recipe(&db, "Rice Bowl");
        let added = add_recipe_component(
            &db,
            RecipeComponentCreate { recipe_id: bowl, ingredient_id: rice, weight_grams: Some(100.0), ..Default::default() },
        )
        .unwrap();

        let removed = remove_recipe_component(&db, added.component.id).unwrap().unwrap();
        assert_eq!(removed.recipe_totals.energy, "0.00 kcal");
        assert!(remove_recipe_component(&db, added.component.id).unwrap().is_none());
    }
}
