//! Menu Planner MCP Server Implementation
//!
//! Parameter structs and the tool router. Choice strings (categories, units,
//! meal slots) are parsed here; everything else is handed to `crate::tools`.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::Database;
use crate::models::{
    IngredientCategory, IngredientCreate, IngredientFilter, IngredientUpdate, MealSlot,
    MenuPlanUpdate, NutrientProfileSet, NutrientRange, NutritionStandardCreate,
    NutritionStandardUpdate, RecipeCategory, RecipeComponentCreate, RecipeComponentUpdate,
    RecipeCreate, RecipeUpdate, UnitConversionCreate, UnitConversionUpdate,
};
use crate::nutrition::BaseUnit;
use crate::tools::recipes::ComponentInput;
use crate::tools::status::StatusTracker;
use crate::tools::{ingredients, menu_plans, recipes, standards};

/// Menu Planner MCP Service
#[derive(Clone)]
pub struct MenuPlanService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    tool_router: ToolRouter<MenuPlanService>,
}

impl MenuPlanService {
    pub fn new(database_path: PathBuf, database: Database) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            tool_router: Self::tool_router(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Serialize a lookup result, or a not-found payload
fn found_or_error<T: Serialize>(value: Option<T>, what: &str, id: i64) -> Result<CallToolResult, McpError> {
    match value {
        Some(v) => json_result(&v),
        None => json_result(&serde_json::json!({ "error": format!("{} not found", what), "id": id })),
    }
}

fn tool_error(e: String) -> McpError {
    McpError::internal_error(e, None)
}

fn parse_choice<T>(field: &str, value: &str, parse: fn(&str) -> Option<T>, allowed: &str) -> Result<T, McpError> {
    parse(value).ok_or_else(|| {
        tool_error(format!("Invalid {} '{}'. Allowed: {}", field, value, allowed))
    })
}

fn parse_optional<T>(
    field: &str,
    value: Option<&str>,
    parse: fn(&str) -> Option<T>,
    allowed: &str,
) -> Result<Option<T>, McpError> {
    value.map(|v| parse_choice(field, v, parse, allowed)).transpose()
}

const INGREDIENT_CATEGORIES: &str =
    "carbohydrate, animal_protein, plant_protein, vegetable, fruit, fat, dairy, seasoning";
const BASE_UNITS: &str = "g, kg, ml, l, pcs, bunch, egg, pack, hand";
const MEAL_SLOTS: &str = "breakfast, lunch, snack";
const RECIPE_CATEGORIES: &str = "carbohydrate, animal_protein, plant_protein, vegetable, fruit, dairy";

/// Pair two optional bounds into a range update; both or neither
fn optional_range(nutrient: &str, min: Option<f64>, max: Option<f64>) -> Result<Option<NutrientRange>, McpError> {
    match (min, max) {
        (Some(min), Some(max)) => Ok(Some(NutrientRange::new(min, max))),
        (None, None) => Ok(None),
        _ => Err(tool_error(format!("{}_min and {}_max must be given together", nutrient, nutrient))),
    }
}

// ============================================================================
// Ingredient Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddIngredientParams {
    /// Unique ingredient code, at most 20 characters, e.g. "B001"
    pub code: String,
    /// At most 100 characters
    pub name: String,
    /// One of: carbohydrate, animal_protein, plant_protein, vegetable, fruit, fat, dairy, seasoning
    pub category: String,
    /// One of: g, kg, ml, l, pcs, bunch, egg, pack, hand (default g)
    pub base_unit: Option<String>,
    #[serde(default)]
    pub price_estimate: f64,
    #[serde(default)]
    pub shelf_life_days: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListIngredientsParams {
    /// Search in code or name
    pub query: Option<String>,
    pub category: Option<String>,
    pub base_unit: Option<String>,
    pub shelf_life_days: Option<i64>,
    /// code, name, category, price_estimate, shelf_life_days, created_at
    #[serde(default = "default_ingredient_sort")]
    pub sort_by: String,
    #[serde(default = "default_sort_order")]
    pub sort_order: String,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_ingredient_sort() -> String { "code".to_string() }
fn default_sort_order() -> String { "asc".to_string() }
fn default_plan_sort_order() -> String { "desc".to_string() }
fn default_list_limit() -> i64 { 50 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateIngredientParams {
    pub id: i64,
    pub code: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub base_unit: Option<String>,
    pub price_estimate: Option<f64>,
    pub shelf_life_days: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetNutrientProfileParams {
    pub ingredient_id: i64,
    /// kcal per 100 g
    #[serde(default)]
    pub energy: f64,
    /// grams per 100 g
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub carbohydrate: f64,
    /// Edible portion of purchased weight, percent
    #[serde(default)]
    pub edible_portion_pct: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IngredientIdParams {
    pub ingredient_id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddUnitConversionParams {
    pub ingredient_id: i64,
    /// e.g. "bunch", "piece", "cup"
    pub unit_name: String,
    pub grams_per_unit: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateUnitConversionParams {
    pub id: i64,
    pub unit_name: Option<String>,
    pub grams_per_unit: Option<f64>,
}

// ============================================================================
// Nutrition Standard Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddStandardParams {
    /// e.g. "Primary school"
    pub target_group: String,
    /// One of: breakfast, lunch, snack
    pub meal_slot: String,
    #[serde(default)]
    pub budget_per_portion: f64,
    /// Free text, e.g. "30% AKG"
    #[serde(default)]
    pub reference_pct: String,
    pub energy_min: f64,
    pub energy_max: f64,
    pub protein_min: f64,
    pub protein_max: f64,
    pub fat_min: f64,
    pub fat_max: f64,
    pub carbohydrate_min: f64,
    pub carbohydrate_max: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListStandardsParams {
    /// Search in target group
    pub query: Option<String>,
    pub meal_slot: Option<String>,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateStandardParams {
    pub id: i64,
    pub target_group: Option<String>,
    pub meal_slot: Option<String>,
    pub budget_per_portion: Option<f64>,
    pub reference_pct: Option<String>,
    pub energy_min: Option<f64>,
    pub energy_max: Option<f64>,
    pub protein_min: Option<f64>,
    pub protein_max: Option<f64>,
    pub fat_min: Option<f64>,
    pub fat_max: Option<f64>,
    pub carbohydrate_min: Option<f64>,
    pub carbohydrate_max: Option<f64>,
}

// ============================================================================
// Recipe Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateRecipeParams {
    pub name: String,
    /// One of: carbohydrate, animal_protein, plant_protein, vegetable, fruit, dairy
    pub category: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListRecipesParams {
    /// Search in recipe name
    pub query: Option<String>,
    pub category: Option<String>,
    #[serde(default = "default_sort_order")]
    pub sort_order: String,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateRecipeParams {
    pub id: i64,
    pub name: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddRecipeComponentParams {
    pub recipe_id: i64,
    pub ingredient_id: i64,
    /// Direct weight in grams
    pub weight_grams: Option<f64>,
    /// Unit conversion of this ingredient; use with unit_count
    pub conversion_id: Option<i64>,
    pub unit_count: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ComponentInputParams {
    pub ingredient_id: i64,
    pub weight_grams: Option<f64>,
    pub conversion_id: Option<i64>,
    pub unit_count: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddRecipeComponentsBatchParams {
    pub recipe_id: i64,
    pub components: Vec<ComponentInputParams>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateRecipeComponentParams {
    pub id: i64,
    pub weight_grams: Option<f64>,
    pub conversion_id: Option<i64>,
    pub unit_count: Option<f64>,
    /// Remove the stored gram weight
    #[serde(default)]
    pub clear_weight: bool,
    /// Remove the conversion reference; the stored gram weight is kept
    #[serde(default)]
    pub clear_conversion: bool,
    #[serde(default)]
    pub clear_unit_count: bool,
}

// ============================================================================
// Menu Plan Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateMenuPlanParams {
    /// ISO date: YYYY-MM-DD
    pub date: String,
    pub standard_id: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListMenuPlansParams {
    /// Inclusive, YYYY-MM-DD
    pub start_date: Option<String>,
    /// Inclusive, YYYY-MM-DD
    pub end_date: Option<String>,
    pub standard_id: Option<i64>,
    #[serde(default = "default_plan_sort_order")]
    pub sort_order: String,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateMenuPlanParams {
    pub id: i64,
    pub date: Option<String>,
    pub standard_id: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddMenuPlanItemParams {
    pub plan_id: i64,
    pub recipe_id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddMenuPlanItemsBatchParams {
    pub plan_id: i64,
    /// Recipes to serve; repeats are counted each time
    pub recipe_ids: Vec<i64>,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl MenuPlanService {
    // --- Service ---

    #[tool(description = "Get the current status of the menuplan service including build info, database status, and process information")]
    async fn menuplan_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(&self.database);
        json_result(&status)
    }

    #[tool(description = "Get step-by-step instructions for building ingredients, recipes, standards and menu plans. Call this when starting a planning session.")]
    fn planning_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::PLANNING_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(PLANNING_INSTRUCTIONS)]))
    }

    // --- Ingredients ---

    #[tool(description = "Add an ingredient with a unique code, category and base unit")]
    fn add_ingredient(&self, Parameters(p): Parameters<AddIngredientParams>) -> Result<CallToolResult, McpError> {
        let data = IngredientCreate {
            code: p.code,
            name: p.name,
            category: parse_choice("category", &p.category, IngredientCategory::parse, INGREDIENT_CATEGORIES)?,
            base_unit: parse_optional("base_unit", p.base_unit.as_deref(), BaseUnit::parse, BASE_UNITS)?
                .unwrap_or_default(),
            price_estimate: p.price_estimate,
            shelf_life_days: p.shelf_life_days,
        };
        let result = ingredients::add_ingredient(&self.database, data).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Get an ingredient with its nutrient profile, unit conversions and the recipes that use it")]
    fn get_ingredient(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::get_ingredient(&self.database, p.id).map_err(tool_error)?;
        found_or_error(result, "Ingredient", p.id)
    }

    #[tool(description = "List ingredients. Search by code or name; filter by category, base unit or shelf life; sort and paginate")]
    fn list_ingredients(&self, Parameters(p): Parameters<ListIngredientsParams>) -> Result<CallToolResult, McpError> {
        let filter = IngredientFilter {
            query: p.query,
            category: parse_optional("category", p.category.as_deref(), IngredientCategory::parse, INGREDIENT_CATEGORIES)?,
            base_unit: parse_optional("base_unit", p.base_unit.as_deref(), BaseUnit::parse, BASE_UNITS)?,
            shelf_life_days: p.shelf_life_days,
        };
        let result = ingredients::list_ingredients(&self.database, filter, &p.sort_by, &p.sort_order, p.limit, p.offset)
            .map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Update an ingredient's code, name, category, base unit, price or shelf life")]
    fn update_ingredient(&self, Parameters(p): Parameters<UpdateIngredientParams>) -> Result<CallToolResult, McpError> {
        let data = IngredientUpdate {
            code: p.code,
            name: p.name,
            category: parse_optional("category", p.category.as_deref(), IngredientCategory::parse, INGREDIENT_CATEGORIES)?,
            base_unit: parse_optional("base_unit", p.base_unit.as_deref(), BaseUnit::parse, BASE_UNITS)?,
            price_estimate: p.price_estimate,
            shelf_life_days: p.shelf_life_days,
        };
        let result = ingredients::update_ingredient(&self.database, p.id, data).map_err(tool_error)?;
        found_or_error(result, "Ingredient", p.id)
    }

    #[tool(description = "Delete an ingredient. Its nutrient profile, unit conversions and every recipe component using it are deleted too.")]
    fn delete_ingredient(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::delete_ingredient(&self.database, p.id).map_err(tool_error)?;
        found_or_error(result, "Ingredient", p.id)
    }

    #[tool(description = "Set an ingredient's nutrient density per 100 g (energy in kcal; protein, fat, carbohydrate in g). Replaces any existing profile.")]
    fn set_nutrient_profile(&self, Parameters(p): Parameters<SetNutrientProfileParams>) -> Result<CallToolResult, McpError> {
        let data = NutrientProfileSet {
            energy: p.energy,
            protein: p.protein,
            fat: p.fat,
            carbohydrate: p.carbohydrate,
            edible_portion_pct: p.edible_portion_pct,
        };
        let result = ingredients::set_nutrient_profile(&self.database, p.ingredient_id, data).map_err(tool_error)?;
        found_or_error(result, "Ingredient", p.ingredient_id)
    }

    #[tool(description = "Remove an ingredient's nutrient profile. The ingredient then contributes nothing to recipe totals.")]
    fn delete_nutrient_profile(&self, Parameters(p): Parameters<IngredientIdParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::delete_nutrient_profile(&self.database, p.ingredient_id).map_err(tool_error)?;
        found_or_error(result, "Nutrient profile", p.ingredient_id)
    }

    #[tool(description = "Add a named unit (e.g. bunch) and its weight in grams to an ingredient. An ingredient has at most one conversion.")]
    fn add_unit_conversion(&self, Parameters(p): Parameters<AddUnitConversionParams>) -> Result<CallToolResult, McpError> {
        let data = UnitConversionCreate {
            ingredient_id: p.ingredient_id,
            unit_name: p.unit_name,
            grams_per_unit: p.grams_per_unit,
        };
        let result = ingredients::add_unit_conversion(&self.database, data).map_err(tool_error)?;
        found_or_error(result, "Ingredient", p.ingredient_id)
    }

    #[tool(description = "Update a unit conversion. Saved component weights are not rewritten until each component is saved again.")]
    fn update_unit_conversion(&self, Parameters(p): Parameters<UpdateUnitConversionParams>) -> Result<CallToolResult, McpError> {
        let data = UnitConversionUpdate { unit_name: p.unit_name, grams_per_unit: p.grams_per_unit };
        let result = ingredients::update_unit_conversion(&self.database, p.id, data).map_err(tool_error)?;
        found_or_error(result, "Unit conversion", p.id)
    }

    #[tool(description = "Delete a unit conversion. Components that used it keep their saved gram weight.")]
    fn delete_unit_conversion(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::delete_unit_conversion(&self.database, p.id).map_err(tool_error)?;
        found_or_error(result, "Unit conversion", p.id)
    }

    // --- Nutrition Standards ---

    #[tool(description = "Add a nutrition standard: min/max ranges for energy, protein, fat and carbohydrate for one target group and meal slot")]
    fn add_nutrition_standard(&self, Parameters(p): Parameters<AddStandardParams>) -> Result<CallToolResult, McpError> {
        let data = NutritionStandardCreate {
            target_group: p.target_group,
            meal_slot: parse_choice("meal_slot", &p.meal_slot, MealSlot::parse, MEAL_SLOTS)?,
            budget_per_portion: p.budget_per_portion,
            reference_pct: p.reference_pct,
            energy: NutrientRange::new(p.energy_min, p.energy_max),
            protein: NutrientRange::new(p.protein_min, p.protein_max),
            fat: NutrientRange::new(p.fat_min, p.fat_max),
            carbohydrate: NutrientRange::new(p.carbohydrate_min, p.carbohydrate_max),
        };
        let result = standards::add_nutrition_standard(&self.database, data).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Get a nutrition standard with its ranges and plan count")]
    fn get_nutrition_standard(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = standards::get_nutrition_standard(&self.database, p.id).map_err(tool_error)?;
        found_or_error(result, "Nutrition standard", p.id)
    }

    #[tool(description = "List nutrition standards. Search by target group; filter by meal slot")]
    fn list_nutrition_standards(&self, Parameters(p): Parameters<ListStandardsParams>) -> Result<CallToolResult, McpError> {
        let slot = parse_optional("meal_slot", p.meal_slot.as_deref(), MealSlot::parse, MEAL_SLOTS)?;
        let result = standards::list_nutrition_standards(&self.database, p.query.as_deref(), slot, p.limit, p.offset)
            .map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Update a nutrition standard. Give both min and max to change a range.")]
    fn update_nutrition_standard(&self, Parameters(p): Parameters<UpdateStandardParams>) -> Result<CallToolResult, McpError> {
        let data = NutritionStandardUpdate {
            target_group: p.target_group,
            meal_slot: parse_optional("meal_slot", p.meal_slot.as_deref(), MealSlot::parse, MEAL_SLOTS)?,
            budget_per_portion: p.budget_per_portion,
            reference_pct: p.reference_pct,
            energy: optional_range("energy", p.energy_min, p.energy_max)?,
            protein: optional_range("protein", p.protein_min, p.protein_max)?,
            fat: optional_range("fat", p.fat_min, p.fat_max)?,
            carbohydrate: optional_range("carbohydrate", p.carbohydrate_min, p.carbohydrate_max)?,
        };
        let result = standards::update_nutrition_standard(&self.database, p.id, data).map_err(tool_error)?;
        found_or_error(result, "Nutrition standard", p.id)
    }

    #[tool(description = "Delete a nutrition standard and every menu plan that uses it")]
    fn delete_nutrition_standard(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = standards::delete_nutrition_standard(&self.database, p.id).map_err(tool_error)?;
        found_or_error(result, "Nutrition standard", p.id)
    }

    // --- Recipes ---

    #[tool(description = "Create a recipe")]
    fn create_recipe(&self, Parameters(p): Parameters<CreateRecipeParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeCreate {
            name: p.name,
            category: parse_choice("category", &p.category, RecipeCategory::parse, RECIPE_CATEGORIES)?,
        };
        let result = recipes::create_recipe(&self.database, data).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Get a recipe with its components, resolved gram weights and nutrient totals")]
    fn get_recipe(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::get_recipe(&self.database, p.id).map_err(tool_error)?;
        found_or_error(result, "Recipe", p.id)
    }

    #[tool(description = "List recipes with energy, protein, fat and carbohydrate totals. Search by name; filter by category")]
    fn list_recipes(&self, Parameters(p): Parameters<ListRecipesParams>) -> Result<CallToolResult, McpError> {
        let category = parse_optional("category", p.category.as_deref(), RecipeCategory::parse, RECIPE_CATEGORIES)?;
        let result = recipes::list_recipes(&self.database, p.query.as_deref(), category, &p.sort_order, p.limit, p.offset)
            .map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Rename a recipe or change its category")]
    fn update_recipe(&self, Parameters(p): Parameters<UpdateRecipeParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeUpdate {
            name: p.name,
            category: parse_optional("category", p.category.as_deref(), RecipeCategory::parse, RECIPE_CATEGORIES)?,
        };
        let result = recipes::update_recipe(&self.database, p.id, data).map_err(tool_error)?;
        found_or_error(result, "Recipe", p.id)
    }

    #[tool(description = "Delete a recipe, its components, and its appearances in menu plans")]
    fn delete_recipe(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::delete_recipe(&self.database, p.id).map_err(tool_error)?;
        found_or_error(result, "Recipe", p.id)
    }

    #[tool(description = "Add an ingredient to a recipe, either by weight_grams or by conversion_id + unit_count")]
    fn add_recipe_component(&self, Parameters(p): Parameters<AddRecipeComponentParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeComponentCreate {
            recipe_id: p.recipe_id,
            ingredient_id: p.ingredient_id,
            weight_grams: p.weight_grams,
            conversion_id: p.conversion_id,
            unit_count: p.unit_count,
        };
        let result = recipes::add_recipe_component(&self.database, data).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Add several ingredients to a recipe at once. All are added or none.")]
    fn add_recipe_components_batch(&self, Parameters(p): Parameters<AddRecipeComponentsBatchParams>) -> Result<CallToolResult, McpError> {
        let components = p
            .components
            .into_iter()
            .map(|c| ComponentInput {
                ingredient_id: c.ingredient_id,
                weight_grams: c.weight_grams,
                conversion_id: c.conversion_id,
                unit_count: c.unit_count,
            })
            .collect();
        let result = recipes::add_recipe_components_batch(&self.database, p.recipe_id, components)
            .map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Update a recipe component's weight, conversion or unit count")]
    fn update_recipe_component(&self, Parameters(p): Parameters<UpdateRecipeComponentParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeComponentUpdate {
            weight_grams: p.weight_grams,
            conversion_id: p.conversion_id,
            unit_count: p.unit_count,
            clear_weight: p.clear_weight,
            clear_conversion: p.clear_conversion,
            clear_unit_count: p.clear_unit_count,
        };
        let result = recipes::update_recipe_component(&self.database, p.id, data).map_err(tool_error)?;
        found_or_error(result, "Recipe component", p.id)
    }

    #[tool(description = "Remove a component from its recipe")]
    fn remove_recipe_component(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::remove_recipe_component(&self.database, p.id).map_err(tool_error)?;
        found_or_error(result, "Recipe component", p.id)
    }

    // --- Menu Plans ---

    #[tool(description = "Create a menu plan for a date (YYYY-MM-DD) and nutrition standard. One plan per date and standard.")]
    fn create_menu_plan(&self, Parameters(p): Parameters<CreateMenuPlanParams>) -> Result<CallToolResult, McpError> {
        let result = menu_plans::create_menu_plan(&self.database, &p.date, p.standard_id, p.notes)
            .map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Get a menu plan with its recipes, nutrient totals and how the totals compare to its standard")]
    fn get_menu_plan(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = menu_plans::get_menu_plan(&self.database, p.id).map_err(tool_error)?;
        found_or_error(result, "Menu plan", p.id)
    }

    #[tool(description = "List menu plans with energy and protein totals. Filter by date range and standard")]
    fn list_menu_plans(&self, Parameters(p): Parameters<ListMenuPlansParams>) -> Result<CallToolResult, McpError> {
        let result = menu_plans::list_menu_plans(
            &self.database,
            p.start_date.as_deref(),
            p.end_date.as_deref(),
            p.standard_id,
            &p.sort_order,
            p.limit,
            p.offset,
        )
        .map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Change a menu plan's date, standard or notes")]
    fn update_menu_plan(&self, Parameters(p): Parameters<UpdateMenuPlanParams>) -> Result<CallToolResult, McpError> {
        let data = MenuPlanUpdate { date: p.date, standard_id: p.standard_id, notes: p.notes };
        let result = menu_plans::update_menu_plan(&self.database, p.id, data).map_err(tool_error)?;
        found_or_error(result, "Menu plan", p.id)
    }

    #[tool(description = "Delete a menu plan and its items")]
    fn delete_menu_plan(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = menu_plans::delete_menu_plan(&self.database, p.id).map_err(tool_error)?;
        found_or_error(result, "Menu plan", p.id)
    }

    #[tool(description = "Add a recipe to a menu plan")]
    fn add_menu_plan_item(&self, Parameters(p): Parameters<AddMenuPlanItemParams>) -> Result<CallToolResult, McpError> {
        let result = menu_plans::add_menu_plan_item(&self.database, p.plan_id, p.recipe_id).map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Add several recipes to a menu plan at once. All are added or none.")]
    fn add_menu_plan_items_batch(&self, Parameters(p): Parameters<AddMenuPlanItemsBatchParams>) -> Result<CallToolResult, McpError> {
        let result = menu_plans::add_menu_plan_items_batch(&self.database, p.plan_id, p.recipe_ids)
            .map_err(tool_error)?;
        json_result(&result)
    }

    #[tool(description = "Remove a recipe item from its menu plan")]
    fn remove_menu_plan_item(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let result = menu_plans::remove_menu_plan_item(&self.database, p.id).map_err(tool_error)?;
        found_or_error(result, "Menu plan item", p.id)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for MenuPlanService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "menuplan".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Menu Planner".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Menu Planner - ingredient, recipe and daily menu plan data entry with nutrient totals. \
                 IMPORTANT: Call planning_instructions before starting. \
                 Ingredients: add/get/list/update/delete_ingredient, set/delete_nutrient_profile, \
                 add/update/delete_unit_conversion. \
                 Standards: add/get/list/update/delete_nutrition_standard. \
                 Recipes: create/get/list/update/delete_recipe, add_recipe_component(s_batch), \
                 update/remove_recipe_component. \
                 Menu plans: create/get/list/update/delete_menu_plan, add_menu_plan_item(s_batch), \
                 remove_menu_plan_item. \
                 Totals are recomputed on every read."
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_parsing_errors_list_allowed_values() {
        let err = parse_choice("meal_slot", "dinner", MealSlot::parse, MEAL_SLOTS).unwrap_err();
        assert!(err.message.contains("breakfast, lunch, snack"));

        assert_eq!(
            parse_optional("base_unit", Some("grams"), BaseUnit::parse, BASE_UNITS).unwrap(),
            Some(BaseUnit::G)
        );
        assert_eq!(parse_optional::<BaseUnit>("base_unit", None, BaseUnit::parse, BASE_UNITS).unwrap(), None);
    }

    #[test]
    fn test_range_bounds_come_in_pairs() {
        assert_eq!(optional_range("fat", Some(1.0), Some(2.0)).unwrap(), Some(NutrientRange::new(1.0, 2.0)));
        assert_eq!(optional_range("fat", None, None).unwrap(), None);
        assert!(optional_range("fat", Some(1.0), None).is_err());
    }
}
