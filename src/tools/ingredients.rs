//! Ingredient tools
//!
//! Ingredients, their nutrient profiles and their unit conversions.

use serde::Serialize;
use tracing::info;

use crate::db::Database;
use crate::models::{
    Ingredient, IngredientCategory, IngredientCreate, IngredientFilter, IngredientUpdate,
    NutrientProfile, NutrientProfileSet, UnitConversion, UnitConversionCreate,
    UnitConversionUpdate,
};
use crate::nutrition::display::ENERGY_UNIT;
use crate::nutrition::{format_quantity, BaseUnit, NutritionDisplay, UnitCategory};
use super::{require_max_len, require_non_negative, require_text, write_error};

/// Response for add_ingredient
#[derive(Debug, Serialize)]
pub struct AddIngredientResponse {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub label: String,
    pub created_at: String,
}

/// Ingredient row for list results
#[derive(Debug, Serialize)]
pub struct IngredientSummary {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub category: IngredientCategory,
    pub base_unit: BaseUnit,
    pub price_estimate: f64,
    pub shelf_life_days: i64,
}

impl From<&Ingredient> for IngredientSummary {
    fn from(item: &Ingredient) -> Self {
        Self {
            id: item.id,
            code: item.code.clone(),
            name: item.name.clone(),
            category: item.category,
            base_unit: item.base_unit,
            price_estimate: item.price_estimate,
            shelf_life_days: item.shelf_life_days,
        }
    }
}

/// Response for list_ingredients
#[derive(Debug, Serialize)]
pub struct ListIngredientsResponse {
    pub items: Vec<IngredientSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// A unit conversion with its usage
#[derive(Debug, Serialize)]
pub struct ConversionSummary {
    pub id: i64,
    pub unit_name: String,
    pub grams_per_unit: f64,
    pub label: String,
    pub component_count: i64,
}

/// Nutrient profile with formatted values
#[derive(Debug, Serialize)]
pub struct ProfileSummary {
    pub energy: String,
    pub protein: String,
    pub fat: String,
    pub carbohydrate: String,
    pub edible_portion_pct: f64,
    pub updated_at: String,
    pub raw: NutrientProfile,
}

impl From<NutrientProfile> for ProfileSummary {
    fn from(profile: NutrientProfile) -> Self {
        let display = NutritionDisplay::from(&profile.per_100g);
        Self {
            energy: display.energy,
            protein: display.protein,
            fat: display.fat,
            carbohydrate: display.carbohydrate,
            edible_portion_pct: profile.edible_portion_pct,
            updated_at: profile.updated_at.clone(),
            raw: profile,
        }
    }
}

/// Full ingredient detail
#[derive(Debug, Serialize)]
pub struct IngredientDetail {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub label: String,
    pub category: IngredientCategory,
    pub category_label: &'static str,
    pub base_unit: BaseUnit,
    pub base_unit_label: &'static str,
    pub base_unit_category: UnitCategory,
    pub price_estimate: f64,
    pub shelf_life_days: i64,
    /// Per 100 g; absent profiles contribute nothing to recipe totals
    pub nutrient_profile: Option<ProfileSummary>,
    pub unit_conversions: Vec<ConversionSummary>,
    pub used_in_recipes: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateIngredientResponse {
    pub success: bool,
    pub label: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteIngredientResponse {
    pub success: bool,
    pub deleted_id: i64,
    /// Recipes that lost components with this delete
    pub affected_recipes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted_id: i64,
}

#[derive(Debug, Serialize)]
pub struct DeleteConversionResponse {
    pub success: bool,
    pub deleted_id: i64,
    /// Components whose conversion reference was cleared; their stored
    /// gram weights are kept
    pub components_detached: i64,
}

const CODE_MAX_LEN: usize = 20;
const NAME_MAX_LEN: usize = 100;

fn validate_ingredient_numbers(price_estimate: Option<f64>, shelf_life_days: Option<i64>) -> Result<(), String> {
    if let Some(price) = price_estimate {
        require_non_negative("price_estimate", price)?;
    }
    if let Some(days) = shelf_life_days {
        if days < 0 {
            return Err("shelf_life_days cannot be negative".to_string());
        }
    }
    Ok(())
}

// ============================================================================
// Ingredient Tools
// ============================================================================

/// Add a new ingredient
pub fn add_ingredient(db: &Database, mut data: IngredientCreate) -> Result<AddIngredientResponse, String> {
    data.code = require_text("Ingredient code", &data.code)?;
    data.name = require_text("Ingredient name", &data.name)?;
    require_max_len("Ingredient code", &data.code, CODE_MAX_LEN)?;
    require_max_len("Ingredient name", &data.name, NAME_MAX_LEN)?;
    validate_ingredient_numbers(Some(data.price_estimate), Some(data.shelf_life_days))?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let item = Ingredient::create(&conn, &data)
        .map_err(|e| write_error("create ingredient", e))?;

    info!("Added ingredient {}", item.label());

    Ok(AddIngredientResponse {
        label: item.label(),
        id: item.id,
        code: item.code,
        name: item.name,
        created_at: item.created_at,
    })
}

/// Get an ingredient with its profile, conversions and recipe usage
pub fn get_ingredient(db: &Database, id: i64) -> Result<Option<IngredientDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let item = match Ingredient::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get ingredient: {}", e))?
    {
        Some(item) => item,
        None => return Ok(None),
    };

    let profile = NutrientProfile::get_for_ingredient(&conn, id)
        .map_err(|e| format!("Failed to get nutrient profile: {}", e))?;

    let conversions = UnitConversion::get_for_ingredient(&conn, id)
        .map_err(|e| format!("Failed to get unit conversions: {}", e))?;
    let mut unit_conversions = Vec::with_capacity(conversions.len());
    for c in conversions {
        let component_count = UnitConversion::get_usage_count(&conn, c.id)
            .map_err(|e| format!("Failed to get conversion usage: {}", e))?;
        unit_conversions.push(ConversionSummary {
            label: c.label(),
            id: c.id,
            unit_name: c.unit_name,
            grams_per_unit: c.grams_per_unit,
            component_count,
        });
    }

    let used_in_recipes = Ingredient::get_used_in_recipes(&conn, id)
        .map_err(|e| format!("Failed to get recipe usage: {}", e))?;

    Ok(Some(IngredientDetail {
        label: item.label(),
        id: item.id,
        code: item.code,
        name: item.name,
        category: item.category,
        category_label: item.category.label(),
        base_unit: item.base_unit,
        base_unit_label: item.base_unit.label(),
        base_unit_category: item.base_unit.category(),
        price_estimate: item.price_estimate,
        shelf_life_days: item.shelf_life_days,
        nutrient_profile: profile.map(ProfileSummary::from),
        unit_conversions,
        used_in_recipes,
        created_at: item.created_at,
        updated_at: item.updated_at,
    }))
}

/// List ingredients with search, filters, sorting and pagination
pub fn list_ingredients(
    db: &Database,
    filter: IngredientFilter,
    sort_by: &str,
    sort_order: &str,
    limit: i64,
    offset: i64,
) -> Result<ListIngredientsResponse, String> {
    let limit = limit.min(200).max(1);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let items = Ingredient::list(&conn, &filter, sort_by, sort_order, limit, offset)
        .map_err(|e| format!("Failed to list ingredients: {}", e))?;
    let total = Ingredient::count(&conn, &filter)
        .map_err(|e| format!("Failed to count ingredients: {}", e))?;

    Ok(ListIngredientsResponse {
        items: items.iter().map(IngredientSummary::from).collect(),
        total,
        limit,
        offset,
    })
}

/// Update an ingredient
pub fn update_ingredient(
    db: &Database,
    id: i64,
    mut data: IngredientUpdate,
) -> Result<Option<UpdateIngredientResponse>, String> {
    if let Some(ref code) = data.code {
        let code = require_text("Ingredient code", code)?;
        require_max_len("Ingredient code", &code, CODE_MAX_LEN)?;
        data.code = Some(code);
    }
    if let Some(ref name) = data.name {
        let name = require_text("Ingredient name", name)?;
        require_max_len("Ingredient name", &name, NAME_MAX_LEN)?;
        data.name = Some(name);
    }
    validate_ingredient_numbers(data.price_estimate, data.shelf_life_days)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let updated = Ingredient::update(&conn, id, &data)
        .map_err(|e| write_error("update ingredient", e))?;

    Ok(updated.map(|item| UpdateIngredientResponse {
        success: true,
        label: item.label(),
        updated_at: item.updated_at,
    }))
}

/// Delete an ingredient along with its profile, conversions and any recipe
/// components that use it
pub fn delete_ingredient(db: &Database, id: i64) -> Result<Option<DeleteIngredientResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let affected_recipes = Ingredient::get_used_in_recipes(&conn, id)
        .map_err(|e| format!("Failed to get recipe usage: {}", e))?;

    let deleted = Ingredient::delete(&conn, id)
        .map_err(|e| format!("Failed to delete ingredient: {}", e))?;

    if !deleted {
        return Ok(None);
    }

    info!("Deleted ingredient {} ({} recipes affected)", id, affected_recipes.len());

    Ok(Some(DeleteIngredientResponse {
        success: true,
        deleted_id: id,
        affected_recipes,
    }))
}

// ============================================================================
// Nutrient Profile Tools
// ============================================================================

/// Set (create or replace) an ingredient's per-100g nutrient profile
pub fn set_nutrient_profile(
    db: &Database,
    ingredient_id: i64,
    data: NutrientProfileSet,
) -> Result<Option<ProfileSummary>, String> {
    require_non_negative("energy", data.energy)?;
    require_non_negative("protein", data.protein)?;
    require_non_negative("fat", data.fat)?;
    require_non_negative("carbohydrate", data.carbohydrate)?;
    require_non_negative("edible_portion_pct", data.edible_portion_pct)?;
    if data.edible_portion_pct > 100.0 {
        return Err("edible_portion_pct cannot exceed 100".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    if Ingredient::get_by_id(&conn, ingredient_id)
        .map_err(|e| format!("Failed to get ingredient: {}", e))?
        .is_none()
    {
        return Ok(None);
    }

    let profile = NutrientProfile::set(&conn, ingredient_id, &data)
        .map_err(|e| write_error("set nutrient profile", e))?;

    info!(
        "Set nutrient profile for ingredient {}: {}",
        ingredient_id,
        format_quantity(profile.per_100g.energy, ENERGY_UNIT)
    );

    Ok(Some(ProfileSummary::from(profile)))
}

/// Remove an ingredient's nutrient profile
pub fn delete_nutrient_profile(db: &Database, ingredient_id: i64) -> Result<Option<DeleteResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = NutrientProfile::delete_for_ingredient(&conn, ingredient_id)
        .map_err(|e| format!("Failed to delete nutrient profile: {}", e))?;

    Ok(deleted.then(|| DeleteResponse { success: true, deleted_id: ingredient_id }))
}

// ============================================================================
// Unit Conversion Tools
// ============================================================================

/// Add a named unit and its gram equivalent to an ingredient. An ingredient
/// has at most one conversion.
pub fn add_unit_conversion(db: &Database, mut data: UnitConversionCreate) -> Result<Option<UnitConversion>, String> {
    data.unit_name = require_text("unit_name", &data.unit_name)?;
    require_non_negative("grams_per_unit", data.grams_per_unit)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    if Ingredient::get_by_id(&conn, data.ingredient_id)
        .map_err(|e| format!("Failed to get ingredient: {}", e))?
        .is_none()
    {
        return Ok(None);
    }

    let existing = UnitConversion::get_for_ingredient(&conn, data.ingredient_id)
        .map_err(|e| format!("Failed to get unit conversions: {}", e))?;
    if let Some(current) = existing.first() {
        return Err(format!(
            "Validation failed: ingredient {} already has a unit conversion ({}); update or delete it instead",
            data.ingredient_id,
            current.label()
        ));
    }

    let conversion = UnitConversion::create(&conn, &data)
        .map_err(|e| write_error("create unit conversion", e))?;

    Ok(Some(conversion))
}

/// Update a unit conversion.
///
/// Stored component weights are not recomputed; components pick up the new
/// factor the next time they are saved.
pub fn update_unit_conversion(
    db: &Database,
    id: i64,
    mut data: UnitConversionUpdate,
) -> Result<Option<UnitConversion>, String> {
    if let Some(ref name) = data.unit_name {
        data.unit_name = Some(require_text("unit_name", name)?);
    }
    if let Some(grams) = data.grams_per_unit {
        require_non_negative("grams_per_unit", grams)?;
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    UnitConversion::update(&conn, id, &data)
        .map_err(|e| write_error("update unit conversion", e))
}

/// Delete a unit conversion
pub fn delete_unit_conversion(db: &Database, id: i64) -> Result<Option<DeleteConversionResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let components_detached = UnitConversion::get_usage_count(&conn, id)
        .map_err(|e| format!("Failed to get conversion usage: {}", e))?;

    let deleted = UnitConversion::delete(&conn, id)
        .map_err(|e| format!("Failed to delete unit conversion: {}", e))?;

    Ok(deleted.then(|| DeleteConversionResponse {
        success: true,
        deleted_id: id,
        components_detached,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::temp_database;

    fn rice() -> IngredientCreate {
        IngredientCreate {
            code: "B001".to_string(),
            name: "Rice".to_string(),
            category: IngredientCategory::Carbohydrate,
            base_unit: BaseUnit::G,
            price_estimate: 12000.0,
            shelf_life_days: 180,
        }
    }

    #[test]
    fn test_duplicate_code_is_a_validation_failure() {
        let (_dir, db) = temp_database();
        add_ingredient(&db, rice()).unwrap();

        let err = add_ingredient(&db, rice()).unwrap_err();
        assert!(err.starts_with("Validation failed"), "{}", err);
    }

    #[test]
    fn test_blank_and_negative_input_rejected() {
        let (_dir, db) = temp_database();

        let mut blank = rice();
        blank.name = "  ".to_string();
        assert!(add_ingredient(&db, blank).is_err());

        let mut negative = rice();
        negative.price_estimate = -1.0;
        assert!(add_ingredient(&db, negative).is_err());
    }

    #[test]
    fn test_detail_includes_profile_and_conversions() {
        let (_dir, db) = temp_database();
        let added = add_ingredient(&db, rice()).unwrap();
        assert_eq!(added.label, "[B001] Rice");

        set_nutrient_profile(
            &db,
            added.id,
            NutrientProfileSet { energy: 130.0, protein: 2.7, ..Default::default() },
        )
        .unwrap()
        .unwrap();
        add_unit_conversion(
            &db,
            UnitConversionCreate { ingredient_id: added.id, unit_name: "cup".to_string(), grams_per_unit: 185.0 },
        )
        .unwrap()
        .unwrap();

        let detail = get_ingredient(&db, added.id).unwrap().unwrap();
        let profile = detail.nutrient_profile.unwrap();
        assert_eq!(profile.energy, "130.00 kcal");
        assert_eq!(profile.protein, "2.70 g");
        assert_eq!(detail.unit_conversions.len(), 1);
        assert_eq!(detail.unit_conversions[0].label, "cup (185.00g)");
        assert_eq!(detail.base_unit_label, "Gram (g)");
    }

    #[test]
    fn test_one_conversion_per_ingredient() {
        let (_dir, db) = temp_database();
        let added = add_ingredient(&db, rice()).unwrap();
        let bunch = |unit: &str, grams: f64| UnitConversionCreate {
            ingredient_id: added.id,
            unit_name: unit.to_string(),
            grams_per_unit: grams,
        };

        let first = add_unit_conversion(&db, bunch("bunch", 50.0)).unwrap().unwrap();
        let err = add_unit_conversion(&db, bunch("leaf", 2.0)).unwrap_err();
        assert!(err.starts_with("Validation failed"), "{}", err);
        assert!(err.contains("bunch (50.00g)"), "{}", err);
        assert_eq!(get_ingredient(&db, added.id).unwrap().unwrap().unit_conversions.len(), 1);

        // Replacing means deleting first
        delete_unit_conversion(&db, first.id).unwrap().unwrap();
        let leaf = add_unit_conversion(&db, bunch("leaf", 2.0)).unwrap().unwrap();
        assert_eq!(leaf.unit_name, "leaf");
    }

    #[test]
    fn test_code_and_name_length_limits() {
        let (_dir, db) = temp_database();

        let long_code = IngredientCreate { code: "C".repeat(25), ..rice() };
        let err = add_ingredient(&db, long_code).unwrap_err();
        assert!(err.contains("code cannot exceed 20"), "{}", err);

        let long_name = IngredientCreate { name: "N".repeat(150), ..rice() };
        let err = add_ingredient(&db, long_name).unwrap_err();
        assert!(err.contains("name cannot exceed 100"), "{}", err);

        let at_limit = IngredientCreate { code: "C".repeat(20), name: "N".repeat(100), ..rice() };
        let added = add_ingredient(&db, at_limit).unwrap();

        let err = update_ingredient(
            &db,
            added.id,
            IngredientUpdate { code: Some("C".repeat(21)), ..Default::default() },
        )
        .unwrap_err();
        assert!(err.contains("code cannot exceed 20"), "{}", err);
        let err = update_ingredient(
            &db,
            added.id,
            IngredientUpdate { name: Some("N".repeat(101)), ..Default::default() },
        )
        .unwrap_err();
        assert!(err.contains("name cannot exceed 100"), "{}", err);
    }

    #[test]
    fn test_infinite_profile_values_rejected() {
        let (_dir, db) = temp_database();
        let added = add_ingredient(&db, rice()).unwrap();
        let err = set_nutrient_profile(
            &db,
            added.id,
            NutrientProfileSet { energy: f64::INFINITY, ..Default::default() },
        )
        .unwrap_err();
        assert!(err.contains("finite"), "{}", err);
    }

    #[test]
    fn test_missing_ingredient_returns_none() {
        let (_dir, db) = temp_database();
        assert!(get_ingredient(&db, 99).unwrap().is_none());
        assert!(set_nutrient_profile(&db, 99, NutrientProfileSet::default()).unwrap().is_none());
        assert!(delete_ingredient(&db, 99).unwrap().is_none());
    }

    #[test]
    fn test_list_filters_by_category() {
        let (_dir, db) = temp_database();
        add_ingredient(&db, rice()).unwrap();
        add_ingredient(
            &db,
            IngredientCreate {
                code: "V001".to_string(),
                name: "Spinach".to_string(),
                category: IngredientCategory::Vegetable,
                base_unit: BaseUnit::Bunch,
                price_estimate: 3000.0,
                shelf_life_days: 3,
            },
        )
        .unwrap();

        let filter = IngredientFilter { category: Some(IngredientCategory::Vegetable), ..Default::default() };
        let result = list_ingredients(&db, filter, "code", "asc", 1000, -5).unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].code, "V001");
        assert_eq!(result.limit, 200);
        assert_eq!(result.offset, 0);
    }
}
