//! Menu plan tools
//!
//! Plans for a date and nutrition standard, their recipe items, and the
//! comparison of plan totals against the standard.

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

use crate::db::Database;
use crate::models::{
    calculate_plan_nutrition, calculate_recipe_nutrition, MenuPlan, MenuPlanCreate, MenuPlanFilter,
    MenuPlanItem, MenuPlanItemDetail, MenuPlanUpdate, Nutrition, NutritionStandard, Recipe,
    StandardEvaluation,
};
use crate::nutrition::{plan_totals, NutritionDisplay};
use super::standards::StandardSummary;
use super::write_error;

/// Plan row for list results
#[derive(Debug, Serialize)]
pub struct PlanSummary {
    pub id: i64,
    pub date: String,
    pub standard_id: i64,
    pub standard_label: String,
    pub item_count: usize,
    pub energy: String,
    pub protein: String,
}

#[derive(Debug, Serialize)]
pub struct ListPlansResponse {
    pub plans: Vec<PlanSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// A plan item with its recipe's totals
#[derive(Debug, Serialize)]
pub struct PlanItemLine {
    #[serde(flatten)]
    pub detail: MenuPlanItemDetail,
    pub totals: NutritionDisplay,
}

/// Full plan detail
#[derive(Debug, Serialize)]
pub struct PlanDetail {
    pub id: i64,
    pub date: String,
    pub notes: Option<String>,
    pub standard: StandardSummary,
    pub items: Vec<PlanItemLine>,
    pub totals: Nutrition,
    pub totals_display: NutritionDisplay,
    /// Where each total falls against the standard's range
    pub evaluation: StandardEvaluation,
    pub meets_standard: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct CreatePlanResponse {
    pub id: i64,
    pub date: String,
    pub standard_label: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct UpdatePlanResponse {
    pub success: bool,
    pub date: String,
    pub standard_id: i64,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Response for item writes: the plan's new totals
#[derive(Debug, Serialize)]
pub struct PlanItemsResponse {
    pub plan_id: i64,
    pub item_ids: Vec<i64>,
    pub plan_totals: NutritionDisplay,
}

/// Parse an ISO `YYYY-MM-DD` date, returning it in canonical form
pub fn validate_date(date: &str) -> Result<String, String> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| format!("Invalid date '{}': expected YYYY-MM-DD", date))
}

fn require_standard(conn: &Connection, standard_id: i64) -> Result<NutritionStandard, String> {
    NutritionStandard::get_by_id(conn, standard_id)
        .map_err(|e| format!("Failed to get nutrition standard: {}", e))?
        .ok_or_else(|| format!("Nutrition standard {} not found", standard_id))
}

fn require_plan(conn: &Connection, plan_id: i64) -> Result<MenuPlan, String> {
    MenuPlan::get_by_id(conn, plan_id)
        .map_err(|e| format!("Failed to get menu plan: {}", e))?
        .ok_or_else(|| format!("Menu plan {} not found", plan_id))
}

fn plan_totals_display(conn: &Connection, plan_id: i64) -> Result<NutritionDisplay, String> {
    let totals = calculate_plan_nutrition(conn, plan_id)
        .map_err(|e| format!("Failed to calculate plan nutrition: {}", e))?;
    Ok(NutritionDisplay::from(&totals))
}

fn add_items(conn: &Connection, plan_id: i64, recipe_ids: &[i64]) -> Result<Vec<i64>, String> {
    let mut ids = Vec::with_capacity(recipe_ids.len());
    for &recipe_id in recipe_ids {
        if Recipe::get_by_id(conn, recipe_id)
            .map_err(|e| format!("Failed to get recipe: {}", e))?
            .is_none()
        {
            return Err(format!("Recipe {} not found", recipe_id));
        }
        let item = MenuPlanItem::create(conn, plan_id, recipe_id)
            .map_err(|e| write_error("add plan item", e))?;
        ids.push(item.id);
    }
    Ok(ids)
}

// ============================================================================
// Menu Plan Tools
// ============================================================================

pub fn create_menu_plan(
    db: &Database,
    date: &str,
    standard_id: i64,
    notes: Option<String>,
) -> Result<CreatePlanResponse, String> {
    let date = validate_date(date)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let standard = require_standard(&conn, standard_id)?;

    let plan = MenuPlan::create(&conn, &MenuPlanCreate { date, standard_id, notes })
        .map_err(|e| write_error("create menu plan", e))?;

    info!("Created menu plan {} for {} ({})", plan.id, plan.date, standard.label());

    Ok(CreatePlanResponse {
        id: plan.id,
        date: plan.date,
        standard_label: standard.label(),
        created_at: plan.created_at,
    })
}

/// Get a plan with its items, totals and standard evaluation
pub fn get_menu_plan(db: &Database, id: i64) -> Result<Option<PlanDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let plan = match MenuPlan::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get menu plan: {}", e))?
    {
        Some(p) => p,
        None => return Ok(None),
    };
    let standard = require_standard(&conn, plan.standard_id)?;

    let details = MenuPlanItem::get_details_for_plan(&conn, id)
        .map_err(|e| format!("Failed to get plan items: {}", e))?;

    let mut items = Vec::with_capacity(details.len());
    let mut recipe_totals = Vec::with_capacity(details.len());
    for detail in details {
        let totals = calculate_recipe_nutrition(&conn, detail.recipe_id)
            .map_err(|e| format!("Failed to calculate recipe nutrition: {}", e))?;
        recipe_totals.push(totals);
        items.push(PlanItemLine { totals: NutritionDisplay::from(&totals), detail });
    }

    let totals = plan_totals(recipe_totals);
    let evaluation = standard.evaluate(&totals);

    Ok(Some(PlanDetail {
        id: plan.id,
        date: plan.date,
        notes: plan.notes,
        standard: StandardSummary::from(&standard),
        items,
        totals_display: NutritionDisplay::from(&totals),
        totals,
        meets_standard: evaluation.all_within(),
        evaluation,
        created_at: plan.created_at,
        updated_at: plan.updated_at,
    }))
}

/// List plans in a date range, optionally for one standard
pub fn list_menu_plans(
    db: &Database,
    start_date: Option<&str>,
    end_date: Option<&str>,
    standard_id: Option<i64>,
    sort_order: &str,
    limit: i64,
    offset: i64,
) -> Result<ListPlansResponse, String> {
    let limit = limit.min(200).max(1);
    let offset = offset.max(0);

    let filter = MenuPlanFilter {
        start_date: start_date.map(validate_date).transpose()?,
        end_date: end_date.map(validate_date).transpose()?,
        standard_id,
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let plans = MenuPlan::list(&conn, &filter, sort_order, limit, offset)
        .map_err(|e| format!("Failed to list menu plans: {}", e))?;
    let total = MenuPlan::count(&conn, &filter)
        .map_err(|e| format!("Failed to count menu plans: {}", e))?;

    let mut summaries = Vec::with_capacity(plans.len());
    for plan in plans {
        let standard = require_standard(&conn, plan.standard_id)?;
        let item_count = MenuPlanItem::get_for_plan(&conn, plan.id)
            .map_err(|e| format!("Failed to get plan items: {}", e))?
            .len();
        let display = plan_totals_display(&conn, plan.id)?;

        summaries.push(PlanSummary {
            id: plan.id,
            date: plan.date,
            standard_id: plan.standard_id,
            standard_label: standard.label(),
            item_count,
            energy: display.energy,
            protein: display.protein,
        });
    }

    Ok(ListPlansResponse { plans: summaries, total, limit, offset })
}

pub fn update_menu_plan(db: &Database, id: i64, mut data: MenuPlanUpdate) -> Result<Option<UpdatePlanResponse>, String> {
    if let Some(ref date) = data.date {
        data.date = Some(validate_date(date)?);
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    if let Some(standard_id) = data.standard_id {
        require_standard(&conn, standard_id)?;
    }

    let updated = MenuPlan::update(&conn, id, &data)
        .map_err(|e| write_error("update menu plan", e))?;

    Ok(updated.map(|p| UpdatePlanResponse {
        success: true,
        date: p.date,
        standard_id: p.standard_id,
        updated_at: p.updated_at,
    }))
}

/// Delete a plan and its items
pub fn delete_menu_plan(db: &Database, id: i64) -> Result<Option<DeleteResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = MenuPlan::delete(&conn, id)
        .map_err(|e| format!("Failed to delete menu plan: {}", e))?;

    if deleted {
        info!("Deleted menu plan {}", id);
    }

    Ok(deleted.then(|| DeleteResponse { success: true, deleted_id: id }))
}

// ============================================================================
// Menu Plan Item Tools
// ============================================================================

pub fn add_menu_plan_item(db: &Database, plan_id: i64, recipe_id: i64) -> Result<PlanItemsResponse, String> {
    add_menu_plan_items_batch(db, plan_id, vec![recipe_id])
}

/// Add several recipes to a plan in one transaction. A recipe may be listed
/// more than once.
pub fn add_menu_plan_items_batch(
    db: &Database,
    plan_id: i64,
    recipe_ids: Vec<i64>,
) -> Result<PlanItemsResponse, String> {
    if recipe_ids.is_empty() {
        return Err("No recipes given".to_string());
    }

    let mut conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let tx = conn.transaction().map_err(|e| format!("Database error: {}", e))?;

    require_plan(&tx, plan_id)?;
    let item_ids = add_items(&tx, plan_id, &recipe_ids)?;

    tx.commit().map_err(|e| format!("Failed to commit plan items: {}", e))?;

    Ok(PlanItemsResponse {
        plan_id,
        item_ids,
        plan_totals: plan_totals_display(&conn, plan_id)?,
    })
}

pub fn remove_menu_plan_item(db: &Database, id: i64) -> Result<Option<PlanItemsResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let item = match MenuPlanItem::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get plan item: {}", e))?
    {
        Some(i) => i,
        None => return Ok(None),
    };

    MenuPlanItem::delete(&conn, id)
        .map_err(|e| format!("Failed to remove plan item: {}", e))?;

    Ok(Some(PlanItemsResponse {
        plan_id: item.plan_id,
        item_ids: vec![id],
        plan_totals: plan_totals_display(&conn, item.plan_id)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        IngredientCategory, IngredientCreate, MealSlot, NutrientProfileSet, NutrientRange,
        NutritionStandardCreate, RecipeCategory, RecipeComponentCreate, RecipeCreate,
    };
    use crate::nutrition::BaseUnit;
    use crate::tools::test_support::temp_database;
    use crate::tools::{ingredients, recipes, standards};

    fn standard(db: &Database) -> i64 {
        standards::add_nutrition_standard(
            db,
            NutritionStandardCreate {
                target_group: "Primary school".to_string(),
                meal_slot: MealSlot::Lunch,
                budget_per_portion: 15000.0,
                reference_pct: "30% AKG".to_string(),
                energy: NutrientRange::new(450.0, 550.0),
                protein: NutrientRange::new(0.0, 20.0),
                fat: NutrientRange::new(0.0, 20.0),
                carbohydrate: NutrientRange::new(0.0, 80.0),
            },
        )
        .unwrap()
        .id
    }

    /// A recipe of 100 g of one ingredient with the given energy per 100 g
    fn recipe_with_energy(db: &Database, code: &str, energy: f64) -> i64 {
        let ingredient = ingredients::add_ingredient(
            db,
            IngredientCreate {
                code: code.to_string(),
                name: code.to_string(),
                category: IngredientCategory::Carbohydrate,
                base_unit: BaseUnit::G,
                price_estimate: 0.0,
                shelf_life_days: 0,
            },
        )
        .unwrap()
        .id;
        ingredients::set_nutrient_profile(db, ingredient, NutrientProfileSet { energy, ..Default::default() })
            .unwrap();
        let recipe = recipes::create_recipe(
            db,
            RecipeCreate { name: format!("{} dish", code), category: RecipeCategory::Carbohydrate },
        )
        .unwrap()
        .id;
        recipes::add_recipe_component(
            db,
            RecipeComponentCreate { recipe_id: recipe, ingredient_id: ingredient, weight_grams: Some(100.0), ..Default::default() },
        )
        .unwrap();
        recipe
    }

    #[test]
    fn test_date_validation() {
        assert_eq!(validate_date("2025-01-09").unwrap(), "2025-01-09");
        assert!(validate_date("2025-02-30").is_err());
        assert!(validate_date("09/01/2025").is_err());
    }

    #[test]
    fn test_plan_totals_and_evaluation() {
        let (_dir, db) = temp_database();
        let standard_id = standard(&db);
        let rice = recipe_with_energy(&db, "RICE", 195.0);
        let chicken = recipe_with_energy(&db, "CHICKEN", 305.0);

        let plan = create_menu_plan(&db, "2025-01-09", standard_id, None).unwrap();
        let added = add_menu_plan_items_batch(&db, plan.id, vec![rice, chicken]).unwrap();
        assert_eq!(added.plan_totals.energy, "500.00 kcal");

        let detail = get_menu_plan(&db, plan.id).unwrap().unwrap();
        assert_eq!(detail.items.len(), 2);
        assert!((detail.totals.energy - 500.0).abs() < 1e-9);
        assert!(detail.meets_standard);

        add_menu_plan_item(&db, plan.id, rice).unwrap();
        let detail = get_menu_plan(&db, plan.id).unwrap().unwrap();
        assert!((detail.totals.energy - 695.0).abs() < 1e-9);
        assert!(!detail.meets_standard);

        let listed = list_menu_plans(&db, Some("2025-01-01"), Some("2025-01-31"), None, "desc", 50, 0).unwrap();
        assert_eq!(listed.total, 1);
        assert_eq!(listed.plans[0].energy, "695.00 kcal");
        assert_eq!(listed.plans[0].item_count, 3);
    }

    #[test]
    fn test_duplicate_plan_is_a_validation_failure() {
        let (_dir, db) = temp_database();
        let standard_id = standard(&db);
        create_menu_plan(&db, "2025-01-09", standard_id, None).unwrap();

        let err = create_menu_plan(&db, "2025-01-09", standard_id, Some("again".to_string())).unwrap_err();
        assert!(err.starts_with("Validation failed"), "{}", err);
    }

    #[test]
    fn test_batch_with_unknown_recipe_adds_nothing() {
        let (_dir, db) = temp_database();
        let standard_id = standard(&db);
        let rice = recipe_with_energy(&db, "RICE", 195.0);
        let plan = create_menu_plan(&db, "2025-01-09", standard_id, None).unwrap();

        let err = add_menu_plan_items_batch(&db, plan.id, vec![rice, 4242]).unwrap_err();
        assert!(err.contains("4242"), "{}", err);
        assert!(get_menu_plan(&db, plan.id).unwrap().unwrap().items.is_empty());
    }
}
