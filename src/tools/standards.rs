//! Nutrition standard tools

use serde::Serialize;
use tracing::info;

use crate::db::Database;
use crate::models::{
    MealSlot, NutrientRange, NutritionStandard, NutritionStandardCreate, NutritionStandardUpdate,
};
use crate::nutrition::format_range;
use super::{require_non_negative, require_text, write_error};

/// Standard with formatted range columns
#[derive(Debug, Serialize)]
pub struct StandardSummary {
    pub id: i64,
    pub label: String,
    pub target_group: String,
    pub meal_slot: MealSlot,
    pub meal_slot_label: &'static str,
    pub budget_per_portion: f64,
    pub reference_pct: String,
    pub energy_range: String,
    pub protein_range: String,
    pub fat_range: String,
    pub carbohydrate_range: String,
}

impl From<&NutritionStandard> for StandardSummary {
    fn from(s: &NutritionStandard) -> Self {
        Self {
            id: s.id,
            label: s.label(),
            target_group: s.target_group.clone(),
            meal_slot: s.meal_slot,
            meal_slot_label: s.meal_slot.label(),
            budget_per_portion: s.budget_per_portion,
            reference_pct: s.reference_pct.clone(),
            energy_range: format_range(s.energy.min, s.energy.max),
            protein_range: format_range(s.protein.min, s.protein.max),
            fat_range: format_range(s.fat.min, s.fat.max),
            carbohydrate_range: format_range(s.carbohydrate.min, s.carbohydrate.max),
        }
    }
}

/// Full standard detail
#[derive(Debug, Serialize)]
pub struct StandardDetail {
    #[serde(flatten)]
    pub summary: StandardSummary,
    pub energy: NutrientRange,
    pub protein: NutrientRange,
    pub fat: NutrientRange,
    pub carbohydrate: NutrientRange,
    pub plan_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct ListStandardsResponse {
    pub standards: Vec<StandardSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct DeleteStandardResponse {
    pub success: bool,
    pub deleted_id: i64,
    /// Menu plans removed along with the standard
    pub plans_removed: i64,
}

fn validate_range(nutrient: &str, range: &NutrientRange) -> Result<(), String> {
    require_non_negative(&format!("{}_min", nutrient), range.min)?;
    require_non_negative(&format!("{}_max", nutrient), range.max)?;
    if !range.is_valid() {
        return Err(format!(
            "{} minimum ({}) cannot exceed maximum ({})",
            nutrient, range.min, range.max
        ));
    }
    Ok(())
}

fn validate_ranges(
    energy: &NutrientRange,
    protein: &NutrientRange,
    fat: &NutrientRange,
    carbohydrate: &NutrientRange,
) -> Result<(), String> {
    validate_range("energy", energy)?;
    validate_range("protein", protein)?;
    validate_range("fat", fat)?;
    validate_range("carbohydrate", carbohydrate)
}

/// Add a nutrition standard
pub fn add_nutrition_standard(db: &Database, mut data: NutritionStandardCreate) -> Result<StandardSummary, String> {
    data.target_group = require_text("target_group", &data.target_group)?;
    data.reference_pct = data.reference_pct.trim().to_string();
    require_non_negative("budget_per_portion", data.budget_per_portion)?;
    validate_ranges(&data.energy, &data.protein, &data.fat, &data.carbohydrate)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let standard = NutritionStandard::create(&conn, &data)
        .map_err(|e| write_error("create nutrition standard", e))?;

    info!("Added nutrition standard {}", standard.label());

    Ok(StandardSummary::from(&standard))
}

pub fn get_nutrition_standard(db: &Database, id: i64) -> Result<Option<StandardDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let standard = match NutritionStandard::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get nutrition standard: {}", e))?
    {
        Some(s) => s,
        None => return Ok(None),
    };

    let plan_count = NutritionStandard::get_plan_count(&conn, id)
        .map_err(|e| format!("Failed to count plans: {}", e))?;

    Ok(Some(StandardDetail {
        summary: StandardSummary::from(&standard),
        energy: standard.energy,
        protein: standard.protein,
        fat: standard.fat,
        carbohydrate: standard.carbohydrate,
        plan_count,
        created_at: standard.created_at,
        updated_at: standard.updated_at,
    }))
}

/// List standards, searching by target group and filtering by meal slot
pub fn list_nutrition_standards(
    db: &Database,
    query: Option<&str>,
    meal_slot: Option<MealSlot>,
    limit: i64,
    offset: i64,
) -> Result<ListStandardsResponse, String> {
    let limit = limit.min(200).max(1);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let standards = NutritionStandard::list(&conn, query, meal_slot, limit, offset)
        .map_err(|e| format!("Failed to list nutrition standards: {}", e))?;
    let total = NutritionStandard::count(&conn, query, meal_slot)
        .map_err(|e| format!("Failed to count nutrition standards: {}", e))?;

    Ok(ListStandardsResponse {
        standards: standards.iter().map(StandardSummary::from).collect(),
        total,
        limit,
        offset,
    })
}

/// Update a standard. Ranges are replaced whole and validated before writing.
pub fn update_nutrition_standard(
    db: &Database,
    id: i64,
    mut data: NutritionStandardUpdate,
) -> Result<Option<StandardSummary>, String> {
    if let Some(ref group) = data.target_group {
        data.target_group = Some(require_text("target_group", group)?);
    }
    if let Some(budget) = data.budget_per_portion {
        require_non_negative("budget_per_portion", budget)?;
    }
    for (nutrient, range) in [
        ("energy", &data.energy),
        ("protein", &data.protein),
        ("fat", &data.fat),
        ("carbohydrate", &data.carbohydrate),
    ] {
        if let Some(r) = range {
            validate_range(nutrient, r)?;
        }
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let updated = NutritionStandard::update(&conn, id, &data)
        .map_err(|e| write_error("update nutrition standard", e))?;

    Ok(updated.as_ref().map(StandardSummary::from))
}

/// Delete a standard together with its menu plans
pub fn delete_nutrition_standard(db: &Database, id: i64) -> Result<Option<DeleteStandardResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let plans_removed = NutritionStandard::get_plan_count(&conn, id)
        .map_err(|e| format!("Failed to count plans: {}", e))?;

    let deleted = NutritionStandard::delete(&conn, id)
        .map_err(|e| format!("Failed to delete nutrition standard: {}", e))?;

    if !deleted {
        return Ok(None);
    }

    info!("Deleted nutrition standard {} with {} plans", id, plans_removed);

    Ok(Some(DeleteStandardResponse { success: true, deleted_id: id, plans_removed }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::temp_database;

    fn lunch() -> NutritionStandardCreate {
        NutritionStandardCreate {
            target_group: "Primary school".to_string(),
            meal_slot: MealSlot::Lunch,
            budget_per_portion: 15000.0,
            reference_pct: "30% AKG".to_string(),
            energy: NutrientRange::new(450.0, 550.0),
            protein: NutrientRange::new(12.0, 18.0),
            fat: NutrientRange::new(12.0, 20.0),
            carbohydrate: NutrientRange::new(60.0, 80.0),
        }
    }

    #[test]
    fn test_ranges_are_formatted() {
        let (_dir, db) = temp_database();
        let added = add_nutrition_standard(&db, lunch()).unwrap();
        assert_eq!(added.label, "Primary school - Lunch");
        assert_eq!(added.energy_range, "450.00 - 550.00");

        let detail = get_nutrition_standard(&db, added.id).unwrap().unwrap();
        assert_eq!(detail.plan_count, 0);
        assert_eq!(detail.protein, NutrientRange::new(12.0, 18.0));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let (_dir, db) = temp_database();
        let mut bad = lunch();
        bad.fat = NutrientRange::new(30.0, 10.0);
        let err = add_nutrition_standard(&db, bad).unwrap_err();
        assert!(err.contains("fat"), "{}", err);

        let added = add_nutrition_standard(&db, lunch()).unwrap();
        let err = update_nutrition_standard(
            &db,
            added.id,
            NutritionStandardUpdate { energy: Some(NutrientRange::new(-1.0, 5.0)), ..Default::default() },
        )
        .unwrap_err();
        assert!(err.contains("energy"), "{}", err);

        let mut unbounded = lunch();
        unbounded.carbohydrate = NutrientRange::new(60.0, f64::INFINITY);
        let err = add_nutrition_standard(&db, unbounded).unwrap_err();
        assert!(err.contains("carbohydrate_max must be a finite number"), "{}", err);
    }

    #[test]
    fn test_duplicate_pair_is_a_validation_failure() {
        let (_dir, db) = temp_database();
        add_nutrition_standard(&db, lunch()).unwrap();
        let err = add_nutrition_standard(&db, lunch()).unwrap_err();
        assert!(err.starts_with("Validation failed"), "{}", err);

        let mut snack = lunch();
        snack.meal_slot = MealSlot::Snack;
        assert!(add_nutrition_standard(&db, snack).is_ok());

        let listed = list_nutrition_standards(&db, Some("school"), Some(MealSlot::Snack), 50, 0).unwrap();
        assert_eq!(listed.total, 1);
        assert_eq!(listed.standards[0].meal_slot_label, "Supplementary Food / Snack");
    }
}
