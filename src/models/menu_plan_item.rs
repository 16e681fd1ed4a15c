//! Menu plan item model
//!
//! A recipe served in a plan. The same recipe may appear more than once.

use std::collections::HashMap;

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use crate::nutrition::plan_totals;
use super::{calculate_recipe_nutrition, Nutrition, RecipeCategory, choice_from_row};

/// A recipe in a menu plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuPlanItem {
    pub id: i64,
    pub plan_id: i64,
    pub recipe_id: i64,
    pub created_at: String,
}

/// Plan item with recipe details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuPlanItemDetail {
    pub id: i64,
    pub recipe_id: i64,
    pub recipe_name: String,
    pub recipe_category: RecipeCategory,
}

impl MenuPlanItem {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            plan_id: row.get("plan_id")?,
            recipe_id: row.get("recipe_id")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn create(conn: &Connection, plan_id: i64, recipe_id: i64) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO menu_plan_items (plan_id, recipe_id) VALUES (?1, ?2)",
            params![plan_id, recipe_id],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM menu_plan_items WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_for_plan(conn: &Connection, plan_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM menu_plan_items WHERE plan_id = ?1 ORDER BY id")?;

        let items = stmt
            .query_map([plan_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    pub fn get_details_for_plan(conn: &Connection, plan_id: i64) -> DbResult<Vec<MenuPlanItemDetail>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT mpi.id, mpi.recipe_id, r.name AS recipe_name, r.category AS recipe_category
            FROM menu_plan_items mpi
            INNER JOIN recipes r ON mpi.recipe_id = r.id
            WHERE mpi.plan_id = ?1
            ORDER BY mpi.id
            "#,
        )?;

        let details = stmt
            .query_map([plan_id], |row| {
                Ok(MenuPlanItemDetail {
                    id: row.get("id")?,
                    recipe_id: row.get("recipe_id")?,
                    recipe_name: row.get("recipe_name")?,
                    recipe_category: choice_from_row(row, "recipe_category", RecipeCategory::parse)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(details)
    }

    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM menu_plan_items WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

/// Nutrient totals of a plan: the sum of each item's recipe totals
pub fn calculate_plan_nutrition(conn: &Connection, plan_id: i64) -> DbResult<Nutrition> {
    let items = MenuPlanItem::get_for_plan(conn, plan_id)?;

    // recipe totals are looked up once per distinct recipe
    let mut per_recipe: HashMap<i64, Nutrition> = HashMap::new();
    let mut totals = Vec::with_capacity(items.len());
    for item in &items {
        let recipe_total = match per_recipe.get(&item.recipe_id) {
            Some(n) => *n,
            None => {
                let n = calculate_recipe_nutrition(conn, item.recipe_id)?;
                per_recipe.insert(item.recipe_id, n);
                n
            }
        };
        totals.push(recipe_total);
    }

    Ok(plan_totals(totals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::models::{fixtures, MealSlot};

    #[test]
    fn test_plan_totals_sum_recipes() {
        let conn = open_in_memory().unwrap();
        let rice = fixtures::ingredient(&conn, "B001", "Rice");
        let chicken = fixtures::ingredient(&conn, "P001", "Chicken");
        fixtures::profile(&conn, rice.id, 130.0);
        fixtures::profile(&conn, chicken.id, 305.0);

        let steamed = fixtures::recipe(&conn, "Steamed Rice", RecipeCategory::Carbohydrate);
        fixtures::component(&conn, steamed.id, rice.id, 150.0);
        let grilled = fixtures::recipe(&conn, "Grilled Chicken", RecipeCategory::AnimalProtein);
        fixtures::component(&conn, grilled.id, chicken.id, 100.0);

        let standard = fixtures::standard(&conn, "Primary school", MealSlot::Lunch);
        let plan = fixtures::plan(&conn, "2025-01-09", standard.id);
        MenuPlanItem::create(&conn, plan.id, steamed.id).unwrap();
        MenuPlanItem::create(&conn, plan.id, grilled.id).unwrap();

        let totals = calculate_plan_nutrition(&conn, plan.id).unwrap();
        assert!((totals.energy - 500.0).abs() < 1e-9);

        MenuPlanItem::create(&conn, plan.id, steamed.id).unwrap();
        let totals = calculate_plan_nutrition(&conn, plan.id).unwrap();
        assert!((totals.energy - 695.0).abs() < 1e-9);

        let details = MenuPlanItem::get_details_for_plan(&conn, plan.id).unwrap();
        assert_eq!(details.len(), 3);
        assert_eq!(details[1].recipe_name, "Grilled Chicken");
    }

    #[test]
    fn test_empty_plan_is_zero() {
        let conn = open_in_memory().unwrap();
        let standard = fixtures::standard(&conn, "Toddlers", MealSlot::Snack);
        let plan = fixtures::plan(&conn, "2025-01-09", standard.id);
        assert_eq!(calculate_plan_nutrition(&conn, plan.id).unwrap(), Nutrition::zero());
    }
}
