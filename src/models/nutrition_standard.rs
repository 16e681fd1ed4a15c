//! Nutrition standard model
//!
//! Target nutrient ranges and a budget ceiling for one target group and
//! meal slot. Plans are checked against these ranges for display; nothing
//! here optimizes a menu.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::{choice_from_row, Nutrition};
use crate::db::DbResult;

/// Meal slot a standard applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Snack,
}

impl MealSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Snack => "snack",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Some(MealSlot::Breakfast),
            "lunch" => Some(MealSlot::Lunch),
            "snack" => Some(MealSlot::Snack),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "Breakfast",
            MealSlot::Lunch => "Lunch",
            MealSlot::Snack => "Supplementary Food / Snack",
        }
    }
}

/// Inclusive target range for one nutrient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientRange {
    pub min: f64,
    pub max: f64,
}

/// Where a value falls relative to a range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeStatus {
    Below,
    Within,
    Above,
}

impl NutrientRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min >= 0.0 && self.min <= self.max
    }

    pub fn status(&self, value: f64) -> RangeStatus {
        if value < self.min {
            RangeStatus::Below
        } else if value > self.max {
            RangeStatus::Above
        } else {
            RangeStatus::Within
        }
    }
}

/// Per-nutrient comparison of totals against a standard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardEvaluation {
    pub energy: RangeStatus,
    pub protein: RangeStatus,
    pub fat: RangeStatus,
    pub carbohydrate: RangeStatus,
}

impl StandardEvaluation {
    pub fn all_within(&self) -> bool {
        [self.energy, self.protein, self.fat, self.carbohydrate]
            .iter()
            .all(|s| *s == RangeStatus::Within)
    }
}

/// A nutrition standard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionStandard {
    pub id: i64,
    pub target_group: String,
    pub meal_slot: MealSlot,
    pub budget_per_portion: f64,
    pub reference_pct: String,
    pub energy: NutrientRange,
    pub protein: NutrientRange,
    pub fat: NutrientRange,
    pub carbohydrate: NutrientRange,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a nutrition standard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionStandardCreate {
    pub target_group: String,
    pub meal_slot: MealSlot,
    pub budget_per_portion: f64,
    pub reference_pct: String,
    pub energy: NutrientRange,
    pub protein: NutrientRange,
    pub fat: NutrientRange,
    pub carbohydrate: NutrientRange,
}

/// Data for updating a nutrition standard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NutritionStandardUpdate {
    pub target_group: Option<String>,
    pub meal_slot: Option<MealSlot>,
    pub budget_per_portion: Option<f64>,
    pub reference_pct: Option<String>,
    pub energy: Option<NutrientRange>,
    pub protein: Option<NutrientRange>,
    pub fat: Option<NutrientRange>,
    pub carbohydrate: Option<NutrientRange>,
}

impl NutritionStandard {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            target_group: row.get("target_group")?,
            meal_slot: choice_from_row(row, "meal_slot", MealSlot::parse)?,
            budget_per_portion: row.get("budget_per_portion")?,
            reference_pct: row.get("reference_pct")?,
            energy: NutrientRange::new(row.get("energy_min")?, row.get("energy_max")?),
            protein: NutrientRange::new(row.get("protein_min")?, row.get("protein_max")?),
            fat: NutrientRange::new(row.get("fat_min")?, row.get("fat_max")?),
            carbohydrate: NutrientRange::new(
                row.get("carbohydrate_min")?,
                row.get("carbohydrate_max")?,
            ),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Display label, e.g. `Primary school - Lunch`
    pub fn label(&self) -> String {
        format!("{} - {}", self.target_group, self.meal_slot.label())
    }

    /// Compare totals against this standard's ranges
    pub fn evaluate(&self, totals: &Nutrition) -> StandardEvaluation {
        StandardEvaluation {
            energy: self.energy.status(totals.energy),
            protein: self.protein.status(totals.protein),
            fat: self.fat.status(totals.fat),
            carbohydrate: self.carbohydrate.status(totals.carbohydrate),
        }
    }

    pub fn create(conn: &Connection, data: &NutritionStandardCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO nutrition_standards (
                target_group, meal_slot, budget_per_portion, reference_pct,
                energy_min, energy_max, protein_min, protein_max,
                fat_min, fat_max, carbohydrate_min, carbohydrate_max
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                data.target_group,
                data.meal_slot.as_str(),
                data.budget_per_portion,
                data.reference_pct,
                data.energy.min,
                data.energy.max,
                data.protein.min,
                data.protein.max,
                data.fat.min,
                data.fat.max,
                data.carbohydrate.min,
                data.carbohydrate.max,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM nutrition_standards WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(standard) => Ok(Some(standard)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List standards, optionally searching target group and filtering by meal slot
    pub fn list(
        conn: &Connection,
        query: Option<&str>,
        meal_slot: Option<MealSlot>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let mut sql = String::from("SELECT * FROM nutrition_standards WHERE 1=1");
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(q) = query {
            params_vec.push(Box::new(format!("%{}%", q)));
            sql.push_str(&format!(" AND target_group LIKE ?{}", params_vec.len()));
        }
        if let Some(slot) = meal_slot {
            params_vec.push(Box::new(slot.as_str()));
            sql.push_str(&format!(" AND meal_slot = ?{}", params_vec.len()));
        }

        sql.push_str(" ORDER BY target_group ASC, meal_slot ASC");

        params_vec.push(Box::new(limit));
        sql.push_str(&format!(" LIMIT ?{}", params_vec.len()));
        params_vec.push(Box::new(offset));
        sql.push_str(&format!(" OFFSET ?{}", params_vec.len()));

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();

        let standards = stmt
            .query_map(params_refs.as_slice(), Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(standards)
    }

    pub fn count(conn: &Connection, query: Option<&str>, meal_slot: Option<MealSlot>) -> DbResult<i64> {
        let mut sql = String::from("SELECT COUNT(*) FROM nutrition_standards WHERE 1=1");
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(q) = query {
            params_vec.push(Box::new(format!("%{}%", q)));
            sql.push_str(&format!(" AND target_group LIKE ?{}", params_vec.len()));
        }
        if let Some(slot) = meal_slot {
            params_vec.push(Box::new(slot.as_str()));
            sql.push_str(&format!(" AND meal_slot = ?{}", params_vec.len()));
        }

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let count: i64 = conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))?;
        Ok(count)
    }

    pub fn update(conn: &Connection, id: i64, data: &NutritionStandardUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        macro_rules! add_update {
            ($col:expr, $val:expr) => {
                if let Some(val) = $val {
                    updates.push(format!("{} = ?{}", $col, params_vec.len() + 1));
                    params_vec.push(Box::new(val));
                }
            };
        }

        add_update!("target_group", data.target_group.clone());
        add_update!("meal_slot", data.meal_slot.map(|s| s.as_str()));
        add_update!("budget_per_portion", data.budget_per_portion);
        add_update!("reference_pct", data.reference_pct.clone());
        add_update!("energy_min", data.energy.map(|r| r.min));
        add_update!("energy_max", data.energy.map(|r| r.max));
        add_update!("protein_min", data.protein.map(|r| r.min));
        add_update!("protein_max", data.protein.map(|r| r.max));
        add_update!("fat_min", data.fat.map(|r| r.min));
        add_update!("fat_max", data.fat.map(|r| r.max));
        add_update!("carbohydrate_min", data.carbohydrate.map(|r| r.min));
        add_update!("carbohydrate_max", data.carbohydrate.map(|r| r.max));

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE nutrition_standards SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Number of menu plans using this standard
    pub fn get_plan_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM menu_plans WHERE standard_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete a standard together with its menu plans
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM nutrition_standards WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::models::fixtures;

    #[test]
    fn test_range_status_is_inclusive() {
        let range = NutrientRange::new(300.0, 400.0);
        assert_eq!(range.status(299.99), RangeStatus::Below);
        assert_eq!(range.status(300.0), RangeStatus::Within);
        assert_eq!(range.status(400.0), RangeStatus::Within);
        assert_eq!(range.status(400.01), RangeStatus::Above);
        assert!(range.is_valid());
        assert!(!NutrientRange::new(5.0, 1.0).is_valid());
        assert!(!NutrientRange::new(-1.0, 1.0).is_valid());
    }

    #[test]
    fn test_duplicate_group_and_slot_rejected() {
        let conn = open_in_memory().unwrap();
        fixtures::standard(&conn, "Primary school", MealSlot::Lunch);
        fixtures::standard(&conn, "Primary school", MealSlot::Breakfast);

        let mut dup = fixtures::standard_data("Primary school", MealSlot::Lunch);
        dup.budget_per_portion = 1.0;
        let err = NutritionStandard::create(&conn, &dup).unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_list_search_and_slot_filter() {
        let conn = open_in_memory().unwrap();
        fixtures::standard(&conn, "Primary school", MealSlot::Lunch);
        fixtures::standard(&conn, "Primary school", MealSlot::Snack);
        fixtures::standard(&conn, "Toddlers", MealSlot::Snack);

        let snacks = NutritionStandard::list(&conn, None, Some(MealSlot::Snack), 50, 0).unwrap();
        assert_eq!(snacks.len(), 2);

        let primary = NutritionStandard::list(&conn, Some("primary"), None, 50, 0).unwrap();
        assert_eq!(primary.len(), 2);
        assert_eq!(NutritionStandard::count(&conn, Some("todd"), Some(MealSlot::Snack)).unwrap(), 1);
        assert_eq!(primary[0].label(), "Primary school - Lunch");
    }

    #[test]
    fn test_update_range_and_evaluate() {
        let conn = open_in_memory().unwrap();
        let standard = fixtures::standard(&conn, "Primary school", MealSlot::Lunch);

        let updated = NutritionStandard::update(
            &conn,
            standard.id,
            &NutritionStandardUpdate {
                energy: Some(NutrientRange::new(450.0, 550.0)),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(updated.energy, NutrientRange::new(450.0, 550.0));

        let totals = Nutrition { energy: 500.0, protein: 1.0, fat: 15.0, carbohydrate: 200.0 };
        let eval = updated.evaluate(&totals);
        assert_eq!(eval.energy, RangeStatus::Within);
        assert_eq!(eval.protein, RangeStatus::Below);
        assert_eq!(eval.carbohydrate, RangeStatus::Above);
        assert!(!eval.all_within());
    }
}
