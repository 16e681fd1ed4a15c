//! Nutrient profile model
//!
//! Per-100g nutrient density for an ingredient. At most one per ingredient.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::Nutrition;

/// Nutrient density of an ingredient, per 100 g
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutrientProfile {
    pub id: i64,
    pub ingredient_id: i64,
    pub per_100g: Nutrition,
    /// Edible portion of the purchased weight, in percent
    pub edible_portion_pct: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for setting an ingredient's profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NutrientProfileSet {
    #[serde(default)]
    pub energy: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub carbohydrate: f64,
    #[serde(default)]
    pub edible_portion_pct: f64,
}

impl NutrientProfile {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            ingredient_id: row.get("ingredient_id")?,
            per_100g: Nutrition {
                energy: row.get("energy")?,
                protein: row.get("protein")?,
                fat: row.get("fat")?,
                carbohydrate: row.get("carbohydrate")?,
            },
            edible_portion_pct: row.get("edible_portion_pct")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Set or replace the profile of an ingredient (upsert)
    pub fn set(conn: &Connection, ingredient_id: i64, data: &NutrientProfileSet) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO nutrient_profiles (ingredient_id, energy, protein, fat, carbohydrate, edible_portion_pct)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(ingredient_id) DO UPDATE SET
                energy = excluded.energy,
                protein = excluded.protein,
                fat = excluded.fat,
                carbohydrate = excluded.carbohydrate,
                edible_portion_pct = excluded.edible_portion_pct,
                updated_at = datetime('now')
            "#,
            params![
                ingredient_id,
                data.energy,
                data.protein,
                data.fat,
                data.carbohydrate,
                data.edible_portion_pct,
            ],
        )?;

        Self::get_for_ingredient(conn, ingredient_id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get the profile of an ingredient, if it has one
    pub fn get_for_ingredient(conn: &Connection, ingredient_id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM nutrient_profiles WHERE ingredient_id = ?1")?;

        match stmt.query_row([ingredient_id], Self::from_row) {
            Ok(profile) => Ok(Some(profile)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the profile of an ingredient
    pub fn delete_for_ingredient(conn: &Connection, ingredient_id: i64) -> DbResult<bool> {
        let rows = conn.execute(
            "DELETE FROM nutrient_profiles WHERE ingredient_id = ?1",
            [ingredient_id],
        )?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::models::fixtures;

    #[test]
    fn test_set_is_an_upsert() {
        let conn = open_in_memory().unwrap();
        let rice = fixtures::ingredient(&conn, "B001", "Rice");

        let first = NutrientProfile::set(
            &conn,
            rice.id,
            &NutrientProfileSet { energy: 130.0, protein: 2.7, ..Default::default() },
        )
        .unwrap();
        let second = NutrientProfile::set(
            &conn,
            rice.id,
            &NutrientProfileSet { energy: 360.0, protein: 6.8, edible_portion_pct: 100.0, ..Default::default() },
        )
        .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.per_100g.energy, 360.0);
        assert_eq!(second.edible_portion_pct, 100.0);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM nutrient_profiles", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_missing_profile_and_delete() {
        let conn = open_in_memory().unwrap();
        let salt = fixtures::ingredient(&conn, "S001", "Salt");
        assert!(NutrientProfile::get_for_ingredient(&conn, salt.id).unwrap().is_none());

        NutrientProfile::set(&conn, salt.id, &NutrientProfileSet::default()).unwrap();
        assert!(NutrientProfile::delete_for_ingredient(&conn, salt.id).unwrap());
        assert!(NutrientProfile::get_for_ingredient(&conn, salt.id).unwrap().is_none());
    }

    #[test]
    fn test_profile_removed_with_ingredient() {
        let conn = open_in_memory().unwrap();
        let rice = fixtures::ingredient(&conn, "B001", "Rice");
        fixtures::profile(&conn, rice.id, 130.0);

        crate::models::Ingredient::delete(&conn, rice.id).unwrap();
        assert!(NutrientProfile::get_for_ingredient(&conn, rice.id).unwrap().is_none());
    }
}
