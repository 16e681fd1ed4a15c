//! Unit conversion model
//!
//! A named non-gram unit ("bunch", "piece") and its gram equivalent,
//! scoped to one ingredient.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A unit conversion for an ingredient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitConversion {
    pub id: i64,
    pub ingredient_id: i64,
    pub unit_name: String,
    pub grams_per_unit: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for adding a unit conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitConversionCreate {
    pub ingredient_id: i64,
    pub unit_name: String,
    pub grams_per_unit: f64,
}

/// Data for updating a unit conversion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitConversionUpdate {
    pub unit_name: Option<String>,
    pub grams_per_unit: Option<f64>,
}

impl UnitConversion {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            ingredient_id: row.get("ingredient_id")?,
            unit_name: row.get("unit_name")?,
            grams_per_unit: row.get("grams_per_unit")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Display label, e.g. `bunch (50.00g)`
    pub fn label(&self) -> String {
        format!("{} ({:.2}g)", self.unit_name, self.grams_per_unit)
    }

    pub fn create(conn: &Connection, data: &UnitConversionCreate) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO unit_conversions (ingredient_id, unit_name, grams_per_unit) VALUES (?1, ?2, ?3)",
            params![data.ingredient_id, data.unit_name, data.grams_per_unit],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM unit_conversions WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(conversion) => Ok(Some(conversion)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All conversions for an ingredient
    pub fn get_for_ingredient(conn: &Connection, ingredient_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM unit_conversions WHERE ingredient_id = ?1 ORDER BY id",
        )?;

        let conversions = stmt
            .query_map([ingredient_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(conversions)
    }

    pub fn update(conn: &Connection, id: i64, data: &UnitConversionUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.unit_name {
            updates.push(format!("unit_name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.clone()));
        }
        if let Some(grams) = data.grams_per_unit {
            updates.push(format!("grams_per_unit = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(grams));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE unit_conversions SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Number of recipe components referencing this conversion
    pub fn get_usage_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM recipe_components WHERE conversion_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete a conversion. Components that referenced it keep their stored
    /// gram weight; their conversion reference becomes null.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM unit_conversions WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
