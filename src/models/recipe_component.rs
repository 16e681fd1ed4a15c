//! Recipe component model
//!
//! One ingredient line of a recipe. The amount is either a direct gram
//! weight or a count of one of the ingredient's unit conversions. When both
//! a conversion and a count are saved, the gram column is rewritten with
//! their product (see `nutrition::weight_to_store`).

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::nutrition::{recipe_totals, resolve_weight, weight_to_store};
use super::{Nutrition, UnitConversion};

/// An ingredient line in a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeComponent {
    pub id: i64,
    pub recipe_id: i64,
    pub ingredient_id: i64,
    /// Stored gram weight; authoritative when present
    pub weight_grams: Option<f64>,
    pub conversion_id: Option<i64>,
    pub unit_count: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Component joined with its ingredient, conversion and nutrient profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeComponentDetail {
    pub id: i64,
    pub ingredient_id: i64,
    pub ingredient_code: String,
    pub ingredient_name: String,
    pub weight_grams: Option<f64>,
    pub conversion_id: Option<i64>,
    pub conversion_unit: Option<String>,
    pub grams_per_unit: Option<f64>,
    pub unit_count: Option<f64>,
    /// Weight used for nutrient totals
    pub resolved_weight_grams: f64,
    /// Ingredient density per 100 g; `None` when it has no profile
    pub per_100g: Option<Nutrition>,
}

/// Data for adding a component to a recipe
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeComponentCreate {
    pub recipe_id: i64,
    pub ingredient_id: i64,
    pub weight_grams: Option<f64>,
    pub conversion_id: Option<i64>,
    pub unit_count: Option<f64>,
}

/// Data for updating a component. `None` leaves a field unchanged; the
/// `clear_*` flags null it out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeComponentUpdate {
    pub weight_grams: Option<f64>,
    pub conversion_id: Option<i64>,
    pub unit_count: Option<f64>,
    #[serde(default)]
    pub clear_weight: bool,
    #[serde(default)]
    pub clear_conversion: bool,
    #[serde(default)]
    pub clear_unit_count: bool,
}

impl RecipeComponent {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            recipe_id: row.get("recipe_id")?,
            ingredient_id: row.get("ingredient_id")?,
            weight_grams: row.get("weight_grams")?,
            conversion_id: row.get("conversion_id")?,
            unit_count: row.get("unit_count")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Gram factor of a conversion, if the reference is set and still exists
    fn grams_per_unit(conn: &Connection, conversion_id: Option<i64>) -> DbResult<Option<f64>> {
        match conversion_id {
            Some(id) => Ok(UnitConversion::get_by_id(conn, id)?.map(|c| c.grams_per_unit)),
            None => Ok(None),
        }
    }

    /// Weight used for totals, given this component's conversion factor
    pub fn resolved_weight(&self, grams_per_unit: Option<f64>) -> f64 {
        resolve_weight(self.weight_grams, grams_per_unit, self.unit_count)
    }

    /// Add a component, applying the save-time weight rule
    pub fn create(conn: &Connection, data: &RecipeComponentCreate) -> DbResult<Self> {
        let per_unit = Self::grams_per_unit(conn, data.conversion_id)?;
        let weight = weight_to_store(data.weight_grams, per_unit, data.unit_count);

        conn.execute(
            r#"
            INSERT INTO recipe_components (recipe_id, ingredient_id, weight_grams, conversion_id, unit_count)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                data.recipe_id,
                data.ingredient_id,
                weight,
                data.conversion_id,
                data.unit_count,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipe_components WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(component) => Ok(Some(component)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM recipe_components WHERE recipe_id = ?1 ORDER BY id",
        )?;

        let components = stmt
            .query_map([recipe_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(components)
    }

    /// Components of a recipe with ingredient, conversion and profile data
    pub fn get_details_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<Vec<RecipeComponentDetail>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT rc.id, rc.ingredient_id, i.code AS ingredient_code, i.name AS ingredient_name,
                   rc.weight_grams, rc.conversion_id, rc.unit_count,
                   uc.unit_name AS conversion_unit, uc.grams_per_unit,
                   np.id AS profile_id, np.energy, np.protein, np.fat, np.carbohydrate
            FROM recipe_components rc
            INNER JOIN ingredients i ON rc.ingredient_id = i.id
            LEFT JOIN unit_conversions uc ON rc.conversion_id = uc.id
            LEFT JOIN nutrient_profiles np ON np.ingredient_id = rc.ingredient_id
            WHERE rc.recipe_id = ?1
            ORDER BY rc.id
            "#,
        )?;

        let details = stmt
            .query_map([recipe_id], |row| {
                let weight_grams: Option<f64> = row.get("weight_grams")?;
                let grams_per_unit: Option<f64> = row.get("grams_per_unit")?;
                let unit_count: Option<f64> = row.get("unit_count")?;
                let profile_id: Option<i64> = row.get("profile_id")?;

                let per_100g = match profile_id {
                    Some(_) => Some(Nutrition {
                        energy: row.get("energy")?,
                        protein: row.get("protein")?,
                        fat: row.get("fat")?,
                        carbohydrate: row.get("carbohydrate")?,
                    }),
                    None => None,
                };

                Ok(RecipeComponentDetail {
                    id: row.get("id")?,
                    ingredient_id: row.get("ingredient_id")?,
                    ingredient_code: row.get("ingredient_code")?,
                    ingredient_name: row.get("ingredient_name")?,
                    weight_grams,
                    conversion_id: row.get("conversion_id")?,
                    conversion_unit: row.get("conversion_unit")?,
                    grams_per_unit,
                    unit_count,
                    resolved_weight_grams: resolve_weight(weight_grams, grams_per_unit, unit_count),
                    per_100g,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(details)
    }

    /// Update a component and re-apply the save-time weight rule.
    ///
    /// Clearing the conversion keeps whatever gram weight was last stored.
    pub fn update(conn: &Connection, id: i64, data: &RecipeComponentUpdate) -> DbResult<Option<Self>> {
        let current = match Self::get_by_id(conn, id)? {
            Some(c) => c,
            None => return Ok(None),
        };

        let weight = if data.clear_weight { None } else { data.weight_grams.or(current.weight_grams) };
        let conversion_id = if data.clear_conversion { None } else { data.conversion_id.or(current.conversion_id) };
        let unit_count = if data.clear_unit_count { None } else { data.unit_count.or(current.unit_count) };

        let per_unit = Self::grams_per_unit(conn, conversion_id)?;
        let weight = weight_to_store(weight, per_unit, unit_count);

        conn.execute(
            r#"
            UPDATE recipe_components
            SET weight_grams = ?1, conversion_id = ?2, unit_count = ?3, updated_at = datetime('now')
            WHERE id = ?4
            "#,
            params![weight, conversion_id, unit_count, id],
        )?;

        Self::get_by_id(conn, id)
    }

    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM recipe_components WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

/// Nutrient totals of a recipe, computed from its current components.
/// A recipe without components totals zero.
pub fn calculate_recipe_nutrition(conn: &Connection, recipe_id: i64) -> DbResult<Nutrition> {
    let details = RecipeComponent::get_details_for_recipe(conn, recipe_id)?;
    Ok(recipe_totals(
        details.iter().map(|d| (d.resolved_weight_grams, d.per_100g.as_ref())),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::models::{fixtures, RecipeCategory};

    #[test]
    fn test_conversion_and_count_are_stored_as_grams() {
        let conn = open_in_memory().unwrap();
        let recipe = fixtures::recipe(&conn, "Spinach Soup", RecipeCategory::Vegetable);
        let spinach = fixtures::ingredient(&conn, "V001", "Spinach");
        let bunch = fixtures::conversion(&conn, spinach.id, "bunch", 50.0);

        let component = RecipeComponent::create(
            &conn,
            &RecipeComponentCreate {
                recipe_id: recipe.id,
                ingredient_id: spinach.id,
                conversion_id: Some(bunch.id),
                unit_count: Some(3.0),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(component.weight_grams, Some(150.0));
        assert_eq!(component.resolved_weight(Some(50.0)), 150.0);
    }

    #[test]
    fn test_clearing_conversion_keeps_stored_grams() {
        let conn = open_in_memory().unwrap();
        let recipe = fixtures::recipe(&conn, "Spinach Soup", RecipeCategory::Vegetable);
        let spinach = fixtures::ingredient(&conn, "V001", "Spinach");
        let bunch = fixtures::conversion(&conn, spinach.id, "bunch", 50.0);

        let component = RecipeComponent::create(
            &conn,
            &RecipeComponentCreate {
                recipe_id: recipe.id,
                ingredient_id: spinach.id,
                conversion_id: Some(bunch.id),
                unit_count: Some(3.0),
                ..Default::default()
            },
        )
        .unwrap();

        let cleared = RecipeComponent::update(
            &conn,
            component.id,
            &RecipeComponentUpdate { clear_conversion: true, ..Default::default() },
        )
        .unwrap()
        .unwrap();

        assert_eq!(cleared.conversion_id, None);
        assert_eq!(cleared.weight_grams, Some(150.0));
    }

    #[test]
    fn test_deleting_conversion_nulls_reference() {
        let conn = open_in_memory().unwrap();
        let recipe = fixtures::recipe(&conn, "Spinach Soup", RecipeCategory::Vegetable);
        let spinach = fixtures::ingredient(&conn, "V001", "Spinach");
        let bunch = fixtures::conversion(&conn, spinach.id, "bunch", 50.0);
        let component = RecipeComponent::create(
            &conn,
            &RecipeComponentCreate {
                recipe_id: recipe.id,
                ingredient_id: spinach.id,
                conversion_id: Some(bunch.id),
                unit_count: Some(2.0),
                ..Default::default()
            },
        )
        .unwrap();

        UnitConversion::delete(&conn, bunch.id).unwrap();

        let after = RecipeComponent::get_by_id(&conn, component.id).unwrap().unwrap();
        assert_eq!(after.conversion_id, None);
        assert_eq!(after.weight_grams, Some(100.0));
    }

    #[test]
    fn test_recipe_totals_from_components() {
        let conn = open_in_memory().unwrap();
        let recipe = fixtures::recipe(&conn, "Steamed Rice", RecipeCategory::Carbohydrate);
        let rice = fixtures::ingredient(&conn, "B001", "Rice");
        let salt = fixtures::ingredient(&conn, "S001", "Salt");
        fixtures::profile(&conn, rice.id, 130.0);

        fixtures::component(&conn, recipe.id, rice.id, 150.0);
        fixtures::component(&conn, recipe.id, salt.id, 2.0);

        let totals = calculate_recipe_nutrition(&conn, recipe.id).unwrap();
        assert!((totals.energy - 195.0).abs() < 1e-9);

        let details = RecipeComponent::get_details_for_recipe(&conn, recipe.id).unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].ingredient_name, "Rice");
        assert!(details[1].per_100g.is_none());
    }

    #[test]
    fn test_recipe_without_components_is_zero() {
        let conn = open_in_memory().unwrap();
        let recipe = fixtures::recipe(&conn, "Empty", RecipeCategory::Fruit);
        assert_eq!(calculate_recipe_nutrition(&conn, recipe.id).unwrap(), Nutrition::zero());
    }
}
