//! Recipe model
//!
//! A named dish. Nutrient totals are not stored; see
//! `calculate_recipe_nutrition`.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::choice_from_row;
use crate::db::DbResult;

/// Dish category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeCategory {
    Carbohydrate,
    AnimalProtein,
    PlantProtein,
    Vegetable,
    Fruit,
    Dairy,
}

impl RecipeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeCategory::Carbohydrate => "carbohydrate",
            RecipeCategory::AnimalProtein => "animal_protein",
            RecipeCategory::PlantProtein => "plant_protein",
            RecipeCategory::Vegetable => "vegetable",
            RecipeCategory::Fruit => "fruit",
            RecipeCategory::Dairy => "dairy",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "carbohydrate" => Some(RecipeCategory::Carbohydrate),
            "animal_protein" => Some(RecipeCategory::AnimalProtein),
            "plant_protein" => Some(RecipeCategory::PlantProtein),
            "vegetable" => Some(RecipeCategory::Vegetable),
            "fruit" => Some(RecipeCategory::Fruit),
            "dairy" => Some(RecipeCategory::Dairy),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RecipeCategory::Carbohydrate => "Carbohydrate Source",
            RecipeCategory::AnimalProtein => "Animal Protein",
            RecipeCategory::PlantProtein => "Plant Protein",
            RecipeCategory::Vegetable => "Vegetable",
            RecipeCategory::Fruit => "Fruit",
            RecipeCategory::Dairy => "Dairy",
        }
    }
}

/// A recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub category: RecipeCategory,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCreate {
    pub name: String,
    pub category: RecipeCategory,
}

/// Data for updating a recipe
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeUpdate {
    pub name: Option<String>,
    pub category: Option<RecipeCategory>,
}

impl Recipe {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            category: choice_from_row(row, "category", RecipeCategory::parse)?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Display label, e.g. `Steamed Rice (Carbohydrate Source)`
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.category.label())
    }

    pub fn create(conn: &Connection, data: &RecipeCreate) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO recipes (name, category) VALUES (?1, ?2)",
            params![data.name, data.category.as_str()],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipes WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(recipe) => Ok(Some(recipe)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List recipes with optional name search and category filter
    pub fn list(
        conn: &Connection,
        query: Option<&str>,
        category: Option<RecipeCategory>,
        sort_order: &str,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let order = if sort_order.to_lowercase() == "desc" { "DESC" } else { "ASC" };
        let mut sql = String::from("SELECT * FROM recipes WHERE 1=1");
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(q) = query {
            params_vec.push(Box::new(format!("%{}%", q)));
            sql.push_str(&format!(" AND name LIKE ?{}", params_vec.len()));
        }
        if let Some(cat) = category {
            params_vec.push(Box::new(cat.as_str()));
            sql.push_str(&format!(" AND category = ?{}", params_vec.len()));
        }

        sql.push_str(&format!(" ORDER BY name {}", order));

        params_vec.push(Box::new(limit));
        sql.push_str(&format!(" LIMIT ?{}", params_vec.len()));
        params_vec.push(Box::new(offset));
        sql.push_str(&format!(" OFFSET ?{}", params_vec.len()));

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();

        let recipes = stmt
            .query_map(params_refs.as_slice(), Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(recipes)
    }

    pub fn count(conn: &Connection, query: Option<&str>, category: Option<RecipeCategory>) -> DbResult<i64> {
        let mut sql = String::from("SELECT COUNT(*) FROM recipes WHERE 1=1");
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(q) = query {
            params_vec.push(Box::new(format!("%{}%", q)));
            sql.push_str(&format!(" AND name LIKE ?{}", params_vec.len()));
        }
        if let Some(cat) = category {
            params_vec.push(Box::new(cat.as_str()));
            sql.push_str(&format!(" AND category = ?{}", params_vec.len()));
        }

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let count: i64 = conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))?;
        Ok(count)
    }

    pub fn update(conn: &Connection, id: i64, data: &RecipeUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.clone()));
        }
        if let Some(cat) = data.category {
            updates.push(format!("category = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(cat.as_str()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE recipes SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Number of menu plan items serving this recipe
    pub fn get_plan_usage_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM menu_plan_items WHERE recipe_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete a recipe; its components and plan items go with it
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM recipes WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::models::fixtures;

    #[test]
    fn test_list_by_name_and_category() {
        let conn = open_in_memory().unwrap();
        fixtures::recipe(&conn, "Steamed Rice", RecipeCategory::Carbohydrate);
        fixtures::recipe(&conn, "Fried Rice", RecipeCategory::Carbohydrate);
        fixtures::recipe(&conn, "Spinach Soup", RecipeCategory::Vegetable);

        let rice = Recipe::list(&conn, Some("rice"), None, "asc", 50, 0).unwrap();
        assert_eq!(rice.len(), 2);
        assert_eq!(rice[0].name, "Fried Rice");

        let veg = Recipe::list(&conn, None, Some(RecipeCategory::Vegetable), "asc", 50, 0).unwrap();
        assert_eq!(veg.len(), 1);
        assert_eq!(veg[0].label(), "Spinach Soup (Vegetable)");

        assert_eq!(Recipe::count(&conn, None, None).unwrap(), 3);
        assert_eq!(Recipe::count(&conn, Some("rice"), Some(RecipeCategory::Fruit)).unwrap(), 0);
    }

    #[test]
    fn test_update_category() {
        let conn = open_in_memory().unwrap();
        let recipe = fixtures::recipe(&conn, "Tempeh", RecipeCategory::AnimalProtein);

        let updated = Recipe::update(
            &conn,
            recipe.id,
            &RecipeUpdate { category: Some(RecipeCategory::PlantProtein), ..Default::default() },
        )
        .unwrap()
        .unwrap();
        assert_eq!(updated.category, RecipeCategory::PlantProtein);
        assert_eq!(updated.name, "Tempeh");
    }
}
