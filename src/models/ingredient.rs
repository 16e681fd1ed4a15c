//! Ingredient model
//!
//! Raw food items identified by a unique code, with cost and shelf-life data.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::choice_from_row;
use crate::db::DbResult;
use crate::nutrition::BaseUnit;

/// Food group an ingredient belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientCategory {
    Carbohydrate,
    AnimalProtein,
    PlantProtein,
    Vegetable,
    Fruit,
    Fat,
    Dairy,
    Seasoning,
}

impl IngredientCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngredientCategory::Carbohydrate => "carbohydrate",
            IngredientCategory::AnimalProtein => "animal_protein",
            IngredientCategory::PlantProtein => "plant_protein",
            IngredientCategory::Vegetable => "vegetable",
            IngredientCategory::Fruit => "fruit",
            IngredientCategory::Fat => "fat",
            IngredientCategory::Dairy => "dairy",
            IngredientCategory::Seasoning => "seasoning",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "carbohydrate" => Some(IngredientCategory::Carbohydrate),
            "animal_protein" => Some(IngredientCategory::AnimalProtein),
            "plant_protein" => Some(IngredientCategory::PlantProtein),
            "vegetable" => Some(IngredientCategory::Vegetable),
            "fruit" => Some(IngredientCategory::Fruit),
            "fat" => Some(IngredientCategory::Fat),
            "dairy" => Some(IngredientCategory::Dairy),
            "seasoning" => Some(IngredientCategory::Seasoning),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IngredientCategory::Carbohydrate => "Carbohydrate Source",
            IngredientCategory::AnimalProtein => "Animal Protein",
            IngredientCategory::PlantProtein => "Plant Protein",
            IngredientCategory::Vegetable => "Vegetable",
            IngredientCategory::Fruit => "Fruit",
            IngredientCategory::Fat => "Fat Source",
            IngredientCategory::Dairy => "Dairy",
            IngredientCategory::Seasoning => "Seasoning & Condiments",
        }
    }
}

/// A raw ingredient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub category: IngredientCategory,
    pub base_unit: BaseUnit,
    pub price_estimate: f64,
    pub shelf_life_days: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new ingredient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientCreate {
    pub code: String,
    pub name: String,
    pub category: IngredientCategory,
    #[serde(default)]
    pub base_unit: BaseUnit,
    #[serde(default)]
    pub price_estimate: f64,
    #[serde(default)]
    pub shelf_life_days: i64,
}

/// Data for updating an ingredient
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngredientUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    pub category: Option<IngredientCategory>,
    pub base_unit: Option<BaseUnit>,
    pub price_estimate: Option<f64>,
    pub shelf_life_days: Option<i64>,
}

/// Search and filter options for listing ingredients
#[derive(Debug, Clone, Default)]
pub struct IngredientFilter {
    /// Matches code or name
    pub query: Option<String>,
    pub category: Option<IngredientCategory>,
    pub base_unit: Option<BaseUnit>,
    pub shelf_life_days: Option<i64>,
}

impl IngredientFilter {
    /// Build the WHERE clause and its parameters
    fn where_clause(&self) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut sql = String::from(" WHERE 1=1");
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref q) = self.query {
            params_vec.push(Box::new(format!("%{}%", q)));
            let idx = params_vec.len();
            sql.push_str(&format!(" AND (code LIKE ?{idx} OR name LIKE ?{idx})"));
        }
        if let Some(category) = self.category {
            params_vec.push(Box::new(category.as_str()));
            sql.push_str(&format!(" AND category = ?{}", params_vec.len()));
        }
        if let Some(unit) = self.base_unit {
            params_vec.push(Box::new(unit.as_str()));
            sql.push_str(&format!(" AND base_unit = ?{}", params_vec.len()));
        }
        if let Some(days) = self.shelf_life_days {
            params_vec.push(Box::new(days));
            sql.push_str(&format!(" AND shelf_life_days = ?{}", params_vec.len()));
        }

        (sql, params_vec)
    }
}

impl Ingredient {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            code: row.get("code")?,
            name: row.get("name")?,
            category: choice_from_row(row, "category", IngredientCategory::parse)?,
            base_unit: choice_from_row(row, "base_unit", BaseUnit::parse)?,
            price_estimate: row.get("price_estimate")?,
            shelf_life_days: row.get("shelf_life_days")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Display label, e.g. `[B001] Rice`
    pub fn label(&self) -> String {
        format!("[{}] {}", self.code, self.name)
    }

    /// Insert a new ingredient
    pub fn create(conn: &Connection, data: &IngredientCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO ingredients (code, name, category, base_unit, price_estimate, shelf_life_days)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                data.code,
                data.name,
                data.category.as_str(),
                data.base_unit.as_str(),
                data.price_estimate,
                data.shelf_life_days,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get an ingredient by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM ingredients WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get an ingredient by its unique code
    pub fn get_by_code(conn: &Connection, code: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM ingredients WHERE code = ?1")?;

        match stmt.query_row([code], Self::from_row) {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List ingredients matching a filter, with sorting and pagination
    pub fn list(
        conn: &Connection,
        filter: &IngredientFilter,
        sort_by: &str,
        sort_order: &str,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let order = if sort_order.to_lowercase() == "desc" { "DESC" } else { "ASC" };
        let sort_col = match sort_by.to_lowercase().as_str() {
            "name" => "name",
            "category" => "category",
            "price_estimate" => "price_estimate",
            "shelf_life_days" => "shelf_life_days",
            "created_at" => "created_at",
            _ => "code",
        };

        let (where_sql, mut params_vec) = filter.where_clause();
        let mut sql = format!("SELECT * FROM ingredients{} ORDER BY {} {}", where_sql, sort_col, order);

        params_vec.push(Box::new(limit));
        sql.push_str(&format!(" LIMIT ?{}", params_vec.len()));
        params_vec.push(Box::new(offset));
        sql.push_str(&format!(" OFFSET ?{}", params_vec.len()));

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();

        let items = stmt
            .query_map(params_refs.as_slice(), Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// Count ingredients matching a filter
    pub fn count(conn: &Connection, filter: &IngredientFilter) -> DbResult<i64> {
        let (where_sql, params_vec) = filter.where_clause();
        let sql = format!("SELECT COUNT(*) FROM ingredients{}", where_sql);
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let count: i64 = conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))?;
        Ok(count)
    }

    /// Update an ingredient
    pub fn update(conn: &Connection, id: i64, data: &IngredientUpdate) -> DbResult<Option<Self>> {
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

        add_update!("code", data.code.clone());
        add_update!("name", data.name.clone());
        add_update!("category", data.category.map(|c| c.as_str()));
        add_update!("base_unit", data.base_unit.map(|u| u.as_str()));
        add_update!("price_estimate", data.price_estimate);
        add_update!("shelf_life_days", data.shelf_life_days);

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE ingredients SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Names of recipes that use this ingredient
    pub fn get_used_in_recipes(conn: &Connection, id: i64) -> DbResult<Vec<String>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT r.name FROM recipes r
            INNER JOIN recipe_components rc ON r.id = rc.recipe_id
            WHERE rc.ingredient_id = ?1
            ORDER BY r.name
            "#,
        )?;

        let names = stmt
            .query_map([id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(names)
    }

    /// Delete an ingredient. Its profile, conversions and recipe components
    /// are removed with it.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM ingredients WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
