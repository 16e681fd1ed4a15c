//! Menu plan model
//!
//! A plan is the set of recipes served on one date against one nutrition
//! standard. At most one plan exists per (date, standard) pair.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A menu plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuPlan {
    pub id: i64,
    /// ISO date, e.g. "2025-01-09"
    pub date: String,
    pub standard_id: i64,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a menu plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuPlanCreate {
    pub date: String,
    pub standard_id: i64,
    pub notes: Option<String>,
}

/// Data for updating a menu plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuPlanUpdate {
    pub date: Option<String>,
    pub standard_id: Option<i64>,
    pub notes: Option<String>,
}

/// Filter for listing plans. Date bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct MenuPlanFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub standard_id: Option<i64>,
}

impl MenuPlanFilter {
    fn where_clause(&self, params_vec: &mut Vec<Box<dyn rusqlite::ToSql>>) -> String {
        let mut sql = String::from(" WHERE 1=1");

        if let Some(ref start) = self.start_date {
            params_vec.push(Box::new(start.clone()));
            sql.push_str(&format!(" AND date >= ?{}", params_vec.len()));
        }
        if let Some(ref end) = self.end_date {
            params_vec.push(Box::new(end.clone()));
            sql.push_str(&format!(" AND date <= ?{}", params_vec.len()));
        }
        if let Some(standard_id) = self.standard_id {
            params_vec.push(Box::new(standard_id));
            sql.push_str(&format!(" AND standard_id = ?{}", params_vec.len()));
        }

        sql
    }
}

impl MenuPlan {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            date: row.get("date")?,
            standard_id: row.get("standard_id")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn create(conn: &Connection, data: &MenuPlanCreate) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO menu_plans (date, standard_id, notes) VALUES (?1, ?2, ?3)",
            params![data.date, data.standard_id, data.notes],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM menu_plans WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(plan) => Ok(Some(plan)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List plans, newest date first unless `sort_order` is "asc"
    pub fn list(
        conn: &Connection,
        filter: &MenuPlanFilter,
        sort_order: &str,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let order = if sort_order.to_lowercase() == "asc" { "ASC" } else { "DESC" };
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        let mut sql = format!("SELECT * FROM menu_plans{}", filter.where_clause(&mut params_vec));

        sql.push_str(&format!(" ORDER BY date {}, id {}", order, order));

        params_vec.push(Box::new(limit));
        sql.push_str(&format!(" LIMIT ?{}", params_vec.len()));
        params_vec.push(Box::new(offset));
        sql.push_str(&format!(" OFFSET ?{}", params_vec.len()));

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();

        let plans = stmt
            .query_map(params_refs.as_slice(), Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(plans)
    }

    pub fn count(conn: &Connection, filter: &MenuPlanFilter) -> DbResult<i64> {
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        let sql = format!("SELECT COUNT(*) FROM menu_plans{}", filter.where_clause(&mut params_vec));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let count: i64 = conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))?;
        Ok(count)
    }

    pub fn update(conn: &Connection, id: i64, data: &MenuPlanUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref date) = data.date {
            updates.push(format!("date = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(date.clone()));
        }
        if let Some(standard_id) = data.standard_id {
            updates.push(format!("standard_id = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(standard_id));
        }
        if let Some(ref notes) = data.notes {
            updates.push(format!("notes = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(notes.clone()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE menu_plans SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Delete a plan and its items
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM menu_plans WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::models::{fixtures, MealSlot};

    #[test]
    fn test_duplicate_date_and_standard_rejected() {
        let conn = open_in_memory().unwrap();
        let standard = fixtures::standard(&conn, "Primary school", MealSlot::Lunch);
        fixtures::plan(&conn, "2025-01-09", standard.id);

        let err = MenuPlan::create(
            &conn,
            &MenuPlanCreate { date: "2025-01-09".to_string(), standard_id: standard.id, notes: None },
        )
        .unwrap_err();
        assert!(err.is_constraint_violation());

        let other = fixtures::standard(&conn, "Primary school", MealSlot::Snack);
        assert!(MenuPlan::create(
            &conn,
            &MenuPlanCreate { date: "2025-01-09".to_string(), standard_id: other.id, notes: None },
        )
        .is_ok());
    }

    #[test]
    fn test_list_by_date_range() {
        let conn = open_in_memory().unwrap();
        let standard = fixtures::standard(&conn, "Primary school", MealSlot::Lunch);
        fixtures::plan(&conn, "2025-01-06", standard.id);
        fixtures::plan(&conn, "2025-01-07", standard.id);
        fixtures::plan(&conn, "2025-01-13", standard.id);

        let filter = MenuPlanFilter {
            start_date: Some("2025-01-06".to_string()),
            end_date: Some("2025-01-10".to_string()),
            ..Default::default()
        };
        let week = MenuPlan::list(&conn, &filter, "asc", 50, 0).unwrap();
        assert_eq!(week.len(), 2);
        assert_eq!(week[0].date, "2025-01-06");
        assert_eq!(MenuPlan::count(&conn, &filter).unwrap(), 2);

        let all = MenuPlan::list(&conn, &MenuPlanFilter::default(), "desc", 50, 0).unwrap();
        assert_eq!(all[0].date, "2025-01-13");
    }

    #[test]
    fn test_plans_removed_with_standard() {
        let conn = open_in_memory().unwrap();
        let standard = fixtures::standard(&conn, "Toddlers", MealSlot::Snack);
        let plan = fixtures::plan(&conn, "2025-02-01", standard.id);

        crate::models::NutritionStandard::delete(&conn, standard.id).unwrap();
        assert!(MenuPlan::get_by_id(&conn, plan.id).unwrap().is_none());
    }
}
