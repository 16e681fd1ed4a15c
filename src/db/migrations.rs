//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        tracing::info!("Applying schema migration v1");
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- INGREDIENTS
        -- Raw food items with cost and shelf life
        -- ============================================
        CREATE TABLE ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE CHECK(length(code) <= 20),
            name TEXT NOT NULL CHECK(length(name) <= 100),
            category TEXT NOT NULL CHECK(category IN (
                'carbohydrate', 'animal_protein', 'plant_protein', 'vegetable',
                'fruit', 'fat', 'dairy', 'seasoning'
            )),
            base_unit TEXT NOT NULL DEFAULT 'g' CHECK(base_unit IN (
                'g', 'kg', 'ml', 'l', 'pcs', 'bunch', 'egg', 'pack', 'hand'
            )),
            price_estimate REAL NOT NULL DEFAULT 0 CHECK(price_estimate >= 0),
            shelf_life_days INTEGER NOT NULL DEFAULT 0 CHECK(shelf_life_days >= 0),

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_ingredients_name ON ingredients(name);
        CREATE INDEX idx_ingredients_category ON ingredients(category);

        -- ============================================
        -- NUTRIENT PROFILES
        -- Per-100g nutrient density, one per ingredient
        -- ============================================
        CREATE TABLE nutrient_profiles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ingredient_id INTEGER NOT NULL UNIQUE REFERENCES ingredients(id) ON DELETE CASCADE,
            energy REAL NOT NULL DEFAULT 0,        -- kcal per 100g
            protein REAL NOT NULL DEFAULT 0,       -- grams per 100g
            fat REAL NOT NULL DEFAULT 0,           -- grams per 100g
            carbohydrate REAL NOT NULL DEFAULT 0,  -- grams per 100g
            edible_portion_pct REAL NOT NULL DEFAULT 0,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- UNIT CONVERSIONS
        -- Named non-gram unit, at most one per ingredient
        -- ============================================
        CREATE TABLE unit_conversions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ingredient_id INTEGER NOT NULL UNIQUE REFERENCES ingredients(id) ON DELETE CASCADE,
            unit_name TEXT NOT NULL,
            grams_per_unit REAL NOT NULL CHECK(grams_per_unit >= 0),

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- NUTRITION STANDARDS
        -- Target ranges and budget per target group and meal slot
        -- ============================================
        CREATE TABLE nutrition_standards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            target_group TEXT NOT NULL,
            meal_slot TEXT NOT NULL CHECK(meal_slot IN ('breakfast', 'lunch', 'snack')),
            budget_per_portion REAL NOT NULL CHECK(budget_per_portion >= 0),
            reference_pct TEXT NOT NULL,

            energy_min REAL NOT NULL,
            energy_max REAL NOT NULL,
            protein_min REAL NOT NULL,
            protein_max REAL NOT NULL,
            fat_min REAL NOT NULL,
            fat_max REAL NOT NULL,
            carbohydrate_min REAL NOT NULL,
            carbohydrate_max REAL NOT NULL,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(target_group, meal_slot)
        );

        -- ============================================
        -- RECIPES
        -- Totals are derived from components on read, never stored
        -- ============================================
        CREATE TABLE recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            category TEXT NOT NULL CHECK(category IN (
                'carbohydrate', 'animal_protein', 'plant_protein', 'vegetable', 'fruit', 'dairy'
            )),

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_recipes_name ON recipes(name);
        CREATE INDEX idx_recipes_category ON recipes(category);

        -- ============================================
        -- RECIPE COMPONENTS
        -- Ingredient usage: explicit grams or (conversion, unit count)
        -- ============================================
        CREATE TABLE recipe_components (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            ingredient_id INTEGER NOT NULL REFERENCES ingredients(id) ON DELETE CASCADE,
            weight_grams REAL CHECK(weight_grams IS NULL OR weight_grams >= 0),
            conversion_id INTEGER REFERENCES unit_conversions(id) ON DELETE SET NULL,
            unit_count REAL CHECK(unit_count IS NULL OR unit_count >= 0),

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_recipe_components_recipe ON recipe_components(recipe_id);
        CREATE INDEX idx_recipe_components_ingredient ON recipe_components(ingredient_id);
        CREATE INDEX idx_recipe_components_conversion ON recipe_components(conversion_id);

        -- ============================================
        -- MENU PLANS
        -- One plan per date and standard
        -- ============================================
        CREATE TABLE menu_plans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,                  -- ISO date: "2025-01-09"
            standard_id INTEGER NOT NULL REFERENCES nutrition_standards(id) ON DELETE CASCADE,
            notes TEXT,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(date, standard_id)
        );

        CREATE INDEX idx_menu_plans_date ON menu_plans(date);

        -- ============================================
        -- MENU PLAN ITEMS
        -- Recipes served in a plan
        -- ============================================
        CREATE TABLE menu_plan_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            plan_id INTEGER NOT NULL REFERENCES menu_plans(id) ON DELETE CASCADE,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,

            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_menu_plan_items_plan ON menu_plan_items(plan_id);
        CREATE INDEX idx_menu_plan_items_recipe ON menu_plan_items(recipe_id);
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let tracked: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_migrations')",
        [],
        |row| row.get(0),
    )?;
    if !tracked {
        return Ok(true);
    }
    Ok(get_schema_version(conn)? < SCHEMA_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
        assert!(!needs_migration(&conn).unwrap());
    }

    #[test]
    fn test_fresh_database_needs_migration() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(needs_migration(&conn).unwrap());

        conn.execute(
            "CREATE TABLE schema_migrations (version INTEGER PRIMARY KEY, applied_at TEXT)",
            [],
        )
        .unwrap();
        assert!(needs_migration(&conn).unwrap());
    }
}
