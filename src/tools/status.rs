//! Service status and usage guide

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::db::Database;
use crate::db::migrations::get_schema_version;

/// Menu planning instructions for AI assistants
pub const PLANNING_INSTRUCTIONS: &str = r#"
# Menu Planning Instructions

This guide explains how to build nutrition-checked menus with the menuplan tools.

## Overview

A menu is built bottom-up:
1. **Ingredients** - coded raw materials with a per-100g nutrient profile
2. **Nutrition standards** - target ranges per target group and meal slot
3. **Recipes** - ingredients with gram weights
4. **Menu plans** - recipes served on a date against one standard

Nutrient totals are never stored. Every read recomputes them from the
current data, so editing an ingredient's profile is reflected everywhere
immediately.

---

## Ingredients

`add_ingredient(code: "B001", name: "Rice", category: "carbohydrate", base_unit: "g")`

- `code` is unique, at most 20 characters; `name` at most 100.
- Categories: carbohydrate, animal_protein, plant_protein, vegetable, fruit,
  fat, dairy, seasoning.
- Base units: g, kg, ml, l, pcs, bunch, egg, pack, hand.

Then set its nutrient density **per 100 g**:

`set_nutrient_profile(ingredient_id: 1, energy: 130, protein: 2.7, fat: 0.3, carbohydrate: 28)`

An ingredient without a profile is allowed. It contributes nothing to totals.

### Unit conversions

For ingredients measured in kitchen units, add a conversion:

`add_unit_conversion(ingredient_id: 2, unit_name: "bunch", grams_per_unit: 50)`

Each ingredient has at most one conversion. To change it, use
`update_unit_conversion` or delete it first.

---

## Recipes

`create_recipe(name: "Spinach Soup", category: "vegetable")`

Add components either by grams or by unit count:

```
add_recipe_component(recipe_id: 1, ingredient_id: 1, weight_grams: 150)
add_recipe_component(recipe_id: 1, ingredient_id: 2, conversion_id: 1, unit_count: 3)
```

### Weight rules

- `weight_grams` given: used as-is.
- `conversion_id` and a positive `unit_count` given: weight =
  unit_count × grams_per_unit, and this product is saved as the component's
  grams. A count of 0 leaves the grams alone.
- Neither: weight is 0.
- Clearing the conversion later keeps the last saved grams.
- Changing a conversion's grams_per_unit does not rewrite saved components;
  re-save a component to pick up the new factor.

The conversion must belong to the component's ingredient.

### Totals

Per nutrient: Σ (weight_grams / 100) × density_per_100g.
Displayed as `"195.00 kcal"` and `"4.05 g"`.

---

## Nutrition standards

```
add_nutrition_standard(target_group: "Primary school", meal_slot: "lunch",
    budget_per_portion: 15000, reference_pct: "30% AKG",
    energy_min: 450, energy_max: 550, protein_min: 12, protein_max: 18,
    fat_min: 12, fat_max: 20, carbohydrate_min: 60, carbohydrate_max: 80)
```

- Meal slots: breakfast, lunch, snack.
- One standard per (target_group, meal_slot).
- Every range needs min <= max, both >= 0.

---

## Menu plans

```
create_menu_plan(date: "2025-01-09", standard_id: 1)
add_menu_plan_items_batch(plan_id: 1, recipe_ids: [1, 2, 3])
get_menu_plan(id: 1)
```

- Dates use ISO format: YYYY-MM-DD.
- One plan per (date, standard).
- A recipe may appear more than once; it counts each time.
- `get_menu_plan` reports each total as below / within / above the
  standard's range. This is informational only.

---

## Deleting

- Deleting an ingredient removes its profile, conversions and every recipe
  component that uses it.
- Deleting a conversion keeps components, with their saved grams.
- Deleting a recipe removes it from every plan.
- Deleting a standard removes its plans.

Duplicate codes, standards or plans are rejected with
"Validation failed: ...".
"#;

/// Runtime status of the menuplan service
#[derive(Debug, Clone, Serialize)]
pub struct MenuPlanStatus {
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub schema_version: Option<i32>,

    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status. Schema version is `None` if the database
    /// cannot be queried.
    pub fn get_status(&self, database: &Database) -> MenuPlanStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());
        let schema_version = database.with_conn(get_schema_version).ok();

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        MenuPlanStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            schema_version,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::temp_database;

    #[test]
    fn test_status_reports_schema_and_file() {
        let (dir, db) = temp_database();
        let tracker = StatusTracker::new(dir.path().join("menuplan.db"));
        let status = tracker.get_status(&db);

        assert_eq!(status.schema_version, Some(1));
        assert!(status.database_size_bytes.is_some());
        assert_eq!(status.process_id, std::process::id());
    }
}
