//! Nutrition calculation module
//!
//! Weight resolution, nutrient aggregation and display formatting.

pub mod aggregate;
pub mod display;
pub mod units;
pub mod weight;

pub use aggregate::{component_contribution, plan_totals, recipe_totals};
pub use display::{format_quantity, format_range, NutritionDisplay};
pub use units::{BaseUnit, UnitCategory};
pub use weight::{resolve_weight, weight_to_store};
