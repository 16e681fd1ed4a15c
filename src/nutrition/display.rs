//! Display formatting for computed nutrient columns

use serde::Serialize;

use crate::models::Nutrition;

pub const ENERGY_UNIT: &str = "kcal";
pub const MASS_UNIT: &str = "g";

/// Format a value with two decimals followed by its unit, e.g. `"195.00 kcal"`
pub fn format_quantity(value: f64, unit: &str) -> String {
    format!("{:.2} {}", value, unit)
}

/// Format a min/max pair, e.g. `"300.00 - 400.00"`
pub fn format_range(min: f64, max: f64) -> String {
    format!("{:.2} - {:.2}", min, max)
}

/// Nutrient totals rendered for list columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionDisplay {
    pub energy: String,
    pub protein: String,
    pub fat: String,
    pub carbohydrate: String,
}

impl From<&Nutrition> for NutritionDisplay {
    fn from(n: &Nutrition) -> Self {
        Self {
            energy: format_quantity(n.energy, ENERGY_UNIT),
            protein: format_quantity(n.protein, MASS_UNIT),
            fat: format_quantity(n.fat, MASS_UNIT),
            carbohydrate: format_quantity(n.carbohydrate, MASS_UNIT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(195.0, ENERGY_UNIT), "195.00 kcal");
        assert_eq!(format_quantity(4.054, MASS_UNIT), "4.05 g");
        assert_eq!(format_quantity(0.0, MASS_UNIT), "0.00 g");
    }

    #[test]
    fn test_format_range() {
        assert_eq!(format_range(300.0, 400.5), "300.00 - 400.50");
    }

    #[test]
    fn test_nutrition_display() {
        let n = Nutrition { energy: 500.0, protein: 12.346, fat: 3.0, carbohydrate: 70.0 };
        let d = NutritionDisplay::from(&n);
        assert_eq!(d.energy, "500.00 kcal");
        assert_eq!(d.protein, "12.35 g");
        assert_eq!(d.carbohydrate, "70.00 g");
    }
}
