//! Shared nutrition data structure
//!
//! Used for per-100g densities on nutrient profiles and for the derived
//! totals of recipes and menu plans.

use serde::{Deserialize, Serialize};

/// Macronutrient amounts
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub energy: f64,       // kcal
    pub protein: f64,      // grams
    pub fat: f64,          // grams
    pub carbohydrate: f64, // grams
}

impl Nutrition {
    /// Create a new Nutrition with all zeros
    pub fn zero() -> Self {
        Self::default()
    }

    /// Scale nutrition values by a multiplier
    pub fn scale(&self, multiplier: f64) -> Self {
        Self {
            energy: self.energy * multiplier,
            protein: self.protein * multiplier,
            fat: self.fat * multiplier,
            carbohydrate: self.carbohydrate * multiplier,
        }
    }

    /// Add another nutrition to this one
    pub fn add(&self, other: &Nutrition) -> Self {
        Self {
            energy: self.energy + other.energy,
            protein: self.protein + other.protein,
            fat: self.fat + other.fat,
            carbohydrate: self.carbohydrate + other.carbohydrate,
        }
    }
}

impl std::ops::Add for Nutrition {
    type Output = Nutrition;

    fn add(self, other: Nutrition) -> Nutrition {
        Nutrition::add(&self, &other)
    }
}

impl std::ops::Mul<f64> for Nutrition {
    type Output = Nutrition;

    fn mul(self, multiplier: f64) -> Nutrition {
        self.scale(multiplier)
    }
}

impl std::iter::Sum for Nutrition {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Nutrition::zero(), |acc, n| acc + n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_and_add() {
        let rice = Nutrition { energy: 130.0, protein: 2.7, fat: 0.3, carbohydrate: 28.0 };
        let scaled = rice * 1.5;
        assert!((scaled.energy - 195.0).abs() < 1e-9);
        assert!((scaled.carbohydrate - 42.0).abs() < 1e-9);

        let total = scaled + rice;
        assert!((total.energy - 325.0).abs() < 1e-9);
    }

    #[test]
    fn test_sum_of_empty_is_zero() {
        let total: Nutrition = Vec::<Nutrition>::new().into_iter().sum();
        assert_eq!(total, Nutrition::zero());
    }
}
