//! Nutrient roll-ups
//!
//! Recipe totals sum per-component contributions from per-100g densities;
//! plan totals sum recipe totals. Nothing here touches the database.

use crate::models::Nutrition;

/// Contribution of one component: `(grams / 100) * density` for each
/// nutrient. An ingredient without a nutrient profile contributes nothing.
pub fn component_contribution(weight_grams: f64, density_per_100g: Option<&Nutrition>) -> Nutrition {
    match density_per_100g {
        Some(density) => density.scale(weight_grams / 100.0),
        None => Nutrition::zero(),
    }
}

/// Recipe totals from `(resolved weight in grams, optional per-100g density)`
/// pairs. No rounding is applied.
pub fn recipe_totals<'a, I>(components: I) -> Nutrition
where
    I: IntoIterator<Item = (f64, Option<&'a Nutrition>)>,
{
    components
        .into_iter()
        .map(|(grams, density)| component_contribution(grams, density))
        .sum()
}

/// Plan totals: the plain sum of each item's recipe totals.
pub fn plan_totals<I>(recipe_totals: I) -> Nutrition
where
    I: IntoIterator<Item = Nutrition>,
{
    recipe_totals.into_iter().sum()
}
