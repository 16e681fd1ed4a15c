//! Base units for ingredients
//!
//! The unit an ingredient is purchased and priced in. Recipe quantities are
//! always resolved to grams; the base unit only describes the ingredient.

use serde::{Deserialize, Serialize};

/// Category of a measurement unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitCategory {
    /// Weight/mass units (g, kg)
    Weight,
    /// Volume units (ml, l)
    Volume,
    /// Count/discrete units (pieces, bunches, packs)
    Count,
}

/// Unit an ingredient is stocked in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BaseUnit {
    #[default]
    G,
    Kg,
    Ml,
    L,
    Pcs,
    Bunch,
    Egg,
    Pack,
    /// A hand of bananas
    Hand,
}

impl BaseUnit {
    pub const ALL: [BaseUnit; 9] = [
        BaseUnit::G,
        BaseUnit::Kg,
        BaseUnit::Ml,
        BaseUnit::L,
        BaseUnit::Pcs,
        BaseUnit::Bunch,
        BaseUnit::Egg,
        BaseUnit::Pack,
        BaseUnit::Hand,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BaseUnit::G => "g",
            BaseUnit::Kg => "kg",
            BaseUnit::Ml => "ml",
            BaseUnit::L => "l",
            BaseUnit::Pcs => "pcs",
            BaseUnit::Bunch => "bunch",
            BaseUnit::Egg => "egg",
            BaseUnit::Pack => "pack",
            BaseUnit::Hand => "hand",
        }
    }

    /// Parse a unit string, accepting a few common spellings
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "g" | "gr" | "gram" | "grams" => Some(BaseUnit::G),
            "kg" | "kilogram" | "kilograms" => Some(BaseUnit::Kg),
            "ml" | "milliliter" | "milliliters" | "millilitre" => Some(BaseUnit::Ml),
            "l" | "liter" | "litre" | "liters" => Some(BaseUnit::L),
            "pcs" | "piece" | "pieces" => Some(BaseUnit::Pcs),
            "bunch" => Some(BaseUnit::Bunch),
            "egg" | "eggs" => Some(BaseUnit::Egg),
            "pack" | "package" => Some(BaseUnit::Pack),
            "hand" => Some(BaseUnit::Hand),
            _ => None,
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            BaseUnit::G => "Gram (g)",
            BaseUnit::Kg => "Kilogram (kg)",
            BaseUnit::Ml => "Milliliter (ml)",
            BaseUnit::L => "Liter (l)",
            BaseUnit::Pcs => "Pieces",
            BaseUnit::Bunch => "Bunch",
            BaseUnit::Egg => "Egg",
            BaseUnit::Pack => "Pack",
            BaseUnit::Hand => "Hand",
        }
    }

    pub fn category(&self) -> UnitCategory {
        match self {
            BaseUnit::G | BaseUnit::Kg => UnitCategory::Weight,
            BaseUnit::Ml | BaseUnit::L => UnitCategory::Volume,
            BaseUnit::Pcs | BaseUnit::Bunch | BaseUnit::Egg | BaseUnit::Pack | BaseUnit::Hand => {
                UnitCategory::Count
            }
        }
    }
}
