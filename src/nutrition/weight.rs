//! Weight resolution for recipe components
//!
//! A component is entered either as an explicit gram weight or as a count of
//! a named unit (e.g. 3 × "bunch" at 50 g each). Both paths end in grams.

/// Resolve the gram weight of a component.
///
/// - An explicit gram weight is authoritative.
/// - Otherwise, with both a conversion factor and a positive unit count, the
///   weight is `unit_count * grams_per_unit`.
/// - Otherwise the weight is zero.
///
/// This is the read-time rule; totals are always computed through it.
pub fn resolve_weight(
    explicit_grams: Option<f64>,
    grams_per_unit: Option<f64>,
    unit_count: Option<f64>,
) -> f64 {
    if let Some(grams) = explicit_grams {
        return grams;
    }
    match (grams_per_unit, unit_count) {
        (Some(per_unit), Some(count)) if count > 0.0 => count * per_unit,
        _ => 0.0,
    }
}

/// The gram value to persist when a component is saved.
///
/// When a conversion factor and a positive unit count are supplied, the
/// stored grams are overwritten with their product so the stored and resolved
/// weights agree. Otherwise the current value is kept as-is: a zero count
/// does not wipe entered grams, and clearing the conversion later leaves the
/// last computed weight in place.
pub fn weight_to_store(
    current_grams: Option<f64>,
    grams_per_unit: Option<f64>,
    unit_count: Option<f64>,
) -> Option<f64> {
    match (grams_per_unit, unit_count) {
        (Some(per_unit), Some(count)) if count > 0.0 => Some(count * per_unit),
        _ => current_grams,
    }
}
