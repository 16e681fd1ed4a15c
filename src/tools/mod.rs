//! Menu planning tools
//!
//! Tool implementations behind the MCP server. Each tool borrows a pooled
//! connection, validates its input, and returns a serializable response or a
//! human-readable error string.

pub mod ingredients;
pub mod menu_plans;
pub mod recipes;
pub mod standards;
pub mod status;

use crate::db::DbError;

/// Error string for a failed write. Uniqueness and check-constraint
/// violations are reported as validation failures.
pub(crate) fn write_error(action: &str, e: DbError) -> String {
    if e.is_constraint_violation() {
        format!("Validation failed: {}", e)
    } else {
        format!("Failed to {}: {}", action, e)
    }
}

/// Reject blank text fields
pub(crate) fn require_text(field: &str, value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{} cannot be empty", field));
    }
    Ok(trimmed.to_string())
}

/// Reject text longer than `max` characters
pub(crate) fn require_max_len(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.chars().count() > max {
        return Err(format!("{} cannot exceed {} characters", field, max));
    }
    Ok(())
}

/// Reject negative and non-finite numbers
pub(crate) fn require_non_negative(field: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() {
        return Err(format!("{} must be a finite number", field));
    }
    if value < 0.0 {
        return Err(format!("{} cannot be negative", field));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use tempfile::TempDir;

    use crate::db::migrations::run_migrations;
    use crate::db::Database;

    /// A migrated database in a temporary directory. Keep the `TempDir`
    /// alive for as long as the database is used.
    pub fn temp_database() -> (TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("menuplan.db")).unwrap();
        db.with_conn(|conn| run_migrations(conn)).unwrap();
        (dir, db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_number_validation() {
        assert_eq!(require_text("name", "  Rice ").unwrap(), "Rice");
        assert!(require_text("name", "   ").is_err());
        assert!(require_non_negative("price", 0.0).is_ok());
        assert!(require_non_negative("price", -0.5).is_err());
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        assert!(require_non_negative("weight_grams", f64::INFINITY).unwrap_err().contains("finite"));
        assert!(require_non_negative("weight_grams", f64::NEG_INFINITY).is_err());
        assert!(require_non_negative("weight_grams", f64::NAN).is_err());
        assert!(require_non_negative("weight_grams", f64::MAX).is_ok());
    }

    #[test]
    fn test_length_limit_counts_characters() {
        assert!(require_max_len("code", "B001", 20).is_ok());
        assert!(require_max_len("code", &"x".repeat(20), 20).is_ok());
        assert!(require_max_len("code", &"x".repeat(21), 20).unwrap_err().contains("20 characters"));
        assert!(require_max_len("name", &"é".repeat(100), 100).is_ok());
    }
}
