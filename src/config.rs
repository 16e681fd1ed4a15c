//! Runtime configuration

use std::path::PathBuf;

/// Environment variable overriding the database location
pub const DATABASE_PATH_VAR: &str = "MENUPLAN_DATABASE_PATH";

/// Database path from `MENUPLAN_DATABASE_PATH`, or `data/menuplan.db` under
/// the project root (the executable's directory, stepping out of
/// `target/debug` or `target/release`).
pub fn database_path() -> PathBuf {
    std::env::var(DATABASE_PATH_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));
            default_database_path(exe_dir)
        })
}

fn default_database_path(mut path: PathBuf) -> PathBuf {
    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(parent) = path.parent() {
            if let Some(grandparent) = parent.parent() {
                path = grandparent.to_path_buf();
            }
        }
    }

    path.push("data");
    path.push("menuplan.db");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_steps_out_of_target() {
        let path = default_database_path(PathBuf::from("/srv/menuplan/target/release"));
        assert_eq!(path, PathBuf::from("/srv/menuplan/data/menuplan.db"));

        let path = default_database_path(PathBuf::from("/opt/menuplan/bin"));
        assert_eq!(path, PathBuf::from("/opt/menuplan/bin/data/menuplan.db"));
    }
}
