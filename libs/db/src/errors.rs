//! Shared database error helpers (constraint categorization).

use sea_orm::{DbErr, SqlErr};

/// If `err` is a unique constraint violation, return the driver message
/// (for SQLite: `UNIQUE constraint failed: <table>.<column>`).
pub fn unique_violation(err: &DbErr) -> Option<String> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => Some(msg),
        _ => None,
    }
}

/// Extract the `<table>.<column>` list from a SQLite unique violation message.
pub fn violated_columns(msg: &str) -> Vec<&str> {
    msg.rsplit_once(':')
        .map(|(_, cols)| cols.split(',').map(str::trim).filter(|c| !c.is_empty()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_from_sqlite_message() {
        assert_eq!(
            violated_columns("UNIQUE constraint failed: users.email"),
            vec!["users.email"]
        );
        assert_eq!(
            violated_columns("UNIQUE constraint failed: t.a, t.b"),
            vec!["t.a", "t.b"]
        );
        assert!(violated_columns("no colon here").is_empty());
    }
}
