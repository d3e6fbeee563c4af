//! SQLite DSN helpers.

use std::path::{Path, PathBuf};

use crate::{DbError, Result};

/// True for DSNs that open a private in-memory database.
pub fn is_memory_dsn(dsn: &str) -> bool {
    let s = dsn.trim();
    s.eq_ignore_ascii_case("sqlite::memory:")
        || s.eq_ignore_ascii_case("sqlite://:memory:")
        || s.contains("mode=memory")
}

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps in-memory DSNs as `sqlite::memory:`.
/// - Normalizes backslashes into forward slashes.
/// - Optionally creates the parent directory of the database file.
pub fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    let dsn = dsn.trim();
    if is_memory_dsn(dsn) {
        return Ok("sqlite::memory:".to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .or_else(|| dsn.strip_prefix("sqlite:"))
        .ok_or_else(|| DbError::UnknownDsn(dsn.to_string()))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(DbError::UnknownDsn(format!("empty SQLite path in '{dsn}'")));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if create_dirs {
        if let Some(dir) = p.parent() {
            std::fs::create_dir_all(dir)?;
        }
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}
