//! `DATABASE_PATH` handling shared by the `db` and `migration` crates.
//!
//! The value is either a SQLite file path or a full DSN. Only file paths are
//! touched on disk; DSNs go to the driver untouched.

use std::fs;
use std::io;
use std::path::Path;

const DSN_PREFIXES: [&str; 4] = ["sqlite:", "postgres://", "postgresql://", "mysql://"];

/// Returns `Some(path)` when `path_or_url` is a plain file path, `None` for a DSN.
pub fn sqlite_file_path(path_or_url: &str) -> Option<&Path> {
    if DSN_PREFIXES.iter().any(|p| path_or_url.starts_with(p)) {
        None
    } else {
        Some(Path::new(path_or_url))
    }
}

/// Connection URL for a configured database location. File paths are
/// opened in read-write-create mode.
pub fn database_url(path_or_url: &str) -> String {
    match sqlite_file_path(path_or_url) {
        Some(path) => format!("sqlite://{}?mode=rwc", path.display()),
        None => path_or_url.to_owned(),
    }
}

/// Creates the parent directory of a file-backed database. SQLite won't.
pub fn ensure_parent_dir(path_or_url: &str) -> io::Result<()> {
    let Some(parent) = sqlite_file_path(path_or_url).and_then(Path::parent) else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(parent)
}

/// Deletes a file-backed database. Returns whether a file was removed;
/// DSNs and missing files are left alone.
pub fn remove_database_file(path_or_url: &str) -> io::Result<bool> {
    match sqlite_file_path(path_or_url) {
        Some(path) if path.exists() => fs::remove_file(path).map(|()| true),
        _ => Ok(false),
    }
}
