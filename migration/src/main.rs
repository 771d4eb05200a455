use std::process::ExitCode;

use colored::*;
use util::{config, database};

mod runner;

// Needed by `runner`, which resolves the migration list through the crate root.
use migration::Migrator;

#[tokio::main]
async fn main() -> ExitCode {
    let db_path = config::database_path();
    let url = database::database_url(&db_path);
    let args: Vec<String> = std::env::args().collect();

    println!(
        "{} {}",
        config::project_name().bold(),
        format!("[{}]", config::env()).dimmed()
    );

    let result = match args.get(1).map(|s| s.as_str()) {
        Some("clean") => remove_db_file(&db_path).map_err(|e| e.to_string()),
        Some("fresh") => match remove_db_file(&db_path)
            .and_then(|_| database::ensure_parent_dir(&db_path))
        {
            Ok(()) => runner::run_all_migrations(&url)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        },
        _ => match database::ensure_parent_dir(&db_path) {
            Ok(()) => runner::run_all_migrations(&url)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn remove_db_file(db_path: &str) -> std::io::Result<()> {
    if database::sqlite_file_path(db_path).is_none() {
        println!("DATABASE_PATH is a DSN, nothing to delete: {db_path}");
    } else if database::remove_database_file(db_path)? {
        println!("Deleted DB: {db_path}");
    } else {
        println!("DB file does not exist: {db_path}");
    }
    Ok(())
}
