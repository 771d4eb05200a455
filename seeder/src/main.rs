use std::process::ExitCode;

use colored::*;

use migration::Migrator;
use sea_orm_migration::MigratorTrait;
use util::{config, logging::init_logging};

use crate::seed::{Seeder, run_seeder};
use crate::seeds::{
    attendance::AttendanceSeeder, class_session::ClassSessionSeeder, user::UserSeeder,
};

mod seed;
mod seeds;

#[tokio::main]
async fn main() -> ExitCode {
    let _log_guard = init_logging(&config::log_file(), &config::log_level());

    println!(
        "{} {}",
        config::project_name().bold(),
        format!("[{}]", config::env()).dimmed()
    );
    tracing::info!(project = %config::project_name(), env = %config::env(), "seeding database");

    let db = match db::connect().await {
        Ok(db) => db,
        Err(err) => {
            eprintln!("Failed to connect to database: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = Migrator::up(&db, None).await {
        eprintln!("Failed to run migrations: {err}");
        return ExitCode::FAILURE;
    }

    for (seeder, name) in [
        (Box::new(UserSeeder) as Box<dyn Seeder + Send + Sync>, "User"),
        (Box::new(ClassSessionSeeder), "ClassSession"),
        (Box::new(AttendanceSeeder), "Attendance"),
    ] {
        if let Err(err) = run_seeder(&*seeder, name, &db).await {
            eprintln!("{name} seeder failed: {err}");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
