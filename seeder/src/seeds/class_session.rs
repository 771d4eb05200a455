use crate::seed::Seeder;
use crate::seeds::LECTURER_USERNAME;
use chrono::{Duration, Utc};
use db::models::user;
use sea_orm::{DatabaseConnection, DbErr};
use services::class_session::{ClassSessionError, ClassSessionService, CreateClassSession};

/// Lecture theatre used as the class location.
pub const CLASS_LAT: f64 = 6.5244;
pub const CLASS_LON: f64 = 3.3792;

pub struct ClassSessionSeeder;

#[async_trait::async_trait]
impl Seeder for ClassSessionSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        let Some(lecturer) = user::Model::find_by_username(db, LECTURER_USERNAME).await? else {
            return Err(DbErr::RecordNotFound(LECTURER_USERNAME.into()));
        };
        let now = Utc::now();

        // one running lecture, one finished, one with the gate shut
        let specs = [
            ("COS301", "Software Engineering", -15, None, true),
            ("COS332", "Computer Networks", -24 * 60, Some(90), true),
            ("COS344", "Computer Graphics", -5, None, false),
        ];

        for (course_code, title, offset_minutes, length_minutes, open) in specs {
            let starts_at = now + Duration::minutes(offset_minutes);
            let session = ClassSessionService::create(
                db,
                CreateClassSession {
                    lecturer_id: lecturer.id,
                    course_code: course_code.into(),
                    title: title.into(),
                    latitude: CLASS_LAT,
                    longitude: CLASS_LON,
                    radius_meters: Some(fastrand::i32(25..=60)),
                    attendance_open: Some(open),
                    starts_at,
                    ends_at: length_minutes.map(|m| starts_at + Duration::minutes(m)),
                },
            )
            .await
            .map_err(into_db_err)?;

            if length_minutes.is_some() {
                ClassSessionService::end(db, session.id, now)
                    .await
                    .map_err(into_db_err)?;
            }
        }

        Ok(())
    }
}

fn into_db_err(err: ClassSessionError) -> DbErr {
    match err {
        ClassSessionError::Database(db_err) => db_err,
        other => DbErr::Custom(other.to_string()),
    }
}
