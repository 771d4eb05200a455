use crate::seed::Seeder;
use crate::seeds::class_session::{CLASS_LAT, CLASS_LON};
use crate::seeds::{LECTURER_USERNAME, STUDENT_COUNT, STUDENT_PREFIX};
use chrono::Utc;
use db::models::class_session::{self, ClassStatus};
use db::models::user;
use sea_orm::{DatabaseConnection, DbErr};
use services::admission::AdmissionController;
use services::error::AdmissionError;
use services::events::AttendanceEvent;
use services::store::DatabaseStore;

/// Roughly 111 km per degree of latitude.
const METERS_PER_DEGREE: f64 = 111_320.0;

pub struct AttendanceSeeder;

#[async_trait::async_trait]
impl Seeder for AttendanceSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        let Some(lecturer) = user::Model::find_by_username(db, LECTURER_USERNAME).await? else {
            return Err(DbErr::RecordNotFound(LECTURER_USERNAME.into()));
        };
        let controller = AdmissionController::new(DatabaseStore::new(db.clone()));

        for session in class_session::Model::find_all_for_lecturer(db, lecturer.id).await? {
            if session.status != ClassStatus::Active {
                continue;
            }
            let now = Utc::now();

            for i in 1..=STUDENT_COUNT {
                let username = format!("{STUDENT_PREFIX}{i:08}");
                let Some(student) = user::Model::find_by_username(db, &username).await? else {
                    continue;
                };

                let outcome = if i % 10 == 0 {
                    controller
                        .mark_attendance_manually(&session, &student, lecturer.id, now)
                        .await
                } else {
                    // jitter of up to ~80 m, so some land outside the radius
                    let north = fastrand::f64() * 80.0 / METERS_PER_DEGREE;
                    let east = fastrand::f64() * 20.0 / METERS_PER_DEGREE;
                    controller
                        .mark_attendance(&session, &student, CLASS_LAT + north, CLASS_LON + east, now)
                        .await
                };

                match outcome {
                    Ok(record) => {
                        let event = AttendanceEvent::from_record(&record);
                        tracing::debug!(
                            event = event.event_type(),
                            class_session_id = event.class_session_id(),
                            student_id = event.student_id(),
                            "seeded attendance"
                        );
                    }
                    Err(AdmissionError::StorageTransient(err)) => return Err(err),
                    Err(rejected) => {
                        tracing::debug!(
                            code = rejected.code(),
                            student_id = student.id,
                            "seeded submission rejected"
                        );
                    }
                }
            }
        }

        Ok(())
    }
}
