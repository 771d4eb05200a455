use chrono::{DateTime, Utc};
use db::models::class_session::{ClassStatus, Model, NewClassSession};
use sea_orm::{DbConn, DbErr};
use util::config;

use crate::geo::{GeoPoint, InvalidCoordinates};

pub use db::models::class_session::Model as ClassSession;

#[derive(Debug, thiserror::Error)]
pub enum ClassSessionError {
    #[error("admission radius must be greater than zero, got {0}")]
    InvalidRadius(i32),

    #[error(transparent)]
    InvalidCoordinates(#[from] InvalidCoordinates),

    #[error("class session must end after it starts")]
    InvalidWindow,

    #[error("class session {0} has ended")]
    AlreadyEnded(i64),

    #[error("class session {0} not found")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

#[derive(Debug, Clone)]
pub struct CreateClassSession {
    pub lecturer_id: i64,
    pub course_code: String,
    pub title: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Falls back to `DEFAULT_RADIUS_METERS`.
    pub radius_meters: Option<i32>,
    /// Gate starts open unless set.
    pub attendance_open: Option<bool>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl CreateClassSession {
    fn validate(self) -> Result<NewClassSession, ClassSessionError> {
        let location = GeoPoint::new(self.latitude, self.longitude)?;

        let radius_meters = self
            .radius_meters
            .unwrap_or_else(config::default_radius_meters);
        if radius_meters <= 0 {
            return Err(ClassSessionError::InvalidRadius(radius_meters));
        }

        if matches!(self.ends_at, Some(ends_at) if ends_at < self.starts_at) {
            return Err(ClassSessionError::InvalidWindow);
        }

        Ok(NewClassSession {
            lecturer_id: self.lecturer_id,
            course_code: self.course_code.trim().to_owned(),
            title: self.title.trim().to_owned(),
            latitude: location.latitude(),
            longitude: location.longitude(),
            radius_meters,
            attendance_open: self.attendance_open.unwrap_or(true),
            starts_at: self.starts_at,
            ends_at: self.ends_at,
        })
    }
}

/// Lecturer-side lifecycle of a class session: pause, resume, end, and the
/// attendance gate. None of these touch existing attendance records.
pub struct ClassSessionService;

impl ClassSessionService {
    pub async fn create(
        db: &DbConn,
        params: CreateClassSession,
    ) -> Result<ClassSession, ClassSessionError> {
        let new = params.validate()?;
        let session = Model::create(db, new).await?;

        tracing::info!(
            class_session_id = session.id,
            lecturer_id = session.lecturer_id,
            radius_meters = session.radius_meters,
            "class session created"
        );
        Ok(session)
    }

    pub async fn find_by_id(db: &DbConn, id: i64) -> Result<ClassSession, ClassSessionError> {
        Model::find_by_id(db, id)
            .await?
            .ok_or(ClassSessionError::NotFound(id))
    }

    pub async fn pause(
        db: &DbConn,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<ClassSession, ClassSessionError> {
        Self::transition(db, id, ClassStatus::Paused, now).await
    }

    pub async fn resume(
        db: &DbConn,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<ClassSession, ClassSessionError> {
        Self::transition(db, id, ClassStatus::Active, now).await
    }

    /// Ending is final; later pause/resume calls fail with `AlreadyEnded`.
    pub async fn end(
        db: &DbConn,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<ClassSession, ClassSessionError> {
        let current = Self::find_by_id(db, id).await?;
        if current.status == ClassStatus::Ended {
            return Ok(current);
        }

        let session = Model::end(db, id, now).await.map_err(not_found(id))?;
        tracing::info!(class_session_id = id, "class session ended");
        Ok(session)
    }

    pub async fn open_attendance(
        db: &DbConn,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<ClassSession, ClassSessionError> {
        Self::set_gate(db, id, true, now).await
    }

    pub async fn close_attendance(
        db: &DbConn,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<ClassSession, ClassSessionError> {
        Self::set_gate(db, id, false, now).await
    }

    pub async fn delete(db: &DbConn, id: i64) -> Result<(), ClassSessionError> {
        if !Model::delete_by_id(db, id).await? {
            return Err(ClassSessionError::NotFound(id));
        }
        tracing::info!(class_session_id = id, "class session deleted");
        Ok(())
    }

    async fn transition(
        db: &DbConn,
        id: i64,
        status: ClassStatus,
        now: DateTime<Utc>,
    ) -> Result<ClassSession, ClassSessionError> {
        let current = Self::find_by_id(db, id).await?;
        if current.status == ClassStatus::Ended {
            return Err(ClassSessionError::AlreadyEnded(id));
        }

        let session = Model::set_status(db, id, status, now)
            .await
            .map_err(not_found(id))?;
        tracing::info!(class_session_id = id, status = %status, "class session status changed");
        Ok(session)
    }

    async fn set_gate(
        db: &DbConn,
        id: i64,
        open: bool,
        now: DateTime<Utc>,
    ) -> Result<ClassSession, ClassSessionError> {
        let session = Model::set_attendance_open(db, id, open, now)
            .await
            .map_err(not_found(id))?;
        tracing::info!(class_session_id = id, open, "attendance gate toggled");
        Ok(session)
    }
}

fn not_found(id: i64) -> impl FnOnce(DbErr) -> ClassSessionError {
    move |err| match err {
        DbErr::RecordNotFound(_) => ClassSessionError::NotFound(id),
        other => ClassSessionError::Database(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use db::models::user;
    use db::test_utils::setup_test_db;
    use serial_test::serial;
    use util::config::AppConfig;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 8, 10, 0, 0).unwrap()
    }

    fn params(lecturer_id: i64) -> CreateClassSession {
        CreateClassSession {
            lecturer_id,
            course_code: " COS301 ".into(),
            title: "Software Engineering".into(),
            latitude: 6.5244,
            longitude: 3.3792,
            radius_meters: Some(30),
            attendance_open: None,
            starts_at: start(),
            ends_at: Some(start() + Duration::hours(1)),
        }
    }

    async fn lecturer(db: &DbConn) -> i64 {
        user::Model::create(db, "lect1", "lect1@test.com", Some("Dr. Okafor"))
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_validates_and_trims() {
        let db = setup_test_db().await;
        let lecturer_id = lecturer(&db).await;

        let s = ClassSessionService::create(&db, params(lecturer_id))
            .await
            .unwrap();
        assert_eq!(s.course_code, "COS301");
        assert_eq!(s.status, ClassStatus::Active);
        assert!(s.attendance_open);
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_radius_uses_configured_default() {
        let db = setup_test_db().await;
        let lecturer_id = lecturer(&db).await;
        AppConfig::set_default_radius_meters(45);

        let s = ClassSessionService::create(
            &db,
            CreateClassSession {
                radius_meters: None,
                ..params(lecturer_id)
            },
        )
        .await
        .unwrap();
        assert_eq!(s.radius_meters, 45);

        AppConfig::reset();
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let db = setup_test_db().await;
        let lecturer_id = lecturer(&db).await;

        let zero_radius = ClassSessionService::create(
            &db,
            CreateClassSession {
                radius_meters: Some(0),
                ..params(lecturer_id)
            },
        )
        .await;
        assert!(matches!(zero_radius, Err(ClassSessionError::InvalidRadius(0))));

        let bad_coords = ClassSessionService::create(
            &db,
            CreateClassSession {
                latitude: 123.0,
                ..params(lecturer_id)
            },
        )
        .await;
        assert!(matches!(
            bad_coords,
            Err(ClassSessionError::InvalidCoordinates(_))
        ));

        let backwards = ClassSessionService::create(
            &db,
            CreateClassSession {
                ends_at: Some(start() - Duration::minutes(1)),
                ..params(lecturer_id)
            },
        )
        .await;
        assert!(matches!(backwards, Err(ClassSessionError::InvalidWindow)));
    }

    #[tokio::test]
    async fn test_pause_resume_end_lifecycle() {
        let db = setup_test_db().await;
        let lecturer_id = lecturer(&db).await;
        let s = ClassSessionService::create(&db, params(lecturer_id))
            .await
            .unwrap();
        let now = start() + Duration::minutes(20);

        let paused = ClassSessionService::pause(&db, s.id, now).await.unwrap();
        assert_eq!(paused.status, ClassStatus::Paused);

        let resumed = ClassSessionService::resume(&db, s.id, now).await.unwrap();
        assert_eq!(resumed.status, ClassStatus::Active);

        let ended = ClassSessionService::end(&db, s.id, now).await.unwrap();
        assert_eq!(ended.status, ClassStatus::Ended);
        assert_eq!(ended.ends_at, Some(now));

        let again = ClassSessionService::resume(&db, s.id, now).await;
        assert!(matches!(again, Err(ClassSessionError::AlreadyEnded(id)) if id == s.id));

        // idempotent
        let ended_twice = ClassSessionService::end(&db, s.id, now + Duration::minutes(5))
            .await
            .unwrap();
        assert_eq!(ended_twice.ends_at, Some(now));
    }

    #[tokio::test]
    async fn test_end_keeps_earlier_scheduled_end() {
        let db = setup_test_db().await;
        let lecturer_id = lecturer(&db).await;
        let s = ClassSessionService::create(&db, params(lecturer_id))
            .await
            .unwrap();
        let late = start() + Duration::hours(3);

        let ended = ClassSessionService::end(&db, s.id, late).await.unwrap();
        assert_eq!(ended.ends_at, Some(start() + Duration::hours(1)));
    }

    #[tokio::test]
    async fn test_gate_toggle() {
        let db = setup_test_db().await;
        let lecturer_id = lecturer(&db).await;
        let s = ClassSessionService::create(&db, params(lecturer_id))
            .await
            .unwrap();

        let closed = ClassSessionService::close_attendance(&db, s.id, start())
            .await
            .unwrap();
        assert!(!closed.attendance_open);
        assert_eq!(closed.status, ClassStatus::Active);

        let opened = ClassSessionService::open_attendance(&db, s.id, start())
            .await
            .unwrap();
        assert!(opened.attendance_open);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let db = setup_test_db().await;

        assert!(matches!(
            ClassSessionService::pause(&db, 77, start()).await,
            Err(ClassSessionError::NotFound(77))
        ));
        assert!(matches!(
            ClassSessionService::close_attendance(&db, 77, start()).await,
            Err(ClassSessionError::NotFound(77))
        ));
        assert!(matches!(
            ClassSessionService::delete(&db, 77).await,
            Err(ClassSessionError::NotFound(77))
        ));
    }
}
