//! Attendance admission: decides whether a submission is accepted and commits it.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. eligibility window (status, gate, `starts_at`/`ends_at`)
//! 2. duplicate (class session, student) pair
//! 3. distance against the class radius (skipped for manual entries)
//! 4. guarded insert; a concurrent winner turns into `AlreadyMarked`
//!
//! The controller keeps no mutable state and does no logging. Successful
//! admissions are turned into [`crate::events::AttendanceEvent`]s by the caller.

use chrono::{DateTime, Utc};
use db::models::attendance_record::NewAttendanceRecord;
use db::models::class_session::ClassStatus;

use crate::error::AdmissionError;
use crate::geo::{self, GeoPoint};
use crate::store::{
    AttendanceRecord, AttendanceStore, ClassSession, ClassSessionLookup, InsertOutcome, Student,
    StudentLookup,
};

/// Step 1. Status and gate are checked before the time window.
pub fn check_window(session: &ClassSession, now: DateTime<Utc>) -> Result<(), AdmissionError> {
    match session.status {
        ClassStatus::Ended | ClassStatus::Paused => return Err(AdmissionError::ClassNotActive),
        ClassStatus::Active => {}
    }
    if !session.attendance_open {
        return Err(AdmissionError::AttendanceClosed);
    }
    if now < session.starts_at {
        return Err(AdmissionError::ClassNotActive);
    }
    if let Some(ends_at) = session.ends_at {
        if now > ends_at {
            return Err(AdmissionError::ClassNotActive);
        }
    }
    Ok(())
}

/// Step 3 on an already computed distance. Exactly `radius_meters` is admitted.
pub fn check_range(distance: f64, radius_meters: i32) -> Result<(), AdmissionError> {
    if distance > f64::from(radius_meters) {
        return Err(AdmissionError::OutOfRange {
            distance,
            required: radius_meters,
        });
    }
    Ok(())
}

pub struct AdmissionController<S> {
    store: S,
}

impl<S: AttendanceStore> AdmissionController<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Self-service geolocation admission.
    pub async fn mark_attendance(
        &self,
        session: &ClassSession,
        student: &Student,
        submitted_lat: f64,
        submitted_lon: f64,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AdmissionError> {
        let submitted = GeoPoint::new(submitted_lat, submitted_lon)?;

        check_window(session, now)?;
        self.reject_duplicate(session, student).await?;

        let distance = geo::distance(
            session.latitude,
            session.longitude,
            submitted.latitude(),
            submitted.longitude(),
        );
        check_range(distance, session.radius_meters)?;

        self.commit(NewAttendanceRecord {
            class_session_id: session.id,
            student_id: student.id,
            latitude: Some(submitted.latitude()),
            longitude: Some(submitted.longitude()),
            distance_meters: geo::round_meters(distance),
            marked_at: now,
            is_manual: false,
            marked_by: None,
        })
        .await
    }

    /// Lecturer-asserted admission. No coordinates, no distance check; the
    /// stored distance is 0. Window and duplicate rules still apply.
    pub async fn mark_attendance_manually(
        &self,
        session: &ClassSession,
        student: &Student,
        marked_by: i64,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AdmissionError> {
        check_window(session, now)?;
        self.reject_duplicate(session, student).await?;

        self.commit(NewAttendanceRecord {
            class_session_id: session.id,
            student_id: student.id,
            latitude: None,
            longitude: None,
            distance_meters: 0.0,
            marked_at: now,
            is_manual: true,
            marked_by: Some(marked_by),
        })
        .await
    }

    /// Resolves both ids through `directory`, then behaves like
    /// [`AdmissionController::mark_attendance`].
    pub async fn mark_attendance_for<L>(
        &self,
        directory: &L,
        class_session_id: i64,
        student_id: i64,
        submitted_lat: f64,
        submitted_lon: f64,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AdmissionError>
    where
        L: ClassSessionLookup + StudentLookup,
    {
        let session = directory
            .find_class_session(class_session_id)
            .await?
            .ok_or(AdmissionError::ClassNotFound(class_session_id))?;
        let student = directory
            .find_student(student_id)
            .await?
            .ok_or(AdmissionError::StudentNotFound(student_id))?;

        self.mark_attendance(&session, &student, submitted_lat, submitted_lon, now)
            .await
    }

    async fn reject_duplicate(
        &self,
        session: &ClassSession,
        student: &Student,
    ) -> Result<(), AdmissionError> {
        if self.store.attendance_exists(session.id, student.id).await? {
            return Err(AdmissionError::AlreadyMarked);
        }
        Ok(())
    }

    async fn commit(&self, record: NewAttendanceRecord) -> Result<AttendanceRecord, AdmissionError> {
        match self.store.insert_attendance_if_absent(record).await? {
            InsertOutcome::Inserted(model) => Ok(model),
            InsertOutcome::AlreadyExists => Err(AdmissionError::AlreadyMarked),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::EARTH_RADIUS_M;
    use crate::store::DatabaseStore;
    use chrono::{Duration, TimeZone};
    use db::models::class_session::{self, NewClassSession};
    use db::models::{attendance_record, user};
    use db::test_utils::setup_test_db;
    use sea_orm::DatabaseConnection;

    const CLASS_LAT: f64 = 6.5244;
    const CLASS_LON: f64 = 3.3792;

    fn lecture_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 8, 10, 0, 0).unwrap()
    }

    fn session_fixture() -> ClassSession {
        ClassSession {
            id: 1,
            lecturer_id: 1,
            course_code: "COS301".into(),
            title: "Lecture 5".into(),
            latitude: CLASS_LAT,
            longitude: CLASS_LON,
            radius_meters: 30,
            status: ClassStatus::Active,
            attendance_open: true,
            starts_at: lecture_start(),
            ends_at: Some(lecture_start() + Duration::hours(2)),
            created_at: lecture_start(),
            updated_at: lecture_start(),
        }
    }

    /// A point `meters` north of the class location.
    fn north_of_class(meters: f64) -> (f64, f64) {
        (CLASS_LAT + (meters / EARTH_RADIUS_M).to_degrees(), CLASS_LON)
    }

    struct Fixture {
        db: DatabaseConnection,
        controller: AdmissionController<DatabaseStore>,
        lecturer: Student,
        student: Student,
        session: ClassSession,
    }

    async fn fixture() -> Fixture {
        let db = setup_test_db().await;
        let lecturer = user::Model::create(&db, "lect1", "lect1@test.com", None)
            .await
            .unwrap();
        let student = user::Model::create(&db, "stud1", "stud1@test.com", None)
            .await
            .unwrap();
        let session = class_session::Model::create(
            &db,
            NewClassSession {
                lecturer_id: lecturer.id,
                course_code: "COS301".into(),
                title: "Lecture 5".into(),
                latitude: CLASS_LAT,
                longitude: CLASS_LON,
                radius_meters: 30,
                attendance_open: true,
                starts_at: lecture_start(),
                ends_at: None,
            },
        )
        .await
        .unwrap();

        Fixture {
            controller: AdmissionController::new(DatabaseStore::new(db.clone())),
            db,
            lecturer,
            student,
            session,
        }
    }

    // --- pure policy ---

    #[test]
    fn test_window_accepts_open_active_class() {
        let s = session_fixture();
        assert!(check_window(&s, lecture_start()).is_ok());
        assert!(check_window(&s, lecture_start() + Duration::hours(2)).is_ok());
    }

    #[test]
    fn test_window_rejects_paused_and_ended() {
        for status in [ClassStatus::Paused, ClassStatus::Ended] {
            let s = ClassSession {
                status,
                ..session_fixture()
            };
            assert!(matches!(
                check_window(&s, lecture_start() + Duration::minutes(5)),
                Err(AdmissionError::ClassNotActive)
            ));
        }
    }

    #[test]
    fn test_status_is_checked_before_gate() {
        let s = ClassSession {
            status: ClassStatus::Ended,
            attendance_open: false,
            ..session_fixture()
        };
        assert!(matches!(
            check_window(&s, lecture_start()),
            Err(AdmissionError::ClassNotActive)
        ));
    }

    #[test]
    fn test_window_rejects_closed_gate() {
        let s = ClassSession {
            attendance_open: false,
            ..session_fixture()
        };
        assert!(matches!(
            check_window(&s, lecture_start()),
            Err(AdmissionError::AttendanceClosed)
        ));
    }

    #[test]
    fn test_window_rejects_outside_time_bounds() {
        let s = session_fixture();
        assert!(matches!(
            check_window(&s, lecture_start() - Duration::seconds(1)),
            Err(AdmissionError::ClassNotActive)
        ));
        assert!(matches!(
            check_window(&s, lecture_start() + Duration::hours(2) + Duration::seconds(1)),
            Err(AdmissionError::ClassNotActive)
        ));
    }

    #[test]
    fn test_radius_boundary_is_inclusive() {
        assert!(check_range(30.0, 30).is_ok());
        assert!(check_range(0.0, 30).is_ok());

        for eps in [1e-9, f64::EPSILON * 32.0, 0.01] {
            match check_range(30.0 + eps, 30) {
                Err(AdmissionError::OutOfRange { distance, required }) => {
                    assert_eq!(distance, 30.0 + eps);
                    assert_eq!(required, 30);
                }
                other => panic!("expected OutOfRange for eps {eps}, got {other:?}"),
            }
        }
    }

    // --- scenarios ---

    #[tokio::test]
    async fn test_identical_point_is_admitted_with_zero_distance() {
        let f = fixture().await;
        let now = lecture_start() + Duration::minutes(10);

        let rec = f
            .controller
            .mark_attendance(&f.session, &f.student, CLASS_LAT, CLASS_LON, now)
            .await
            .unwrap();

        assert_eq!(rec.distance_meters, 0.0);
        assert_eq!(rec.latitude, Some(CLASS_LAT));
        assert_eq!(rec.longitude, Some(CLASS_LON));
        assert_eq!(rec.marked_at, now);
        assert!(!rec.is_manual);
        assert_eq!(rec.marked_by, None);
    }

    #[tokio::test]
    async fn test_fifty_meters_away_is_out_of_range() {
        let f = fixture().await;
        let (lat, lon) = north_of_class(50.0);

        let err = f
            .controller
            .mark_attendance(&f.session, &f.student, lat, lon, lecture_start())
            .await
            .unwrap_err();

        match err {
            AdmissionError::OutOfRange { distance, required } => {
                assert!((distance - 50.0).abs() < 1e-6, "got {distance}");
                assert_eq!(required, 30);
            }
            other => panic!("expected OutOfRange, got {other:?}"),
        }
        let count = attendance_record::Model::count_for_session(&f.db, f.session.id)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_in_range_point_stores_rounded_distance() {
        let f = fixture().await;
        let (lat, lon) = north_of_class(12.3456);

        let rec = f
            .controller
            .mark_attendance(&f.session, &f.student, lat, lon, lecture_start())
            .await
            .unwrap();
        assert_eq!(rec.distance_meters, 12.35);
    }

    #[tokio::test]
    async fn test_closed_gate_wins_regardless_of_distance() {
        let f = fixture().await;
        let closed = class_session::Model::set_attendance_open(&f.db, f.session.id, false, lecture_start())
            .await
            .unwrap();
        let (far_lat, far_lon) = north_of_class(5_000.0);

        for (lat, lon) in [(CLASS_LAT, CLASS_LON), (far_lat, far_lon)] {
            let err = f
                .controller
                .mark_attendance(&closed, &f.student, lat, lon, lecture_start())
                .await
                .unwrap_err();
            assert!(matches!(err, AdmissionError::AttendanceClosed));
        }
    }

    #[tokio::test]
    async fn test_double_submission_is_already_marked() {
        let f = fixture().await;
        let now = lecture_start() + Duration::minutes(1);

        f.controller
            .mark_attendance(&f.session, &f.student, CLASS_LAT, CLASS_LON, now)
            .await
            .unwrap();
        let err = f
            .controller
            .mark_attendance(&f.session, &f.student, CLASS_LAT, CLASS_LON, now)
            .await
            .unwrap_err();

        assert!(matches!(err, AdmissionError::AlreadyMarked));
        assert_eq!(
            attendance_record::Model::count_for_session(&f.db, f.session.id)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_duplicate_is_reported_before_distance() {
        let f = fixture().await;
        f.controller
            .mark_attendance(&f.session, &f.student, CLASS_LAT, CLASS_LON, lecture_start())
            .await
            .unwrap();

        let (lat, lon) = north_of_class(500.0);
        let err = f
            .controller
            .mark_attendance(&f.session, &f.student, lat, lon, lecture_start())
            .await
            .unwrap_err();
        assert!(matches!(err, AdmissionError::AlreadyMarked));
    }

    #[tokio::test]
    async fn test_elapsed_end_time_rejects_active_class() {
        let f = fixture().await;
        let now = Utc::now();
        let session = ClassSession {
            starts_at: now - Duration::hours(3),
            ends_at: Some(now - Duration::hours(1)),
            ..f.session.clone()
        };
        assert_eq!(session.status, ClassStatus::Active);
        assert!(session.attendance_open);

        let err = f
            .controller
            .mark_attendance(&session, &f.student, CLASS_LAT, CLASS_LON, now)
            .await
            .unwrap_err();
        assert!(matches!(err, AdmissionError::ClassNotActive));
    }

    #[tokio::test]
    async fn test_invalid_coordinates_are_rejected_without_writing() {
        let f = fixture().await;

        for (lat, lon) in [(91.0, 0.0), (0.0, 181.0), (f64::NAN, 3.0)] {
            let err = f
                .controller
                .mark_attendance(&f.session, &f.student, lat, lon, lecture_start())
                .await
                .unwrap_err();
            assert!(matches!(err, AdmissionError::InvalidCoordinates(_)));
        }
        assert!(
            !f.controller
                .store()
                .attendance_exists(f.session.id, f.student.id)
                .await
                .unwrap()
        );
    }

    // --- manual entry ---

    #[tokio::test]
    async fn test_manual_entry_skips_distance() {
        let f = fixture().await;

        let rec = f
            .controller
            .mark_attendance_manually(&f.session, &f.student, f.lecturer.id, lecture_start())
            .await
            .unwrap();

        assert!(rec.is_manual);
        assert_eq!(rec.distance_meters, 0.0);
        assert_eq!(rec.latitude, None);
        assert_eq!(rec.marked_by, Some(f.lecturer.id));
    }

    #[tokio::test]
    async fn test_manual_after_geolocation_is_already_marked() {
        let f = fixture().await;
        f.controller
            .mark_attendance(&f.session, &f.student, CLASS_LAT, CLASS_LON, lecture_start())
            .await
            .unwrap();

        let err = f
            .controller
            .mark_attendance_manually(&f.session, &f.student, f.lecturer.id, lecture_start())
            .await
            .unwrap_err();
        assert!(matches!(err, AdmissionError::AlreadyMarked));
    }

    #[tokio::test]
    async fn test_geolocation_after_manual_is_already_marked() {
        let f = fixture().await;
        f.controller
            .mark_attendance_manually(&f.session, &f.student, f.lecturer.id, lecture_start())
            .await
            .unwrap();

        let err = f
            .controller
            .mark_attendance(&f.session, &f.student, CLASS_LAT, CLASS_LON, lecture_start())
            .await
            .unwrap_err();
        assert!(matches!(err, AdmissionError::AlreadyMarked));
    }

    #[tokio::test]
    async fn test_manual_entry_respects_window() {
        let f = fixture().await;
        let paused = class_session::Model::set_status(&f.db, f.session.id, ClassStatus::Paused, lecture_start())
            .await
            .unwrap();

        let err = f
            .controller
            .mark_attendance_manually(&paused, &f.student, f.lecturer.id, lecture_start())
            .await
            .unwrap_err();
        assert!(matches!(err, AdmissionError::ClassNotActive));
    }

    // --- id-based entry point ---

    #[tokio::test]
    async fn test_mark_by_ids_resolves_collaborators() {
        let f = fixture().await;
        let directory = DatabaseStore::new(f.db.clone());

        let rec = f
            .controller
            .mark_attendance_for(&directory, f.session.id, f.student.id, CLASS_LAT, CLASS_LON, lecture_start())
            .await
            .unwrap();
        assert_eq!(rec.student_id, f.student.id);

        let missing_class = f
            .controller
            .mark_attendance_for(&directory, 404, f.student.id, CLASS_LAT, CLASS_LON, lecture_start())
            .await
            .unwrap_err();
        assert!(matches!(missing_class, AdmissionError::ClassNotFound(404)));

        let missing_student = f
            .controller
            .mark_attendance_for(&directory, f.session.id, 404, CLASS_LAT, CLASS_LON, lecture_start())
            .await
            .unwrap_err();
        assert!(matches!(missing_student, AdmissionError::StudentNotFound(404)));
    }

    #[tokio::test]
    async fn test_storage_failure_is_transient() {
        let f = fixture().await;
        // A student id with no user row trips the foreign key, not the unique index.
        let ghost = Student {
            id: 9_999,
            ..f.student.clone()
        };

        let err = f
            .controller
            .mark_attendance(&f.session, &ghost, CLASS_LAT, CLASS_LON, lecture_start())
            .await
            .unwrap_err();
        assert!(matches!(err, AdmissionError::StorageTransient(_)));
        assert!(err.is_retryable());
    }
}
