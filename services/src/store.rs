//! Storage and lookup seams used by the admission controller.
//!
//! The controller never coordinates concurrent requests itself. Exactly-once
//! marking rests on [`AttendanceStore::insert_attendance_if_absent`], which must
//! be backed by a uniqueness constraint on `(class_session_id, student_id)`.

use std::future::Future;

use db::models::attendance_record::{self, NewAttendanceRecord};
use db::models::{class_session, user};
use sea_orm::{DatabaseConnection, DbErr, SqlErr};

pub use db::models::attendance_record::Model as AttendanceRecord;
pub use db::models::class_session::Model as ClassSession;
pub use db::models::user::Model as Student;

/// Result of a guarded insert.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(AttendanceRecord),
    /// The constraint rejected the row; another request already holds the pair.
    AlreadyExists,
}

pub trait AttendanceStore: Send + Sync {
    /// Fast-path read. Not authoritative under concurrency.
    fn attendance_exists(
        &self,
        class_session_id: i64,
        student_id: i64,
    ) -> impl Future<Output = Result<bool, DbErr>> + Send;

    /// Inserts unless a record for the pair exists, atomically.
    fn insert_attendance_if_absent(
        &self,
        record: NewAttendanceRecord,
    ) -> impl Future<Output = Result<InsertOutcome, DbErr>> + Send;
}

pub trait ClassSessionLookup: Send + Sync {
    fn find_class_session(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<ClassSession>, DbErr>> + Send;
}

pub trait StudentLookup: Send + Sync {
    fn find_student(&self, id: i64) -> impl Future<Output = Result<Option<Student>, DbErr>> + Send;
}

/// SeaORM-backed implementation of every seam.
#[derive(Debug, Clone)]
pub struct DatabaseStore {
    db: DatabaseConnection,
}

impl DatabaseStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl AttendanceStore for DatabaseStore {
    async fn attendance_exists(&self, class_session_id: i64, student_id: i64) -> Result<bool, DbErr> {
        attendance_record::Model::exists_for(&self.db, class_session_id, student_id).await
    }

    async fn insert_attendance_if_absent(
        &self,
        record: NewAttendanceRecord,
    ) -> Result<InsertOutcome, DbErr> {
        let (class_session_id, student_id) = (record.class_session_id, record.student_id);

        match attendance_record::Model::insert_new(&self.db, record).await {
            Ok(model) => Ok(InsertOutcome::Inserted(model)),
            Err(err) if is_unique_violation(&err) => {
                tracing::debug!(
                    class_session_id,
                    student_id,
                    "attendance insert rejected by unique constraint"
                );
                Ok(InsertOutcome::AlreadyExists)
            }
            Err(err) => {
                tracing::error!(
                    class_session_id,
                    student_id,
                    error = %err,
                    "attendance insert failed"
                );
                Err(err)
            }
        }
    }
}

impl ClassSessionLookup for DatabaseStore {
    async fn find_class_session(&self, id: i64) -> Result<Option<ClassSession>, DbErr> {
        class_session::Model::find_by_id(&self.db, id).await
    }
}

impl StudentLookup for DatabaseStore {
    async fn find_student(&self, id: i64) -> Result<Option<Student>, DbErr> {
        user::Model::find_by_id(&self.db, id).await
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
