use db::models::attendance_record;
use sea_orm::{DbConn, DbErr};
use serde::Serialize;

use crate::store::AttendanceRecord;

/// A roster row: the record plus the name to display for the student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    pub student_name: String,
}

/// Read and correction access to committed attendance.
pub struct AttendanceRecordService;

impl AttendanceRecordService {
    /// Everyone admitted to a class session, in marking order.
    pub async fn roster(db: &DbConn, class_session_id: i64) -> Result<Vec<RosterEntry>, DbErr> {
        let rows =
            attendance_record::Model::find_all_for_session_with_students(db, class_session_id)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(record, student)| {
                let student_name = student
                    .as_ref()
                    .map(|s| s.display_name().to_owned())
                    .unwrap_or_default();
                RosterEntry {
                    record,
                    student_name,
                }
            })
            .collect())
    }

    pub async fn count(db: &DbConn, class_session_id: i64) -> Result<u64, DbErr> {
        attendance_record::Model::count_for_session(db, class_session_id).await
    }

    pub async fn find(
        db: &DbConn,
        class_session_id: i64,
        student_id: i64,
    ) -> Result<Option<AttendanceRecord>, DbErr> {
        attendance_record::Model::find_for(db, class_session_id, student_id).await
    }

    /// Lecturer correction. Once removed, the student may mark again.
    pub async fn remove(
        db: &DbConn,
        class_session_id: i64,
        student_id: i64,
        removed_by: i64,
    ) -> Result<bool, DbErr> {
        let removed = attendance_record::Model::delete_for(db, class_session_id, student_id).await?;
        if removed {
            tracing::info!(
                class_session_id,
                student_id,
                removed_by,
                "attendance record removed"
            );
        }
        Ok(removed)
    }
}
