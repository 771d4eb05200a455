//! Attendance events
//!
//! Built by callers from a committed record and forwarded to audit logging or
//! notification collaborators. The admission controller never emits these itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::AttendanceRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum AttendanceEvent {
    /// Student admitted through the geofence
    AttendanceMarked {
        class_session_id: i64,
        student_id: i64,
        distance_meters: f64,
        marked_at: DateTime<Utc>,
    },

    /// Lecturer asserted attendance on the student's behalf
    AttendanceMarkedManually {
        class_session_id: i64,
        student_id: i64,
        marked_by: Option<i64>,
        marked_at: DateTime<Utc>,
    },
}

impl AttendanceEvent {
    pub fn from_record(record: &AttendanceRecord) -> Self {
        if record.is_manual {
            AttendanceEvent::AttendanceMarkedManually {
                class_session_id: record.class_session_id,
                student_id: record.student_id,
                marked_by: record.marked_by,
                marked_at: record.marked_at,
            }
        } else {
            AttendanceEvent::AttendanceMarked {
                class_session_id: record.class_session_id,
                student_id: record.student_id,
                distance_meters: record.distance_meters,
                marked_at: record.marked_at,
            }
        }
    }

    pub fn student_id(&self) -> i64 {
        match self {
            AttendanceEvent::AttendanceMarked { student_id, .. } => *student_id,
            AttendanceEvent::AttendanceMarkedManually { student_id, .. } => *student_id,
        }
    }

    pub fn class_session_id(&self) -> i64 {
        match self {
            AttendanceEvent::AttendanceMarked {
                class_session_id, ..
            } => *class_session_id,
            AttendanceEvent::AttendanceMarkedManually {
                class_session_id, ..
            } => *class_session_id,
        }
    }

    /// Matches the serialized `type` tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            AttendanceEvent::AttendanceMarked { .. } => "attendance_marked",
            AttendanceEvent::AttendanceMarkedManually { .. } => "attendance_marked_manually",
        }
    }

    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl From<&AttendanceRecord> for AttendanceEvent {
    fn from(record: &AttendanceRecord) -> Self {
        AttendanceEvent::from_record(record)
    }
}
