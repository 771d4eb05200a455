use sea_orm::DbErr;

use crate::geo::{InvalidCoordinates, format_distance};

/// Why an attendance submission was not admitted.
///
/// Every variant except [`AdmissionError::StorageTransient`] is terminal for
/// the attempt and should be shown to the student.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error("class session is not accepting attendance")]
    ClassNotActive,

    #[error("attendance gate is closed")]
    AttendanceClosed,

    #[error("attendance already marked for this class session")]
    AlreadyMarked,

    #[error("submission is {distance:.2}m from the class, must be within {required}m")]
    OutOfRange { distance: f64, required: i32 },

    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(#[from] InvalidCoordinates),

    #[error("class session {0} not found")]
    ClassNotFound(i64),

    #[error("student {0} not found")]
    StudentNotFound(i64),

    #[error("storage error: {0}")]
    StorageTransient(#[from] DbErr),
}

impl AdmissionError {
    /// Stable identifier for the presentation layer.
    pub fn code(&self) -> &'static str {
        match self {
            AdmissionError::ClassNotActive => "class_not_active",
            AdmissionError::AttendanceClosed => "attendance_closed",
            AdmissionError::AlreadyMarked => "already_marked",
            AdmissionError::OutOfRange { .. } => "out_of_range",
            AdmissionError::InvalidCoordinates(_) => "invalid_coordinates",
            AdmissionError::ClassNotFound(_) => "class_not_found",
            AdmissionError::StudentNotFound(_) => "student_not_found",
            AdmissionError::StorageTransient(_) => "storage_transient",
        }
    }

    /// Human-readable reason for the end user.
    pub fn user_message(&self) -> String {
        match self {
            AdmissionError::ClassNotActive => {
                "This class is not accepting attendance right now.".into()
            }
            AdmissionError::AttendanceClosed => "The lecturer has closed attendance.".into(),
            AdmissionError::AlreadyMarked => {
                "You have already marked attendance for this class.".into()
            }
            AdmissionError::OutOfRange { distance, required } => format!(
                "You are {}m away; must be within {}m.",
                format_distance(*distance),
                required
            ),
            AdmissionError::InvalidCoordinates(_) => "Invalid location data.".into(),
            AdmissionError::ClassNotFound(_) => "This class could not be found.".into(),
            AdmissionError::StudentNotFound(_) => "Your student record could not be found.".into(),
            AdmissionError::StorageTransient(_) => "Please try again.".into(),
        }
    }

    /// Only storage failures may be retried automatically. A retry after a
    /// partial success cannot double-admit because of the uniqueness constraint.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdmissionError::StorageTransient(_))
    }
}
