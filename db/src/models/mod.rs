pub mod attendance_record;
pub mod class_session;
pub mod user;
