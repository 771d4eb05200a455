pub mod attendance;
pub mod class_session;
pub mod user;

/// Fixed accounts that the other seeders look up by username.
pub const LECTURER_USERNAME: &str = "lect0001";
pub const STUDENT_PREFIX: &str = "u";
pub const STUDENT_COUNT: usize = 40;
