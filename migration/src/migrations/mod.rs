pub mod m202505290001_create_users;
pub mod m202509080001_create_class_sessions;
pub mod m202509080002_create_attendance_records;
