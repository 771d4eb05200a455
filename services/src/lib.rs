pub mod admission;
pub mod attendance_record;
pub mod class_session;
pub mod error;
pub mod events;
pub mod geo;
pub mod store;

pub use admission::AdmissionController;
pub use error::AdmissionError;
pub use store::DatabaseStore;
